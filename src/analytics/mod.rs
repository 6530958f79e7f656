pub mod enrichment;
pub mod indicators;

pub use enrichment::{enrich, Cell, EnrichedRow, EnrichedSeries, MissingInput};
