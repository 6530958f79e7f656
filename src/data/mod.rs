pub mod frame;
pub mod mock_source;
pub mod schema;
pub mod source;
pub mod types;
