use clap::Parser;

#[derive(Debug, Parser)]
#[clap(name = "polymarket-insight", version, about = "Mock Polymarket insight dashboard")]
pub struct Cli {
    /// Market ids to look up (defaults to `system.default_markets`)
    pub markets: Vec<String>,

    /// Days of history to fetch per market
    #[clap(long)]
    pub days: Option<usize>,

    /// Path to the TOML config file
    #[clap(long)]
    pub config: Option<String>,

    /// Print the dashboard payload as JSON instead of text tables
    #[clap(long)]
    pub json: bool,

    /// Seed for reproducible mock data
    #[clap(long)]
    pub seed: Option<u64>,
}
