use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "nightalign",
    version,
    about = "Correlates medication dosing with nightly sleep metrics"
)]
pub struct Args {
    /// JSON array of dose events (from the CSV importer).
    #[arg(long)]
    pub doses: PathBuf,
    /// JSON array of nightly metric records (from the device ingester).
    #[arg(long)]
    pub sleep: PathBuf,
    /// Optional analysis config JSON; defaults apply when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Emit the aligned data points instead of running the analysis.
    #[arg(long, default_value_t = false)]
    pub aligned_only: bool,
}
