use clap::{Args, Parser, Subcommand};
use invoice_splitter::RuleOptions;
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "invoice-split")]
#[command(about = "Split a PDF containing multiple invoices into one PDF per invoice")]
#[command(version)]
#[command(subcommand_negates_reqs = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub split: SplitArgs,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect invoice boundaries and report them without writing files
    Analyze(AnalyzeArgs),

    /// Serve the upload form in a browser
    Serve(ServeArgs),
}

#[derive(Args, Clone, Debug)]
pub struct RuleArgs {
    /// Marker text that starts a new invoice (repeatable)
    #[arg(short = 'm', long = "marker", value_name = "TEXT", conflicts_with = "regex")]
    pub markers: Vec<String>,

    /// Regular expression that starts a new invoice
    #[arg(short = 'p', long, value_name = "PATTERN")]
    pub regex: Option<String>,

    /// Match markers and patterns regardless of case
    #[arg(short = 'i', long)]
    pub ignore_case: bool,

    /// Only search the first N characters of each page
    #[arg(long, value_name = "N")]
    pub scan_chars: Option<usize>,
}

impl RuleArgs {
    pub fn to_options(&self) -> RuleOptions {
        RuleOptions {
            markers: self.markers.clone(),
            regex: self.regex.clone(),
            case_sensitive: !self.ignore_case,
            scan_limit: self.scan_chars,
        }
    }
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Input PDF files or directories containing PDF files
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    #[command(flatten)]
    pub rule: RuleArgs,

    /// Output directory for the invoice files
    #[arg(short, long = "output-dir", default_value = "./output")]
    pub output_dir: PathBuf,

    /// Prefix for output file names (<prefix>_invoice_001.pdf)
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Also write all invoices into one ZIP archive
    #[arg(long, value_name = "FILE")]
    pub zip: Option<PathBuf>,

    /// Write only the ZIP archive, not the individual files
    #[arg(long, requires = "zip")]
    pub zip_only: bool,

    /// Write a manifest.json describing the split
    #[arg(long)]
    pub manifest: bool,

    /// Write into a non-empty output directory
    #[arg(long)]
    pub force: bool,

    /// Show the detected invoices without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input PDF files or directories containing PDF files
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    #[command(flatten)]
    pub rule: RuleArgs,

    /// Output analysis to JSON file
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Show per-page match details
    #[arg(long)]
    pub detailed: bool,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, default_value = "8080")]
    pub port: u16,

    /// Maximum upload size in megabytes
    #[arg(long, default_value = "50")]
    pub max_upload_mb: usize,

    #[command(flatten)]
    pub rule: RuleArgs,
}
