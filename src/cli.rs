use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "policy-intake",
    version,
    about = "Parse carrier PDF reports and diff pending-business spreadsheets"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Underwriting(ReportArgs),
    Returns(ReportArgs),
    Compare(CompareArgs),
    Status(StatusArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum TextBackend {
    Auto,
    Layout,
    Raw,
}

impl TextBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Layout => "layout",
            Self::Raw => "raw",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub document_type: String,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub text_sample: bool,

    #[arg(long)]
    pub custom_data: Option<String>,

    #[arg(long, default_value_t = 20)]
    pub max_upload_mb: u64,

    #[arg(long, value_enum, default_value_t = TextBackend::Auto)]
    pub text_backend: TextBackend,
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    #[arg(long, default_value = ".cache/policy-intake")]
    pub store_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

impl StoreArgs {
    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.store_root.join(crate::store::DB_FILE_NAME))
    }
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[command(subcommand)]
    pub command: CompareCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CompareCommand {
    Preview(ComparePreviewArgs),
    Confirm(CompareConfirmArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ComparePreviewArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long)]
    pub csv: PathBuf,

    /// Compare against this file instead of the latest confirmed snapshot.
    #[arg(long)]
    pub previous: Option<PathBuf>,

    #[arg(long = "compare-field")]
    pub compare_fields: Vec<String>,

    #[arg(long = "numeric-field")]
    pub numeric_fields: Vec<String>,

    #[arg(long)]
    pub custom_data: Option<String>,

    #[arg(long, default_value_t = 20)]
    pub max_upload_mb: u64,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CompareConfirmArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long)]
    pub token: String,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}
