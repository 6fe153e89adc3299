use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use synthkit_core::export::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "synthkit",
    about = "Deterministic synthetic tabular datasets from declarative schemas",
    version,
    after_help = "Examples:\n  synthkit generate --schema shop.yaml --out ./out --format csv\n  synthkit generate --schema shop.yaml --out ./out --format sql\n  synthkit validate --schema shop.yaml --out ./out --format csv\n  synthkit graph --schema shop.yaml --format mermaid"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a dataset and its validation report
    Generate(GenerateArgs),

    /// Re-run the validator over an existing output directory
    Validate(ValidateArgs),

    /// Print the table dependency graph
    Graph(GraphArgs),
}

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Path to the schema file (.yaml, .yml, or .json)
    #[arg(long)]
    pub schema: PathBuf,

    /// Output directory (created if missing)
    #[arg(long, default_value = "./out")]
    pub out: PathBuf,

    /// Output format for table files
    #[arg(long, value_enum, default_value = "csv")]
    pub format: FormatArg,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the schema file the output was generated from
    #[arg(long)]
    pub schema: PathBuf,

    /// Directory holding the generated table files
    #[arg(long, default_value = "./out")]
    pub out: PathBuf,

    /// Format the table files were written in
    #[arg(long, value_enum, default_value = "csv")]
    pub format: FormatArg,

    /// Write the report to validation_report.json in the output directory
    #[arg(long)]
    pub write_report: bool,
}

#[derive(Parser, Debug)]
pub struct GraphArgs {
    /// Path to the schema file
    #[arg(long)]
    pub schema: PathBuf,

    /// Output format for the dependency graph
    #[arg(long, value_enum, default_value = "mermaid")]
    pub format: GraphFormatArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Csv,
    Jsonl,
    Sql,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Jsonl => OutputFormat::Jsonl,
            FormatArg::Sql => OutputFormat::Sql,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GraphFormatArg {
    Mermaid,
    Dot,
}
