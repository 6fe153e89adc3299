use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};

use synthkit_core::config::load_schema;
use synthkit_core::export::OutputFormat;
use synthkit_core::generate::generate_dataset;

use crate::args::GenerateArgs;
use crate::commands::validate::render_report;

pub fn run(args: &GenerateArgs) -> anyhow::Result<()> {
    let (schema, config_hash) = load_schema(&args.schema)
        .with_context(|| format!("loading schema {}", args.schema.display()))?;
    let format: OutputFormat = args.format.into();

    let total_rows: usize = schema
        .tables
        .keys()
        .map(|t| schema.dataset.size.rows_for(t))
        .sum();
    let bar = ProgressBar::new(total_rows as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} rows {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let progress = |table: &str, done: usize, _total: usize| {
        bar.set_position(done as u64);
        bar.set_message(table.to_string());
    };

    let metadata = generate_dataset(&schema, &config_hash, &args.out, format, Some(&progress))?;
    bar.finish_and_clear();

    println!(
        "Generated dataset '{}' (id {}, seed {}, mode {}) into {}",
        metadata.dataset_name,
        metadata.dataset_id,
        metadata.seed,
        metadata.mode,
        args.out.display()
    );

    let report_path = args.out.join("validation_report.json");
    let report_text = std::fs::read_to_string(&report_path)
        .with_context(|| format!("reading {}", report_path.display()))?;
    let report = serde_json::from_str(&report_text)
        .with_context(|| format!("parsing {}", report_path.display()))?;
    println!("{}", render_report(&report));

    Ok(())
}
