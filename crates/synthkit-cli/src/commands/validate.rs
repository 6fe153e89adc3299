use anyhow::Context;
use comfy_table::Table;

use synthkit_core::config::load_schema;
use synthkit_core::validate::report::ValidationReport;
use synthkit_core::validate::validate_output;

use crate::args::ValidateArgs;

pub fn run(args: &ValidateArgs) -> anyhow::Result<()> {
    let (schema, _config_hash) = load_schema(&args.schema)
        .with_context(|| format!("loading schema {}", args.schema.display()))?;
    let report = validate_output(&schema, &args.out, args.format.into())?;

    if args.write_report {
        let path = args.out.join("validation_report.json");
        let text = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
    }

    println!("{}", render_report(&report));
    Ok(())
}

/// Terminal summary of a validation report.
pub(crate) fn render_report(report: &ValidationReport) -> String {
    let mut table = Table::new();
    table.set_header(vec![
        "Table",
        "Rows",
        "Violations",
        "Rule violations",
        "Failed rows",
        "Repair attempts",
    ]);
    for table_report in report.tables.values() {
        let violations: usize = table_report.violations.values().sum();
        table.add_row(vec![
            table_report.table.clone(),
            table_report.row_count.to_string(),
            violations.to_string(),
            table_report.rule_violations.to_string(),
            table_report.failed_rows.to_string(),
            table_report
                .repair_attempts
                .map(|a| a.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }

    format!(
        "{}\nDataset '{}' ({} mode): {} total violation(s)",
        table, report.dataset, report.mode, report.total_violations
    )
}
