//! The `irtroc summarize` command.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};

use irtroc_core::emitter::read_datapoints;
use irtroc_core::statistics::Summary;

pub fn execute(roc_path: PathBuf, format: String) -> Result<()> {
    let file = File::open(&roc_path)
        .with_context(|| format!("failed to open {}", roc_path.display()))?;
    let points = read_datapoints(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", roc_path.display()))?;
    let summary = Summary::compute(&points);

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        "text" => {
            println!("Datapoints: {}", summary.count);
            println!("{}", summary_table(&summary));
        }
        other => anyhow::bail!("unknown output format: {other} (expected text or json)"),
    }

    Ok(())
}

fn metric(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"))
}

pub fn summary_table(summary: &Summary) -> comfy_table::Table {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Points",
        "Correct %",
        "Mean Pred",
        "AUC",
        "Log Loss",
        "Brier",
        "Acc@0.5",
    ]);
    table.add_row(vec![
        Cell::new(summary.count),
        Cell::new(
            summary
                .observed_rate
                .map_or_else(|| "n/a".to_string(), |r| format!("{:.1}%", r * 100.0)),
        ),
        Cell::new(metric(summary.mean_predicted)),
        Cell::new(metric(summary.auc)),
        Cell::new(metric(summary.log_loss)),
        Cell::new(metric(summary.brier)),
        Cell::new(metric(summary.accuracy)),
    ]);
    table
}
