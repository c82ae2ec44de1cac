//! Synthetic training data export

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use surge_engine::{SyntheticDataGenerator, TrainingRow, FEATURE_NAMES};

use crate::output::print_success;

/// Write `samples` synthetic rows as CSV to a file, or stdout when no path is given
pub fn export(samples: usize, seed: u64, output: Option<&Path>) -> Result<()> {
    let rows = SyntheticDataGenerator::with_seed(seed).generate(samples);

    match output {
        Some(path) => {
            let writer = csv::Writer::from_path(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_rows(writer, &rows)?;
            print_success(&format!("Wrote {} rows to {}", rows.len(), path.display()));
        }
        None => {
            let stdout = std::io::stdout();
            write_rows(csv::Writer::from_writer(stdout.lock()), &rows)?;
        }
    }

    Ok(())
}

fn write_rows<W: Write>(mut writer: csv::Writer<W>, rows: &[TrainingRow]) -> Result<()> {
    let header = FEATURE_NAMES
        .iter()
        .copied()
        .chain(["surge_percentage", "surge_probability"]);
    writer.write_record(header)?;

    for row in rows {
        let record = row
            .features
            .to_row()
            .into_iter()
            .chain([row.surge_percentage, row.surge_probability])
            .map(|v| v.to_string());
        writer.write_record(record)?;
    }

    writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}
