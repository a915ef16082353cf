use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use super::open_input;
use crate::error::PipelineError;

/// One row of the corpus frequency table.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyRow {
    pub word: String,
    pub pos: String,
    pub freq: f64,
}

/// Parse a raw frequency cell. Negative or non-finite values are rejected too.
pub fn parse_frequency(raw: &str) -> Result<f64, PipelineError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(PipelineError::Data(raw.to_string())),
    }
}

/// Read a `;`-delimited frequency table with `word`, `upos` and `freq` columns.
pub fn read_frequency_table(path: &Path) -> Result<Vec<FrequencyRow>, PipelineError> {
    info!("Loading frequency table from {}", path.display());
    let file = open_input(path)?;
    parse_frequency_table(file, path)
}

/// Parse frequency rows from any reader; `origin` is used in error messages.
pub fn parse_frequency_table<R: Read>(
    reader: R,
    origin: &Path,
) -> Result<Vec<FrequencyRow>, PipelineError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(reader);

    let malformed = |reason: String| PipelineError::MalformedInput {
        path: origin.to_path_buf(),
        reason,
    };

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| malformed(e.to_string()))?
        .iter()
        .map(|h| h.trim().replace('"', ""))
        .collect();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| malformed(format!("missing column `{name}`")))
    };
    let word_col = column("word")?;
    let pos_col = column("upos")?;
    let freq_col = column("freq")?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (line, record) in rdr.records().enumerate() {
        let record = match record {
            Ok(r) if r.len() <= headers.len() => r,
            Ok(_) => {
                debug!("Skipping row {}: too many fields", line + 2);
                skipped += 1;
                continue;
            }
            Err(e) => {
                debug!("Skipping row {}: {e}", line + 2);
                skipped += 1;
                continue;
            }
        };

        let word = match record.get(word_col).map(str::trim) {
            Some(w) if !w.is_empty() => w.to_string(),
            _ => {
                skipped += 1;
                continue;
            }
        };
        let pos = record.get(pos_col).unwrap_or_default().trim().to_string();
        let freq = parse_frequency(record.get(freq_col).unwrap_or_default()).unwrap_or_else(|e| {
            debug!("Row {}: {e}, using 0", line + 2);
            0.0
        });

        rows.push(FrequencyRow { word, pos, freq });
    }

    if skipped > 0 {
        info!("Skipped {skipped} malformed frequency rows");
    }
    Ok(rows)
}
