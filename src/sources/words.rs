use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use tracing::info;

use super::open_input;
use crate::error::PipelineError;

/// Read a newline-delimited list of target word-forms.
pub fn read_word_list(path: &Path) -> Result<Vec<String>, PipelineError> {
    info!("Loading word list from {}", path.display());
    let file = open_input(path)?;
    parse_word_list(file).map_err(|e| PipelineError::from_io(path, e))
}

/// Trimmed non-blank lines, in file order.
pub fn parse_word_list<R: Read>(reader: R) -> std::io::Result<Vec<String>> {
    let mut words = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        let word = line.trim();
        if !word.is_empty() {
            words.push(word.to_string());
        }
    }
    Ok(words)
}
