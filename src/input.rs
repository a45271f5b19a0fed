use std::fs;
use std::io::{self, BufRead, Write};

use camino::Utf8Path;

use crate::error::BatchError;

/// Reads one locator per line until a blank line, `q`, or end of input.
pub fn read_interactive<R: BufRead, W: Write>(
    reader: R,
    mut prompt: W,
) -> Result<Vec<String>, BatchError> {
    let mut locators = Vec::new();
    let mut lines = reader.lines();
    loop {
        write!(prompt, "> ").map_err(|err| BatchError::Input(err.to_string()))?;
        prompt
            .flush()
            .map_err(|err| BatchError::Input(err.to_string()))?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.map_err(|err| BatchError::Input(err.to_string()))?;
        let line = line.trim();
        if line.is_empty() || line.eq_ignore_ascii_case("q") {
            break;
        }
        locators.push(line.to_string());
    }
    Ok(locators)
}

/// Reads a list file: one locator per line, blank lines and `#` comments skipped.
pub fn read_list_file(path: &Utf8Path) -> Result<Vec<String>, BatchError> {
    let content = fs::read_to_string(path.as_std_path())
        .map_err(|err| BatchError::Input(format!("{path}: {err}")))?;
    Ok(parse_list(&content))
}

pub fn parse_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn read_stdin() -> Result<Vec<String>, BatchError> {
    eprintln!("Enter video/stream links, one per line (blank line or q to finish):");
    read_interactive(io::stdin().lock(), io::stderr())
}
