pub mod csv;
pub mod json;

pub use self::csv::load_csv;
pub use self::json::load_json;

use anyhow::Result;
use crate::core::Position;
use std::path::Path;

/// Input format detection result
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputFormat {
    Csv,
    Json,
    Unknown,
}

/// Detect the format of a position export by looking at its first bytes
pub fn detect_format(data: &[u8]) -> InputFormat {
    if is_json(data) {
        return InputFormat::Json;
    }

    if is_csv(data) {
        return InputFormat::Csv;
    }

    InputFormat::Unknown
}

fn is_json(data: &[u8]) -> bool {
    // Position exports are always a top-level array
    data.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|&b| b == b'[')
}

fn is_csv(data: &[u8]) -> bool {
    if data.len() < 10 {
        return false;
    }

    let sample = &data[..data.len().min(500)];
    let text = match std::str::from_utf8(sample) {
        Ok(text) => text,
        // The cut may land inside a multi-byte character
        Err(e) if e.error_len().is_none() => {
            std::str::from_utf8(&sample[..e.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return false,
    };

    // A header with at least server time, latitude and longitude
    text.lines().take(5).any(|line| line.chars().filter(|&c| c == ',').count() >= 2)
}

/// Load positions from a file, auto-detecting format
pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<Position>> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;

    match detect_format(&data) {
        InputFormat::Csv => load_csv(path),
        InputFormat::Json => load_json(path),
        InputFormat::Unknown => anyhow::bail!("Unknown input format: {}", path.display()),
    }
}
