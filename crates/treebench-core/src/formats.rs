//! Native label formats and their decoders
//!
//! Only label decoding lives here: the harness compares predicted and true
//! labels but never reads feature data itself.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult};

/// Native encoding of a dataset or label file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    /// Flat binary records, one unsigned byte per label
    Bin,
    /// Header line `balsa <type> <rows> <cols>` followed by little-endian values
    Balsa,
    /// Text, optional header line, one integer per line
    Csv,
}

impl DataFormat {
    /// All known formats
    pub const ALL: [DataFormat; 3] = [DataFormat::Bin, DataFormat::Balsa, DataFormat::Csv];

    /// Identifier used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Bin => "bin",
            DataFormat::Balsa => "balsa",
            DataFormat::Csv => "csv",
        }
    }

    /// Decode the labels stored in `path`
    pub async fn load_labels(&self, path: &Path) -> BenchResult<Vec<i64>> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| BenchError::io(format!("Failed to read labels {:?}", path), e))?;
        let source = path.display().to_string();

        match self {
            DataFormat::Bin => Ok(decode_bin(&bytes)),
            DataFormat::Balsa => decode_balsa(&bytes, &source),
            DataFormat::Csv => decode_csv(&bytes, &source),
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataFormat {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bin" => Ok(DataFormat::Bin),
            "balsa" => Ok(DataFormat::Balsa),
            "csv" => Ok(DataFormat::Csv),
            other => Err(BenchError::InvalidConfig(format!(
                "Unsupported data format: '{}'",
                other
            ))),
        }
    }
}

fn decode_bin(bytes: &[u8]) -> Vec<i64> {
    bytes.iter().map(|&b| i64::from(b)).collect()
}

fn decode_balsa(bytes: &[u8], source: &str) -> BenchResult<Vec<i64>> {
    let header_end = bytes
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| BenchError::malformed(source, "missing balsa header line"))?;
    let header = std::str::from_utf8(&bytes[..header_end])
        .map_err(|_| BenchError::malformed(source, "balsa header is not UTF-8"))?;

    let fields: Vec<&str> = header.split_whitespace().collect();
    let [magic, value_type, rows, cols] = fields.as_slice() else {
        return Err(BenchError::malformed(
            source,
            format!("invalid balsa header '{}'", header),
        ));
    };
    if *magic != "balsa" {
        return Err(BenchError::malformed(
            source,
            format!("invalid balsa magic '{}'", magic),
        ));
    }

    let parse_dim = |text: &str| {
        text.parse::<usize>()
            .map_err(|_| BenchError::malformed(source, format!("invalid balsa dimension '{}'", text)))
    };
    let rows = parse_dim(*rows)?;
    let cols = parse_dim(*cols)?;
    if cols == 0 {
        return Err(BenchError::malformed(source, "balsa label file has zero columns"));
    }

    let width = match *value_type {
        "u8" => 1,
        "i32" | "f32" => 4,
        "f64" => 8,
        other => {
            return Err(BenchError::malformed(
                source,
                format!("unsupported balsa value type '{}'", other),
            ));
        }
    };

    let body = &bytes[header_end + 1..];
    let expected = rows * cols * width;
    if body.len() != expected {
        return Err(BenchError::malformed(
            source,
            format!("expected {} data bytes, found {}", expected, body.len()),
        ));
    }

    // Labels are the first column of each row.
    let labels = body
        .chunks_exact(cols * width)
        .map(|row| {
            let cell = &row[..width];
            match *value_type {
                "u8" => i64::from(cell[0]),
                "i32" => i64::from(i32::from_le_bytes([cell[0], cell[1], cell[2], cell[3]])),
                "f32" => f32::from_le_bytes([cell[0], cell[1], cell[2], cell[3]]) as i64,
                _ => {
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(cell);
                    f64::from_le_bytes(raw) as i64
                }
            }
        })
        .collect();

    Ok(labels)
}

fn decode_csv(bytes: &[u8], source: &str) -> BenchResult<Vec<i64>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| BenchError::malformed(source, "label file is not UTF-8"))?;

    let mut labels = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse::<i64>() {
            Ok(label) => labels.push(label),
            // Header line such as "Predictions" or "label"
            Err(_) if index == 0 => {}
            Err(_) => {
                return Err(BenchError::malformed(
                    source,
                    format!("invalid label on line {}: '{}'", index + 1, line),
                ));
            }
        }
    }

    Ok(labels)
}
