//! Tabulated focal-plane data ingest.
//!
//! This module turns a project's optics table (as exported from the optical
//! design software) into `CurveSamples`.
//!
//! Design goals:
//! - **Strict schema** for required columns (`R`, `Z`, `CRD`; clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Forgiving layout**: comma, tab, semicolon or whitespace-aligned columns,
//!   case-insensitive headers, `#` comment lines
//! - **Separation of concerns**: no interpolation logic here

use std::collections::HashMap;
use std::path::Path;

use csv::StringRecord;

use crate::domain::CurveSamples;
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: samples + row errors.
#[derive(Debug, Clone)]
pub struct IngestedTable {
    pub samples: CurveSamples,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Read a focal-plane data file.
pub fn read_focal_plane_data(path: &Path) -> Result<IngestedTable, AppError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open focal plane data '{}': {e}", path.display()),
        )
    })?;
    let table = parse_focal_plane_table(&content)
        .map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))?;

    for err in &table.row_errors {
        log::warn!("{}:{}: skipped row: {}", path.display(), err.line, err.message);
    }
    log::info!(
        "Read {} samples from {} ({} rows, {} skipped)",
        table.samples.len(),
        path.display(),
        table.rows_read,
        table.row_errors.len()
    );
    Ok(table)
}

/// Parse the contents of a focal-plane data file.
pub fn parse_focal_plane_table(content: &str) -> Result<IngestedTable, AppError> {
    let content = content.trim_start_matches('\u{feff}');
    let header_line = content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .ok_or_else(|| AppError::new(2, "Data file is empty."))?;

    let (delimiter, normalized) = match sniff_delimiter(header_line) {
        Some(d) => (d, None),
        None => (b'\t', Some(whitespace_to_tabs(content))),
    };
    let source = normalized.as_deref().unwrap_or(content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(source.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read data headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let col = |name: &str| -> Result<usize, AppError> {
        header_map
            .get(name)
            .copied()
            .ok_or_else(|| AppError::new(2, format!("Missing required column: `{name}`")))
    };
    let r_idx = col("r")?;
    let z_idx = col("z")?;
    let crd_idx = col("crd")?;
    let slope_idx = header_map.get("slope").copied();
    let bfs_slope_idx = header_map.get("bfs_slope").copied();

    let mut samples = CurveSamples {
        slope: slope_idx.map(|_| Vec::new()),
        bfs_slope: bfs_slope_idx.map(|_| Vec::new()),
        ..CurveSamples::default()
    };
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for result in reader.records() {
        rows_read += 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
                row_errors.push(RowError {
                    line,
                    message: format!("parse error: {e}"),
                });
                continue;
            }
        };
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);

        let parsed = (|| -> Result<_, String> {
            let r = parse_f64(&record, r_idx, "R")?;
            let z = parse_f64(&record, z_idx, "Z")?;
            let crd = parse_f64(&record, crd_idx, "CRD")?;
            let slope = slope_idx.map(|i| parse_f64(&record, i, "Slope")).transpose()?;
            let bfs_slope = bfs_slope_idx
                .map(|i| parse_f64(&record, i, "BFS_Slope"))
                .transpose()?;
            Ok((r, z, crd, slope, bfs_slope))
        })();

        match parsed {
            Ok((r, z, crd, slope, bfs_slope)) => {
                samples.r.push(r);
                samples.z.push(z);
                samples.crd.push(crd);
                if let (Some(col), Some(v)) = (samples.slope.as_mut(), slope) {
                    col.push(v);
                }
                if let (Some(col), Some(v)) = (samples.bfs_slope.as_mut(), bfs_slope) {
                    col.push(v);
                }
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if samples.is_empty() {
        return Err(AppError::new(3, "No valid rows in focal plane data."));
    }

    Ok(IngestedTable {
        samples,
        row_errors,
        rows_read,
    })
}

fn sniff_delimiter(header_line: &str) -> Option<u8> {
    [b',', b'\t', b';']
        .into_iter()
        .find(|d| header_line.as_bytes().contains(d))
}

fn whitespace_to_tabs(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for line in content.lines() {
        if line.trim_start().starts_with('#') {
            out.push_str(line.trim());
        } else {
            out.push_str(&line.split_whitespace().collect::<Vec<_>>().join("\t"));
        }
        out.push('\n');
    }
    out
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes emit a BOM on the first header.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_f64(record: &StringRecord, idx: usize, label: &str) -> Result<f64, String> {
    let raw = record
        .get(idx)
        .ok_or_else(|| format!("missing `{label}` value"))?;
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("invalid `{label}` value '{raw}'"))?;
    if !value.is_finite() {
        return Err(format!("non-finite `{label}` value '{raw}'"));
    }
    Ok(value)
}
