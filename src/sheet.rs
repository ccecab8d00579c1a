use std::path::Path;

use anyhow::Context;
use calamine::{open_workbook_auto, Data, Reader};

/// One spreadsheet cell after ingestion. Booleans are kept as text; error
/// cells behave like blanks.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Numeric view of the cell. Text is parsed as standard decimal notation;
    /// anything else is None.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => {
                if n.fract() == 0.0 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
        }
    }
}

fn cell_from_data(d: &Data) -> Cell {
    match d {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// Header-less 2-D cell grid. The whole input is materialized before any
/// processing starts; there is no streaming parse.
#[derive(Debug, Clone, Default)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        Grid { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Out-of-bounds coordinates read as empty; the ragged edge of a
    /// worksheet is not an error.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }
}

/// Labeled table: first physical row is the header row.
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn from_grid(grid: Grid) -> anyhow::Result<Self> {
        let mut rows = grid.rows;
        if rows.is_empty() {
            anyhow::bail!("input has no rows");
        }
        let headers = rows.remove(0).iter().map(|c| c.as_text()).collect();
        Ok(Table { headers, rows })
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }
}

fn is_delimited_text(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("csv") | Some("tsv") | Some("txt")
    )
}

/// Load a file as a header-less grid. CSV/TSV goes through the csv crate with
/// delimiter sniffing; everything else through calamine (first worksheet).
pub fn load_grid(path: &Path) -> anyhow::Result<Grid> {
    if is_delimited_text(path) {
        let content = read_file_as_utf8(path)?;
        let delimiter = sniff_delimiter(&content);
        grid_from_delimited(&content, delimiter)
    } else {
        grid_from_workbook(path)
    }
}

/// Load a file as a labeled table (first row = headers).
pub fn load_table(path: &Path) -> anyhow::Result<Table> {
    Table::from_grid(load_grid(path)?)
}

fn grid_from_workbook(path: &Path) -> anyhow::Result<Grid> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook {}", path.display()))?;
    let sheet_names = workbook.sheet_names().to_vec();
    let Some(first) = sheet_names.first() else {
        anyhow::bail!("workbook contains no sheets");
    };
    let range = workbook
        .worksheet_range(first)
        .with_context(|| format!("failed to read sheet '{}'", first))?;

    let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(range.get_size().0);
    for row in range.rows() {
        rows.push(row.iter().map(cell_from_data).collect());
    }
    Ok(Grid::from_rows(rows))
}

fn grid_from_delimited(content: &str, delimiter: u8) -> anyhow::Result<Grid> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for result in reader.records() {
        let record = result.context("failed to parse delimited input")?;
        let row = record
            .iter()
            .map(|field| {
                if field.trim().is_empty() {
                    Cell::Empty
                } else if let Ok(n) = field.trim().parse::<f64>() {
                    Cell::Number(n)
                } else {
                    Cell::Text(field.to_string())
                }
            })
            .collect();
        rows.push(row);
    }
    Ok(Grid::from_rows(rows))
}

/// Read a file as UTF-8, falling back to Windows-1252 (common for
/// Excel-exported CSVs).
fn read_file_as_utf8(path: &Path) -> anyhow::Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Detect the most likely field delimiter by checking field-count consistency
/// across the first few lines.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();
    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;
    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }
    best
}
