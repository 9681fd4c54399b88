//! Load a personnel roster from a spreadsheet (.xlsx/.xlsm/.xls/.ods) or CSV export.
//!
//! The first row is the header. Required columns are matched by name (trimmed,
//! case-insensitive, spaces and dashes read as underscores); every other named
//! column is carried through untouched so exports keep it.

use std::fs;
use std::path::Path;

use calamine::{Data, DataType, Reader};
use chrono::{Days, NaiveDate};
use thiserror::Error;
use tracing::warn;

use crate::engine::calendar::{format_day_first, parse_day_first};
use crate::engine::roster::{Member, Roster, Seniority};

pub const DEFAULT_ROSTER_PATH: &str = "data/militares.xlsx";

/// Roster fields and the header names accepted for each. The first name is the one written on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Registration,
    Rank,
    Seniority,
    LastPromotion,
    Admission,
    Birth,
    Supernumerary,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Registration,
        Field::Rank,
        Field::Seniority,
        Field::LastPromotion,
        Field::Admission,
        Field::Birth,
        Field::Supernumerary,
    ];

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Registration => &["Matricula", "registration", "id"],
            Self::Rank => &["Posto_Graduacao", "rank"],
            Self::Seniority => &["Pos_Hierarquica", "seniority"],
            Self::LastPromotion => &["Ultima_promocao", "last_promotion"],
            Self::Admission => &["Data_Admissao", "admission", "admission_date"],
            Self::Birth => &["Data_Nascimento", "birth", "birth_date"],
            Self::Supernumerary => &["Excedente", "supernumerary"],
        }
    }

    pub fn header(self) -> &'static str {
        self.aliases()[0]
    }

    pub fn required(self) -> bool {
        !matches!(self, Self::Supernumerary)
    }

    pub fn matches(self, header: &str) -> bool {
        let header = normalize_header(header);
        self.aliases().iter().any(|alias| normalize_header(alias) == header)
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if c.is_whitespace() || c == '-' { '_' } else { c.to_ascii_lowercase() })
        .collect()
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("sheet '{0}' not found in workbook")]
    SheetNotFound(String),
    #[error("input has no header row")]
    EmptySheet,
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("row {row}: column '{column}' has unparseable date '{value}'")]
    InvalidDate {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("unsupported roster format '{0}' (expected .xlsx, .xlsm, .xls, .ods or .csv)")]
    UnsupportedFormat(String),
}

/// One input cell, independent of the source format.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Bool(bool),
}

impl Cell {
    fn text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self::Empty
        } else {
            Self::Text(trimmed.to_string())
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Cell rendered as it should appear in an exported sheet.
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
            Self::Date(d) => format_day_first(*d),
            Self::Bool(b) => b.to_string(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Self::Empty,
            Data::String(s) => Self::text(s),
            Data::Float(f) => Self::Number(*f),
            Data::Int(i) => Self::Number(*i as f64),
            Data::Bool(b) => Self::Bool(*b),
            Data::DateTime(_) | Data::DateTimeIso(_) => data.as_date().map_or(Self::Empty, Self::Date),
            other => other.as_string().map_or(Self::Empty, |s| Self::text(&s)),
        }
    }
}

/// Load a roster, choosing the reader by file extension. `sheet` selects a
/// workbook sheet by name; the first sheet is used otherwise.
pub fn load_roster(path: impl AsRef<Path>, sheet: Option<&str>) -> Result<Roster, LoadError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_workbook(path, sheet),
        "csv" | "txt" => {
            let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
                path: path.display().to_string(),
                source,
            })?;
            parse_csv_str(&content)
        }
        _ => Err(LoadError::UnsupportedFormat(path.display().to_string())),
    }
}

fn load_workbook(path: &Path, sheet: Option<&str>) -> Result<Roster, LoadError> {
    let mut workbook = calamine::open_workbook_auto(path)?;
    let names = workbook.sheet_names();
    let sheet_name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|name| name.trim().eq_ignore_ascii_case(wanted.trim()))
            .cloned()
            .ok_or_else(|| LoadError::SheetNotFound(wanted.to_string()))?,
        None => names.first().cloned().ok_or(LoadError::EmptySheet)?,
    };
    let range = workbook.worksheet_range(&sheet_name)?;
    let rows = range
        .rows()
        .map(|row| row.iter().map(Cell::from).collect::<Vec<_>>());
    parse_rows(rows)
}

/// Parse CSV text. Semicolon-separated exports are detected from the header line.
pub fn parse_csv_str(content: &str) -> Result<Roster, LoadError> {
    let content = content.trim_start_matches('\u{feff}');
    let header_line = content.lines().next().unwrap_or_default();
    let delimiter = if header_line.matches(';').count() > header_line.matches(',').count() {
        b';'
    } else {
        b','
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(Cell::text).collect::<Vec<_>>());
    }
    parse_rows(rows.into_iter())
}

static EMPTY_CELL: Cell = Cell::Empty;

struct ColumnMap {
    fields: Vec<(Field, usize)>,
    extras: Vec<(String, usize)>,
}

impl ColumnMap {
    fn from_header(header: &[Cell]) -> Result<Self, LoadError> {
        let names: Vec<String> = header.iter().map(Cell::display).collect();
        let mut fields = Vec::new();
        let mut claimed = vec![false; names.len()];
        for field in Field::ALL {
            match names.iter().position(|name| field.matches(name)) {
                Some(index) => {
                    claimed[index] = true;
                    fields.push((field, index));
                }
                None if field.required() => return Err(LoadError::MissingColumn(field.header())),
                None => {}
            }
        }
        let extras = names
            .into_iter()
            .enumerate()
            .filter(|(index, name)| !claimed[*index] && !name.trim().is_empty())
            .map(|(index, name)| (name.trim().to_string(), index))
            .collect();
        Ok(Self { fields, extras })
    }

    fn cell<'a>(&self, row: &'a [Cell], field: Field) -> &'a Cell {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, index)| row.get(*index))
            .unwrap_or(&EMPTY_CELL)
    }
}

/// Build a roster from header + data rows. Fully empty rows are skipped.
pub fn parse_rows(mut rows: impl Iterator<Item = Vec<Cell>>) -> Result<Roster, LoadError> {
    let header = rows.next().ok_or(LoadError::EmptySheet)?;
    let columns = ColumnMap::from_header(&header)?;

    let mut members = Vec::new();
    for (offset, row) in rows.enumerate() {
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        // Spreadsheet numbering: header is row 1.
        let line = offset + 2;
        members.push(parse_member(&columns, &row, line)?);
    }

    let extra_columns = columns.extras.iter().map(|(name, _)| name.clone()).collect();
    Ok(Roster::with_extra_columns(members, extra_columns))
}

fn parse_member(columns: &ColumnMap, row: &[Cell], line: usize) -> Result<Member, LoadError> {
    let cell = |field| columns.cell(row, field);
    Ok(Member {
        registration: coerce_registration(cell(Field::Registration), line),
        rank: cell(Field::Rank).display().trim().to_string(),
        seniority: coerce_number(cell(Field::Seniority), line, Field::Seniority).and_then(Seniority::new),
        last_promotion: parse_date(cell(Field::LastPromotion), line, Field::LastPromotion)?,
        admission: parse_date(cell(Field::Admission), line, Field::Admission)?,
        birth: parse_date(cell(Field::Birth), line, Field::Birth)?,
        supernumerary: parse_flag(cell(Field::Supernumerary)),
        extra: columns
            .extras
            .iter()
            .map(|(_, index)| row.get(*index).map(Cell::display).unwrap_or_default())
            .collect(),
    })
}

/// Number from a cell. Text that does not parse, dates and booleans become missing.
fn coerce_number(cell: &Cell, line: usize, field: Field) -> Option<f64> {
    let parsed = match cell {
        Cell::Empty => return None,
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        Cell::Date(_) | Cell::Bool(_) => None,
    }
    .filter(|n| n.is_finite());
    if parsed.is_none() {
        warn_coerced(cell, line, field);
    }
    parsed
}

/// Registration numbers must be whole and non-negative.
fn coerce_registration(cell: &Cell, line: usize) -> Option<u64> {
    let number = coerce_number(cell, line, Field::Registration)?;
    let whole = (number.fract() == 0.0 && (0.0..9.0e15).contains(&number)).then_some(number as u64);
    if whole.is_none() {
        warn_coerced(cell, line, Field::Registration);
    }
    whole
}

fn warn_coerced(cell: &Cell, line: usize, field: Field) {
    warn!(
        target: "ranksim::loader",
        row = line,
        column = field.header(),
        value = %cell.display(),
        "numeric cell coerced to missing"
    );
}

fn parse_date(cell: &Cell, line: usize, field: Field) -> Result<Option<NaiveDate>, LoadError> {
    let parsed = match cell {
        Cell::Empty => return Ok(None),
        Cell::Date(date) => Some(*date),
        Cell::Text(s) => parse_day_first(s),
        Cell::Number(serial) => excel_serial_date(*serial),
        Cell::Bool(_) => None,
    };
    parsed.map(Some).ok_or_else(|| LoadError::InvalidDate {
        row: line,
        column: field.header(),
        value: cell.display(),
    })
}

/// Spreadsheet serial day number (1900 date system) to a date.
///
/// The 1900 system counts a nonexistent 29 Feb 1900 as serial 60, so serials
/// before it are one day later than a plain offset from 30 Dec 1899. Serial 60
/// itself lands on 28 Feb, as calamine does.
fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let days = serial.floor() as u64;
    let days = if days < 60 { days + 1 } else { days };
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(days))
}

fn parse_flag(cell: &Cell) -> bool {
    match cell {
        Cell::Bool(b) => *b,
        Cell::Number(n) => *n == 1.0,
        Cell::Text(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "x" | "true" | "yes" | "sim" | "s" | "1"
        ),
        Cell::Empty | Cell::Date(_) => false,
    }
}
