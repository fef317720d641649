use std::{fmt::Formatter, str::FromStr};

use google_sheets4::api::GridRange;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Notation(String);

impl std::fmt::Display for A1Notation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<A1Notation> for String {
    fn from(a1_notation: A1Notation) -> Self {
        a1_notation.0
    }
}

impl AsRef<str> for A1Notation {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for A1Notation {
    fn from(s: String) -> Self {
        A1Notation(s)
    }
}

impl From<&str> for A1Notation {
    fn from(s: &str) -> Self {
        A1Notation(s.to_owned())
    }
}

pub trait ToA1Notation {
    fn to_a1_notation(&self, sheet_name: Option<&str>) -> A1Notation;
}

/// 1-based row number, as written in A1 notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Row(u32);

/// 1-based column number, `A` is 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Column(u32);

impl Row {
    pub fn number(&self) -> u32 {
        self.0
    }

    /// Zero-based index used by the Sheets API grid ranges
    pub fn index(&self) -> u32 {
        self.0 - 1
    }
}

impl Column {
    pub fn number(&self) -> u32 {
        self.0
    }

    pub fn index(&self) -> u32 {
        self.0 - 1
    }
}

impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", number_to_letters(self.0))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ColumnParseError {
    #[error("Non-alphabetic character in column")]
    NonAlphabeticCharacter,
    #[error("Empty column")]
    Empty,
    #[error("Column '{0}' is out of range")]
    OutOfRange(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RowParseError {
    #[error("Row '{0}' is not a positive number")]
    NotAPositiveNumber(String),
}

impl FromStr for Column {
    type Err = ColumnParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_col(s)
    }
}

impl FromStr for Row {
    type Err = RowParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<u32>() {
            Ok(row) if row > 0 => Ok(Row(row)),
            _ => Err(RowParseError::NotAPositiveNumber(s.to_owned())),
        }
    }
}

impl TryFrom<u32> for Row {
    type Error = RowParseError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err(RowParseError::NotAPositiveNumber(value.to_string()));
        }
        Ok(Row(value))
    }
}

/// Parses column letters, case-insensitive: `A` is 1, `AA` is 27.
pub fn parse_col<T: AsRef<str>>(col_str: T) -> Result<Column, ColumnParseError> {
    let col_str = col_str.as_ref();
    if col_str.is_empty() {
        return Err(ColumnParseError::Empty);
    }
    if col_str.chars().any(|c| !c.is_ascii_alphabetic()) {
        return Err(ColumnParseError::NonAlphabeticCharacter);
    }

    let col_num = col_str
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .try_fold(0u32, |acc, c| {
            acc.checked_mul(26)?.checked_add(c as u32 - 'A' as u32 + 1)
        })
        .ok_or_else(|| ColumnParseError::OutOfRange(col_str.to_owned()))?;

    Ok(Column(col_num))
}

pub fn number_to_letters(number: u32) -> String {
    let mut number = number;
    let mut result = String::new();
    while number > 0 {
        let remainder = (number - 1) % 26;
        let letter = (remainder as u8 + b'A') as char;
        result.push(letter);
        number = (number - remainder) / 26;
    }
    result.chars().rev().collect()
}

/// One side of a range. Either part may be absent: `L` bounds only the column, `4` only the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBound {
    pub col: Option<Column>,
    pub row: Option<Row>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum A1NotationParseError {
    #[error("Error parsing column: {0}")]
    ColumnParseError(ColumnParseError),
    #[error("Error parsing row: {0}")]
    RowParseError(RowParseError),
    #[error("Empty cell reference in '{0}'")]
    EmptyReference(String),
    #[error("Range '{0}' ends before it starts")]
    Inverted(String),
}

impl FromStr for CellBound {
    type Err = A1NotationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.trim().chars().filter(|c| *c != '$').collect();
        if cleaned.is_empty() {
            return Err(A1NotationParseError::EmptyReference(s.to_owned()));
        }

        let split = cleaned
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(cleaned.len());
        let (col, row) = cleaned.split_at(split);

        let col = match col {
            "" => None,
            col => Some(parse_col(col).map_err(A1NotationParseError::ColumnParseError)?),
        };
        let row = match row {
            "" => None,
            row => Some(row.parse().map_err(A1NotationParseError::RowParseError)?),
        };

        Ok(CellBound { col, row })
    }
}

impl ToA1Notation for CellBound {
    fn to_a1_notation(&self, sheet_name: Option<&str>) -> A1Notation {
        let local = format!(
            "{}{}",
            self.col.map(|col| col.to_string()).unwrap_or_default(),
            self.row.map(|row| row.to_string()).unwrap_or_default()
        );
        with_sheet_name(local, sheet_name)
    }
}

/// A rectangular, possibly open-ended, range such as `'Sheet 1'!A4:L`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRange {
    pub sheet_title: Option<String>,
    pub start: CellBound,
    pub end: CellBound,
}

struct A1NotationParts<'a> {
    sheet_title: Option<String>,
    start: &'a str,
    end: &'a str,
}

fn generic_a1_notation_split(a1_notation: &str) -> A1NotationParts<'_> {
    let (sheet_title, local) = match a1_notation.rfind('!') {
        Some(index) => (
            Some(unquote_sheet_title(&a1_notation[..index])),
            &a1_notation[index + 1..],
        ),
        None => (None, a1_notation),
    };

    let (start, end) = match local.split_once(':') {
        Some((start, end)) => (start, end),
        None => (local, local),
    };

    A1NotationParts {
        sheet_title,
        start,
        end,
    }
}

fn unquote_sheet_title(title: &str) -> String {
    match title
        .strip_prefix('\'')
        .and_then(|title| title.strip_suffix('\''))
    {
        Some(quoted) => quoted.replace("''", "'"),
        None => title.to_owned(),
    }
}

fn with_sheet_name(local: String, sheet_name: Option<&str>) -> A1Notation {
    match sheet_name {
        Some(sheet_name) => A1Notation(format!("'{}'!{}", sheet_name.replace('\'', "''"), local)),
        None => A1Notation(local),
    }
}

impl FromStr for CellRange {
    type Err = A1NotationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = generic_a1_notation_split(s.trim());
        let start: CellBound = parts.start.parse()?;
        let end: CellBound = parts.end.parse()?;

        let inverted = matches!((start.col, end.col), (Some(a), Some(b)) if b < a)
            || matches!((start.row, end.row), (Some(a), Some(b)) if b < a);
        if inverted {
            return Err(A1NotationParseError::Inverted(s.to_owned()));
        }

        Ok(CellRange {
            sheet_title: parts.sheet_title,
            start,
            end,
        })
    }
}

impl ToA1Notation for CellRange {
    fn to_a1_notation(&self, sheet_name: Option<&str>) -> A1Notation {
        let start = self.start.to_a1_notation(None);
        let end = self.end.to_a1_notation(None);
        let sheet_name = sheet_name.or(self.sheet_title.as_deref());

        if start == end {
            return with_sheet_name(start.into(), sheet_name);
        }
        with_sheet_name(format!("{}:{}", start, end), sheet_name)
    }
}

impl CellRange {
    /// Grid range on `sheet_id`. Start indexes are inclusive and end indexes exclusive; a side
    /// without a bound stays unbounded.
    pub fn to_grid_range(&self, sheet_id: i32) -> GridRange {
        GridRange {
            sheet_id: Some(sheet_id),
            start_row_index: self.start.row.map(|row| row.index() as i32),
            end_row_index: self.end.row.map(|row| row.number() as i32),
            start_column_index: self.start.col.map(|col| col.index() as i32),
            end_column_index: self.end.col.map(|col| col.number() as i32),
        }
    }
}
