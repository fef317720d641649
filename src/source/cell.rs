use std::{
    fmt::Formatter,
    hash::{Hash, Hasher},
};

use chrono::{NaiveDateTime, NaiveTime};

/// A single scalar read from a sheet.
#[derive(Debug, Clone, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    /// Formula errors such as `#N/A`, kept only for diagnostics
    Error(String),
}

impl CellValue {
    /// `true` for cells that carry no usable value: blanks, NaN and formula errors.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Empty | CellValue::Error(_) => true,
            CellValue::Float(value) => value.is_nan(),
            _ => false,
        }
    }

    /// Renders the value the way it is written to the remote sheet.
    ///
    /// Missing values become an empty string and integral numbers never carry a
    /// fractional part, so a column mixing `5` and `5.0` renders both as `"5"`.
    pub fn to_clean_string(&self) -> String {
        match self {
            _ if self.is_missing() => String::new(),
            CellValue::Text(text) => text.clone(),
            CellValue::Int(value) => value.to_string(),
            CellValue::Float(value) => format_float(*value),
            CellValue::Bool(true) => "True".to_owned(),
            CellValue::Bool(false) => "False".to_owned(),
            CellValue::DateTime(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            CellValue::Time(value) => value.format("%H:%M:%S").to_string(),
            CellValue::Empty | CellValue::Error(_) => String::new(),
        }
    }

    fn key(&self) -> CellKey<'_> {
        match self {
            _ if self.is_missing() => CellKey::Missing,
            CellValue::Text(text) => CellKey::Text(text),
            CellValue::Int(value) => CellKey::Number(normalized_bits(*value as f64)),
            CellValue::Float(value) => CellKey::Number(normalized_bits(*value)),
            CellValue::Bool(value) => CellKey::Bool(*value),
            CellValue::DateTime(value) => CellKey::DateTime(*value),
            CellValue::Time(value) => CellKey::Time(*value),
            CellValue::Empty | CellValue::Error(_) => CellKey::Missing,
        }
    }
}

fn format_float(value: f64) -> String {
    if value == 0.0 {
        return "0".to_owned();
    }

    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

/// Integers and floats share one numeric key; `-0.0` folds into `0.0`.
fn normalized_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

/// Equality view of a cell. All missing markers are equal to each other.
#[derive(PartialEq, Eq, Hash)]
enum CellKey<'a> {
    Missing,
    Number(u64),
    Text(&'a str),
    Bool(bool),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_clean_string())
    }
}

/// Conversions: Others -> CellValue

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Empty, Into::into)
    }
}
