use strum::{AsRefStr, Display, EnumString};

use super::color::{Hue, TEXT_COLOR};
use crate::source::Row;

pub const RECORD_WIDTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Position {
    Top,
    Bottom,
}

impl Position {
    /// `top` for even rows, `bottom` for odd ones, starting at `top`.
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            Position::Top
        } else {
            Position::Bottom
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ShapeKind {
    /// Single instant
    Rect,
    /// Interval with a start and an end
    SmallRect,
}

/// Names the source columns feeding each textual field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub primary_time: String,
    pub secondary_time: Option<String>,
    pub name: String,
    pub description: String,
}

impl FieldMapping {
    /// Single-instant rows of the `Events` sheet.
    pub fn events() -> Self {
        FieldMapping {
            primary_time: "Time".to_owned(),
            secondary_time: None,
            name: "Name".to_owned(),
            description: "Description".to_owned(),
        }
    }

    /// Interval rows of the `Periods` sheet.
    pub fn periods() -> Self {
        FieldMapping {
            primary_time: "Time from".to_owned(),
            secondary_time: Some("Time to".to_owned()),
            name: "Name".to_owned(),
            description: "Description".to_owned(),
        }
    }

    pub fn shape_kind(&self) -> ShapeKind {
        match self.secondary_time {
            Some(_) => ShapeKind::SmallRect,
            None => ShapeKind::Rect,
        }
    }
}

/// Ten-column row written to the remote sheet:
/// `[primary time, secondary time, name, description, "", "", position, shape, fill, text color]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord([String; RECORD_WIDTH]);

impl OutputRecord {
    pub fn fields(&self) -> &[String; RECORD_WIDTH] {
        &self.0
    }

    pub fn primary_time(&self) -> &str {
        &self.0[0]
    }

    pub fn secondary_time(&self) -> &str {
        &self.0[1]
    }

    pub fn name(&self) -> &str {
        &self.0[2]
    }

    pub fn description(&self) -> &str {
        &self.0[3]
    }

    pub fn position(&self) -> &str {
        &self.0[6]
    }

    pub fn shape_kind(&self) -> &str {
        &self.0[7]
    }

    pub fn fill_color(&self) -> &str {
        &self.0[8]
    }

    pub fn text_color(&self) -> &str {
        &self.0[9]
    }
}

impl From<OutputRecord> for Vec<String> {
    fn from(record: OutputRecord) -> Self {
        record.0.into()
    }
}

impl<const N: usize> PartialEq<[&str; N]> for OutputRecord {
    fn eq(&self, other: &[&str; N]) -> bool {
        N == RECORD_WIDTH && self.0.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

/// Cleaned value of `column`, or an empty string when the row lacks it.
fn cleaned(row: &Row, column: &str) -> String {
    row.get(column)
        .map(|value| value.to_clean_string())
        .unwrap_or_default()
}

/// Builds the record of the `index`-th row of a transfer. Pure in `(row, index)`.
pub fn shape_record(row: &Row, index: usize, mapping: &FieldMapping) -> OutputRecord {
    let secondary_time = mapping
        .secondary_time
        .as_deref()
        .map(|column| cleaned(row, column))
        .unwrap_or_default();

    OutputRecord([
        cleaned(row, &mapping.primary_time),
        secondary_time,
        cleaned(row, &mapping.name),
        cleaned(row, &mapping.description),
        String::new(),
        String::new(),
        Position::for_index(index).to_string(),
        mapping.shape_kind().to_string(),
        Hue::for_index(index).fill_color(),
        TEXT_COLOR.to_owned(),
    ])
}

/// Records of all rows, in source order.
pub fn shape_records<'a>(
    rows: &'a [Row],
    mapping: &'a FieldMapping,
) -> impl Iterator<Item = OutputRecord> + 'a {
    rows.iter()
        .enumerate()
        .map(move |(index, row)| shape_record(row, index, mapping))
}
