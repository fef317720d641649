use google_sheets4::api::ValueRange;
use serde_json::Value;

use crate::transfer::OutputRecord;

pub trait ValueRangeFactory {
    fn from_records(records: &[OutputRecord]) -> Self;
}

fn wrap_row<T: AsRef<str>>(row: &[T]) -> Vec<Value> {
    row.iter()
        .map(|cell| Value::String(cell.as_ref().to_owned()))
        .collect()
}

impl ValueRangeFactory for ValueRange {
    fn from_records(records: &[OutputRecord]) -> Self {
        Self {
            major_dimension: Some("ROWS".to_string()),
            range: None,
            values: Some(
                records
                    .iter()
                    .map(|record| wrap_row(record.fields()))
                    .collect(),
            ),
        }
    }
}

/// Number of cells a value range writes.
pub fn cell_count(value_range: &ValueRange) -> usize {
    value_range
        .values
        .as_ref()
        .map(|rows| rows.iter().map(Vec::len).sum())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        source::tests::sheet,
        transfer::{record::shape_records, FieldMapping},
    };

    #[test]
    fn test_wrap_row() {
        assert_eq!(
            wrap_row(&["a", ""]),
            vec![Value::String("a".to_string()), Value::String(String::new())]
        );
    }

    #[test]
    fn test_from_records_keeps_all_ten_fields() {
        let sheet = sheet("Events", &["Time", "Name"], &[&["10:00", "A"], &["11:00", "B"]]);
        let records: Vec<_> = shape_records(sheet.rows(), &FieldMapping::events()).collect();

        let value_range = ValueRange::from_records(&records);

        assert_eq!(value_range.major_dimension, Some("ROWS".to_string()));
        assert_eq!(value_range.range, None);
        let values = value_range.values.as_ref().unwrap();
        assert_eq!(values.len(), 2);
        assert!(values.iter().all(|row| row.len() == 10));
        assert_eq!(values[1][0], Value::String("11:00".to_string()));
        assert_eq!(values[1][6], Value::String("bottom".to_string()));
        assert_eq!(cell_count(&value_range), 20);
    }

    #[test]
    fn test_empty_value_range_has_no_cells() {
        assert_eq!(cell_count(&ValueRange::default()), 0);
        assert_eq!(cell_count(&ValueRange::from_records(&[])), 0);
    }
}
