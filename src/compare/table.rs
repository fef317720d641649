use std::fmt::{self, Display, Formatter};

use crate::source::Row;

/// Left-aligned text table with a header line and a leading row index.
pub struct Table<'a> {
    columns: &'a [String],
    rows: &'a [(usize, &'a Row)],
}

impl<'a> Table<'a> {
    pub fn new(columns: &'a [String], rows: &'a [(usize, &'a Row)]) -> Self {
        Table { columns, rows }
    }

    fn cells(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|(_, row)| {
                self.columns
                    .iter()
                    .map(|column| {
                        row.get(column)
                            .map(|value| value.to_clean_string())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }
}

impl Display for Table<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let cells = self.cells();
        let index_width = self
            .rows
            .iter()
            .map(|(index, _)| index.to_string().len())
            .max()
            .unwrap_or(0);
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(column.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header = self.columns.iter().map(String::as_str);
        write_line(f, index_width, "", header, &widths)?;
        for ((index, _), row) in self.rows.iter().zip(&cells) {
            let index = index.to_string();
            write_line(f, index_width, &index, row.iter().map(String::as_str), &widths)?;
        }
        Ok(())
    }
}

fn write_line<'a>(
    f: &mut Formatter<'_>,
    index_width: usize,
    index: &str,
    cells: impl Iterator<Item = &'a str>,
    widths: &[usize],
) -> fmt::Result {
    let mut line = format!("{:<width$}", index, width = index_width);
    for (cell, width) in cells.zip(widths) {
        line.push_str(&format!("  {:<width$}", cell, width = *width));
    }
    writeln!(f, "{}", line.trim_end_matches(' '))
}
