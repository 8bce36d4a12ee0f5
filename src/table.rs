use std::io::Write;

use crate::error::Result;

/// Tabular projection of a catalog: one column per class label, cells are
/// image path strings. Columns may have different lengths; missing cells
/// read as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTable {
    labels: Vec<String>,
    columns: Vec<Vec<String>>,
}

impl PathTable {
    pub fn new(labels: Vec<String>, columns: Vec<Vec<String>>) -> Self {
        debug_assert_eq!(labels.len(), columns.len());
        PathTable { labels, columns }
    }

    /// Column headers (class labels) in catalog order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows: the length of the longest column
    pub fn num_rows(&self) -> usize {
        self.columns.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// All cells of one column, looked up by label
    pub fn column(&self, label: &str) -> Option<&[String]> {
        self.labels
            .iter()
            .position(|candidate| candidate == label)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// Cell at (row, column index); `None` marks a padded cell
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.columns
            .get(col)
            .and_then(|column| column.get(row))
            .map(String::as_str)
    }

    /// Write the table as CSV: a header row of labels, then padded rows with
    /// empty cells where a column has run out of paths.
    pub fn write_csv<W: Write>(&self, writer: &mut W) -> Result<()> {
        let header: Vec<String> = self.labels.iter().map(|label| escape_csv(label)).collect();
        writeln!(writer, "{}", header.join(","))?;

        for row in 0..self.num_rows() {
            let cells: Vec<String> = (0..self.num_columns())
                .map(|col| self.cell(row, col).map(escape_csv).unwrap_or_default())
                .collect();
            writeln!(writer, "{}", cells.join(","))?;
        }

        Ok(())
    }
}

// Quote a field only when it would break the row
fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> PathTable {
        PathTable::new(
            vec!["cat".to_string(), "dog".to_string()],
            vec![
                vec!["/d/cat/a.png".to_string(), "/d/cat/b.png".to_string()],
                vec!["/d/dog/c.png".to_string()],
            ],
        )
    }

    #[test]
    fn test_shape_and_cells() {
        let table = sample_table();
        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.cell(0, 0), Some("/d/cat/a.png"));
        assert_eq!(table.cell(1, 0), Some("/d/cat/b.png"));
        assert_eq!(table.cell(0, 1), Some("/d/dog/c.png"));
        // Ragged column padded with a missing marker
        assert_eq!(table.cell(1, 1), None);
    }

    #[test]
    fn test_column_lookup() {
        let table = sample_table();
        assert_eq!(table.column("dog").unwrap().len(), 1);
        assert!(table.column("bird").is_none());
    }

    #[test]
    fn test_csv_output_pads_short_columns() {
        let table = sample_table();
        let mut buffer = Vec::new();
        table.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "cat,dog\n/d/cat/a.png,/d/dog/c.png\n/d/cat/b.png,\n");
    }

    #[test]
    fn test_csv_quotes_awkward_fields() {
        let table = PathTable::new(
            vec!["a,b".to_string()],
            vec![vec!["/d/we\"ird.png".to_string()]],
        );
        let mut buffer = Vec::new();
        table.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "\"a,b\"\n\"/d/we\"\"ird.png\"\n");
    }
}
