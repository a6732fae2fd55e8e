//! Table rendering for the presence board and roster listings.

pub struct Column {
    pub header: String,
    pub width: usize,
}

pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Cells wider than their column stretch it for the whole table.
    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.width).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.len());
                }
            }
        }
        widths
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut out = String::new();

        // Header + divider
        for (col, w) in self.columns.iter().zip(&widths) {
            out.push_str(&format!("{:<width$}  ", col.header, width = w));
        }
        out.push('\n');
        for w in &widths {
            out.push_str(&format!("{}  ", "-".repeat(*w)));
        }
        out.push('\n');

        // Rows
        for row in &self.rows {
            for (cell, w) in row.iter().zip(&widths) {
                out.push_str(&format!("{:<width$}  ", cell, width = w));
            }
            out.push('\n');
        }

        out
    }
}
