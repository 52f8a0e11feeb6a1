//! Column-aligned tables for `list` and `status`.

/// A table rendered as left-aligned columns separated by two spaces.
#[derive(Debug)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    column_widths: Vec<usize>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        let headers: Vec<String> = headers.iter().map(|h| h.to_uppercase()).collect();
        let column_widths = headers.iter().map(|h| h.chars().count()).collect();

        Self {
            headers,
            rows: Vec::new(),
            column_widths,
        }
    }

    /// Add a row. Cells beyond the header count are dropped.
    pub fn add_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row: Vec<String> = row
            .into_iter()
            .map(Into::into)
            .take(self.headers.len())
            .collect();

        for (width, cell) in self.column_widths.iter_mut().zip(&row) {
            *width = (*width).max(cell.chars().count());
        }

        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        std::iter::once(&self.headers)
            .chain(&self.rows)
            .map(|row| self.render_row(row))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_row(&self, row: &[String]) -> String {
        let last = self.column_widths.len().saturating_sub(1);
        let mut line = String::new();

        for (i, width) in self.column_widths.iter().enumerate() {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            if i == last {
                line.push_str(cell);
            } else {
                line.push_str(&format!("{:width$}  ", cell, width = width));
            }
        }

        line.trim_end().to_string()
    }
}
