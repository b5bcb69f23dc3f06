/// Describes how a column should align its contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableColumn {
    pub header: String,
    pub min_width: usize,
    pub alignment: Alignment,
}

impl TableColumn {
    pub fn new(header: impl Into<String>, alignment: Alignment) -> Self {
        Self {
            header: header.into(),
            min_width: 0,
            alignment,
        }
    }
}

/// Plain-text table with an optional footer row under a second rule.
pub struct Table {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Vec<String>>,
    pub footer: Option<Vec<String>>,
    pub padding: usize,
    /// Use ASCII rules instead of box-drawing characters.
    pub plain: bool,
}

impl Table {
    pub fn new(columns: Vec<TableColumn>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            footer: None,
            padding: 1,
            plain: false,
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Content width of each column across header, rows and footer.
    pub fn compute_widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let mut width = display_width(&column.header).max(column.min_width);
                for row in self.rows.iter().chain(self.footer.iter()) {
                    if let Some(cell) = row.get(idx) {
                        width = width.max(display_width(cell));
                    }
                }
                width
            })
            .collect()
    }

    pub fn render_row(&self, row: &[String], widths: &[usize]) -> String {
        let cells: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let text = row.get(idx).map(String::as_str).unwrap_or("");
                render_cell(text, widths[idx], column.alignment, self.padding)
            })
            .collect();
        cells.join(" ").trim_end().to_string()
    }

    pub fn render(&self) -> String {
        let widths = self.compute_widths();
        let header: Vec<String> = self.columns.iter().map(|c| c.header.clone()).collect();
        let rule = horizontal_rule(&widths, self.padding, self.plain);

        let mut lines = vec![self.render_row(&header, &widths), rule.clone()];
        lines.extend(self.rows.iter().map(|row| self.render_row(row, &widths)));
        if let Some(footer) = &self.footer {
            lines.push(rule);
            lines.push(self.render_row(footer, &widths));
        }
        lines.join("\n")
    }
}

/// Terminal column width; Hangul and other East Asian wide glyphs take two.
pub fn display_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

fn char_width(ch: char) -> usize {
    match ch as u32 {
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA960..=0xA97F
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6 => 2,
        _ => 1,
    }
}

pub fn render_cell(text: &str, width: usize, alignment: Alignment, padding: usize) -> String {
    let remaining = width.saturating_sub(display_width(text));
    let (left, right) = match alignment {
        Alignment::Left => (0, remaining),
        Alignment::Right => (remaining, 0),
    };
    format!(
        "{pad}{}{text}{}{pad}",
        " ".repeat(left),
        " ".repeat(right),
        pad = " ".repeat(padding)
    )
}

pub fn horizontal_rule(widths: &[usize], padding: usize, plain: bool) -> String {
    if widths.is_empty() {
        return String::new();
    }
    let total: usize =
        widths.iter().map(|w| w + padding * 2).sum::<usize>() + widths.len().saturating_sub(1);
    let ch = if plain { '-' } else { '─' };
    ch.to_string().repeat(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hangul_counts_double_width() {
        assert_eq!(display_width("301호"), 5);
        assert_eq!(display_width("abc"), 3);
    }

    #[test]
    fn renders_aligned_columns_with_footer() {
        let mut table = Table::new(vec![
            TableColumn::new("Unit", Alignment::Left),
            TableColumn::new("Bill", Alignment::Right),
        ]);
        table.plain = true;
        table.push_row(vec!["A".into(), "10".into()]);
        table.push_row(vec!["BB".into(), "1,000".into()]);
        table.footer = Some(vec!["Total".into(), "1,010".into()]);

        let expected = [
            " Unit     Bill",
            "---------------",
            " A          10",
            " BB      1,000",
            "---------------",
            " Total   1,010",
        ]
        .join("\n");
        assert_eq!(table.render(), expected);
    }
}
