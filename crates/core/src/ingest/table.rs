use anyhow::{Context, Result};

/// Row-oriented table loaded from CSV text. Pure data; no I/O and no
/// knowledge of where the bytes came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .context("failed to read CSV header row")?
            .iter()
            .map(|h| h.trim().to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.context("failed to read CSV row")?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Keeps rows whose cell in `column` parses as a number greater than
    /// `threshold`. A table without that column passes through unchanged.
    pub fn filter_numeric_gt(&self, column: &str, threshold: f64) -> Self {
        let Some(idx) = self.column_index(column) else {
            return self.clone();
        };

        let rows = self
            .rows
            .iter()
            .filter(|row| {
                row.get(idx)
                    .and_then(|cell| cell.trim().parse::<f64>().ok())
                    .is_some_and(|v| v > threshold)
            })
            .cloned()
            .collect();

        Self {
            headers: self.headers.clone(),
            rows,
        }
    }

    /// Projects onto `columns`, in the given order, skipping names the
    /// table does not have.
    pub fn project(&self, columns: &[&str]) -> Self {
        let indexes: Vec<usize> = columns
            .iter()
            .filter_map(|c| self.column_index(c))
            .collect();

        let headers = indexes.iter().map(|&i| self.headers[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                indexes
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    /// Fixed-width rendering used as the prompt payload: right-aligned
    /// cells, two spaces between columns, header row first.
    pub fn to_text(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }

        let render = |cells: &[String]| -> String {
            cells
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let width = widths.get(i).copied().unwrap_or(0);
                    let pad = width.saturating_sub(cell.chars().count());
                    format!("{}{}", " ".repeat(pad), cell)
                })
                .collect::<Vec<_>>()
                .join("  ")
        };

        let mut out = render(&self.headers);
        for row in &self.rows {
            out.push('\n');
            out.push_str(&render(row));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
代號,名稱,成交,技術評分
2330,台積電,1000,7.5
2317,鴻海,180,0
1234,測試,50,abc
2454,聯發科,1200,6.0
";

    #[test]
    fn parses_headers_and_rows() {
        let table = CsvTable::parse(SAMPLE).unwrap();
        assert_eq!(table.headers, vec!["代號", "名稱", "成交", "技術評分"]);
        assert_eq!(table.len(), 4);
        assert_eq!(table.rows[0][1], "台積電");
    }

    #[test]
    fn filter_keeps_only_rows_above_threshold() {
        let table = CsvTable::parse(SAMPLE).unwrap();
        let filtered = table.filter_numeric_gt("技術評分", 0.0);
        // Zero and non-numeric cells both drop out.
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.rows[0][0], "2330");
        assert_eq!(filtered.rows[1][0], "2454");
    }

    #[test]
    fn filter_without_the_column_is_a_passthrough() {
        let table = CsvTable::parse(SAMPLE).unwrap();
        let filtered = table.filter_numeric_gt("不存在的欄位", 0.0);
        assert_eq!(filtered, table);
    }

    #[test]
    fn project_keeps_requested_order_and_skips_missing() {
        let table = CsvTable::parse(SAMPLE).unwrap();
        let projected = table.project(&["名稱", "代號", "外資買賣超"]);
        assert_eq!(projected.headers, vec!["名稱", "代號"]);
        assert_eq!(projected.rows[0], vec!["台積電", "2330"]);
    }

    #[test]
    fn empty_table_renders_header_only() {
        let table = CsvTable::parse("代號,名稱\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.to_text(), "代號  名稱");
    }

    #[test]
    fn to_text_right_aligns_cells() {
        let table = CsvTable::parse("a,bb\n100,2\n1,33\n").unwrap();
        let text = table.to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["  a  bb", "100   2", "  1  33"]);
    }
}
