use crate::domain::model::EnrichedRecord;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Searchable, paginated view over the enriched results.
pub struct DataGrid<'a> {
    columns: Vec<String>,
    rows: &'a [EnrichedRecord],
}

#[derive(Debug)]
pub struct Page<'a> {
    /// 1-based.
    pub number: usize,
    pub total_pages: usize,
    pub matching_rows: usize,
    pub rows: Vec<&'a EnrichedRecord>,
}

impl<'a> DataGrid<'a> {
    /// Columns come from the first record's keys.
    pub fn new(rows: &'a [EnrichedRecord]) -> Self {
        let columns = rows
            .first()
            .map(|record| record.keys().map(str::to_string).collect())
            .unwrap_or_default();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows with any cell containing `query`, ignoring case. Blank matches all.
    pub fn search(&self, query: &str) -> Vec<&'a EnrichedRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.rows.iter().collect();
        }

        self.rows
            .iter()
            .filter(|record| {
                self.columns.iter().any(|column| {
                    record
                        .text(column)
                        .map(|cell| cell.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                })
            })
            .collect()
    }

    /// Page `number` of the rows matching `query`, clamped to the last page.
    pub fn page(&self, query: &str, number: usize, page_size: usize) -> Page<'a> {
        let matching = self.search(query);
        let page_size = page_size.max(1);
        let total_pages = matching.len().div_ceil(page_size).max(1);
        let number = number.clamp(1, total_pages);

        let rows = matching
            .iter()
            .skip((number - 1) * page_size)
            .take(page_size)
            .copied()
            .collect();

        Page {
            number,
            total_pages,
            matching_rows: matching.len(),
            rows,
        }
    }

    /// Plain-text rendering with aligned columns.
    pub fn render(&self, page: &Page<'_>) -> String {
        let cells: Vec<Vec<String>> = page
            .rows
            .iter()
            .map(|record| {
                self.columns
                    .iter()
                    .map(|column| record.text(column).unwrap_or_default())
                    .collect()
            })
            .collect();

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

        let format_row = |values: &[String]| {
            values
                .iter()
                .zip(&widths)
                .map(|(value, width)| format!("{:<width$}", value, width = *width))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut lines = vec![format_row(&self.columns)];
        lines.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        lines.extend(cells.iter().map(|row| format_row(row)));
        lines.push(format!(
            "Page {} of {} ({} matching rows)",
            page.number, page.total_pages, page.matching_rows
        ));
        lines.join("\n")
    }
}
