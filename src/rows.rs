use crate::error::{FinancialReportError, Result};
use crate::utils::format_amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Decimal places used for display values.
pub const AMOUNT_PRECISION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Amount(Decimal),
    Text(String),
    Empty,
}

impl CellValue {
    pub fn as_amount(&self) -> Option<Decimal> {
        match self {
            CellValue::Amount(value) => Some(*value),
            _ => None,
        }
    }
}

/// Sign indicator decided by the engine. Renderers show it as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellColor {
    Green,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellAlign {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub raw_value: CellValue,
    pub display_value: String,
    pub bold: bool,
    pub color: Option<CellColor>,
    pub indent: usize,
    pub align: CellAlign,
}

impl Cell {
    pub fn text(value: impl Into<String>, indent: usize) -> Self {
        let value = value.into();
        Self {
            display_value: value.clone(),
            raw_value: CellValue::Text(value),
            bold: false,
            color: None,
            indent,
            align: CellAlign::Left,
        }
    }

    pub fn amount(value: Decimal) -> Self {
        Self {
            raw_value: CellValue::Amount(value),
            display_value: format_amount(value, AMOUNT_PRECISION),
            bold: false,
            color: None,
            indent: 0,
            align: CellAlign::Right,
        }
    }

    pub fn empty(align: CellAlign) -> Self {
        Self {
            raw_value: CellValue::Empty,
            display_value: String::new(),
            bold: false,
            color: None,
            indent: 0,
            align,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub cells: Vec<Cell>,
    pub level: usize,
    pub is_group: bool,
    /// Blank separator row.
    pub is_empty: bool,
}

impl ReportRow {
    /// Account name of the row, taken from the first cell.
    pub fn label(&self) -> Option<&str> {
        match self.cells.first().map(|c| &c.raw_value) {
            Some(CellValue::Text(name)) => Some(name.as_str()),
            _ => None,
        }
    }
}

/// Ordered report rows handed to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportData(Vec<ReportRow>);

impl ReportData {
    pub fn new(rows: Vec<ReportRow>) -> Self {
        Self(rows)
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReportRow> {
        self.0.iter()
    }

    pub fn push(&mut self, row: ReportRow) {
        self.0.push(row);
    }

    pub fn pop(&mut self) -> Option<ReportRow> {
        self.0.pop()
    }

    /// First row whose name cell equals `label`.
    pub fn find_row(&self, label: &str) -> Option<&ReportRow> {
        self.0.iter().find(|r| r.label() == Some(label))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Display values as CSV, one header row from `columns`. Names are
    /// indented with two spaces per level.
    pub fn to_csv(&self, columns: &[ReportColumn]) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(columns.iter().map(|c| c.label.as_str()))?;

        for row in &self.0 {
            let record: Vec<String> = row.cells.iter().map(indented_display).collect();
            if record.is_empty() {
                writer.write_record(columns.iter().map(|_| ""))?;
            } else {
                writer.write_record(&record)?;
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| FinancialReportError::IoError(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| {
            FinancialReportError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }

    pub fn to_markdown(&self, columns: &[ReportColumn]) -> String {
        let mut output = String::new();

        output.push('|');
        for column in columns {
            output.push_str(&format!(" {} |", column.label));
        }
        output.push('\n');

        output.push('|');
        for column in columns {
            let marker = match column.fieldtype {
                ColumnType::Data => " --- |",
                ColumnType::Currency => " ---: |",
            };
            output.push_str(marker);
        }
        output.push('\n');

        for row in &self.0 {
            output.push('|');
            if row.is_empty || row.cells.is_empty() {
                for _ in columns {
                    output.push_str("  |");
                }
            } else {
                for cell in &row.cells {
                    let text = format!(
                        "{}{}",
                        "&nbsp;&nbsp;".repeat(cell.indent),
                        cell.display_value
                    );
                    if cell.bold && !text.is_empty() {
                        output.push_str(&format!(" **{}** |", text));
                    } else {
                        output.push_str(&format!(" {} |", text));
                    }
                }
            }
            output.push('\n');
        }

        output
    }
}

impl From<Vec<ReportRow>> for ReportData {
    fn from(rows: Vec<ReportRow>) -> Self {
        Self(rows)
    }
}

impl FromIterator<ReportRow> for ReportData {
    fn from_iter<T: IntoIterator<Item = ReportRow>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<ReportRow> for ReportData {
    fn extend<T: IntoIterator<Item = ReportRow>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl IntoIterator for ReportData {
    type Item = ReportRow;
    type IntoIter = std::vec::IntoIter<ReportRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ReportData {
    type Item = &'a ReportRow;
    type IntoIter = std::slice::Iter<'a, ReportRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn indented_display(cell: &Cell) -> String {
    format!("{}{}", "  ".repeat(cell.indent), cell.display_value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ColumnType {
    Data,
    Currency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportColumn {
    pub label: String,
    pub fieldname: String,
    pub fieldtype: ColumnType,
}

/// The account column followed by one currency column per period key.
pub fn columns_for_periods(period_keys: &[String]) -> Vec<ReportColumn> {
    let mut columns = Vec::with_capacity(period_keys.len() + 1);
    columns.push(ReportColumn {
        label: "Account".to_string(),
        fieldname: "account".to_string(),
        fieldtype: ColumnType::Data,
    });
    columns.extend(period_keys.iter().map(|key| ReportColumn {
        label: key.clone(),
        fieldname: key.clone(),
        fieldtype: ColumnType::Currency,
    }));
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> (ReportData, Vec<ReportColumn>) {
        let columns = columns_for_periods(&["2024".to_string()]);
        let mut total = ReportRow {
            cells: vec![Cell::text("Total", 0), Cell::amount(dec!(1234.5))],
            ..Default::default()
        };
        for cell in &mut total.cells {
            cell.bold = true;
        }
        let data = ReportData::new(vec![
            ReportRow {
                cells: vec![Cell::text("Income", 0), Cell::amount(dec!(1234.5))],
                level: 0,
                is_group: true,
                is_empty: false,
            },
            ReportRow {
                cells: vec![Cell::text("Sales", 1), Cell::amount(dec!(1234.5))],
                level: 1,
                ..Default::default()
            },
            ReportRow {
                is_empty: true,
                ..Default::default()
            },
            total,
        ]);
        (data, columns)
    }

    #[test]
    fn test_columns_for_periods() {
        let columns = columns_for_periods(&["Q1".to_string(), "Q2".to_string()]);
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].fieldtype, ColumnType::Data);
        assert_eq!(columns[2].label, "Q2");
    }

    #[test]
    fn test_cell_constructors() {
        let cell = Cell::amount(dec!(-42));
        assert_eq!(cell.display_value, "-42.00");
        assert_eq!(cell.raw_value.as_amount(), Some(dec!(-42)));
        assert_eq!(cell.align, CellAlign::Right);

        let name = Cell::text("Rent", 2);
        assert_eq!(name.indent, 2);
        assert!(name.raw_value.as_amount().is_none());
    }

    #[test]
    fn test_find_row() {
        let (data, _) = sample();
        assert_eq!(data.find_row("Sales").unwrap().level, 1);
        assert!(data.find_row("Missing").is_none());
    }

    #[test]
    fn test_to_csv() {
        let (data, columns) = sample();
        let csv = data.to_csv(&columns).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Account,2024");
        assert_eq!(lines[1], "Income,\"1,234.50\"");
        assert_eq!(lines[2], "  Sales,\"1,234.50\"");
        assert_eq!(lines[3], ",");
    }

    #[test]
    fn test_to_markdown() {
        let (data, columns) = sample();
        let markdown = data.to_markdown(&columns);
        assert!(markdown.starts_with("| Account | 2024 |"));
        assert!(markdown.contains("| ---: |"));
        assert!(markdown.contains("&nbsp;&nbsp;Sales"));
        assert!(markdown.contains("**Total**"));
    }

    #[test]
    fn test_json_shape() {
        let (data, _) = sample();
        let json = data.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["cells"][1]["raw_value"]["type"], "amount");
        assert_eq!(value[0]["cells"][0]["align"], "left");
    }
}
