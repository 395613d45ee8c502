// 🏗️ Row Sources & Normalization
//
// Upstream readers turn a spreadsheet into fixed-position RawRows. The
// normalizer turns a RawRow into a classified ParsedRow or a RowError.
//
// Column layout (0-indexed):
//   0 date | 1 amount | 2 account | 4 counterparty | 6 category
//   8 comment | 9 direction tag | 10 subdirection tag

use crate::error::{ImportError, ImportResult, RowError};
use crate::model::{CategoryKey, ParsedRow};
use crate::rules::Classifier;
use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{FixedOffset, NaiveDate, TimeZone};
use serde::Serialize;
use std::path::Path;
use tracing::info;

pub const COL_DATE: usize = 0;
pub const COL_AMOUNT: usize = 1;
pub const COL_ACCOUNT: usize = 2;
pub const COL_COUNTERPARTY: usize = 4;
pub const COL_CATEGORY: usize = 6;
pub const COL_COMMENT: usize = 8;
pub const COL_DIRECTION: usize = 9;
pub const COL_SUBDIRECTION: usize = 10;

// ============================================================================
// RAW ROW
// ============================================================================

/// One source row as text cells, before any interpretation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawRow {
    /// Line in the source file (1-indexed, header included)
    pub line: usize,
    pub date: Option<String>,
    pub amount: Option<String>,
    pub account: Option<String>,
    pub counterparty: Option<String>,
    pub category: Option<String>,
    pub comment: Option<String>,
    pub direction: Option<String>,
    pub subdirection: Option<String>,
}

impl RawRow {
    /// Build from positional cells; missing or blank cells become None
    pub fn from_cells(line: usize, cells: &[Option<String>]) -> Self {
        let cell = |i: usize| -> Option<String> {
            cells
                .get(i)
                .and_then(|c| c.as_deref())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        RawRow {
            line,
            date: cell(COL_DATE),
            amount: cell(COL_AMOUNT),
            account: cell(COL_ACCOUNT),
            counterparty: cell(COL_COUNTERPARTY),
            category: cell(COL_CATEGORY),
            comment: cell(COL_COMMENT),
            direction: cell(COL_DIRECTION),
            subdirection: cell(COL_SUBDIRECTION),
        }
    }
}

// ============================================================================
// ROW SOURCES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Spreadsheet,
}

/// Upstream reader: yields every data row of one file
pub trait RowSource {
    fn read(&self, path: &Path) -> Result<Vec<RawRow>>;

    fn format(&self) -> SourceFormat;
}

/// Pick the reader from the file extension
pub fn detect_source(path: &Path) -> Result<SourceFormat> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => Ok(SourceFormat::Csv),
        "xlsx" | "xlsm" | "xls" | "ods" => Ok(SourceFormat::Spreadsheet),
        _ => Err(anyhow!("Unsupported source file: {}", path.display())),
    }
}

pub fn get_source(format: SourceFormat, has_header: bool) -> Box<dyn RowSource> {
    match format {
        SourceFormat::Csv => Box::new(CsvSource::new(has_header)),
        SourceFormat::Spreadsheet => Box::new(SpreadsheetSource::new(has_header)),
    }
}

/// Detect, read and report; reader failures abort the batch
pub fn read_rows(path: &Path, has_header: bool) -> ImportResult<Vec<RawRow>> {
    let rows = detect_source(path)
        .and_then(|format| get_source(format, has_header).read(path))
        .map_err(|e| ImportError::Source(format!("{:#}", e)))?;

    info!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

pub struct CsvSource {
    has_header: bool,
}

impl CsvSource {
    pub fn new(has_header: bool) -> Self {
        CsvSource { has_header }
    }
}

impl RowSource for CsvSource {
    fn read(&self, path: &Path) -> Result<Vec<RawRow>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(self.has_header)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;

        let first_line = if self.has_header { 2 } else { 1 };
        let mut rows = Vec::new();

        for (index, result) in reader.records().enumerate() {
            let line = index + first_line;
            let record = result
                .with_context(|| format!("Failed to parse CSV line {} in {}", line, path.display()))?;

            let cells: Vec<Option<String>> = record.iter().map(|c| Some(c.to_string())).collect();
            rows.push(RawRow::from_cells(line, &cells));
        }

        Ok(rows)
    }

    fn format(&self) -> SourceFormat {
        SourceFormat::Csv
    }
}

/// First worksheet of an xlsx/xls/ods workbook
pub struct SpreadsheetSource {
    has_header: bool,
}

impl SpreadsheetSource {
    pub fn new(has_header: bool) -> Self {
        SpreadsheetSource { has_header }
    }
}

impl RowSource for SpreadsheetSource {
    fn read(&self, path: &Path) -> Result<Vec<RawRow>> {
        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("Failed to open workbook: {}", path.display()))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("Workbook has no sheets: {}", path.display()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("Failed to read sheet '{}'", sheet_name))?;

        // Data may not begin at A1; positions are absolute columns
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let (start_row, start_col) = (start_row as usize, start_col as usize);

        let mut rows = Vec::new();
        for (index, cells) in range.rows().enumerate() {
            let row_number = start_row + index;
            if self.has_header && row_number == 0 {
                continue;
            }

            let mut positional: Vec<Option<String>> = vec![None; start_col];
            positional.extend(cells.iter().map(cell_text));
            rows.push(RawRow::from_cells(row_number + 1, &positional));
        }

        Ok(rows)
    }

    fn format(&self) -> SourceFormat {
        SourceFormat::Spreadsheet
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Float(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                Some(format!("{}", *n as i64))
            } else {
                Some(format!("{}", n))
            }
        }
        Data::Int(n) => Some(n.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        // as_datetime applies the workbook epoch (1900 or 1904)
        Data::DateTime(dt) => dt.as_datetime().map(|d| d.format("%Y-%m-%d").to_string()),
    }
}

// ============================================================================
// FIELD PARSERS
// ============================================================================

/// Local midnight of the cell's date, in milliseconds since epoch.
///
/// Accepts `DD.MM.YYYY`, `YYYY-MM-DD` and `YYYY-MM-DD HH:MM:SS` (time ignored).
pub fn parse_date(value: &str, tz: &FixedOffset) -> Option<i64> {
    let s = value.trim();
    let date_part = s.split([' ', 'T']).next()?;

    let date = if date_part.split('-').next().is_some_and(|y| y.len() == 4) && date_part.contains('-') {
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?
    } else {
        let parts: Vec<&str> = date_part.split('.').collect();
        if parts.len() != 3 {
            return None;
        }
        let day: u32 = parts[0].parse().ok()?;
        let month: u32 = parts[1].parse().ok()?;
        let year: i32 = parts[2].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)?
    };

    let midnight = date.and_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&midnight)
        .single()
        .map(|dt| dt.timestamp_millis())
}

/// Minor units and sign of an amount cell.
///
/// Parentheses or a leading `-` mark a negative amount. Spaces (including
/// non-breaking ones) are group separators and `,` is the decimal separator.
/// Digits past the second decimal round half-up.
pub fn parse_amount(value: &str) -> Option<(i64, bool)> {
    let mut s = value.trim();
    let mut negative = false;

    if s.len() >= 2 && s.starts_with('(') && s.ends_with(')') {
        s = s[1..s.len() - 1].trim();
        negative = true;
    }
    if let Some(rest) = s.strip_prefix('-') {
        s = rest.trim_start();
        negative = true;
    }

    let cleaned: String = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    let (int_part, frac_part) = match cleaned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (cleaned.as_str(), ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().all(|c| c.is_ascii_digit()) || !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let units: i64 = if int_part.is_empty() { 0 } else { int_part.parse().ok()? };
    let digit = |i: usize| -> i64 {
        frac_part
            .as_bytes()
            .get(i)
            .map(|b| (b - b'0') as i64)
            .unwrap_or(0)
    };

    let mut minor = units.checked_mul(100)?.checked_add(digit(0) * 10 + digit(1))?;
    if digit(2) >= 5 {
        minor = minor.checked_add(1)?;
    }

    Some((minor, negative))
}

// ============================================================================
// NORMALIZER
// ============================================================================

/// RawRow → ParsedRow: required fields, date, amount, classification
pub struct RowNormalizer<'a> {
    tz: FixedOffset,
    classifier: &'a Classifier,
}

impl<'a> RowNormalizer<'a> {
    pub fn new(tz: FixedOffset, classifier: &'a Classifier) -> Self {
        RowNormalizer { tz, classifier }
    }

    pub fn normalize(&self, raw: &RawRow) -> Result<ParsedRow, RowError> {
        let line = raw.line;
        let missing = |field: &'static str| RowError::MissingField { line, field };

        let date = raw.date.as_deref().ok_or_else(|| missing("date"))?;
        let amount = raw.amount.as_deref().ok_or_else(|| missing("amount"))?;
        let account = raw.account.as_deref().ok_or_else(|| missing("account"))?;
        let category = raw.category.as_deref().ok_or_else(|| missing("category"))?;

        let nominal_time = parse_date(date, &self.tz).ok_or_else(|| RowError::DateParse {
            line,
            value: date.to_string(),
        })?;

        let (amount_minor_units, signed) = parse_amount(amount).ok_or_else(|| RowError::AmountParse {
            line,
            value: amount.to_string(),
        })?;

        let classification = self.classifier.classify(category, signed);

        let mut tag_refs: Vec<String> = Vec::new();
        for tag in [&raw.direction, &raw.subdirection].into_iter().flatten() {
            if !tag_refs.contains(tag) {
                tag_refs.push(tag.clone());
            }
        }

        Ok(ParsedRow {
            line,
            nominal_time,
            classification,
            signed,
            amount_minor_units,
            category_key: CategoryKey {
                name: category.to_string(),
                category_type: classification.category_type(),
            },
            account_ref: account.to_string(),
            counterparty_ref: raw.counterparty.clone(),
            tag_refs,
            comment: raw.comment.clone().unwrap_or_default(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CategoryType, Classification};
    use calamine::{CellErrorType, ExcelDateTime, ExcelDateTimeType};
    use std::io::Write;

    fn moscow() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    fn raw(date: &str, amount: &str, account: &str, category: &str) -> RawRow {
        let mut cells = vec![None; 11];
        cells[COL_DATE] = Some(date.to_string());
        cells[COL_AMOUNT] = Some(amount.to_string());
        cells[COL_ACCOUNT] = Some(account.to_string());
        cells[COL_CATEGORY] = Some(category.to_string());
        RawRow::from_cells(2, &cells)
    }

    #[test]
    fn test_parse_amount_parenthesised_with_grouping() {
        assert_eq!(parse_amount("(1 234,56)"), Some((123456, true)));
    }

    #[test]
    fn test_parse_amount_variants() {
        assert_eq!(parse_amount("-32000"), Some((3_200_000, true)));
        assert_eq!(parse_amount("1\u{a0}500,5"), Some((150_050, false)));
        assert_eq!(parse_amount("- 12.34"), Some((1234, true)));
        assert_eq!(parse_amount("0,005"), Some((1, false)));
        assert_eq!(parse_amount("10.994"), Some((1099, false)));
        assert_eq!(parse_amount(",5"), Some((50, false)));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("1.234,56"), None);
        assert_eq!(parse_amount("12$"), None);
    }

    #[test]
    fn test_parse_date_dotted() {
        let expected = moscow()
            .with_ymd_and_hms(2021, 7, 6, 0, 0, 0)
            .unwrap()
            .timestamp_millis();

        assert_eq!(parse_date("06.07.2021", &moscow()), Some(expected));
        assert_eq!(expected, 1_625_518_800_000);
    }

    #[test]
    fn test_parse_date_iso_and_datetime() {
        let expected = parse_date("06.07.2021", &moscow());

        assert_eq!(parse_date("2021-07-06", &moscow()), expected);
        assert_eq!(parse_date("2021-07-06 15:42:00", &moscow()), expected);
        assert_eq!(parse_date("2021-07-06T15:42:00", &moscow()), expected);
    }

    #[test]
    fn test_parse_date_rejects_invalid() {
        assert_eq!(parse_date("32.01.2021", &moscow()), None);
        assert_eq!(parse_date("yesterday", &moscow()), None);
        assert_eq!(parse_date("2021/07/06", &moscow()), None);
    }

    #[test]
    fn test_cell_text_numbers_and_blanks() {
        assert_eq!(cell_text(&Data::Float(-32000.0)), Some("-32000".to_string()));
        assert_eq!(cell_text(&Data::Float(1500.5)), Some("1500.5".to_string()));
        assert_eq!(cell_text(&Data::Int(42)), Some("42".to_string()));
        assert_eq!(cell_text(&Data::Bool(true)), Some("TRUE".to_string()));
        assert_eq!(cell_text(&Data::String("Tinkoff".to_string())), Some("Tinkoff".to_string()));
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::Error(CellErrorType::Div0)), None);
    }

    #[test]
    fn test_cell_text_dates_honour_workbook_epoch() {
        let date_1900 = ExcelDateTime::new(44383.0, ExcelDateTimeType::DateTime, false);
        let with_time = ExcelDateTime::new(44383.75, ExcelDateTimeType::DateTime, false);
        let date_1904 = ExcelDateTime::new(42921.0, ExcelDateTimeType::DateTime, true);

        assert_eq!(cell_text(&Data::DateTime(date_1900)), Some("2021-07-06".to_string()));
        assert_eq!(cell_text(&Data::DateTime(with_time)), Some("2021-07-06".to_string()));
        assert_eq!(cell_text(&Data::DateTime(date_1904)), Some("2021-07-06".to_string()));
    }

    #[test]
    fn test_from_cells_trims_and_blanks() {
        let cells = vec![
            Some(" 06.07.2021 ".to_string()),
            Some("100".to_string()),
            Some("   ".to_string()),
        ];
        let row = RawRow::from_cells(5, &cells);

        assert_eq!(row.line, 5);
        assert_eq!(row.date.as_deref(), Some("06.07.2021"));
        assert_eq!(row.account, None);
        assert_eq!(row.category, None);
    }

    #[test]
    fn test_normalize_income_row() {
        let classifier = Classifier::new(["Перевод между счетами"]);
        let normalizer = RowNormalizer::new(moscow(), &classifier);

        let parsed = normalizer.normalize(&raw("06.07.2021", "1 500,00", "Tinkoff", "Зарплата")).unwrap();

        assert_eq!(parsed.classification, Classification::Income);
        assert_eq!(parsed.category_key.category_type, CategoryType::Income);
        assert_eq!(parsed.amount_minor_units, 150_000);
        assert!(!parsed.signed);
        assert_eq!(parsed.nominal_time, 1_625_518_800_000);
        assert_eq!(parsed.comment, "");
    }

    #[test]
    fn test_normalize_transfer_and_tags() {
        let classifier = Classifier::new(["Перевод между счетами"]);
        let normalizer = RowNormalizer::new(moscow(), &classifier);

        let mut row = raw("06.07.2021", "-100", "Tinkoff", "Перевод между счетами");
        row.direction = Some("Семья".to_string());
        row.subdirection = Some("Семья".to_string());

        let parsed = normalizer.normalize(&row).unwrap();

        assert_eq!(parsed.classification, Classification::TransferOut);
        assert_eq!(parsed.category_key.category_type, CategoryType::Transfer);
        assert_eq!(parsed.tag_refs, vec!["Семья".to_string()]);
    }

    #[test]
    fn test_normalize_errors() {
        let classifier = Classifier::default();
        let normalizer = RowNormalizer::new(moscow(), &classifier);

        let mut no_account = raw("06.07.2021", "1", "x", "c");
        no_account.account = None;

        assert_eq!(
            normalizer.normalize(&no_account),
            Err(RowError::MissingField { line: 2, field: "account" })
        );
        assert!(matches!(
            normalizer.normalize(&raw("6 July", "1", "a", "c")),
            Err(RowError::DateParse { .. })
        ));
        assert!(matches!(
            normalizer.normalize(&raw("06.07.2021", "one", "a", "c")),
            Err(RowError::AmountParse { .. })
        ));
    }

    #[test]
    fn test_detect_source() {
        assert_eq!(detect_source(Path::new("import.XLSX")).unwrap(), SourceFormat::Spreadsheet);
        assert_eq!(detect_source(Path::new("import.csv")).unwrap(), SourceFormat::Csv);
        assert!(detect_source(Path::new("import.pdf")).is_err());
    }

    #[test]
    fn test_csv_source_reads_fixed_positions() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Дата,Сумма,Счёт,,Контрагент,,Статья,,Описание,Направление,Поднаправление").unwrap();
        writeln!(file, "06.07.2021,\"-32 000,00\",Tinkoff,,Google,,Реклама,,google-аккаунты,Маркетинг,").unwrap();
        writeln!(file, ",,,,,,,,,,").unwrap();

        let source = get_source(detect_source(file.path()).unwrap(), true);
        let rows = source.read(file.path()).unwrap();

        assert_eq!(source.format(), SourceFormat::Csv);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].amount.as_deref(), Some("-32 000,00"));
        assert_eq!(rows[0].counterparty.as_deref(), Some("Google"));
        assert_eq!(rows[0].category.as_deref(), Some("Реклама"));
        assert_eq!(rows[0].direction.as_deref(), Some("Маркетинг"));
        assert_eq!(rows[0].subdirection, None);
        assert_eq!(rows[1].date, None);
    }

    // Minimal xlsx package: one sheet, inline strings, style 1 = builtin date format 14
    fn write_xlsx(path: &Path, date1904: bool, sheet_rows: &str) {
        use zip::write::SimpleFileOptions;

        let workbook = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<workbookPr date1904="{}"/>
<sheets><sheet name="Операции" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#,
            if date1904 { 1 } else { 0 }
        );
        let parts = [
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
</Types>"#
                    .to_string(),
            ),
            (
                "_rels/.rels",
                r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#
                    .to_string(),
            ),
            ("xl/workbook.xml", workbook),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#
                    .to_string(),
            ),
            (
                "xl/styles.xml",
                r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14"/></cellXfs>
</styleSheet>"#
                    .to_string(),
            ),
            (
                "xl/worksheets/sheet1.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
                    sheet_rows
                ),
            ),
        ];

        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, body) in parts {
            zip.start_file(name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn text(cell: &str, value: &str) -> String {
        format!(r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#, cell, value)
    }

    fn header_and_one_row(date_serial: u32) -> String {
        format!(
            r#"<row r="1">{}{}{}</row><row r="2"><c r="A2" s="1"><v>{}</v></c><c r="B2"><v>-32000</v></c>{}{}</row>"#,
            text("A1", "Дата"),
            text("B1", "Сумма"),
            text("C1", "Счёт"),
            date_serial,
            text("C2", "Tinkoff"),
            text("G2", "Реклама"),
        )
    }

    #[test]
    fn test_spreadsheet_dates_same_day_in_both_epochs() {
        let dir = tempfile::tempdir().unwrap();
        let path_1900 = dir.path().join("windows.xlsx");
        let path_1904 = dir.path().join("mac.xlsx");
        write_xlsx(&path_1900, false, &header_and_one_row(44383));
        write_xlsx(&path_1904, true, &header_and_one_row(42921));

        let source = get_source(detect_source(&path_1904).unwrap(), true);
        let rows_1900 = source.read(&path_1900).unwrap();
        let rows_1904 = source.read(&path_1904).unwrap();

        assert_eq!(source.format(), SourceFormat::Spreadsheet);
        assert_eq!(rows_1900[0].date.as_deref(), Some("2021-07-06"));
        assert_eq!(rows_1904[0].date, rows_1900[0].date);
        assert_eq!(parse_date("2021-07-06", &moscow()), Some(1_625_518_800_000));
    }

    #[test]
    fn test_spreadsheet_skips_header_and_keeps_positions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.xlsx");
        write_xlsx(&path, false, &header_and_one_row(44383));

        let rows = SpreadsheetSource::new(true).read(&path).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].date.as_deref(), Some("2021-07-06"));
        assert_eq!(rows[0].amount.as_deref(), Some("-32000"));
        assert_eq!(rows[0].account.as_deref(), Some("Tinkoff"));
        assert_eq!(rows[0].category.as_deref(), Some("Реклама"));
        assert_eq!(rows[0].counterparty, None);

        // Without a header the first row is data
        let rows = SpreadsheetSource::new(false).read(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 1);
        assert_eq!(rows[0].date.as_deref(), Some("Дата"));
    }

    #[test]
    fn test_spreadsheet_range_not_starting_at_a1() {
        // Column A is empty everywhere, so the used range begins at B
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offset.xlsx");
        let sheet = format!(
            r#"<row r="1">{}{}</row><row r="2"><c r="B2"><v>1500.5</v></c>{}</row>"#,
            text("B1", "Сумма"),
            text("C1", "Счёт"),
            text("C2", "Сбер"),
        );
        write_xlsx(&path, false, &sheet);

        let rows = SpreadsheetSource::new(true).read(&path).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].date, None);
        assert_eq!(rows[0].amount.as_deref(), Some("1500.5"));
        assert_eq!(rows[0].account.as_deref(), Some("Сбер"));
    }
}
