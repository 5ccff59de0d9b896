use crate::domain::model::Table;
use crate::utils::error::{Result, RewriteError};
use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::{Workbook, XlsxError};
use std::io::Cursor;
use std::path::Path;

/// On-disk layout of a table, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Xlsx,
    Csv,
}

impl TableFormat {
    pub const EXTENSIONS: [&'static str; 2] = ["xlsx", "csv"];

    pub fn from_path(path: &str) -> Option<Self> {
        let extension = Path::new(path).extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "xlsx" => Some(TableFormat::Xlsx),
            "csv" => Some(TableFormat::Csv),
            _ => None,
        }
    }

    pub fn read(self, data: &[u8], has_headers: bool, sheet: &str) -> Result<Table> {
        let rows = match self {
            TableFormat::Xlsx => read_xlsx_rows(data, sheet)?,
            TableFormat::Csv => read_csv_rows(data)?,
        };

        let mut rows = rows.into_iter();
        let header = if has_headers { rows.next() } else { None };
        Ok(Table {
            header,
            rows: rows.collect(),
        })
    }

    pub fn write(self, table: &Table, sheet: &str) -> Result<Vec<u8>> {
        match self {
            TableFormat::Xlsx => write_xlsx(table, sheet),
            TableFormat::Csv => write_csv(table),
        }
    }
}

fn read_csv_rows(data: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Cells keep their sheet position: a used range starting at C3 still puts
/// its first value in row 2, column 2.
fn read_xlsx_rows(data: &[u8], sheet: &str) -> Result<Vec<Vec<String>>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(data))?;
    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(RewriteError::SpreadsheetError(
            calamine::XlsxError::WorksheetNotFound(sheet.to_string()),
        ));
    }

    let range = workbook.worksheet_range(sheet)?;
    let (first_row, first_col) = match range.start() {
        Some((row, col)) => (row as usize, col as usize),
        None => return Ok(Vec::new()),
    };

    let mut rows = vec![Vec::new(); first_row];
    for cells in range.rows() {
        let mut row = vec![String::new(); first_col];
        row.extend(cells.iter().map(cell_text));
        rows.push(row);
    }
    Ok(rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn write_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(Vec::new());

    for row in table.header.iter().chain(table.rows.iter()) {
        writer.write_record(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| RewriteError::IoError(e.into_error()))
}

fn write_xlsx(table: &Table, sheet: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet)?;

    for (row_index, row) in table.header.iter().chain(table.rows.iter()).enumerate() {
        let row_index = u32::try_from(row_index).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col_index, value) in row.iter().enumerate() {
            // blank cells stay absent, Excel has no empty string cells
            if value.is_empty() {
                continue;
            }
            let col_index = u16::try_from(col_index).map_err(|_| XlsxError::RowColumnLimitError)?;
            worksheet.write_string(row_index, col_index, value)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}
