use std::ops::Range;

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::data::model::{CellValue, Table};
use crate::error::WriteError;
use crate::progress::{ProgressObserver, ProgressScope};

/// Rows a worksheet can hold, header included.
pub const MAX_ROWS: usize = 1_048_576;
/// Columns a worksheet can hold.
pub const MAX_COLUMNS: usize = 16_384;

const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Rows per batch: roughly a hundred progress updates whatever the size.
pub fn chunk_size(total_rows: usize) -> usize {
    (total_rows / 100).max(1)
}

/// Row ranges written per batch, each paired with the cumulative percentage
/// reported once it is done. Non-decreasing, ending at exactly 100.
pub fn batches(total_rows: usize) -> impl Iterator<Item = (Range<usize>, u8)> {
    let chunk = chunk_size(total_rows);
    (0..total_rows).step_by(chunk).map(move |start| {
        let end = (start + chunk).min(total_rows);
        let percent = ((start + chunk) * 100 / total_rows).min(100) as u8;
        (start..end, percent)
    })
}

/// Serialise `table` into an xlsx workbook with a single `Sheet1`.
///
/// The header row holds the row-label names followed by the column names;
/// data rows follow in table order. `label` names the file in progress
/// messages. A table without rows still yields a workbook with its header.
pub fn write_table(
    table: &Table,
    label: &str,
    observer: &mut dyn ProgressObserver,
) -> Result<Vec<u8>, WriteError> {
    if table.len() + 1 > MAX_ROWS {
        return Err(WriteError::TooManyRows { rows: table.len() });
    }
    if table.width() > MAX_COLUMNS {
        return Err(WriteError::TooManyColumns {
            columns: table.width(),
        });
    }

    let bold = Format::new().set_bold();
    let datetime = Format::new().set_num_format(DATETIME_FORMAT);
    let index_datetime = Format::new().set_bold().set_num_format(DATETIME_FORMAT);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        for (col, name) in table.index_names.iter().chain(&table.columns).enumerate() {
            sheet.write_string_with_format(0, col as u16, name, &bold)?;
        }

        let n_index = table.index_names.len();
        let total = table.len();
        for (rows, percent) in batches(total) {
            for r in rows {
                let row = &table.rows[r];
                let excel_row = (r + 1) as u32;
                for (c, value) in row.key.iter().enumerate() {
                    write_cell(sheet, excel_row, c as u16, value, Some(&bold), &index_datetime)?;
                }
                for (c, value) in row.cells.iter().enumerate() {
                    write_cell(sheet, excel_row, (n_index + c) as u16, value, None, &datetime)?;
                }
            }
            observer.report(
                ProgressScope::File,
                f32::from(percent) / 100.0,
                &format!("Converting {label} to Excel: {percent}%"),
            );
        }
        if total == 0 {
            observer.report(
                ProgressScope::File,
                1.0,
                &format!("Converting {label} to Excel: 100%"),
            );
        }
    }

    let bytes = workbook.save_to_buffer()?;
    info!("wrote {label}: {} rows, {} bytes", table.len(), bytes.len());
    Ok(bytes)
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    format: Option<&Format>,
    datetime_format: &Format,
) -> Result<(), WriteError> {
    match value {
        CellValue::Missing => {}
        CellValue::Text(s) => write_text(sheet, row, col, s, format)?,
        CellValue::Integer(i) => write_number(sheet, row, col, *i as f64, format)?,
        CellValue::Float(f) if f.is_finite() => write_number(sheet, row, col, *f, format)?,
        CellValue::Float(f) => {
            let text = if *f > 0.0 { "inf" } else { "-inf" };
            write_text(sheet, row, col, text, format)?;
        }
        CellValue::DateTime(dt) => match excel_serial(dt) {
            Some(serial) => {
                sheet.write_number_with_format(row, col, serial, datetime_format)?;
            }
            None => {
                debug!("date {dt} predates the Excel epoch, writing it as text");
                write_text(sheet, row, col, &value.to_string(), format)?;
            }
        },
    }
    Ok(())
}

fn write_text(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    text: &str,
    format: Option<&Format>,
) -> Result<(), WriteError> {
    match format {
        Some(f) => sheet.write_string_with_format(row, col, text, f)?,
        None => sheet.write_string(row, col, text)?,
    };
    Ok(())
}

fn write_number(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    n: f64,
    format: Option<&Format>,
) -> Result<(), WriteError> {
    match format {
        Some(f) => sheet.write_number_with_format(row, col, n, f)?,
        None => sheet.write_number(row, col, n)?,
    };
    Ok(())
}

/// Days since the Excel epoch (1899-12-30), for dates Excel represents
/// unambiguously (1900-03-01 through 9999-12-31).
pub fn excel_serial(dt: &NaiveDateTime) -> Option<f64> {
    let first = NaiveDate::from_ymd_opt(1900, 3, 1)?.and_hms_opt(0, 0, 0)?;
    let last = NaiveDate::from_ymd_opt(10000, 1, 1)?.and_hms_opt(0, 0, 0)?;
    if *dt < first || *dt >= last {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let micros = (*dt - epoch).num_microseconds()?;
    Some(micros as f64 / 86_400_000_000.0)
}
