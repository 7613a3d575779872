// src/export.rs
//! xlsx export: one sheet, fixed headers, one row per rate in input order.

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::model::RateUpdate;
use crate::view::TABLE_HEADERS;

pub const SHEET_NAME: &str = "富邦銀行匯率";

/// Serialize the current table to a single-sheet workbook. Returns
/// `Ok(None)` when there are no rows: no file is produced, silently or
/// otherwise.
pub fn workbook_bytes(update: &RateUpdate) -> Result<Option<Vec<u8>>, XlsxError> {
    if update.rates.is_empty() {
        return Ok(None);
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new().set_bold();
    for (col, header) in TABLE_HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (i, rate) in update.rates.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, &rate.currency)?;
        worksheet.write_string(row, 1, &rate.currency_code)?;
        worksheet.write_string(row, 2, &rate.cash_buy)?;
        worksheet.write_string(row, 3, &rate.cash_sell)?;
        worksheet.write_string(row, 4, &rate.spot_buy)?;
        worksheet.write_string(row, 5, &rate.spot_sell)?;
    }
    worksheet.set_column_width(0, 14)?;
    worksheet.set_column_width(1, 8)?;

    let buf = workbook.save_to_buffer()?;
    Ok(Some(buf))
}

/// ASCII stem so the Content-Disposition header stays plain.
pub fn export_filename(date: NaiveDate) -> String {
    format!("fubon_rates_{}.xlsx", date.format("%Y-%m-%d"))
}
