use extrato_core::StatementEntry;
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::util::{direction_from_marker, parse_flexible_date, parse_signed_cents};

/// Column contract for a delimited export. The caller owns the convention;
/// the default matches the `;`-separated layout most Brazilian banks emit:
/// `date;description;amount;type;document`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvProfile {
    pub name: String,
    pub delimiter: String,
    pub has_header: bool,
    pub date_column: usize,
    pub description_column: Option<usize>,
    pub amount_column: usize,
    pub type_column: Option<usize>,
    pub document_column: Option<usize>,
    pub date_format: String,
}

impl Default for CsvProfile {
    fn default() -> Self {
        Self {
            name: "padrao".to_string(),
            delimiter: ";".to_string(),
            has_header: true,
            date_column: 0,
            description_column: Some(1),
            amount_column: 2,
            type_column: Some(3),
            document_column: Some(4),
            date_format: "%d/%m/%Y".to_string(),
        }
    }
}

pub fn decode(input: &str) -> Result<Vec<StatementEntry>, DecodeError> {
    decode_with_profile(input, &CsvProfile::default())
}

pub fn decode_with_profile(
    input: &str,
    profile: &CsvProfile,
) -> Result<Vec<StatementEntry>, DecodeError> {
    if input.trim().is_empty() {
        return Err(DecodeError::EmptyInput);
    }

    let delimiter = profile.delimiter.as_bytes().first().copied().unwrap_or(b';');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(profile.has_header)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input.as_bytes());

    let mut entries = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let row = i + 1;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }

        let date_raw = required(&record, profile.date_column, row, "date")?;
        let date = parse_date(date_raw, &profile.date_format).ok_or_else(|| {
            DecodeError::InvalidDate {
                record: row,
                value: date_raw.to_string(),
            }
        })?;

        let amount_raw = required(&record, profile.amount_column, row, "amount")?;
        let cents = parse_signed_cents(amount_raw).ok_or_else(|| DecodeError::InvalidAmount {
            record: row,
            value: amount_raw.to_string(),
        })?;

        let explicit = profile
            .type_column
            .and_then(|col| record.get(col))
            .and_then(direction_from_marker);

        let description = profile
            .description_column
            .and_then(|col| record.get(col))
            .map(|s| s.to_string());
        let document = profile
            .document_column
            .and_then(|col| record.get(col))
            .map(|s| s.to_string());

        let entry = StatementEntry::from_signed(date, description, cents, explicit, document)
            .ok_or_else(|| DecodeError::InvalidAmount {
                record: row,
                value: amount_raw.to_string(),
            })?;
        entries.push(entry);
    }

    if entries.is_empty() {
        return Err(DecodeError::NoTransactions);
    }
    Ok(entries)
}

fn required<'a>(
    record: &'a csv::StringRecord,
    column: usize,
    row: usize,
    field: &str,
) -> Result<&'a str, DecodeError> {
    record
        .get(column)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DecodeError::ShortRecord {
            record: row,
            reason: format!("missing {field} column {column}"),
        })
}

fn parse_date(raw: &str, format: &str) -> Option<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(raw, format)
        .ok()
        .or_else(|| parse_flexible_date(raw))
}
