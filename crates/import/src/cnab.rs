//! Fixed-width batch remittance decoder (CNAB). Two historical layouts are
//! supported, each described by a declarative field table so the byte
//! offsets live in data rather than in parsing code:
//!
//! - 240-byte records: detail lines carry record type `'3'` at offset 7 and
//!   the statement segment marker `'E'` at offset 13; dates are `DDMMYYYY`.
//! - 400-byte records: a single record type `'1'` at offset 0; dates are
//!   `DDMMYY` with 2-digit years, and `'2'` doubles as a credit marker.
//!
//! Header/trailer lines and other segments are skipped. A line that *is* a
//! detail record but is shorter than the layout's record length aborts the
//! decode.

use chrono::NaiveDate;
use extrato_core::{Direction, StatementEntry};

use crate::error::DecodeError;

#[derive(Debug, Clone, Copy)]
struct Field {
    start: usize,
    len: usize,
}

impl Field {
    const fn new(start: usize, len: usize) -> Self {
        Field { start, len }
    }

    fn slice(&self, chars: &[char]) -> String {
        chars[self.start..self.start + self.len].iter().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateForm {
    /// `DDMMYY`, 2-digit year resolved as 2000 + yy. Dates before 2000
    /// cannot be represented; the source format simply has no room for them.
    Ddmmyy,
    /// `DDMMYYYY`
    Ddmmyyyy,
}

struct Layout {
    name: &'static str,
    record_len: usize,
    /// Offset and marker identifying a detail record.
    record_type: (usize, char),
    /// Additional segment qualifier within detail records (240-byte layout).
    segment: Option<(usize, char)>,
    date: Field,
    date_form: DateForm,
    amount: Field,
    direction_offset: usize,
    credit_markers: &'static [char],
    description: Field,
    document: Field,
}

const LAYOUT_240: Layout = Layout {
    name: "cnab240",
    record_len: 240,
    record_type: (7, '3'),
    segment: Some((13, 'E')),
    date: Field::new(142, 8),
    date_form: DateForm::Ddmmyyyy,
    amount: Field::new(150, 18),
    direction_offset: 168,
    credit_markers: &['C'],
    description: Field::new(176, 25),
    document: Field::new(201, 25),
};

const LAYOUT_400: Layout = Layout {
    name: "cnab400",
    record_len: 400,
    record_type: (0, '1'),
    segment: None,
    date: Field::new(110, 6),
    date_form: DateForm::Ddmmyy,
    amount: Field::new(152, 13),
    direction_offset: 165,
    credit_markers: &['C', '2'],
    description: Field::new(166, 25),
    document: Field::new(116, 10),
};

pub fn decode(input: &str) -> Result<Vec<StatementEntry>, DecodeError> {
    let lines: Vec<&str> = input
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(DecodeError::EmptyInput);
    }

    let layout = select_layout(lines[0])?;
    let mut entries = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let chars: Vec<char> = line.chars().collect();
        if !is_detail(&chars, layout) {
            continue;
        }
        if chars.len() < layout.record_len {
            return Err(DecodeError::ShortRecord {
                record: i + 1,
                reason: format!(
                    "{} detail record has {} of {} positions",
                    layout.name,
                    chars.len(),
                    layout.record_len
                ),
            });
        }
        entries.push(decode_detail(&chars, layout, i + 1)?);
    }

    if entries.is_empty() {
        return Err(DecodeError::NoTransactions);
    }
    Ok(entries)
}

fn select_layout(first_line: &str) -> Result<&'static Layout, DecodeError> {
    let len = first_line.chars().count();
    if len >= LAYOUT_400.record_len {
        Ok(&LAYOUT_400)
    } else if len >= LAYOUT_240.record_len {
        Ok(&LAYOUT_240)
    } else {
        Err(DecodeError::UnrecognizedLayout(format!(
            "line of {len} positions matches no known record length"
        )))
    }
}

/// A line is a detail record when its record-type byte (and, for the
/// 240-byte layout, its segment byte) carries the expected marker. Lines
/// too short to even hold those markers are control noise and are skipped.
fn is_detail(chars: &[char], layout: &Layout) -> bool {
    let (offset, marker) = layout.record_type;
    if chars.get(offset).copied() != Some(marker) {
        return false;
    }
    match layout.segment {
        Some((seg_offset, seg_marker)) => chars.get(seg_offset).copied() == Some(seg_marker),
        None => true,
    }
}

fn decode_detail(
    chars: &[char],
    layout: &Layout,
    record: usize,
) -> Result<StatementEntry, DecodeError> {
    let date_raw = layout.date.slice(chars);
    let date = parse_date(&date_raw, layout.date_form).ok_or_else(|| DecodeError::InvalidDate {
        record,
        value: date_raw.clone(),
    })?;

    let amount_raw = layout.amount.slice(chars);
    let cents = parse_scaled_amount(&amount_raw).ok_or_else(|| DecodeError::InvalidAmount {
        record,
        value: amount_raw.trim().to_string(),
    })?;

    let marker = chars[layout.direction_offset];
    let direction = if layout.credit_markers.contains(&marker) {
        Direction::Income
    } else {
        Direction::Expense
    };

    let description = layout.description.slice(chars).trim().to_string();
    let document = layout.document.slice(chars).trim().to_string();

    StatementEntry::from_signed(
        date,
        Some(description),
        cents,
        Some(direction),
        Some(document),
    )
    .ok_or(DecodeError::InvalidAmount {
        record,
        value: amount_raw.trim().to_string(),
    })
}

fn parse_date(raw: &str, form: DateForm) -> Option<NaiveDate> {
    if !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let day: u32 = raw[0..2].parse().ok()?;
    let month: u32 = raw[2..4].parse().ok()?;
    let year: i32 = match form {
        DateForm::Ddmmyy => 2000 + raw[4..6].parse::<i32>().ok()?,
        DateForm::Ddmmyyyy => raw[4..8].parse().ok()?,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Zero-padded numeric field holding the value scaled by 100 (the trailing
/// two digits are cents).
fn parse_scaled_amount(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use extrato_core::DESCRIPTION_PLACEHOLDER;

    // Builds a line by dropping values onto a space-padded buffer at the
    // layout's own offsets, so the tests cannot drift from the tables.
    fn build_line(layout: &Layout, fields: &[(usize, &str)]) -> String {
        let mut chars = vec![' '; layout.record_len];
        for (offset, value) in fields {
            for (i, c) in value.chars().enumerate() {
                chars[offset + i] = c;
            }
        }
        chars.into_iter().collect()
    }

    fn detail_240(date: &str, amount18: &str, dc: char, desc: &str, doc: &str) -> String {
        build_line(
            &LAYOUT_240,
            &[
                (7, "3"),
                (13, "E"),
                (142, date),
                (150, amount18),
                (168, &dc.to_string()),
                (176, desc),
                (201, doc),
            ],
        )
    }

    fn detail_400(date: &str, amount13: &str, dc: char, desc: &str, doc: &str) -> String {
        build_line(
            &LAYOUT_400,
            &[
                (0, "1"),
                (110, date),
                (116, doc),
                (152, amount13),
                (165, &dc.to_string()),
                (166, desc),
            ],
        )
    }

    fn header_240() -> String {
        build_line(&LAYOUT_240, &[(7, "0")])
    }

    #[test]
    fn cnab240_detail_line_decodes() {
        let file = format!(
            "{}\n{}\n",
            header_240(),
            detail_240("15012024", "000000000000012345", 'D', "TARIFA PACOTE", "DOC42")
        );
        let entries = decode(&file).unwrap();
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(e.amount.to_cents(), 12345);
        assert_eq!(e.direction, Direction::Expense);
        assert_eq!(e.description, "TARIFA PACOTE");
        assert_eq!(e.document_ref.as_deref(), Some("DOC42"));
    }

    #[test]
    fn cnab240_amount_scaled_by_100() {
        // "000000000012345" zero-extended to the 18-digit field is 123.45
        let file = detail_240("01022024", "000000000000012345", 'C', "PIX", "");
        let entries = decode(&file).unwrap();
        assert_eq!(entries[0].amount.to_cents(), 12345);
        assert_eq!(entries[0].direction, Direction::Income);
    }

    #[test]
    fn cnab240_non_detail_lines_are_skipped_not_errors() {
        let file = format!(
            "{}\n{}\n{}\n",
            header_240(),
            detail_240("15012024", "000000000000010000", 'C', "TED", ""),
            build_line(&LAYOUT_240, &[(7, "9")]), // trailer
        );
        let entries = decode(&file).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn cnab240_wrong_segment_is_skipped() {
        let other_segment = build_line(&LAYOUT_240, &[(7, "3"), (13, "T")]);
        let file = format!(
            "{}\n{}\n",
            other_segment,
            detail_240("15012024", "000000000000010000", 'C', "TED", "")
        );
        assert_eq!(decode(&file).unwrap().len(), 1);
    }

    #[test]
    fn cnab240_only_control_lines_errors() {
        let file = format!("{}\n{}\n", header_240(), build_line(&LAYOUT_240, &[(7, "9")]));
        assert!(matches!(decode(&file), Err(DecodeError::NoTransactions)));
    }

    #[test]
    fn cnab240_short_detail_aborts() {
        let full = detail_240("15012024", "000000000000010000", 'C', "TED", "");
        let truncated: String = full.chars().take(200).collect();
        let file = format!("{}\n{}\n", header_240(), truncated);
        assert!(matches!(
            decode(&file),
            Err(DecodeError::ShortRecord { record: 2, .. })
        ));
    }

    #[test]
    fn cnab400_two_digit_year_resolves_to_current_century() {
        let file = detail_400("150123", "0000000012345", 'C', "DEPOSITO", "0000000042");
        let entries = decode(&file).unwrap();
        assert_eq!(entries[0].date, NaiveDate::from_ymd_opt(2023, 1, 15).unwrap());
        assert_eq!(entries[0].amount.to_cents(), 12345);
        assert_eq!(entries[0].direction, Direction::Income);
    }

    #[test]
    fn cnab400_alternate_credit_marker() {
        let credit = detail_400("150123", "0000000010000", '2', "RESGATE", "");
        let debit = detail_400("150123", "0000000010000", 'D', "SAQUE", "");
        assert_eq!(decode(&credit).unwrap()[0].direction, Direction::Income);
        assert_eq!(decode(&debit).unwrap()[0].direction, Direction::Expense);
    }

    #[test]
    fn cnab400_blank_description_gets_placeholder() {
        let file = detail_400("150123", "0000000010000", 'C', "", "");
        let entries = decode(&file).unwrap();
        assert_eq!(entries[0].description, DESCRIPTION_PLACEHOLDER);
        assert!(entries[0].document_ref.is_none());
    }

    #[test]
    fn cnab400_invalid_date_names_the_record() {
        let file = detail_400("320123", "0000000010000", 'C', "X", "");
        assert!(matches!(
            decode(&file),
            Err(DecodeError::InvalidDate { record: 1, .. })
        ));
    }

    #[test]
    fn cnab400_zero_amount_is_invalid() {
        let file = detail_400("150123", "0000000000000", 'C', "X", "");
        assert!(matches!(
            decode(&file),
            Err(DecodeError::InvalidAmount { record: 1, .. })
        ));
    }

    #[test]
    fn empty_input_errors() {
        assert!(matches!(decode(""), Err(DecodeError::EmptyInput)));
        assert!(matches!(decode("\n\n"), Err(DecodeError::EmptyInput)));
    }

    #[test]
    fn short_first_line_is_unrecognized_layout() {
        assert!(matches!(
            decode("0123456789"),
            Err(DecodeError::UnrecognizedLayout(_))
        ));
    }
}
