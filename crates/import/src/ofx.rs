use extrato_core::{Direction, StatementEntry};

use crate::error::DecodeError;
use crate::util::{parse_flexible_date, parse_signed_cents};

/// Transaction type tags that decide direction on their own. Anything else
/// (notably XFER) is inconclusive and falls back to the amount's sign.
const CREDIT_TYPES: &[&str] = &["CREDIT", "DEP", "DIRECTDEP", "INT", "DIV"];
const DEBIT_TYPES: &[&str] = &[
    "DEBIT",
    "DIRECTDEBIT",
    "PAYMENT",
    "REPEATPMT",
    "FEE",
    "SRVCHG",
    "ATM",
    "POS",
    "CHECK",
];

#[derive(Default)]
struct BuildingTrx {
    trn_type: Option<String>,
    date_raw: Option<String>,
    amount_raw: Option<String>,
    name: Option<String>,
    memo: Option<String>,
    check_number: Option<String>,
}

/// Decodes an OFX/SGML statement into canonical entries. Only `<STMTTRN>`
/// blocks are data; everything around them (headers, account blocks,
/// balances) is ignored.
pub fn decode(input: &str) -> Result<Vec<StatementEntry>, DecodeError> {
    let data = input.trim();
    if data.is_empty() {
        return Err(DecodeError::EmptyInput);
    }

    let mut entries = Vec::new();
    let mut current: Option<BuildingTrx> = None;
    let mut record = 0usize;

    for line in data.lines() {
        let line = line.trim();
        let Some(tag) = line.strip_prefix('<') else {
            continue;
        };
        let (tag_name, value) = match tag.split_once('>') {
            Some((name, val)) => (name.trim().to_uppercase(), Some(val.trim().to_string())),
            None => (tag.trim_end_matches(['>', '\r']).to_uppercase(), None),
        };

        match tag_name.as_str() {
            "STMTTRN" => {
                record += 1;
                current = Some(BuildingTrx::default());
            }
            "/STMTTRN" => {
                if let Some(trx) = current.take() {
                    entries.push(finish(trx, record)?);
                }
            }
            _ => {
                if let Some(ref mut trx) = current {
                    match (tag_name.as_str(), value) {
                        ("TRNTYPE", Some(v)) => trx.trn_type = Some(v),
                        ("DTPOSTED", Some(v)) => trx.date_raw = Some(v),
                        ("TRNAMT", Some(v)) => trx.amount_raw = Some(v),
                        ("NAME", Some(v)) => trx.name = Some(v),
                        ("MEMO", Some(v)) => trx.memo = Some(v),
                        ("CHECKNUM", Some(v)) => trx.check_number = Some(v),
                        _ => {}
                    }
                }
            }
        }
    }

    if entries.is_empty() {
        return Err(DecodeError::NoTransactions);
    }
    Ok(entries)
}

fn finish(trx: BuildingTrx, record: usize) -> Result<StatementEntry, DecodeError> {
    let date_raw = trx.date_raw.unwrap_or_default();
    let date = parse_flexible_date(&date_raw).ok_or_else(|| DecodeError::InvalidDate {
        record,
        value: date_raw.clone(),
    })?;

    let amount_raw = trx.amount_raw.unwrap_or_default();
    let cents = parse_signed_cents(&amount_raw).ok_or_else(|| DecodeError::InvalidAmount {
        record,
        value: amount_raw.clone(),
    })?;

    let explicit = trx.trn_type.as_deref().and_then(direction_from_trn_type);
    let description = trx.name.or(trx.memo);

    StatementEntry::from_signed(date, description, cents, explicit, trx.check_number).ok_or(
        DecodeError::InvalidAmount {
            record,
            value: amount_raw,
        },
    )
}

fn direction_from_trn_type(trn_type: &str) -> Option<Direction> {
    let t = trn_type.trim().to_uppercase();
    if CREDIT_TYPES.contains(&t.as_str()) {
        Some(Direction::Income)
    } else if DEBIT_TYPES.contains(&t.as_str()) {
        Some(Direction::Expense)
    } else {
        None
    }
}
