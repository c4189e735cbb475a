use chrono::NaiveDate;
use extrato_core::Direction;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses a monetary string into signed cents. Tolerates currency symbols,
/// accounting parentheses, thousands separators and either decimal
/// separator. When both `.` and `,` appear, the one that occurs last is the
/// decimal separator; a lone comma is taken as the decimal separator.
pub(crate) fn parse_signed_cents(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let (negative, s) = if s.starts_with('(') && s.ends_with(')') {
        (true, &s[1..s.len() - 1])
    } else {
        (false, s)
    };
    let s: String = s
        .chars()
        .filter(|c| !matches!(c, '$' | 'R' | ' ' | '\u{a0}'))
        .collect();

    let normalized = match (s.rfind('.'), s.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => {
            // 1.234,56: dot groups thousands, comma is decimal
            s.replace('.', "").replace(',', ".")
        }
        (Some(_), Some(_)) => s.replace(',', ""),
        (None, Some(_)) => s.replace(',', "."),
        _ => s,
    };

    let mut dec = Decimal::from_str(&normalized).ok()?;
    if negative {
        dec = -dec;
    }
    (dec * Decimal::from(100)).round().to_i64()
}

/// Parses a date in any of the forms bank exports actually use:
/// `DD/MM/YYYY`, ISO `YYYY-MM-DD`, or compact `YYYYMMDD`.
pub(crate) fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.contains('/') {
        return NaiveDate::parse_from_str(s, "%d/%m/%Y").ok();
    }
    if s.contains('-') {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
    }
    if s.len() >= 8 && s.chars().take(8).all(|c| c.is_ascii_digit()) {
        // Compact form may carry a time suffix; only the first 8 digits count.
        return NaiveDate::parse_from_str(&s[0..8], "%Y%m%d").ok();
    }
    None
}

/// Maps an explicit source type marker to a direction, if conclusive.
pub(crate) fn direction_from_marker(raw: &str) -> Option<Direction> {
    match raw.trim().to_uppercase().as_str() {
        "C" | "CR" | "CREDIT" | "CREDITO" | "CRÉDITO" | "RECEITA" | "ENTRADA" => {
            Some(Direction::Income)
        }
        "D" | "DB" | "DEBIT" | "DEBITO" | "DÉBITO" | "DESPESA" | "SAIDA" | "SAÍDA" => {
            Some(Direction::Expense)
        }
        _ => None,
    }
}
