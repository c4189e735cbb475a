//! Markup-export decoder. Bank XML exporters disagree on element naming
//! (`transacao` vs `TRANSACTION`, `valor` vs `amount`), so every logical
//! field is located through a prioritized candidate list matched
//! case-insensitively.

use extrato_core::StatementEntry;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::DecodeError;
use crate::util::{direction_from_marker, parse_flexible_date, parse_signed_cents};

const TRANSACTION_TAGS: &[&str] = &["transacao", "transaction", "lancamento", "mov", "trn"];
const DATE_TAGS: &[&str] = &["data", "date", "dtposted"];
const DESCRIPTION_TAGS: &[&str] = &["descricao", "description", "historico", "memo", "name"];
const AMOUNT_TAGS: &[&str] = &["valor", "amount", "value", "trnamt"];
const TYPE_TAGS: &[&str] = &["tipo", "type", "trntype"];
const DOCUMENT_TAGS: &[&str] = &["documento", "document", "checknum", "numdoc"];

#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

pub fn decode(input: &str) -> Result<Vec<StatementEntry>, DecodeError> {
    if input.trim().is_empty() {
        return Err(DecodeError::EmptyInput);
    }

    let root = parse_tree(input)?;
    let mut transactions = Vec::new();
    collect_matching(&root, TRANSACTION_TAGS, &mut transactions);

    if transactions.is_empty() {
        return Err(DecodeError::NoTransactions);
    }

    let mut entries = Vec::with_capacity(transactions.len());
    for (i, element) in transactions.iter().enumerate() {
        entries.push(decode_transaction(element, i + 1)?);
    }
    Ok(entries)
}

fn decode_transaction(element: &Element, record: usize) -> Result<StatementEntry, DecodeError> {
    let date_raw = first_child_text(element, DATE_TAGS).unwrap_or_default();
    let date = parse_flexible_date(date_raw).ok_or_else(|| DecodeError::InvalidDate {
        record,
        value: date_raw.to_string(),
    })?;

    let amount_raw = first_child_text(element, AMOUNT_TAGS).unwrap_or_default();
    let cents = parse_signed_cents(amount_raw).ok_or_else(|| DecodeError::InvalidAmount {
        record,
        value: amount_raw.to_string(),
    })?;

    let explicit = first_child_text(element, TYPE_TAGS).and_then(direction_from_marker);
    let description = first_child_text(element, DESCRIPTION_TAGS).map(|s| s.to_string());
    let document = first_child_text(element, DOCUMENT_TAGS).map(|s| s.to_string());

    StatementEntry::from_signed(date, description, cents, explicit, document).ok_or(
        DecodeError::InvalidAmount {
            record,
            value: amount_raw.to_string(),
        },
    )
}

/// Builds a minimal element tree under a synthetic root. Attribute and
/// namespace handling is deliberately absent; exports in the wild carry the
/// data as element text.
fn parse_tree(input: &str) -> Result<Element, DecodeError> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(true);

    let mut stack = vec![Element::default()];

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                stack.push(Element {
                    name,
                    ..Element::default()
                });
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let parent = stack.last_mut().unwrap();
                parent.children.push(Element {
                    name,
                    ..Element::default()
                });
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| DecodeError::Malformed(e.to_string()))?;
                let current = stack.last_mut().unwrap();
                current.text.push_str(&text);
            }
            Ok(Event::CData(t)) => {
                let current = stack.last_mut().unwrap();
                current.text.push_str(&String::from_utf8_lossy(&t));
            }
            Ok(Event::End(_)) => {
                let finished = stack.pop().unwrap();
                let parent = stack.last_mut().ok_or_else(|| {
                    DecodeError::Malformed("unbalanced closing tag".to_string())
                })?;
                parent.children.push(finished);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(DecodeError::Malformed(e.to_string())),
        }
    }

    if stack.len() != 1 {
        return Err(DecodeError::Malformed("unclosed element".to_string()));
    }
    Ok(stack.pop().unwrap())
}

fn name_matches(name: &str, candidates: &[&str]) -> bool {
    candidates.iter().any(|c| name.eq_ignore_ascii_case(c))
}

/// Depth-first collection of every element whose name matches one of the
/// candidates. Matched elements are not descended into, so a `<mov>` inside
/// a `<transacao>` does not double-count.
fn collect_matching<'a>(element: &'a Element, candidates: &[&str], out: &mut Vec<&'a Element>) {
    for child in &element.children {
        if name_matches(&child.name, candidates) {
            out.push(child);
        } else {
            collect_matching(child, candidates, out);
        }
    }
}

/// The single tolerant-lookup helper: first child (in document order) whose
/// name matches any candidate spelling, with non-blank text.
fn first_child_text<'a>(element: &'a Element, candidates: &[&str]) -> Option<&'a str> {
    element
        .children
        .iter()
        .find(|c| name_matches(&c.name, candidates) && !c.text.trim().is_empty())
        .map(|c| c.text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use extrato_core::Direction;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<extrato>
  <conta>00012345-6</conta>
  <transacoes>
    <transacao>
      <data>15/01/2024</data>
      <descricao>SUPERMERCADO</descricao>
      <valor>-120,50</valor>
    </transacao>
    <TRANSACTION>
      <DATE>2024-01-20</DATE>
      <DESCRIPTION>PAYROLL</DESCRIPTION>
      <AMOUNT>4500.00</AMOUNT>
      <TYPE>C</TYPE>
    </TRANSACTION>
    <lancamento>
      <data>20240122</data>
      <historico>CHEQUE COMPENSADO</historico>
      <valor>230,00</valor>
      <tipo>D</tipo>
      <documento>000871</documento>
    </lancamento>
  </transacoes>
</extrato>
"#;

    #[test]
    fn decodes_mixed_tag_spellings() {
        let entries = decode(SAMPLE).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.amount.to_cents() > 0));
    }

    #[test]
    fn detects_all_three_date_forms() {
        let entries = decode(SAMPLE).unwrap();
        assert_eq!(entries[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(entries[1].date, NaiveDate::from_ymd_opt(2024, 1, 20).unwrap());
        assert_eq!(entries[2].date, NaiveDate::from_ymd_opt(2024, 1, 22).unwrap());
    }

    #[test]
    fn comma_and_dot_decimals() {
        let entries = decode(SAMPLE).unwrap();
        assert_eq!(entries[0].amount.to_cents(), 12050);
        assert_eq!(entries[1].amount.to_cents(), 450000);
    }

    #[test]
    fn type_element_wins_sign_falls_back() {
        let entries = decode(SAMPLE).unwrap();
        // no tipo element, negative amount
        assert_eq!(entries[0].direction, Direction::Expense);
        // explicit markers
        assert_eq!(entries[1].direction, Direction::Income);
        assert_eq!(entries[2].direction, Direction::Expense);
    }

    #[test]
    fn document_element_becomes_document_ref() {
        let entries = decode(SAMPLE).unwrap();
        assert_eq!(entries[2].document_ref.as_deref(), Some("000871"));
    }

    #[test]
    fn empty_input_errors() {
        assert!(matches!(decode("   "), Err(DecodeError::EmptyInput)));
    }

    #[test]
    fn document_without_transactions_errors() {
        let data = "<extrato><conta>123</conta></extrato>";
        assert!(matches!(decode(data), Err(DecodeError::NoTransactions)));
    }

    #[test]
    fn unbalanced_document_is_malformed() {
        let data = "<extrato><transacao><data>15/01/2024</data>";
        assert!(matches!(decode(data), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn transaction_missing_date_errors() {
        let data = "<x><transacao><valor>1,00</valor></transacao></x>";
        assert!(matches!(
            decode(data),
            Err(DecodeError::InvalidDate { record: 1, .. })
        ));
    }
}
