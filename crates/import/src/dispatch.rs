use extrato_core::StatementEntry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DecodeError, UsageError};
use crate::{cnab, csv, ofx, xml};

/// Explicit format selector. The caller names the format; content is never
/// sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementFormat {
    Ofx,
    Csv,
    Xml,
    Cnab,
}

impl FromStr for StatementFormat {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ofx" => Ok(StatementFormat::Ofx),
            "csv" => Ok(StatementFormat::Csv),
            "xml" => Ok(StatementFormat::Xml),
            "cnab" => Ok(StatementFormat::Cnab),
            other => Err(UsageError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for StatementFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementFormat::Ofx => write!(f, "ofx"),
            StatementFormat::Csv => write!(f, "csv"),
            StatementFormat::Xml => write!(f, "xml"),
            StatementFormat::Cnab => write!(f, "cnab"),
        }
    }
}

pub fn decode(format: StatementFormat, input: &str) -> Result<Vec<StatementEntry>, DecodeError> {
    match format {
        StatementFormat::Ofx => ofx::decode(input),
        StatementFormat::Csv => csv::decode(input),
        StatementFormat::Xml => xml::decode(input),
        StatementFormat::Cnab => cnab::decode(input),
    }
}
