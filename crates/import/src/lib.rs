pub mod cnab;
pub mod csv;
pub mod dispatch;
pub mod error;
pub mod matcher;
pub mod ofx;
pub mod xml;
pub(crate) mod util;

pub use csv::CsvProfile;
pub use dispatch::{decode, StatementFormat};
pub use error::{DecodeError, UsageError};
pub use matcher::{
    find_batch_duplicates, MatchOutcome, ReconcileEngine, ReconcileReport, ReconcileSummary,
};
