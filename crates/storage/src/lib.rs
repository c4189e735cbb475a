pub mod db;
pub mod import;

pub use db::{
    create_account, create_db, create_db_in_memory, find_account, read_ledger_transactions,
    DbPool,
};
pub use import::{import_entries, ImportError, ImportOutcome};
