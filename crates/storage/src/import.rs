use extrato_core::{AccountId, StatementEntry, TransactionStatus, UserId};
use thiserror::Error;

use crate::db::{direction_to_str, format_date, status_to_str, DbPool};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("account {account_id} not found for user {user_id} (entry {entry_index})")]
    AccountNotFound {
        account_id: AccountId,
        user_id: UserId,
        entry_index: usize,
    },
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// Ids of the ledger transactions created, in entry order.
    pub created_ids: Vec<i64>,
    pub imported: usize,
}

/// Books a batch of statement entries as new ledger transactions and
/// applies the signed balance deltas to the target account. Everything runs
/// inside one database transaction: either the whole batch lands or none of
/// it does (dropping the transaction on the error path rolls it back).
pub async fn import_entries(
    pool: &DbPool,
    user_id: UserId,
    account_id: AccountId,
    entries: &[StatementEntry],
) -> Result<ImportOutcome, ImportError> {
    let mut tx = pool.begin().await?;
    let mut created_ids = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let owned: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM accounts WHERE id = ? AND user_id = ?")
                .bind(account_id.0)
                .bind(user_id.0)
                .fetch_optional(&mut *tx)
                .await?;
        if owned.is_none() {
            tracing::warn!(
                account = account_id.0,
                user = user_id.0,
                entry = index,
                "import aborted: account missing or not owned"
            );
            return Err(ImportError::AccountNotFound {
                account_id,
                user_id,
                entry_index: index,
            });
        }

        let status = TransactionStatus::settled_for(entry.direction);
        let result = sqlx::query(
            "INSERT INTO transactions
             (user_id, account_id, description, amount_cents, direction, competence_date, status)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id.0)
        .bind(account_id.0)
        .bind(&entry.description)
        .bind(entry.amount.to_cents())
        .bind(direction_to_str(entry.direction))
        .bind(format_date(entry.date))
        .bind(status_to_str(status))
        .execute(&mut *tx)
        .await?;
        created_ids.push(result.last_insert_rowid());

        let delta = entry.direction.signed_cents(entry.amount);
        sqlx::query(
            "UPDATE accounts
             SET current_balance_cents = current_balance_cents + ?,
                 available_balance_cents = available_balance_cents + ?
             WHERE id = ?",
        )
        .bind(delta)
        .bind(delta)
        .bind(account_id.0)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let imported = created_ids.len();
    tracing::info!(
        account = account_id.0,
        user = user_id.0,
        imported,
        "statement entries booked"
    );

    Ok(ImportOutcome {
        created_ids,
        imported,
    })
}
