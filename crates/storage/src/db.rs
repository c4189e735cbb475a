use chrono::NaiveDate;
use extrato_core::{
    Account, AccountId, DateRange, Direction, LedgerTransaction, Money, TransactionStatus, UserId,
};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;

pub type DbPool = Pool<Sqlite>;

const DATE_FMT: &str = "%Y-%m-%d";

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite:{}?mode=rwc", path.display()))
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// In-memory database, used by tests and throwaway runs. A single
/// connection is mandatory here: each new connection would see its own
/// empty database.
pub async fn create_db_in_memory() -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            current_balance_cents INTEGER NOT NULL DEFAULT 0,
            available_balance_cents INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            description TEXT NOT NULL,
            amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
            direction TEXT NOT NULL,
            competence_date TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (account_id) REFERENCES accounts(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_user_date
         ON transactions(user_id, competence_date)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_account(
    pool: &DbPool,
    user_id: UserId,
    name: &str,
    initial_balance: Money,
) -> Result<Account, sqlx::Error> {
    let cents = initial_balance.to_cents();
    let result = sqlx::query(
        "INSERT INTO accounts (user_id, name, current_balance_cents, available_balance_cents)
         VALUES (?, ?, ?, ?)",
    )
    .bind(user_id.0)
    .bind(name)
    .bind(cents)
    .bind(cents)
    .execute(pool)
    .await?;

    Ok(Account {
        id: AccountId(result.last_insert_rowid()),
        user_id,
        name: name.to_string(),
        current_balance: initial_balance,
        available_balance: initial_balance,
    })
}

pub async fn find_account(
    pool: &DbPool,
    account_id: AccountId,
    user_id: UserId,
) -> Result<Option<Account>, sqlx::Error> {
    let row = sqlx::query_as::<_, (i64, i64, String, i64, i64)>(
        "SELECT id, user_id, name, current_balance_cents, available_balance_cents
         FROM accounts WHERE id = ? AND user_id = ?",
    )
    .bind(account_id.0)
    .bind(user_id.0)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(account_from_row))
}

fn account_from_row(r: (i64, i64, String, i64, i64)) -> Account {
    Account {
        id: AccountId(r.0),
        user_id: UserId(r.1),
        name: r.2,
        current_balance: Money::from_cents(r.3),
        available_balance: Money::from_cents(r.4),
    }
}

/// User-scoped ledger snapshot for a date range, the matcher's data source.
/// Passing an account restricts the read to that account's rows.
pub async fn read_ledger_transactions(
    pool: &DbPool,
    user_id: UserId,
    account_id: Option<AccountId>,
    range: &DateRange,
) -> Result<Vec<LedgerTransaction>, sqlx::Error> {
    let start = range.start.format(DATE_FMT).to_string();
    let end = range.end.format(DATE_FMT).to_string();

    let query = match account_id {
        Some(account) => sqlx::query_as::<_, LedgerRow>(
            "SELECT id, user_id, account_id, description, amount_cents, direction,
                    competence_date, status
             FROM transactions
             WHERE user_id = ? AND account_id = ? AND competence_date BETWEEN ? AND ?
             ORDER BY competence_date, id",
        )
        .bind(user_id.0)
        .bind(account.0)
        .bind(start)
        .bind(end),
        None => sqlx::query_as::<_, LedgerRow>(
            "SELECT id, user_id, account_id, description, amount_cents, direction,
                    competence_date, status
             FROM transactions
             WHERE user_id = ? AND competence_date BETWEEN ? AND ?
             ORDER BY competence_date, id",
        )
        .bind(user_id.0)
        .bind(start)
        .bind(end),
    };

    let rows = query.fetch_all(pool).await?;
    Ok(rows.into_iter().map(ledger_from_row).collect())
}

type LedgerRow = (i64, i64, i64, String, i64, String, String, String);

fn ledger_from_row(r: LedgerRow) -> LedgerTransaction {
    LedgerTransaction {
        id: r.0,
        user_id: UserId(r.1),
        account_id: AccountId(r.2),
        description: r.3,
        amount: Money::from_cents(r.4),
        direction: direction_from_str(&r.5),
        competence_date: NaiveDate::parse_from_str(&r.6, DATE_FMT)
            .unwrap_or(NaiveDate::MIN),
        status: status_from_str(&r.7),
    }
}

pub(crate) fn direction_to_str(direction: Direction) -> &'static str {
    match direction {
        Direction::Income => "income",
        Direction::Expense => "expense",
    }
}

fn direction_from_str(s: &str) -> Direction {
    match s {
        "income" => Direction::Income,
        _ => Direction::Expense,
    }
}

pub(crate) fn status_to_str(status: TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::Pending => "pending",
        TransactionStatus::Paid => "paid",
        TransactionStatus::Received => "received",
    }
}

fn status_from_str(s: &str) -> TransactionStatus {
    match s {
        "paid" => TransactionStatus::Paid,
        "received" => TransactionStatus::Received,
        _ => TransactionStatus::Pending,
    }
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn create_and_find_account() {
        let pool = create_db_in_memory().await.unwrap();
        let account = create_account(&pool, UserId(1), "Conta Corrente", Money::from_cents(10000))
            .await
            .unwrap();

        let found = find_account(&pool, account.id, UserId(1)).await.unwrap();
        let found = found.expect("account should exist");
        assert_eq!(found.name, "Conta Corrente");
        assert_eq!(found.current_balance.to_cents(), 10000);
        assert_eq!(found.available_balance.to_cents(), 10000);
    }

    #[tokio::test]
    async fn find_account_is_user_scoped() {
        let pool = create_db_in_memory().await.unwrap();
        let account = create_account(&pool, UserId(1), "Conta", Money::zero())
            .await
            .unwrap();

        assert!(find_account(&pool, account.id, UserId(2))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn ledger_read_respects_range_and_account() {
        let pool = create_db_in_memory().await.unwrap();
        let a1 = create_account(&pool, UserId(1), "A", Money::zero()).await.unwrap();
        let a2 = create_account(&pool, UserId(1), "B", Money::zero()).await.unwrap();

        for (account, day) in [(&a1, 10), (&a1, 20), (&a2, 10)] {
            sqlx::query(
                "INSERT INTO transactions
                 (user_id, account_id, description, amount_cents, direction, competence_date, status)
                 VALUES (?, ?, 'X', 100, 'expense', ?, 'paid')",
            )
            .bind(1i64)
            .bind(account.id.0)
            .bind(format_date(d(2024, 1, day)))
            .execute(&pool)
            .await
            .unwrap();
        }

        let range = DateRange::new(d(2024, 1, 1), d(2024, 1, 15));
        let all = read_ledger_transactions(&pool, UserId(1), None, &range)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let only_a1 = read_ledger_transactions(&pool, UserId(1), Some(a1.id), &range)
            .await
            .unwrap();
        assert_eq!(only_a1.len(), 1);
        assert_eq!(only_a1[0].account_id, a1.id);
        assert_eq!(only_a1[0].competence_date, d(2024, 1, 10));
    }
}
