use extrato_core::{LedgerTransaction, StatementEntry};
use serde::{Deserialize, Serialize};

/// Per-entry classification against the existing ledger. More than one
/// candidate is never auto-resolved; picking the wrong row silently would
/// corrupt the ledger, so all candidates are surfaced for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    Matched { ledger_id: i64 },
    Ambiguous { candidate_ids: Vec<i64> },
    NotFound,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub matched: usize,
    pub ambiguous: usize,
    pub not_found: usize,
}

#[derive(Debug, Clone)]
pub struct ReconcileReport {
    /// One outcome per decoded entry, in input order.
    pub outcomes: Vec<MatchOutcome>,
    pub summary: ReconcileSummary,
}

impl ReconcileReport {
    /// Indexes of the entries safe to import as new ledger transactions.
    pub fn not_found_indexes(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| matches!(o, MatchOutcome::NotFound))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Read-and-compare engine. A ledger row is a candidate for a decoded entry
/// when the dates are within the window, the amounts are exactly equal and
/// the directions agree. Exact-day matching is the baseline.
pub struct ReconcileEngine {
    pub date_window_days: i64,
}

impl Default for ReconcileEngine {
    fn default() -> Self {
        Self { date_window_days: 0 }
    }
}

impl ReconcileEngine {
    pub fn new(date_window_days: i64) -> Self {
        Self { date_window_days }
    }

    pub fn reconcile(
        &self,
        entries: &[StatementEntry],
        ledger: &[LedgerTransaction],
    ) -> ReconcileReport {
        let mut summary = ReconcileSummary::default();
        let outcomes = entries
            .iter()
            .map(|entry| {
                let outcome = self.classify(entry, ledger);
                match outcome {
                    MatchOutcome::Matched { .. } => summary.matched += 1,
                    MatchOutcome::Ambiguous { .. } => summary.ambiguous += 1,
                    MatchOutcome::NotFound => summary.not_found += 1,
                }
                outcome
            })
            .collect();
        ReconcileReport { outcomes, summary }
    }

    fn classify(&self, entry: &StatementEntry, ledger: &[LedgerTransaction]) -> MatchOutcome {
        let candidates: Vec<i64> = ledger
            .iter()
            .filter(|tx| self.is_candidate(entry, tx))
            .map(|tx| tx.id)
            .collect();

        match candidates.as_slice() {
            [] => MatchOutcome::NotFound,
            [only] => MatchOutcome::Matched { ledger_id: *only },
            _ => MatchOutcome::Ambiguous {
                candidate_ids: candidates,
            },
        }
    }

    fn is_candidate(&self, entry: &StatementEntry, tx: &LedgerTransaction) -> bool {
        if tx.direction != entry.direction || tx.amount != entry.amount {
            return false;
        }
        let gap = (entry.date - tx.competence_date).num_days().abs();
        gap <= self.date_window_days
    }
}

/// Pairs of indexes within a decoded batch sharing date, amount and
/// direction. Such pairs would match the same ledger rows, so callers
/// usually want to warn before importing both.
pub fn find_batch_duplicates(entries: &[StatementEntry]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..entries.len() {
        for j in (i + 1)..entries.len() {
            let (a, b) = (&entries[i], &entries[j]);
            if a.date == b.date && a.amount == b.amount && a.direction == b.direction {
                pairs.push((i, j));
            }
        }
    }
    pairs
}
