use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive calendar-date range, used to scope ledger reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if end < start {
            DateRange { start: end, end: start }
        } else {
            DateRange { start, end }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Smallest range covering all given dates, widened by `pad_days` on
    /// each side. Returns `None` for an empty set.
    pub fn covering(dates: impl IntoIterator<Item = NaiveDate>, pad_days: i64) -> Option<Self> {
        let mut iter = dates.into_iter();
        let first = iter.next()?;
        let (mut min, mut max) = (first, first);
        for d in iter {
            if d < min {
                min = d;
            }
            if d > max {
                max = d;
            }
        }
        let pad = chrono::Duration::days(pad_days);
        Some(DateRange::new(min - pad, max + pad))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn contains_is_inclusive() {
        let r = DateRange::new(d(2024, 1, 1), d(2024, 1, 31));
        assert!(r.contains(d(2024, 1, 1)));
        assert!(r.contains(d(2024, 1, 31)));
        assert!(!r.contains(d(2024, 2, 1)));
    }

    #[test]
    fn new_swaps_reversed_bounds() {
        let r = DateRange::new(d(2024, 2, 1), d(2024, 1, 1));
        assert_eq!(r.start, d(2024, 1, 1));
        assert_eq!(r.end, d(2024, 2, 1));
    }

    #[test]
    fn covering_pads_min_and_max() {
        let r = DateRange::covering(
            vec![d(2024, 1, 10), d(2024, 1, 5), d(2024, 1, 20)],
            2,
        )
        .unwrap();
        assert_eq!(r.start, d(2024, 1, 3));
        assert_eq!(r.end, d(2024, 1, 22));
    }

    #[test]
    fn covering_empty_is_none() {
        assert!(DateRange::covering(std::iter::empty(), 3).is_none());
    }
}
