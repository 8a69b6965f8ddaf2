//! Time-series accumulator.
//!
//! Single authority for merging yield points regardless of origin channel.
//! The accumulated sequence is always sorted ascending by date with no
//! duplicate dates, and `merge` is idempotent. The one case where the
//! sequence shrinks is the full reset on date regression: an incoming batch
//! whose newest date is older than the last committed date signals a job
//! restart, so the accumulator starts over from that batch.

use chrono::NaiveDate;

use crate::model::YieldPoint;

/// What one `merge` call did to the sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// The sequence was cleared before re-merging (restart detected).
    pub reset: bool,
    /// Points appended or inserted at new dates.
    pub inserted: usize,
    /// Points that overwrote an existing date with different values.
    pub updated: usize,
}

impl MergeReport {
    /// Whether the merge produced any observable change.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.reset || self.inserted > 0 || self.updated > 0
    }
}

/// Ordered, deduplicated yield-point sequence.
///
/// Holds no reference to network resources; both channels feed it through
/// the controller.
#[derive(Debug, Default)]
pub struct TimeSeriesAccumulator {
    points: Vec<YieldPoint>,
}

impl TimeSeriesAccumulator {
    /// Create an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// The committed sequence, sorted ascending by date.
    #[must_use]
    pub fn points(&self) -> &[YieldPoint] {
        &self.points
    }

    /// Number of committed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The last committed date, if any.
    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Drop all committed points.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Merge a batch of points from either channel.
    ///
    /// The batch is sorted by date first. New dates are inserted in sorted
    /// position; colliding dates are overwritten in place (last writer wins
    /// by arrival order). If the batch's newest date is older than the last
    /// committed date, the sequence is reset before re-merging.
    pub fn merge(&mut self, batch: &[YieldPoint]) -> MergeReport {
        let mut report = MergeReport::default();
        if batch.is_empty() {
            return report;
        }

        // Stable sort keeps arrival order among same-date entries, so the
        // last entry for a date within the batch wins.
        let mut incoming = batch.to_vec();
        incoming.sort_by_key(|p| p.date);

        if let (Some(newest), Some(committed)) = (incoming.last(), self.last_date())
            && newest.date < committed
        {
            self.points.clear();
            report.reset = true;
        }

        for point in incoming {
            match self.points.binary_search_by_key(&point.date, |p| p.date) {
                Ok(i) => {
                    if self.points[i] != point {
                        self.points[i] = point;
                        report.updated += 1;
                    }
                }
                Err(i) => {
                    self.points.insert(i, point);
                    report.inserted += 1;
                }
            }
        }

        report
    }
}
