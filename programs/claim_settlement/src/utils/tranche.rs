use crate::error::ScheduleError;

/**
 * Validates a tranche threshold ladder
 *
 * Rules:
 * - At least one threshold
 * - Thresholds are non-decreasing
 * - Every threshold after the first is strictly positive
 *
 * Registration rejects an invalid ladder; a claim re-checks the stored
 * ladder and treats a failure as a corrupt record.
 */
pub fn validate_schedule(schedule: &[u64]) -> Result<(), ScheduleError> {
    if schedule.is_empty() {
        return Err(ScheduleError::InvalidSchedule(
            "schedule must contain at least one threshold".to_string(),
        ));
    }
    for (i, window) in schedule.windows(2).enumerate() {
        if window[1] < window[0] {
            return Err(ScheduleError::InvalidSchedule(format!(
                "threshold {} ({}) is lower than threshold {} ({})",
                i + 1,
                window[1],
                i,
                window[0]
            )));
        }
    }
    if let Some(pos) = schedule.iter().skip(1).position(|t| *t == 0) {
        return Err(ScheduleError::InvalidSchedule(format!(
            "threshold {} must be greater than 0",
            pos + 1
        )));
    }
    Ok(())
}

/**
 * Number of leading tranches qualified by an engagement value
 *
 * Returns the largest `k` such that `metric >= schedule[i]` for all `i < k`.
 * On a non-decreasing ladder this is a prefix, so the first threshold the
 * metric misses ends the scan.
 */
pub fn qualified_count(metric: u64, schedule: &[u64]) -> u64 {
    schedule.iter().take_while(|threshold| metric >= **threshold).count() as u64
}

/// Result of evaluating a claim against its threshold ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrancheEvaluation {
    /// Tranches cleared by the metric
    pub qualified: u64,
    /// Tranches already paid before this claim
    pub already_paid: u64,
}

impl TrancheEvaluation {
    /// Tranches that still have to be distributed
    /// - Never negative: previously paid tranches are never paid again
    pub fn increment(&self) -> u64 {
        self.qualified.saturating_sub(self.already_paid)
    }

    /// Tranche indices to distribute, in ascending order
    pub fn pending_range(&self) -> std::ops::Range<u64> {
        self.already_paid..self.qualified.max(self.already_paid)
    }
}

pub fn evaluate(metric: u64, schedule: &[u64], already_paid: u64) -> TrancheEvaluation {
    TrancheEvaluation {
        qualified: qualified_count(metric, schedule),
        already_paid,
    }
}

/// First threshold above what has already been paid, for operator diagnostics
pub fn next_threshold(schedule: &[u64], already_paid: u64) -> Option<u64> {
    usize::try_from(already_paid)
        .ok()
        .and_then(|index| schedule.get(index).copied())
}
