use super::domain::{Interview, QaEntry};

/// Highest score a single answer can receive.
pub const MAX_SCORE: u8 = 10;

/// Arithmetic mean of the entry scores, or `None` for an empty QA set.
pub fn mean_score(entries: &[QaEntry]) -> Option<f64> {
    if entries.is_empty() {
        return None;
    }

    let total: u32 = entries.iter().map(|entry| u32::from(entry.score)).sum();
    Some(f64::from(total) / entries.len() as f64)
}

/// Refresh the overall score from the QA set.
///
/// An empty QA set leaves the previous overall score in place rather than resetting it.
pub fn recompute_overall(mut interview: Interview) -> Interview {
    if let Some(mean) = mean_score(&interview.qa_set) {
        interview.overall_score = Some(mean);
    }
    interview
}
