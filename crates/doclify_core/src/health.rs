//! Document health score.

use crate::finding::Summary;

/// Computes a 0-100 health score from error and warning counts.
///
/// Errors cost 25 points, warnings 8, clamped to the 0-100 range. The score
/// is informational only; pass/fail policy belongs to the caller.
pub fn compute_health_score(summary: &Summary) -> u8 {
    let raw = 100i64 - (summary.errors as i64 * 25) - (summary.warnings as i64 * 8);
    raw.clamp(0, 100) as u8
}
