// TerraLens - core/score.rs
//
// Quality scoring engine: turns aggregate error/warning counts into a
// 0-100 health score, a letter grade, and textual recommendations.
// Stateless, no I/O; recomputed in full on every statistics update.

use crate::core::model::{Grade, LogStats, QualityScore, ScoreBreakdown};
use crate::util::constants::{ERROR_PENALTY, GRADE_THRESHOLDS, WARNING_PENALTY};

/// Compute the quality score from aggregate counts.
///
/// `score = clamp(100 - errors*10 - warnings*2, 0, 100)`. Negative inputs
/// are clamped to zero before computing penalties, guarding against upstream
/// aggregation bugs rather than rejecting them.
pub fn score(total_entries: i64, error_count: i64, warning_count: i64) -> QualityScore {
    let total_entries = total_entries.max(0) as u32;
    let error_count = error_count.max(0) as u32;
    let warning_count = warning_count.max(0) as u32;

    let error_penalty = error_count * ERROR_PENALTY;
    let warning_penalty = warning_count * WARNING_PENALTY;
    let value = 100i64 - i64::from(error_penalty) - i64::from(warning_penalty);
    let score = value.clamp(0, 100) as u8;

    QualityScore {
        score,
        grade: grade_for(score),
        breakdown: ScoreBreakdown {
            base: 100,
            error_penalty,
            warning_penalty,
            error_count,
            warning_count,
            total_entries,
        },
        recommendations: recommendations(total_entries, error_count, warning_count),
    }
}

/// Score directly from collected statistics.
pub fn score_stats(stats: &LogStats) -> QualityScore {
    score(
        stats.total_entries as i64,
        stats.error_count() as i64,
        stats.warning_count() as i64,
    )
}

/// Letter grade by inclusive lower bound.
fn grade_for(score: u8) -> Grade {
    for &(threshold, letter) in &GRADE_THRESHOLDS {
        if score >= threshold {
            return match letter {
                'A' => Grade::A,
                'B' => Grade::B,
                'C' => Grade::C,
                _ => Grade::D,
            };
        }
    }
    Grade::F
}

/// Build the recommendation list in fixed order.
///
/// The positive acknowledgment requires data; with no entries at all the
/// no-data prompt fires instead, so the list is never empty.
fn recommendations(total_entries: u32, error_count: u32, warning_count: u32) -> Vec<String> {
    let mut out = Vec::new();

    if error_count > 0 {
        out.push(format!("Fix {error_count} configuration errors"));
    }
    if warning_count > 0 {
        out.push(format!("Address {warning_count} warnings"));
    }
    if out.is_empty() && total_entries > 0 {
        out.push("Configuration looks healthy - no errors or warnings detected".to_string());
    }
    if total_entries == 0 {
        out.push("No log entries loaded - upload an execution log to analyse".to_string());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_prompts_instead_of_acknowledging() {
        let result = score(0, 0, 0);
        assert_eq!(result.score, 100);
        assert_eq!(result.grade, Grade::A);
        assert_eq!(result.recommendations.len(), 1);
        assert!(result.recommendations[0].contains("No log entries"));
    }

    #[test]
    fn test_penalties_and_grade() {
        // 100 - 2*10 - 1*2 = 78 -> C
        let result = score(10, 2, 1);
        assert_eq!(result.score, 78);
        assert_eq!(result.grade, Grade::C);
        assert_eq!(result.breakdown.error_penalty, 20);
        assert_eq!(result.breakdown.warning_penalty, 2);
        assert_eq!(
            result.recommendations,
            vec![
                "Fix 2 configuration errors".to_string(),
                "Address 1 warnings".to_string(),
            ]
        );
    }

    #[test]
    fn test_clean_run_acknowledged() {
        let result = score(10, 0, 0);
        assert_eq!(result.score, 100);
        assert_eq!(result.grade, Grade::A);
        assert_eq!(result.recommendations.len(), 1);
        assert!(result.recommendations[0].contains("healthy"));
    }

    #[test]
    fn test_score_floors_at_zero() {
        let result = score(100, 15, 0);
        assert_eq!(result.score, 0);
        assert_eq!(result.grade, Grade::F);
    }

    #[test]
    fn test_negative_counts_clamped() {
        let result = score(-5, -3, -1);
        assert_eq!(result.score, 100);
        assert_eq!(result.breakdown.error_count, 0);
        // Clamped total of zero means the no-data prompt fires.
        assert!(result.recommendations[0].contains("No log entries"));
    }

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(score(10, 1, 0).grade, Grade::A); // 90
        assert_eq!(score(10, 2, 0).grade, Grade::B); // 80
        assert_eq!(score(10, 3, 0).grade, Grade::C); // 70
        assert_eq!(score(10, 4, 0).grade, Grade::D); // 60
        assert_eq!(score(10, 4, 1).grade, Grade::F); // 58
    }
}
