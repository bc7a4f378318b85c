use chrono::{DateTime, Utc};

/// Submission facts that feed the lead score.
#[derive(Debug, Clone, Default)]
pub struct ScoreInput {
    pub budget_max: i64,
    /// None when the submitted deadline could not be parsed; scores as the
    /// distant-future branch, matching the reference behavior for garbage
    /// dates.
    pub deadline: Option<DateTime<Utc>>,
    pub feature_count: usize,
    pub add_on_count: usize,
    pub has_notes: bool,
    pub has_attachments: bool,
}

/// Compute a 0-100 lead score from budget, deadline urgency, scope
/// complexity and submission completeness. Each component is capped
/// independently (40 + 20 + 25 + 15 = 100), so the rounded sum never
/// exceeds 100.
pub fn calculate_lead_score(input: &ScoreInput) -> i32 {
    let mut score = 0.0_f64;

    // Budget (40% of total): linear up to $50k, saturating
    let budget_score = (input.budget_max as f64 / 50_000.0 * 40.0).min(40.0);
    score += budget_score;

    // Urgency (20%): whole days until deadline, ceiling. A deadline already
    // in the past still lands in the <=30 branch and earns full credit.
    let urgency_score = match input.deadline {
        Some(deadline) => {
            let millis = (deadline - Utc::now()).num_milliseconds();
            let days_until_deadline = (millis as f64 / 86_400_000.0).ceil();
            if days_until_deadline <= 30.0 {
                20.0
            } else if days_until_deadline <= 60.0 {
                15.0
            } else {
                10.0
            }
        }
        None => 10.0,
    };
    score += urgency_score;

    // Complexity (25%): 2 points per feature or add-on, capped
    let complexity_score = (((input.feature_count + input.add_on_count) * 2) as f64).min(25.0);
    score += complexity_score;

    // Completeness (15%): notes and attachments present
    let mut completeness_score = 0.0;
    if input.has_notes {
        completeness_score += 5.0;
    }
    if input.has_attachments {
        completeness_score += 10.0;
    }
    score += completeness_score;

    score.round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn days_from_now(days: i64) -> Option<DateTime<Utc>> {
        Some(Utc::now() + Duration::days(days))
    }

    #[test]
    fn test_saturated_budget_and_scope() {
        // $50k budget (40) + 10-day deadline (20) + 12 features (24, under
        // the 25 cap) + notes (5) + attachments (10)
        let input = ScoreInput {
            budget_max: 50_000,
            deadline: days_from_now(10),
            feature_count: 12,
            add_on_count: 0,
            has_notes: true,
            has_attachments: true,
        };
        assert_eq!(calculate_lead_score(&input), 99);
    }

    #[test]
    fn test_intake_reference_case() {
        // $15k budget (12) + 20-day deadline (20) + 4 features (8) +
        // notes and one attachment (15)
        let input = ScoreInput {
            budget_max: 15_000,
            deadline: days_from_now(20),
            feature_count: 4,
            add_on_count: 0,
            has_notes: true,
            has_attachments: true,
        };
        assert_eq!(calculate_lead_score(&input), 55);
    }

    #[test]
    fn test_components_cap_at_100() {
        let input = ScoreInput {
            budget_max: 1_000_000_000,
            deadline: days_from_now(1),
            feature_count: 50,
            add_on_count: 50,
            has_notes: true,
            has_attachments: true,
        };
        assert_eq!(calculate_lead_score(&input), 100);
    }

    #[test]
    fn test_urgency_tiers() {
        let base = ScoreInput {
            budget_max: 0,
            feature_count: 0,
            add_on_count: 0,
            has_notes: false,
            has_attachments: false,
            deadline: None,
        };
        let at = |days| ScoreInput {
            deadline: days_from_now(days),
            ..base.clone()
        };
        assert_eq!(calculate_lead_score(&at(10)), 20);
        assert_eq!(calculate_lead_score(&at(45)), 15);
        assert_eq!(calculate_lead_score(&at(90)), 10);
    }

    #[test]
    fn test_past_deadline_still_earns_full_urgency_credit() {
        // Documents the uncorrected reference behavior: negative days satisfy
        // the <=30 comparison.
        let input = ScoreInput {
            budget_max: 0,
            deadline: days_from_now(-14),
            feature_count: 0,
            add_on_count: 0,
            has_notes: false,
            has_attachments: false,
        };
        assert_eq!(calculate_lead_score(&input), 20);
    }

    #[test]
    fn test_unparseable_deadline_scores_distant_future() {
        let input = ScoreInput {
            budget_max: 0,
            deadline: None,
            feature_count: 0,
            add_on_count: 0,
            has_notes: false,
            has_attachments: false,
        };
        assert_eq!(calculate_lead_score(&input), 10);
    }

    #[test]
    fn test_partial_budget_is_linear() {
        let input = ScoreInput {
            budget_max: 25_000,
            deadline: days_from_now(90),
            feature_count: 0,
            add_on_count: 0,
            has_notes: false,
            has_attachments: false,
        };
        // 20 (budget) + 10 (urgency)
        assert_eq!(calculate_lead_score(&input), 30);
    }

    #[test]
    fn test_minimum_score() {
        let input = ScoreInput {
            budget_max: 0,
            deadline: days_from_now(90),
            feature_count: 0,
            add_on_count: 0,
            has_notes: false,
            has_attachments: false,
        };
        assert_eq!(calculate_lead_score(&input), 10);
    }
}
