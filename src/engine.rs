use crate::encoder::FittedEncoder;
use crate::error::Result;
use crate::index::VectorIndexClient;
use crate::models::{ApplicationRecord, DecisionSummary, OutcomeLabel, RiskSegment, ScoredCase};

/// Policy thresholds for the informational risk tier, applied to the
/// defaulted percentage of the retrieved neighborhood.
pub const HIGH_RISK_DEFAULTED_PCT: f64 = 60.0;
pub const MODERATE_RISK_DEFAULTED_PCT: f64 = 30.0;

/// Orchestrates a live assessment: encode the application, retrieve the
/// nearest historical cases, and aggregate their outcomes. Holds only the
/// frozen encoder and the index handle, so shared read-only use across tasks
/// is safe.
pub struct SimilarityEngine {
    encoder: FittedEncoder,
    index: VectorIndexClient,
}

impl SimilarityEngine {
    pub fn new(encoder: FittedEncoder, index: VectorIndexClient) -> Self {
        SimilarityEngine { encoder, index }
    }

    pub async fn assess(
        &self,
        application: &ApplicationRecord,
        k: usize,
    ) -> Result<DecisionSummary> {
        let vector = self.encoder.transform(application);
        let cases = self.index.query(&vector, k).await?;
        Ok(summarize(&cases))
    }
}

/// Aggregate a retrieved neighborhood into the decision summary. An empty
/// neighborhood is a valid zero-filled summary, distinct from a retrieval
/// failure.
pub fn summarize(cases: &[ScoredCase]) -> DecisionSummary {
    let total = cases.len();
    if total == 0 {
        return DecisionSummary {
            total_cases: 0,
            repaid_pct: 0.0,
            defaulted_pct: 0.0,
            in_progress_pct: 0.0,
            fraud_cases: 0,
            avg_similarity: 0.0,
            risk_segment: RiskSegment::Low,
            cases: Vec::new(),
        };
    }

    let count_label = |label: OutcomeLabel| {
        cases
            .iter()
            .filter(|case| case.payload.loan_outcome == label)
            .count()
    };
    let pct = |count: usize| count as f64 / total as f64 * 100.0;

    let defaulted_pct = pct(count_label(OutcomeLabel::Defaulted));
    let fraud_cases = cases.iter().filter(|case| case.payload.fraud_flag).count();
    let avg_similarity =
        cases.iter().map(|case| case.score as f64).sum::<f64>() / total as f64;

    DecisionSummary {
        total_cases: total,
        repaid_pct: pct(count_label(OutcomeLabel::Repaid)),
        defaulted_pct,
        in_progress_pct: pct(count_label(OutcomeLabel::InProgress)),
        fraud_cases,
        avg_similarity,
        risk_segment: risk_segment(defaulted_pct),
        cases: cases.iter().map(|case| case.payload.clone()).collect(),
    }
}

pub fn risk_segment(defaulted_pct: f64) -> RiskSegment {
    if defaulted_pct > HIGH_RISK_DEFAULTED_PCT {
        RiskSegment::High
    } else if defaulted_pct > MODERATE_RISK_DEFAULTED_PCT {
        RiskSegment::Moderate
    } else {
        RiskSegment::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CasePayload;

    fn case(outcome: OutcomeLabel, fraud: bool, score: f32) -> ScoredCase {
        ScoredCase {
            payload: CasePayload {
                application_id: "APP-000".to_string(),
                loan_outcome: outcome,
                fraud_flag: fraud,
                fraud_type: None,
                loan_type: "Personal Loan".to_string(),
                purpose_of_loan: "Education".to_string(),
                time_to_default_months: None,
            },
            score,
        }
    }

    #[test]
    fn empty_neighborhood_yields_a_zero_summary() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_cases, 0);
        assert_eq!(summary.repaid_pct, 0.0);
        assert_eq!(summary.defaulted_pct, 0.0);
        assert_eq!(summary.in_progress_pct, 0.0);
        assert_eq!(summary.fraud_cases, 0);
        assert_eq!(summary.avg_similarity, 0.0);
        assert_eq!(summary.risk_segment, RiskSegment::Low);
        assert!(summary.cases.is_empty());
    }

    #[test]
    fn three_case_neighborhood_matches_expected_shares() {
        let cases = vec![
            case(OutcomeLabel::Repaid, false, 0.9),
            case(OutcomeLabel::Defaulted, true, 0.8),
            case(OutcomeLabel::Defaulted, false, 0.7),
        ];
        let summary = summarize(&cases);

        assert_eq!(summary.total_cases, 3);
        assert!((summary.defaulted_pct - 66.6666).abs() < 0.01);
        assert!((summary.repaid_pct - 33.3333).abs() < 0.01);
        assert_eq!(summary.fraud_cases, 1);
        assert!((summary.avg_similarity - 0.8).abs() < 1e-6);
        assert_eq!(summary.risk_segment, RiskSegment::High);
    }

    #[test]
    fn percentages_sum_to_one_hundred_when_cases_exist() {
        let cases = vec![
            case(OutcomeLabel::Repaid, false, 0.5),
            case(OutcomeLabel::InProgress, false, 0.4),
            case(OutcomeLabel::Defaulted, false, 0.3),
            case(OutcomeLabel::InProgress, false, 0.2),
            case(OutcomeLabel::Repaid, false, 0.1),
            case(OutcomeLabel::Repaid, false, 0.1),
            case(OutcomeLabel::Defaulted, false, 0.1),
        ];
        let summary = summarize(&cases);
        let sum = summary.repaid_pct + summary.defaulted_pct + summary.in_progress_pct;
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn risk_tiers_follow_the_policy_thresholds() {
        assert_eq!(risk_segment(75.0), RiskSegment::High);
        assert_eq!(risk_segment(60.0), RiskSegment::Moderate);
        assert_eq!(risk_segment(45.0), RiskSegment::Moderate);
        assert_eq!(risk_segment(30.0), RiskSegment::Low);
        assert_eq!(risk_segment(10.0), RiskSegment::Low);
    }
}
