use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A structured loan application. Historical and live records share this
/// schema; the encoder relies on every field being present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicationRecord {
    pub monthly_income: f64,
    pub existing_emis_monthly: f64,
    pub debt_to_income_ratio: f64,
    pub loan_amount_requested: f64,
    pub loan_tenure_months: f64,
    pub interest_rate_offered: f64,
    pub cibil_score: f64,
    pub applicant_age: f64,
    pub number_of_dependents: f64,
    pub employment_status: String,
    pub property_ownership_status: String,
    pub loan_type: String,
    pub purpose_of_loan: String,
}

pub const NUMERIC_FIELDS: [&str; 9] = [
    "monthly_income",
    "existing_emis_monthly",
    "debt_to_income_ratio",
    "loan_amount_requested",
    "loan_tenure_months",
    "interest_rate_offered",
    "cibil_score",
    "applicant_age",
    "number_of_dependents",
];

pub const CATEGORICAL_FIELDS: [&str; 4] = [
    "employment_status",
    "property_ownership_status",
    "loan_type",
    "purpose_of_loan",
];

impl ApplicationRecord {
    /// Numeric field values in the fixed `NUMERIC_FIELDS` order.
    pub fn numeric_values(&self) -> [f64; 9] {
        [
            self.monthly_income,
            self.existing_emis_monthly,
            self.debt_to_income_ratio,
            self.loan_amount_requested,
            self.loan_tenure_months,
            self.interest_rate_offered,
            self.cibil_score,
            self.applicant_age,
            self.number_of_dependents,
        ]
    }

    /// Categorical field values in the fixed `CATEGORICAL_FIELDS` order.
    pub fn categorical_values(&self) -> [&str; 4] {
        [
            &self.employment_status,
            &self.property_ownership_status,
            &self.loan_type,
            &self.purpose_of_loan,
        ]
    }
}

/// Observed outcome of a historical loan. For a live application this is the
/// unknown quantity being estimated from the neighborhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeLabel {
    Repaid,
    Defaulted,
    InProgress,
}

impl OutcomeLabel {
    pub fn as_wire(&self) -> &'static str {
        match self {
            OutcomeLabel::Repaid => "Repaid",
            OutcomeLabel::Defaulted => "Defaulted",
            OutcomeLabel::InProgress => "In_Progress",
        }
    }

    /// Payload strings other than the two terminal outcomes bucket into
    /// InProgress rather than failing the whole result set.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "Repaid" => OutcomeLabel::Repaid,
            "Defaulted" => OutcomeLabel::Defaulted,
            _ => OutcomeLabel::InProgress,
        }
    }
}

impl Serialize for OutcomeLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for OutcomeLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(OutcomeLabel::from_wire(&value))
    }
}

/// Metadata stored alongside each indexed vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CasePayload {
    pub application_id: String,
    pub loan_outcome: OutcomeLabel,
    #[serde(default)]
    pub fraud_flag: bool,
    #[serde(default)]
    pub fraud_type: Option<String>,
    pub loan_type: String,
    pub purpose_of_loan: String,
    #[serde(default)]
    pub time_to_default_months: Option<i32>,
}

/// One point in the vector index. Re-upserting an id overwrites the stored
/// vector and payload for that id.
#[derive(Debug, Clone, Serialize)]
pub struct IndexedPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: CasePayload,
}

/// One retrieved neighbor, paired with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredCase {
    pub payload: CasePayload,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskSegment {
    Low,
    Moderate,
    High,
}

impl std::fmt::Display for RiskSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskSegment::Low => "Low",
            RiskSegment::Moderate => "Moderate",
            RiskSegment::High => "High",
        };
        write!(f, "{label}")
    }
}

/// Aggregate view over a retrieved neighborhood. Derived per query, never
/// persisted.
#[derive(Debug, Clone)]
pub struct DecisionSummary {
    pub total_cases: usize,
    pub repaid_pct: f64,
    pub defaulted_pct: f64,
    pub in_progress_pct: f64,
    pub fraud_cases: usize,
    pub avg_similarity: f64,
    pub risk_segment: RiskSegment,
    pub cases: Vec<CasePayload>,
}
