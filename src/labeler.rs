use chrono::{Months, NaiveDate};

use crate::models::OutcomeLabel;

/// Canonical average month length used for day-to-month conversion, fixed so
/// labels are reproducible across runs and implementations.
pub const DAYS_PER_MONTH: f64 = 30.44;

/// A default observed within this many months of origination counts as an
/// early default.
pub const EARLY_DEFAULT_MONTHS: i32 = 6;

/// Elapsed loan age in fractional months between origination and the
/// reference date. Negative if the application postdates `as_of`.
pub fn loan_age_months(application_date: NaiveDate, as_of: NaiveDate) -> f64 {
    (as_of - application_date).num_days() as f64 / DAYS_PER_MONTH
}

/// Backshift an application date by whole months. Ingestion applies this
/// synthetic shift so a freshly generated corpus contains loans old enough to
/// have completed their term.
pub fn shift_back(date: NaiveDate, months: u32) -> NaiveDate {
    date - Months::new(months)
}

/// Derive the time-aware ground-truth outcome for a historical record. The
/// reference date is injected rather than read from the clock so labeling is
/// a deterministic function of its inputs.
///
/// Defaulted takes precedence: a fraudulent or early-defaulting loan is
/// Defaulted even when its age already exceeds the contractual tenure.
pub fn label_outcome(
    application_date: NaiveDate,
    tenure_months: f64,
    fraud_flag: bool,
    months_to_default: Option<i32>,
    as_of: NaiveDate,
) -> OutcomeLabel {
    let early_default = months_to_default.is_some_and(|months| months <= EARLY_DEFAULT_MONTHS);

    if fraud_flag || early_default {
        return OutcomeLabel::Defaulted;
    }

    if loan_age_months(application_date, as_of) >= tenure_months {
        return OutcomeLabel::Repaid;
    }

    OutcomeLabel::InProgress
}
