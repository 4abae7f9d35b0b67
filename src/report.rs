use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{ApplicationRecord, DecisionSummary};

const HIGH_DEFAULT_SIGNAL_PCT: f64 = 50.0;
const ELEVATED_DTI_SIGNAL: f64 = 0.4;
const STRONG_CREDIT_SCORE: f64 = 750.0;

pub fn risk_signals(application: &ApplicationRecord, summary: &DecisionSummary) -> Vec<String> {
    let mut signals = Vec::new();

    if summary.defaulted_pct > HIGH_DEFAULT_SIGNAL_PCT {
        signals.push("High default rate among similar historical cases.".to_string());
    }
    if summary.fraud_cases > 0 {
        signals.push("Presence of fraud cases in the similarity set.".to_string());
    }
    if application.debt_to_income_ratio > ELEVATED_DTI_SIGNAL {
        signals.push("Elevated debt-to-income ratio compared to peer cases.".to_string());
    }

    signals
}

pub fn positive_signals(application: &ApplicationRecord, summary: &DecisionSummary) -> Vec<String> {
    let mut signals = Vec::new();

    if application.cibil_score >= STRONG_CREDIT_SCORE {
        signals.push("Strong credit score relative to similar applicants.".to_string());
    }
    if application.property_ownership_status == "Owned" {
        signals
            .push("Property ownership associated with improved repayment resilience.".to_string());
    }
    if summary.repaid_pct > summary.defaulted_pct {
        signals.push("Majority of similar cases resulted in successful repayment.".to_string());
    }

    signals
}

pub fn build_report(
    application: &ApplicationRecord,
    summary: &DecisionSummary,
    generated_at: DateTime<Utc>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Credit Decision Memory Report");
    let _ = writeln!(
        output,
        "Generated on {}",
        generated_at.format("%Y-%m-%d %H:%M")
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Executive Summary");
    let _ = writeln!(
        output,
        "This report provides similarity-based decision support for a newly submitted loan \
application. The system does not automate approval or rejection. Instead, it retrieves \
historical loan cases with comparable characteristics and summarizes their observed outcomes \
to assist human decision-makers."
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Application Snapshot");
    let _ = writeln!(output, "| Attribute | Value |");
    let _ = writeln!(output, "| --- | --- |");
    let _ = writeln!(
        output,
        "| Monthly Income | ${:.0} |",
        application.monthly_income
    );
    let _ = writeln!(
        output,
        "| Existing Monthly EMIs | ${:.0} |",
        application.existing_emis_monthly
    );
    let _ = writeln!(
        output,
        "| Debt-to-Income Ratio | {:.2} |",
        application.debt_to_income_ratio
    );
    let _ = writeln!(
        output,
        "| Loan Amount Requested | ${:.0} |",
        application.loan_amount_requested
    );
    let _ = writeln!(
        output,
        "| Loan Tenure (Months) | {:.0} |",
        application.loan_tenure_months
    );
    let _ = writeln!(
        output,
        "| Interest Rate Offered | {:.1}% |",
        application.interest_rate_offered
    );
    let _ = writeln!(output, "| Credit Score | {:.0} |", application.cibil_score);
    let _ = writeln!(
        output,
        "| Applicant Age | {:.0} |",
        application.applicant_age
    );
    let _ = writeln!(
        output,
        "| Number of Dependents | {:.0} |",
        application.number_of_dependents
    );
    let _ = writeln!(
        output,
        "| Employment Status | {} |",
        application.employment_status
    );
    let _ = writeln!(
        output,
        "| Property Ownership | {} |",
        application.property_ownership_status
    );
    let _ = writeln!(output, "| Loan Type | {} |", application.loan_type);
    let _ = writeln!(
        output,
        "| Purpose of Loan | {} |",
        application.purpose_of_loan
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Similarity Methodology");
    let _ = writeln!(
        output,
        "Historical loan cases were retrieved based on vector similarity across financial and \
contextual attributes, including income level, loan amount, credit score, loan tenure, \
employment status, property ownership, and loan purpose. Comparisons are made against \
economically and behaviorally comparable cases rather than abstract predictive scores."
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Historical Outcome Analysis");
    if summary.total_cases == 0 {
        let _ = writeln!(
            output,
            "No comparable historical cases were found in the index."
        );
    } else {
        let _ = writeln!(
            output,
            "The system identified {} historical loan cases with similar characteristics. \
Among these cases, {:.1}% were successfully repaid, {:.1}% resulted in default, and {:.1}% \
are still in progress. {} cases were associated with confirmed fraud signals.",
            summary.total_cases,
            summary.repaid_pct,
            summary.defaulted_pct,
            summary.in_progress_pct,
            summary.fraud_cases
        );
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "Observed risk segment: **{}** (average similarity {:.3}).",
            summary.risk_segment, summary.avg_similarity
        );
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Observed Risk and Positive Signals");
    let _ = writeln!(output, "**Risk Signals**");
    let risks = risk_signals(application, summary);
    if risks.is_empty() {
        let _ = writeln!(output, "- No dominant risk signals identified.");
    } else {
        for signal in &risks {
            let _ = writeln!(output, "- {signal}");
        }
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "**Positive Signals**");
    let positives = positive_signals(application, summary);
    if positives.is_empty() {
        let _ = writeln!(output, "- No strong positive signals identified.");
    } else {
        for signal in &positives {
            let _ = writeln!(output, "- {signal}");
        }
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Decision Support Statement");
    let _ = writeln!(
        output,
        "This similarity-based assessment suggests how comparable loans have historically \
performed under similar conditions. It is intended to support, not replace, human judgment. \
Final credit decisions should incorporate institutional policies, regulatory requirements, \
and current economic context."
    );
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "_Disclaimer: This report is generated using historical similarity analysis and does \
not constitute a predictive credit score or automated decision._"
    );

    output
}
