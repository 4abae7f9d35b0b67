use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::ApplicationRecord;

/// One row of the historical loan corpus CSV: the shared application schema
/// plus the outcome bookkeeping columns used for labeling.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoricalRow {
    pub application_id: String,
    pub application_date: NaiveDate,
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
    pub fraud_flag: u8,
    #[serde(default)]
    pub fraud_type: Option<String>,
    #[serde(default)]
    pub time_to_default_months: Option<i32>,
}

impl HistoricalRow {
    pub fn fraud(&self) -> bool {
        self.fraud_flag != 0
    }

    pub fn application(&self) -> ApplicationRecord {
        ApplicationRecord {
            monthly_income: self.monthly_income,
            existing_emis_monthly: self.existing_emis_monthly,
            debt_to_income_ratio: self.debt_to_income_ratio,
            loan_amount_requested: self.loan_amount_requested,
            loan_tenure_months: self.loan_tenure_months,
            interest_rate_offered: self.interest_rate_offered,
            cibil_score: self.cibil_score,
            applicant_age: self.applicant_age,
            number_of_dependents: self.number_of_dependents,
            employment_status: self.employment_status.clone(),
            property_ownership_status: self.property_ownership_status.clone(),
            loan_type: self.loan_type.clone(),
            purpose_of_loan: self.purpose_of_loan.clone(),
        }
    }
}

pub fn load_corpus(path: &Path) -> Result<Vec<HistoricalRow>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|err| Error::Schema(format!("failed to open {}: {err}", path.display())))?;

    let mut rows = Vec::new();
    for (line, result) in reader.deserialize::<HistoricalRow>().enumerate() {
        let row = result
            .map_err(|err| Error::Schema(format!("malformed corpus row {}: {err}", line + 1)))?;
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "application_id,application_date,monthly_income,existing_emis_monthly,\
debt_to_income_ratio,loan_amount_requested,loan_tenure_months,interest_rate_offered,cibil_score,\
applicant_age,number_of_dependents,employment_status,property_ownership_status,loan_type,\
purpose_of_loan,fraud_flag,fraud_type,time_to_default_months";

    fn parse(rows: &str) -> std::result::Result<Vec<HistoricalRow>, csv::Error> {
        let data = format!("{HEADER}\n{rows}");
        csv::Reader::from_reader(data.as_bytes())
            .deserialize::<HistoricalRow>()
            .collect()
    }

    #[test]
    fn parses_a_complete_row() {
        let rows = parse(
            "APP-001,2023-04-10,5000,1200,0.5,20000,36,12.5,680,34,2,\
Salaried,Rented,Personal Loan,Education,0,,",
        )
        .unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.application_id, "APP-001");
        assert!(!row.fraud());
        assert_eq!(row.fraud_type, None);
        assert_eq!(row.time_to_default_months, None);
        assert_eq!(row.application().loan_type, "Personal Loan");
    }

    #[test]
    fn parses_fraud_and_default_columns() {
        let rows = parse(
            "APP-002,2022-11-01,3000,800,0.6,15000,24,14.0,590,41,3,\
Self-Employed,Rented,Auto Loan,Vehicle,1,Identity Theft,3",
        )
        .unwrap();

        let row = &rows[0];
        assert!(row.fraud());
        assert_eq!(row.fraud_type.as_deref(), Some("Identity Theft"));
        assert_eq!(row.time_to_default_months, Some(3));
    }

    #[test]
    fn rejects_a_row_with_a_non_numeric_income() {
        let result = parse(
            "APP-003,2023-04-10,plenty,1200,0.5,20000,36,12.5,680,34,2,\
Salaried,Rented,Personal Loan,Education,0,,",
        );
        assert!(result.is_err());
    }
}
