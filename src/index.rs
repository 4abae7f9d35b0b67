use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::models::{CasePayload, IndexedPoint, ScoredCase};

#[derive(Serialize)]
struct SearchRequest {
    vector: Vec<f32>,
    limit: usize,
    with_payload: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<SearchEntry>,
}

#[derive(Deserialize)]
struct SearchEntry {
    score: f32,
    payload: Option<serde_json::Value>,
}

/// Client for the Qdrant-compatible REST API of the vector index. Holds the
/// vector dimensionality the collection was built with and refuses requests
/// that do not match it, so encoder/index version skew fails fast instead of
/// producing silently wrong neighborhoods.
pub struct VectorIndexClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    collection: String,
    dimension: usize,
    batch_size: usize,
}

impl VectorIndexClient {
    pub fn new(settings: &Settings, dimension: usize) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|err| Error::Config(format!("failed to build http client: {err}")))?;

        Ok(VectorIndexClient {
            http,
            base_url: settings.index_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            collection: settings.collection.clone(),
            dimension,
            batch_size: settings.batch_size,
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    fn ensure_dimension(&self, actual: usize) -> Result<()> {
        if actual != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual,
            });
        }
        Ok(())
    }

    /// Create the collection with cosine distance if it does not exist yet.
    pub async fn ensure_collection(&self) -> Result<()> {
        let url = format!("{}/collections/{}", self.base_url, self.collection);
        let body = json!({
            "vectors": {
                "size": self.dimension,
                "distance": "Cosine"
            }
        });

        let response = self.authorized(self.http.put(url)).json(&body).send().await?;
        match response.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::CONFLICT => Ok(()),
            _ => Err(rejection("create collection", response).await),
        }
    }

    /// Upsert points in bounded batches, waiting for each batch to land.
    /// Overwrites per id; returns the number of distinct points written.
    pub async fn upsert(&self, points: Vec<IndexedPoint>) -> Result<usize> {
        for point in &points {
            self.ensure_dimension(point.vector.len())?;
        }

        let points = dedupe_latest(points);
        let total = points.len();
        let url = format!("{}/collections/{}/points", self.base_url, self.collection);

        for batch in points.chunks(self.batch_size) {
            let body = json!({ "points": batch });
            let response = self
                .authorized(self.http.post(&url))
                .query(&[("wait", "true")])
                .json(&body)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(rejection("upsert", response).await);
            }
        }

        Ok(total)
    }

    /// Top-K similarity query. An empty collection returns an empty list, not
    /// an error.
    pub async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredCase>> {
        if k == 0 {
            return Err(Error::Schema("query limit k must be positive".to_string()));
        }
        self.ensure_dimension(vector.len())?;

        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection
        );
        let request = SearchRequest {
            vector: vector.to_vec(),
            limit: k,
            with_payload: true,
        };

        let response = self
            .authorized(self.http.post(url))
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection("search", response).await);
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|err| Error::Retrieval(format!("malformed search response: {err}")))?;
        parse_hits(body)
    }
}

async fn rejection(operation: &str, response: Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Error::Retrieval(format!("{operation} rejected ({status}): {body}"))
}

/// Keep only the last occurrence of each id, preserving first-seen order.
/// Mirrors the index's own overwrite semantics for ids repeated across
/// requests.
fn dedupe_latest(points: Vec<IndexedPoint>) -> Vec<IndexedPoint> {
    let mut slot_by_id: HashMap<u64, usize> = HashMap::new();
    let mut deduped: Vec<IndexedPoint> = Vec::with_capacity(points.len());

    for point in points {
        match slot_by_id.get(&point.id) {
            Some(&slot) => deduped[slot] = point,
            None => {
                slot_by_id.insert(point.id, deduped.len());
                deduped.push(point);
            }
        }
    }

    deduped
}

fn parse_hits(response: SearchResponse) -> Result<Vec<ScoredCase>> {
    let mut hits = Vec::with_capacity(response.result.len());

    for entry in response.result {
        let payload = entry
            .payload
            .ok_or_else(|| Error::Retrieval("search hit is missing its payload".to_string()))?;
        let payload: CasePayload = serde_json::from_value(payload)
            .map_err(|err| Error::Retrieval(format!("malformed search payload: {err}")))?;
        hits.push(ScoredCase {
            payload,
            score: entry.score,
        });
    }

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutcomeLabel;

    fn test_settings() -> Settings {
        Settings {
            index_url: "http://localhost:6333/".to_string(),
            api_key: None,
            collection: "credit_decision_memory".to_string(),
            default_top_k: 10,
            batch_size: 500,
            timeout_secs: 60,
        }
    }

    fn point(id: u64, purpose: &str) -> IndexedPoint {
        IndexedPoint {
            id,
            vector: vec![0.0; 4],
            payload: CasePayload {
                application_id: format!("APP-{id:03}"),
                loan_outcome: OutcomeLabel::Repaid,
                fraud_flag: false,
                fraud_type: None,
                loan_type: "Personal Loan".to_string(),
                purpose_of_loan: purpose.to_string(),
                time_to_default_months: None,
            },
        }
    }

    #[test]
    fn dimension_guard_rejects_mismatched_vectors() {
        let client = VectorIndexClient::new(&test_settings(), 14).unwrap();
        assert!(client.ensure_dimension(14).is_ok());
        let err = client.ensure_dimension(12).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 14,
                actual: 12
            }
        ));
    }

    #[test]
    fn duplicate_ids_keep_the_latest_payload() {
        let points = vec![point(1, "Education"), point(2, "Vehicle"), point(1, "Business")];
        let deduped = dedupe_latest(points);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].id, 1);
        assert_eq!(deduped[0].payload.purpose_of_loan, "Business");
        assert_eq!(deduped[1].id, 2);
    }

    #[test]
    fn parse_hits_orders_by_descending_score() {
        let body = r#"{
            "result": [
                {"score": 0.71, "payload": {"application_id": "APP-001", "loan_outcome": "Repaid", "loan_type": "Personal Loan", "purpose_of_loan": "Education"}},
                {"score": 0.93, "payload": {"application_id": "APP-002", "loan_outcome": "Defaulted", "loan_type": "Auto Loan", "purpose_of_loan": "Vehicle"}}
            ]
        }"#;
        let response: SearchResponse = serde_json::from_str(body).unwrap();
        let hits = parse_hits(response).unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].payload.application_id, "APP-002");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn parse_hits_buckets_unknown_outcomes_permissively() {
        let body = r#"{
            "result": [
                {"score": 0.5, "payload": {"application_id": "APP-003", "loan_outcome": "Not_Applicable", "loan_type": "Home Loan", "purpose_of_loan": "Purchase"}}
            ]
        }"#;
        let response: SearchResponse = serde_json::from_str(body).unwrap();
        let hits = parse_hits(response).unwrap();
        assert_eq!(hits[0].payload.loan_outcome, OutcomeLabel::InProgress);
    }

    #[test]
    fn parse_hits_rejects_a_hit_without_a_payload() {
        let body = r#"{"result": [{"score": 0.5, "payload": null}]}"#;
        let response: SearchResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            parse_hits(response),
            Err(Error::Retrieval(_))
        ));
    }
}
