use crate::error::{Error, Result};

pub const DEFAULT_COLLECTION: &str = "credit_decision_memory";
pub const DEFAULT_TOP_K: usize = 10;
pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Connection settings shared by the ingestion and query paths. The same
/// collection name must be used by both, so it lives here rather than on the
/// command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub index_url: String,
    pub api_key: Option<String>,
    pub collection: String,
    pub default_top_k: usize,
    pub batch_size: usize,
    pub timeout_secs: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let index_url = std::env::var("QDRANT_URL").map_err(|_| {
            Error::Config("QDRANT_URL must be set to the vector index endpoint".to_string())
        })?;
        let api_key = std::env::var("QDRANT_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());
        let collection =
            std::env::var("COLLECTION_NAME").unwrap_or_else(|_| DEFAULT_COLLECTION.to_string());

        let default_top_k = match std::env::var("DEFAULT_TOP_K") {
            Ok(raw) => parse_positive("DEFAULT_TOP_K", &raw)?,
            Err(_) => DEFAULT_TOP_K,
        };
        let batch_size = match std::env::var("BATCH_SIZE") {
            Ok(raw) => parse_positive("BATCH_SIZE", &raw)?,
            Err(_) => DEFAULT_BATCH_SIZE,
        };

        Ok(Settings {
            index_url,
            api_key,
            collection,
            default_top_k,
            batch_size,
            timeout_secs: REQUEST_TIMEOUT_SECS,
        })
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<usize> {
    match raw.parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(Error::Config(format!(
            "{name} must be a positive integer, got {raw:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_positive_accepts_valid_values() {
        assert_eq!(parse_positive("DEFAULT_TOP_K", "25").unwrap(), 25);
    }

    #[test]
    fn parse_positive_rejects_zero_and_garbage() {
        assert!(parse_positive("BATCH_SIZE", "0").is_err());
        assert!(parse_positive("BATCH_SIZE", "many").is_err());
        assert!(parse_positive("BATCH_SIZE", "-5").is_err());
    }
}
