use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// One entry of the externally ranked candidate list, best match first.
#[derive(Debug, Clone, Deserialize)]
pub struct SimilarityCandidate {
    pub user_id: String,
    pub similarity: f64,
}

#[derive(Debug)]
pub enum SimilarityProviderError {
    Http(String),
    Decode(String),
}

impl std::fmt::Display for SimilarityProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimilarityProviderError::Http(msg) => write!(f, "HTTP error: {}", msg),
            SimilarityProviderError::Decode(msg) => write!(f, "Decode error: {}", msg),
        }
    }
}

impl std::error::Error for SimilarityProviderError {}

/// External embedding/vector lookup. An error here is always recoverable for
/// the matcher, which falls back to FIFO candidates.
#[async_trait]
pub trait SimilarityProvider: Send + Sync {
    async fn ranked_candidates(
        &self,
        user_id: &str,
        mode: &str,
        limit: usize,
    ) -> Result<Vec<SimilarityCandidate>, SimilarityProviderError>;
}

pub struct HttpSimilarityProvider {
    client: Client,
    base_url: String,
}

impl HttpSimilarityProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn from_env() -> Self {
        let base_url = std::env::var("SIMILARITY_API_URL")
            .expect("SIMILARITY_API_URL environment variable must be set");
        Self::new(base_url)
    }
}

#[async_trait]
impl SimilarityProvider for HttpSimilarityProvider {
    async fn ranked_candidates(
        &self,
        user_id: &str,
        mode: &str,
        limit: usize,
    ) -> Result<Vec<SimilarityCandidate>, SimilarityProviderError> {
        let url = format!("{}/similar", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("user_id", user_id),
                ("mode", mode),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| SimilarityProviderError::Http(e.to_string()))?
            .error_for_status()
            .map_err(|e| SimilarityProviderError::Http(e.to_string()))?;

        response
            .json::<Vec<SimilarityCandidate>>()
            .await
            .map_err(|e| SimilarityProviderError::Decode(e.to_string()))
    }
}
