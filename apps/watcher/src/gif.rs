//! Random novelty GIFs for the `/goose` command

use crate::config::GifConfig;
use rand::seq::IndexedRandom;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

const GIPHY_RANDOM_URL: &str = "https://api.giphy.com/v1/gifs/random";

#[derive(Debug, Deserialize)]
struct GiphyRandom {
    data: GiphyGif,
}

#[derive(Debug, Deserialize)]
struct GiphyGif {
    images: GiphyImages,
}

#[derive(Debug, Deserialize)]
struct GiphyImages {
    original: GiphyImage,
}

#[derive(Debug, Deserialize)]
struct GiphyImage {
    url: String,
}

#[derive(Debug)]
pub enum GifError {
    Client(String),
    Request(String),
    Response { status: u16 },
    Parse(String),
}

impl std::fmt::Display for GifError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GifError::Client(e) => write!(f, "HTTP client error: {}", e),
            GifError::Request(e) => write!(f, "Request error: {}", e),
            GifError::Response { status } => write!(f, "Giphy answered with HTTP {}", status),
            GifError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for GifError {}

pub struct GifSource {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    tag: String,
    fallback: Vec<String>,
}

impl GifSource {
    pub fn new(config: &GifConfig, api_key: Option<String>) -> Result<Self, GifError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GifError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: GIPHY_RANDOM_URL.to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            tag: config.tag.clone(),
            fallback: config.fallback_clips.clone(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// A clip URL from Giphy, or from the fallback list when Giphy is not
    /// configured or fails. `None` when neither has anything.
    pub async fn random_clip(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            match self.from_giphy(key).await {
                Ok(url) => return Some(url),
                Err(e) => warn!(error = %e, "Giphy lookup failed, using fallback clips"),
            }
        }

        self.fallback.choose(&mut rand::rng()).cloned()
    }

    async fn from_giphy(&self, key: &str) -> Result<String, GifError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("api_key", key), ("tag", self.tag.as_str()), ("rating", "g")])
            .send()
            .await
            .map_err(|e| GifError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GifError::Response {
                status: response.status().as_u16(),
            });
        }

        let random: GiphyRandom = response
            .json()
            .await
            .map_err(|e| GifError::Parse(e.to_string()))?;
        Ok(random.data.images.original.url)
    }
}
