//! Error types for the watch pipeline

use crate::registry::TargetId;

/// A single resource could not be fetched this pass
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Could not read body of {url}: {message}")]
    Body { url: String, message: String },
}

/// The local sound cue could not be played
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Sound asset not found: {0}")]
    MissingAsset(String),

    #[error("No audio player available")]
    NoPlayer,

    #[error("Audio player {player} failed: {message}")]
    Player { player: String, message: String },
}

/// A broadcast did not reach one target
#[derive(Debug, thiserror::Error)]
#[error("Delivery to target {target} failed: {message}")]
pub struct DeliveryError {
    pub target: TargetId,
    pub message: String,
}

/// Invalid static configuration, detected while building the watcher
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid url `{url}` for resource {name}: {reason}")]
    InvalidUrl {
        name: String,
        url: String,
        reason: String,
    },

    #[error("Duplicate resource name: {0}")]
    DuplicateName(String),

    #[error("HTTP client setup failed: {0}")]
    HttpClient(String),
}
