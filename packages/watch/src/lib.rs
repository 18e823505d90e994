//! pagewatch - change detection for a fixed set of polled web pages
//!
//! One pass over the monitored set runs this pipeline per resource, strictly in order:
//!
//! | Stage | Type | Failure |
//! |-------|------|---------|
//! | Fetch | [`Fetcher`] / [`HttpFetcher`] | [`FetchError`], resource skipped this pass |
//! | Extract | [`Extractor`] | never fails, no match yields `""` |
//! | Fingerprint | [`Fingerprint`] | never fails |
//! | Detect | [`MonitoredResource::observe`] | never fails |
//! | Notify | [`Notifier`] / [`AlertFanout`] | logged, never propagated |
//!
//! Configuration loading, scheduling and the chat front end live in the
//! watcher binary; this crate only takes [`ResourceSpec`] values as input.

mod error;
mod extract;
mod fetch;
mod fingerprint;
mod notify;
mod registry;
mod resource;
mod watcher;

pub use error::{ConfigError, DeliveryError, FetchError, PlaybackError};
pub use extract::{DEFAULT_SELECTOR, Extractor, default_selector};
pub use fetch::{DEFAULT_USER_AGENT, FetchOptions, Fetcher, HttpFetcher, TlsPolicy};
pub use fingerprint::Fingerprint;
pub use notify::{
    Alarm, AlertFanout, Broadcaster, ChangeEvent, DeliveryReport, FetchFailure, LogBroadcaster,
    Notifier,
};
pub use registry::{TargetId, TargetRegistry};
pub use resource::{MonitoredResource, Observation, ResourceSpec};
pub use watcher::{PassReport, Watcher};
