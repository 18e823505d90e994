use crate::error::{ConfigError, FetchError};
use crate::fetch::Fetcher;
use crate::fingerprint::Fingerprint;
use crate::notify::{ChangeEvent, FetchFailure, Notifier};
use crate::resource::{MonitoredResource, Observation, ResourceSpec};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Tally of one pass over the monitored set
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub seeded: usize,
    pub unchanged: usize,
    pub changed: usize,
    pub failed: usize,
}

impl PassReport {
    pub fn checked(&self) -> usize {
        self.seeded + self.unchanged + self.changed
    }

    fn record(&mut self, observation: &Observation) {
        match observation {
            Observation::Seeded => self.seeded += 1,
            Observation::Unchanged => self.unchanged += 1,
            Observation::Changed { .. } => self.changed += 1,
        }
    }
}

/// Owns the monitored set and runs passes over it.
///
/// Resources are processed one after another in configured order. A failure
/// on one resource is reported and the pass moves on.
pub struct Watcher {
    resources: Vec<MonitoredResource>,
    fetcher: Arc<dyn Fetcher>,
    notifier: Arc<dyn Notifier>,
}

impl Watcher {
    pub fn new(
        specs: &[ResourceSpec],
        fetcher: Arc<dyn Fetcher>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        let mut names = HashSet::new();
        let mut resources = Vec::with_capacity(specs.len());

        for spec in specs {
            if !names.insert(spec.name.as_str()) {
                return Err(ConfigError::DuplicateName(spec.name.clone()));
            }
            resources.push(MonitoredResource::new(spec)?);
        }

        if resources.is_empty() {
            warn!("No resources configured - passes will be empty");
        }

        Ok(Self {
            resources,
            fetcher,
            notifier,
        })
    }

    pub fn resources(&self) -> &[MonitoredResource] {
        &self.resources
    }

    pub async fn run_pass(&mut self) -> PassReport {
        let mut report = PassReport::default();

        for resource in &mut self.resources {
            match check(resource, self.fetcher.as_ref()).await {
                Ok(observation) => {
                    report.record(&observation);
                    announce(resource, observation, self.notifier.as_ref()).await;
                }
                Err(e) => {
                    report.failed += 1;
                    error!(resource = %resource.name(), error = %e, "Check failed");
                    let failure = FetchFailure {
                        name: resource.name().to_string(),
                        url: resource.url().to_string(),
                        error: e.to_string(),
                    };
                    self.notifier.fetch_failed(&failure).await;
                }
            }
        }

        info!(
            checked = report.checked(),
            changed = report.changed,
            failed = report.failed,
            "Pass complete"
        );
        report
    }
}

async fn check(
    resource: &mut MonitoredResource,
    fetcher: &dyn Fetcher,
) -> Result<Observation, FetchError> {
    let markup = fetcher.fetch(resource.url()).await?;
    let region = resource.extractor().extract(&markup);
    debug!(
        resource = %resource.name(),
        selector = %resource.extractor().selector(),
        bytes = region.len(),
        "Extracted region"
    );
    Ok(resource.observe(Fingerprint::of(&region)))
}

async fn announce(
    resource: &MonitoredResource,
    observation: Observation,
    notifier: &dyn Notifier,
) {
    let current = resource
        .last_fingerprint()
        .map(|fp| fp.short())
        .unwrap_or_default();

    match observation {
        Observation::Seeded => {
            info!(resource = %resource.name(), fingerprint = %current, "Seeded");
        }
        Observation::Unchanged => {
            info!(resource = %resource.name(), "Checked, no change");
        }
        Observation::Changed { previous } => {
            warn!(
                resource = %resource.name(),
                previous = %previous.short(),
                current = %current,
                "PAGE CHANGED"
            );
            notifier.notify(&ChangeEvent::for_resource(resource)).await;
        }
    }
}
