use crate::error::ConfigError;
use crate::extract::{Extractor, default_selector};
use crate::fingerprint::Fingerprint;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Static description of one watched page, as handed in by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub name: String,
    pub url: String,
    #[serde(default = "default_selector")]
    pub selector: String,
}

impl ResourceSpec {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            selector: default_selector(),
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }
}

/// Result of comparing a fresh fingerprint against the stored one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First successful check, nothing to compare against
    Seeded,
    Unchanged,
    Changed { previous: Fingerprint },
}

/// A watched page plus its detection state
#[derive(Debug, Clone)]
pub struct MonitoredResource {
    name: String,
    url: Url,
    extractor: Extractor,
    last_fingerprint: Option<Fingerprint>,
}

impl MonitoredResource {
    pub fn new(spec: &ResourceSpec) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            name: spec.name.clone(),
            url: spec.url.clone(),
            reason,
        };

        let url = Url::parse(&spec.url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", url.scheme())));
        }

        Ok(Self {
            name: spec.name.clone(),
            url,
            extractor: Extractor::new(&spec.selector)?,
            last_fingerprint: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn last_fingerprint(&self) -> Option<Fingerprint> {
        self.last_fingerprint
    }

    pub fn is_seeded(&self) -> bool {
        self.last_fingerprint.is_some()
    }

    /// Records `fingerprint` as the latest state and reports how it compares.
    ///
    /// Once seeded a resource stays seeded for the life of the process.
    pub fn observe(&mut self, fingerprint: Fingerprint) -> Observation {
        match self.last_fingerprint.replace(fingerprint) {
            None => Observation::Seeded,
            Some(previous) if previous == fingerprint => Observation::Unchanged,
            Some(previous) => Observation::Changed { previous },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource() -> MonitoredResource {
        MonitoredResource::new(&ResourceSpec::new("DSP", "https://example.com/dsp/grades")).unwrap()
    }

    #[test]
    fn first_observation_only_seeds() {
        let mut dsp = resource();
        assert!(!dsp.is_seeded());
        assert_eq!(dsp.observe(Fingerprint::of("X")), Observation::Seeded);
        assert_eq!(dsp.last_fingerprint(), Some(Fingerprint::of("X")));
    }

    #[test]
    fn equal_fingerprint_is_unchanged() {
        let mut dsp = resource();
        dsp.observe(Fingerprint::of("X"));
        assert_eq!(dsp.observe(Fingerprint::of("X")), Observation::Unchanged);
        assert_eq!(dsp.last_fingerprint(), Some(Fingerprint::of("X")));
    }

    #[test]
    fn different_fingerprint_is_changed_and_stored() {
        let mut dsp = resource();
        dsp.observe(Fingerprint::of("X"));
        assert_eq!(
            dsp.observe(Fingerprint::of("Y")),
            Observation::Changed {
                previous: Fingerprint::of("X")
            }
        );
        assert_eq!(dsp.last_fingerprint(), Some(Fingerprint::of("Y")));
        assert_eq!(dsp.observe(Fingerprint::of("Y")), Observation::Unchanged);
    }

    #[test]
    fn spec_defaults_to_whole_body() {
        let spec: ResourceSpec =
            serde_json::from_str(r#"{"name":"CPS","url":"https://example.com/cps"}"#).unwrap();
        assert_eq!(spec.selector, "body");
    }

    #[test]
    fn rejects_bad_urls() {
        for url in ["not a url", "ftp://example.com/grades", "/relative/path"] {
            let err = MonitoredResource::new(&ResourceSpec::new("bad", url)).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidUrl { .. }), "{url}");
        }
    }

    #[test]
    fn rejects_bad_selector() {
        let spec = ResourceSpec::new("CPS", "https://example.com/cps").with_selector("..grades");
        assert!(matches!(
            MonitoredResource::new(&spec),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }
}
