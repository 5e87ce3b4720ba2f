//! Sweep configuration.
//!
//! Read from a TOML file, eg.
//!
//! ```toml
//! regions = ["us-west-2", "us-east-1"]
//! concurrency = 4
//! call_timeout_secs = 120
//!
//! [[skip]]
//! code = "ThrottlingException"
//! ```
//!
//! Every field is optional. The command line overrides the file.
use std::{path::Path, time::Duration};

use snafu::prelude::*;

use crate::{ConfigParseSnafu, ConfigReadSnafu, Error, SkipPattern};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Regions to sweep, in order.
    pub regions: Vec<String>,
    /// How many resources of one sweeper are destroyed at the same time.
    pub concurrency: usize,
    /// Upper bound on a single remote call, in seconds.
    pub call_timeout_secs: u64,
    /// Keep running later sweepers after one fails.
    pub allow_failures: bool,
    /// Extra errors to treat as skips, on top of the defaults.
    pub skip: Vec<SkipPattern>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            regions: vec!["us-west-2".to_owned()],
            concurrency: crate::DEFAULT_CONCURRENCY,
            call_timeout_secs: crate::DEFAULT_CALL_TIMEOUT.as_secs(),
            allow_failures: false,
            skip: vec![],
        }
    }
}

impl SweepConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn from_toml_str(s: &str) -> crate::Result<Self> {
        let config: SweepConfig = toml::from_str(s).context(ConfigParseSnafu)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        log::debug!("reading config from {path:?}");
        let contents = tokio::fs::read_to_string(path)
            .await
            .context(ConfigReadSnafu { path })?;
        Self::from_toml_str(&contents)
    }

    /// ## Errors
    /// Errs if there are no regions, a region is blank, or a limit is zero.
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |msg: &str| Error::ConfigInvalid {
            msg: msg.to_owned(),
        };
        if self.regions.is_empty() {
            return Err(invalid("at least one region is required"));
        }
        if self.regions.iter().any(|r| r.trim().is_empty()) {
            return Err(invalid("regions must not be blank"));
        }
        if self.concurrency == 0 {
            return Err(invalid("concurrency must be at least 1"));
        }
        if self.call_timeout_secs == 0 {
            return Err(invalid("call_timeout_secs must be at least 1"));
        }
        if self.skip.iter().any(|p| p.code.is_empty()) {
            return Err(invalid("skip patterns need a code"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_file_is_the_default() {
        let config = SweepConfig::from_toml_str("").unwrap();
        pretty_assertions::assert_eq!(SweepConfig::default(), config);
        assert_eq!(Duration::from_secs(600), config.call_timeout());
    }

    #[test]
    fn parses_every_field() {
        let config = SweepConfig::from_toml_str(
            r#"
            regions = ["us-east-1", "eu-west-1"]
            concurrency = 3
            call_timeout_secs = 30
            allow_failures = true

            [[skip]]
            code = "ThrottlingException"

            [[skip]]
            code = "ValidationException"
            message = "not supported"
            "#,
        )
        .unwrap();
        pretty_assertions::assert_eq!(
            SweepConfig {
                regions: vec!["us-east-1".to_owned(), "eu-west-1".to_owned()],
                concurrency: 3,
                call_timeout_secs: 30,
                allow_failures: true,
                skip: vec![
                    SkipPattern::new("ThrottlingException", ""),
                    SkipPattern::new("ValidationException", "not supported"),
                ],
            },
            config
        );
    }

    #[test]
    fn rejects_bad_values() {
        for (toml, msg) in [
            ("regions = []", "Invalid config: at least one region is required"),
            ("regions = [' ']", "Invalid config: regions must not be blank"),
            ("concurrency = 0", "Invalid config: concurrency must be at least 1"),
            ("[[skip]]\ncode = ''", "Invalid config: skip patterns need a code"),
        ] {
            let err = SweepConfig::from_toml_str(toml).unwrap_err();
            assert_eq!(msg, err.to_string(), "{toml}");
        }
        let err = SweepConfig::from_toml_str("concurrency = 'many'").unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }), "{err}");
    }

    #[tokio::test]
    async fn missing_file() {
        let err = SweepConfig::from_file("/definitely/not/here.toml")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }), "{err}");
    }
}
