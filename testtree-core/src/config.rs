// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for testtree.
//!
//! Configuration is read from a TOML file, by default `.config/testtree.toml` relative to the
//! current directory:
//!
//! ```toml
//! [assemble]
//! child-order = "arrival"
//! warn-anomalies = true
//!
//! [report]
//! show-output = "failing"
//! ```
//!
//! Every setting is optional. Unknown keys are reported as warnings and otherwise ignored.

use crate::{errors::ConfigError, reporter::ShowOutput};
use camino::Utf8Path;
use serde::Deserialize;
use std::{collections::BTreeSet, io};
use tracing::{debug, warn};

/// The path, relative to the current directory, that configuration is loaded from by default.
pub const DEFAULT_CONFIG_PATH: &str = ".config/testtree.toml";

/// Special value for `--config` and `TESTTREE_CONFIG` that skips config loading entirely.
pub const CONFIG_NONE: &str = "none";

/// Specifies where to load configuration from.
#[derive(Clone, Copy, Debug)]
pub enum ConfigLocation<'a> {
    /// Load from [`DEFAULT_CONFIG_PATH`] if it exists, otherwise use built-in defaults.
    Default,

    /// Skip config loading entirely, using only built-in defaults.
    Isolated,

    /// Load config from an explicit path.
    ///
    /// Returns an error if the file does not exist.
    Explicit(&'a Utf8Path),
}

impl<'a> ConfigLocation<'a> {
    /// Creates a config location from a CLI or environment variable value.
    ///
    /// Returns `Default` if `None`, `Isolated` if `"none"`, otherwise `Explicit` with the path.
    pub fn from_cli_or_env(s: Option<&'a str>) -> Self {
        match s {
            None => Self::Default,
            Some(s) if s == CONFIG_NONE => Self::Isolated,
            Some(s) => Self::Explicit(Utf8Path::new(s)),
        }
    }
}

/// The order in which children are attached to the root.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChildOrder {
    /// The order in which the first record of each test arrived.
    #[default]
    Arrival,

    /// By package, then by test name.
    Name,

    /// By start time, with ties (and tests without a start time, which come first) in arrival
    /// order.
    StartTime,
}

/// Settings that control tree assembly.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssembleConfig {
    /// The order in which children are attached to the root.
    pub child_order: ChildOrder,

    /// Whether to emit warnings for records that arrive in an unexpected order, for example a
    /// record that follows a test's terminal record.
    pub warn_anomalies: bool,
}

impl Default for AssembleConfig {
    fn default() -> Self {
        Self {
            child_order: ChildOrder::Arrival,
            warn_anomalies: true,
        }
    }
}

/// Settings that control the human-readable report.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReportConfig {
    /// When to show captured output.
    pub show_output: ShowOutput,
}

/// testtree configuration, after defaults have been applied.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TesttreeConfig {
    /// Tree assembly settings.
    pub assemble: AssembleConfig,

    /// Report settings.
    pub report: ReportConfig,
}

impl TesttreeConfig {
    /// Loads configuration from the given location.
    pub fn load(location: ConfigLocation<'_>) -> Result<Self, ConfigError> {
        Self::load_with_warnings(location, &mut DefaultConfigWarnings)
    }

    fn load_with_warnings(
        location: ConfigLocation<'_>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigError> {
        let deserialized = match location {
            ConfigLocation::Isolated => {
                debug!("config: skipping (isolated)");
                None
            }
            ConfigLocation::Default => DeserializedConfig::from_path_with_warnings(
                Utf8Path::new(DEFAULT_CONFIG_PATH),
                warnings,
            )?,
            ConfigLocation::Explicit(path) => {
                debug!("config: loading from explicit path {path}");
                match DeserializedConfig::from_path_with_warnings(path, warnings)? {
                    Some(config) => Some(config),
                    None => {
                        return Err(ConfigError::NotFound {
                            path: path.to_owned(),
                        });
                    }
                }
            }
        };

        Ok(deserialized.unwrap_or_default().resolve())
    }
}

/// Trait for handling configuration warnings.
///
/// Allows tests to collect warnings rather than logging them.
trait ConfigWarnings {
    /// Handle unknown configuration keys found in a config file.
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>);
}

/// Logs warnings using tracing.
struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
        let mut unknown_str = String::new();
        if unknown.len() == 1 {
            // Print this on the same line.
            unknown_str.push_str("key: ");
            unknown_str.push_str(unknown.iter().next().map_or("", String::as_str));
        } else {
            unknown_str.push_str("keys:\n");
            for ignored_key in unknown {
                unknown_str.push('\n');
                unknown_str.push_str("  - ");
                unknown_str.push_str(ignored_key);
            }
        }

        warn!("in config file {config_file}, ignoring unknown configuration {unknown_str}");
    }
}

/// Configuration as deserialized from TOML.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeserializedConfig {
    #[serde(default)]
    assemble: DeserializedAssembleConfig,

    #[serde(default)]
    report: DeserializedReportConfig,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeserializedAssembleConfig {
    child_order: Option<ChildOrder>,
    warn_anomalies: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeserializedReportConfig {
    show_output: Option<ShowOutput>,
}

impl DeserializedConfig {
    /// Loads config from `path`.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    fn from_path_with_warnings(
        path: &Utf8Path,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Option<Self>, ConfigError> {
        debug!("config: attempting to load from {path}");
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!("config: file does not exist at {path}");
                return Ok(None);
            }
            Err(error) => {
                return Err(ConfigError::Read {
                    path: path.to_owned(),
                    error,
                });
            }
        };

        let (config, unknown) =
            Self::deserialize_toml(&contents).map_err(|error| ConfigError::Parse {
                path: path.to_owned(),
                error,
            })?;

        if !unknown.is_empty() {
            warnings.unknown_config_keys(path, &unknown);
        }

        debug!("config: loaded successfully from {path}");
        Ok(Some(config))
    }

    /// Deserializes TOML content and returns the config along with any unknown keys.
    fn deserialize_toml(contents: &str) -> Result<(Self, BTreeSet<String>), toml::de::Error> {
        let deserializer = toml::Deserializer::parse(contents)?;
        let mut unknown = BTreeSet::new();
        let config: DeserializedConfig = serde_ignored::deserialize(deserializer, |path| {
            unknown.insert(path.to_string());
        })?;
        Ok((config, unknown))
    }

    fn resolve(self) -> TesttreeConfig {
        let defaults = TesttreeConfig::default();
        TesttreeConfig {
            assemble: AssembleConfig {
                child_order: self
                    .assemble
                    .child_order
                    .unwrap_or(defaults.assemble.child_order),
                warn_anomalies: self
                    .assemble
                    .warn_anomalies
                    .unwrap_or(defaults.assemble.warn_anomalies),
            },
            report: ReportConfig {
                show_output: self
                    .report
                    .show_output
                    .unwrap_or(defaults.report.show_output),
            },
        }
    }
}
