// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use std::{error::Error, io};
use testtree_core::errors::{ConfigError, ParseError};
use testtree_metadata::TesttreeExitCode;
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// The #[error()] strings are placeholder messages: errors are printed with display_to_stderr, which
// colorizes them.

/// An error that testtree reports to the user and exits with, rather than panicking on.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("failed to load config")]
    ConfigLoadError {
        #[source]
        err: ConfigError,
    },
    #[error("failed to open input `{path}`")]
    InputOpenError {
        path: Utf8PathBuf,
        #[source]
        err: io::Error,
    },
    #[error("failed to parse event stream")]
    StreamParseError {
        #[source]
        err: ParseError,
    },
    #[error("failed to write output")]
    WriteOutputError {
        #[source]
        err: io::Error,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigLoadError { .. } | Self::InputOpenError { .. } => {
                TesttreeExitCode::SETUP_ERROR
            }
            Self::StreamParseError { err } => match err {
                ParseError::Assemble(_) => TesttreeExitCode::ASSEMBLY_FAILED,
                _ => TesttreeExitCode::PARSE_FAILED,
            },
            Self::WriteOutputError { .. } => TesttreeExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::ConfigLoadError { err } => {
                error!("{err}");
                err.source()
            }
            Self::InputOpenError { path, err } => {
                error!("failed to open input `{}`", path.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::StreamParseError { err } => {
                error!("{err}");
                err.source()
            }
            Self::WriteOutputError { err } => {
                error!("failed to write output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "  caused by: {err}");
            next_error = err.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testtree_core::{config::AssembleConfig, parse};

    #[test]
    fn exit_codes() {
        let decode = parse(&b"not json\n"[..], &AssembleConfig::default())
            .expect_err("decoding fails");
        assert_eq!(
            ExpectedError::StreamParseError { err: decode }.process_exit_code(),
            TesttreeExitCode::PARSE_FAILED
        );

        let assemble = parse(&b""[..], &AssembleConfig::default()).expect_err("assembly fails");
        assert_eq!(
            ExpectedError::StreamParseError { err: assemble }.process_exit_code(),
            TesttreeExitCode::ASSEMBLY_FAILED
        );

        let open = ExpectedError::InputOpenError {
            path: "missing.jsonl".into(),
            err: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(open.process_exit_code(), TesttreeExitCode::SETUP_ERROR);
    }
}
