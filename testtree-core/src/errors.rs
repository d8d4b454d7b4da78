// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by testtree.

use crate::collect::GroupKey;
use camino::Utf8PathBuf;
use std::{error, fmt, io};
use thiserror::Error;

/// An error that occurred while turning an event stream into a test tree.
///
/// Every error is fatal: no partial tree is ever produced.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The underlying stream could not be read.
    #[error("error reading event stream at line {line_number}")]
    Read {
        /// The 1-based line number being read when the error occurred.
        line_number: usize,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// A line could not be decoded into a record.
    #[error("line {line_number}: error decoding record")]
    Decode {
        /// The 1-based line number of the line that failed to decode.
        line_number: usize,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },

    /// The records were decoded, but a tree could not be assembled from them.
    #[error("error assembling test tree")]
    Assemble(#[from] AssembleError),
}

/// An error that occurred while assembling collected records into a test tree.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssembleError {
    /// A record had an action other than `run`, `output`, `pass`, `fail` or `skip`.
    #[error("unknown action `{action}` in records for {key}")]
    UnknownAction {
        /// The action string, as it appeared in the input.
        action: String,

        /// The group the record belonged to.
        key: GroupKey,
    },

    /// There wasn't exactly one root.
    #[error(transparent)]
    RootCardinality(#[from] RootCardinalityError),
}

/// There wasn't exactly one group of records with an empty test name.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RootCardinalityError {
    /// No group had an empty test name.
    #[error("no root found: expected exactly one group of records with an empty test name")]
    NoRoot,

    /// More than one group had an empty test name.
    ///
    /// A test group without a `run` record has no name, so it is counted here alongside the real
    /// run-level group.
    #[error(
        "found {} roots, expected exactly one: {}",
        .roots.len(),
        .roots.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    )]
    MultipleRoots {
        /// The group each root was folded from, in the order the groups were first seen.
        roots: Vec<GroupKey>,
    },
}

/// An error that occurred while loading testtree configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file `{path}` not found")]
    NotFound {
        /// The path that was requested.
        path: Utf8PathBuf,
    },

    /// The config file could not be read.
    #[error("failed to read config file `{path}`")]
    Read {
        /// The path to the config file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The config file could not be parsed.
    #[error("failed to parse config file `{path}`")]
    Parse {
        /// The path to the config file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: toml::de::Error,
    },
}

/// Displays an error along with its chain of sources, one per line.
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: error::Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain` wrapping `error`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: error::Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        let mut cause = self.error.source();
        while let Some(err) = cause {
            write!(f, "\n  caused by: {err}")?;
            cause = err.source();
        }

        Ok(())
    }
}
