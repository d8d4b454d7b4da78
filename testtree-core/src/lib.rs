// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for testtree: turning a stream of newline-delimited JSON test events into a
//! tree with one root for the overall run and one child per test.
//!
//! Assembly happens in two phases:
//!
//! 1. [`collect::collect_records`] reads the whole input and groups the decoded records by
//!    `(package, test)`.
//! 2. [`assemble::assemble_tests`] folds each group into a [`tree::Test`] and stitches the tests
//!    into a single tree.
//!
//! [`parse`] runs both phases.

pub mod assemble;
pub mod collect;
pub mod config;
pub mod errors;
pub mod reader;
pub mod reporter;
#[cfg(test)]
mod test_helpers;
pub mod tree;

use config::AssembleConfig;
use errors::ParseError;
use std::io::BufRead;
use tree::Test;

/// Reads every record from `input` and assembles them into a tree.
///
/// Returns the root of the tree, or the first error encountered. No partial tree is produced.
pub fn parse(input: impl BufRead, config: &AssembleConfig) -> Result<Test, ParseError> {
    let groups = collect::collect_records(input)?;
    Ok(assemble::assemble_tests(&groups, config)?)
}
