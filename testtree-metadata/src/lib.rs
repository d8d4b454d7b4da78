// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured access to the data consumed and produced by testtree.
//!
//! testtree reads a stream of newline-delimited JSON test events and turns it
//! into a tree: one root node for the overall run and one child per test. This
//! crate contains the data model for both ends of that pipeline:
//!
//! * [`Record`] and [`Action`]: a single decoded line of the event stream.
//! * [`TestSummary`] and [`StatusCounts`]: the machine-readable form of an
//!   assembled tree, as emitted by `testtree --message-format json`.
//! * [`TesttreeExitCode`]: documented exit codes for the `testtree` binary.

#![warn(missing_docs)]

mod exit_codes;
mod record;
mod status;
mod summary;

pub use exit_codes::*;
pub use record::*;
pub use status::*;
pub use summary::*;
