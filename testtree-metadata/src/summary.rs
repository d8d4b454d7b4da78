// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{StatusCounts, TestStatus};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Machine-readable form of an assembled test tree.
///
/// This is the output of `testtree --message-format json`. The root summary has an empty `name`
/// and one child per test in the run.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct TestSummary {
    /// The name of the test. Empty for the root.
    pub name: String,

    /// The package the test belongs to.
    pub package: String,

    /// The time at which the test started, if known.
    pub time: Option<DateTime<FixedOffset>>,

    /// The terminal status of the test, if one was observed.
    pub status: Option<TestStatus>,

    /// The time the test took, in milliseconds.
    pub elapsed_ms: f64,

    /// All output produced by the test, in chronological order.
    pub output: String,

    /// Status counts across this test and all of its descendants.
    pub stats: StatusCounts,

    /// The number of nodes in this subtree, including this one.
    pub count: usize,

    /// Child tests.
    pub children: Vec<TestSummary>,
}

impl TestSummary {
    /// Creates a new summary for a single node with no children.
    ///
    /// `stats` and `count` are initialized for a leaf; use [`Self::add_child`] to attach children
    /// and keep them up to date.
    pub fn new(
        name: impl Into<String>,
        package: impl Into<String>,
        time: Option<DateTime<FixedOffset>>,
        status: Option<TestStatus>,
        elapsed_ms: f64,
        output: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            time,
            status,
            elapsed_ms,
            output: output.into(),
            stats: StatusCounts::for_status(status),
            count: 1,
            children: Vec::new(),
        }
    }

    /// Adds a child to this summary, updating `stats` and `count`.
    pub fn add_child(&mut self, child: TestSummary) -> &mut Self {
        self.stats.add(&child.stats);
        self.count += child.count;
        self.children.push(child);
        self
    }

    /// Returns true if this is the summary of a root node.
    pub fn is_root(&self) -> bool {
        self.name.is_empty()
    }
}
