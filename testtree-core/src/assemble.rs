// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembling record groups into a test tree.
//!
//! This is the second phase of tree assembly. Each group of records is sorted by time and folded
//! into a single [`Test`]. The one test with an empty name becomes the root, and every other test
//! is attached to it as a direct child.

use crate::{
    collect::{GroupKey, RecordGroups},
    config::{AssembleConfig, ChildOrder},
    errors::{AssembleError, RootCardinalityError},
    tree::Test,
};
use chrono::{DateTime, FixedOffset};
use std::time::Duration;
use testtree_metadata::{Action, Record, TestStatus};
use tracing::{debug, trace, warn};

/// Assembles every group in `groups` into a single rooted tree.
///
/// Every group is folded before the root is identified, so an unknown action in any group is
/// reported in preference to a missing or duplicated root.
pub fn assemble_tests(
    groups: &RecordGroups,
    config: &AssembleConfig,
) -> Result<Test, AssembleError> {
    let mut roots = Vec::new();
    let mut children = Vec::with_capacity(groups.len());

    for (key, records) in groups.iter() {
        let test = assemble_group(key, records, config)?;
        if test.is_root() {
            roots.push((key, test));
        } else {
            children.push(test);
        }
    }

    if roots.len() > 1 {
        return Err(RootCardinalityError::MultipleRoots {
            roots: roots.into_iter().map(|(key, _)| key.clone()).collect(),
        }
        .into());
    }
    let Some((_, mut root)) = roots.pop() else {
        return Err(RootCardinalityError::NoRoot.into());
    };

    // Both sorts are stable, so ties stay in arrival order.
    match config.child_order {
        ChildOrder::Arrival => {}
        ChildOrder::Name => children.sort_by(|a, b| {
            (a.package.as_str(), a.name.as_str()).cmp(&(b.package.as_str(), b.name.as_str()))
        }),
        ChildOrder::StartTime => children.sort_by_key(|child| child.start_time),
    }

    if let Some(earliest) = children.iter().filter_map(|child| child.start_time).min() {
        root.start_time = Some(earliest);
    }
    root.children = children;

    debug!(
        "assembled tree for package `{}` with {} children",
        root.package,
        root.children.len(),
    );

    Ok(root)
}

/// Sorts the records in a single group by time and folds them into a [`Test`].
///
/// Records without a time sort before all timed records. Records with equal times are folded in
/// the order they arrived in.
pub fn assemble_group(
    key: &GroupKey,
    records: &[Record],
    config: &AssembleConfig,
) -> Result<Test, AssembleError> {
    let mut sorted: Vec<&Record> = records.iter().collect();
    sorted.sort_by_key(|record| record.time);

    let mut builder = TestBuilder::new(key, config.warn_anomalies);
    for record in sorted {
        builder.fold(record)?;
    }
    let test = builder.build();

    trace!(
        "assembled {key}: name `{}`, status {}, {} bytes of output",
        test.name,
        test.status.map_or("(none)", TestStatus::as_str),
        test.output.len(),
    );

    Ok(test)
}

/// The state of a [`TestBuilder`], tracked for diagnostics.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum FoldState {
    Empty,
    Named,
    Terminated,
}

/// Accumulates the records of one group. Consumed by [`build`](Self::build).
#[derive(Debug)]
struct TestBuilder<'a> {
    key: &'a GroupKey,
    warn_anomalies: bool,
    state: FoldState,
    name: String,
    package: Option<String>,
    start_time: Option<DateTime<FixedOffset>>,
    status: Option<TestStatus>,
    elapsed: Duration,
    output: String,
}

impl<'a> TestBuilder<'a> {
    fn new(key: &'a GroupKey, warn_anomalies: bool) -> Self {
        Self {
            key,
            warn_anomalies,
            state: FoldState::Empty,
            name: String::new(),
            package: None,
            start_time: None,
            status: None,
            elapsed: Duration::ZERO,
            output: String::new(),
        }
    }

    fn fold(&mut self, record: &Record) -> Result<(), AssembleError> {
        if self.warn_anomalies && self.state == FoldState::Terminated {
            warn!(
                "{}: `{}` record follows a terminal record",
                self.key, record.action,
            );
        }

        match (&record.action, record.action.status()) {
            (_, Some(status)) => self.terminate(record, status),
            (Action::Run, None) => {
                // Last write wins if a test is run more than once.
                self.name.clone_from(&record.test);
                self.package = Some(record.package.clone());
                self.start_time = record.time;
                if self.state == FoldState::Empty {
                    self.state = FoldState::Named;
                }
            }
            (Action::Output, None) => self.output.push_str(&record.output),
            (action, None) => {
                return Err(AssembleError::UnknownAction {
                    action: action.to_string(),
                    key: self.key.clone(),
                });
            }
        }

        Ok(())
    }

    fn terminate(&mut self, record: &Record, status: TestStatus) {
        // Run-level groups don't normally have a run record of their own.
        if self.warn_anomalies && self.state == FoldState::Empty && !self.key.is_run_level() {
            warn!(
                "{}: `{}` record seen before the test was run",
                self.key, record.action,
            );
        }

        self.status = Some(status);
        self.elapsed = match record.elapsed_duration() {
            Some(elapsed) => elapsed,
            None => {
                if self.warn_anomalies {
                    warn!(
                        "{}: invalid elapsed time {} ms, using 0",
                        self.key, record.elapsed,
                    );
                }
                Duration::ZERO
            }
        };
        self.state = FoldState::Terminated;
    }

    fn build(self) -> Test {
        let package = self
            .package
            .unwrap_or_else(|| self.key.package.clone());
        Test::new(
            self.name,
            package,
            self.start_time,
            self.status,
            self.elapsed,
            self.output,
        )
    }
}
