// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collecting decoded records into per-test groups.
//!
//! This is the first phase of tree assembly. Every line of the input is decoded into a
//! [`Record`], and records are grouped by their `(package, test)` key. Within a group, records
//! are kept in the order they arrived in; groups themselves are kept in the order their first
//! record arrived in.

use crate::{errors::ParseError, reader::LineReader};
use indexmap::IndexMap;
use std::{fmt, io::BufRead};
use testtree_metadata::Record;
use tracing::debug;

/// The key records are grouped by.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct GroupKey {
    /// The package name.
    pub package: String,

    /// The test name. Empty for run-level records.
    pub test: String,
}

impl GroupKey {
    /// Creates a new `GroupKey`.
    pub fn new(package: impl Into<String>, test: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            test: test.into(),
        }
    }

    /// Returns the key `record` is grouped under.
    pub fn for_record(record: &Record) -> Self {
        Self::new(record.package.clone(), record.test.clone())
    }

    /// Returns true if this is the key of a run-level group.
    pub fn is_run_level(&self) -> bool {
        self.test.is_empty()
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.package.is_empty(), self.test.is_empty()) {
            (true, true) => write!(f, "run-level records"),
            (false, true) => write!(f, "package `{}`", self.package),
            (true, false) => write!(f, "test `{}`", self.test),
            (false, false) => write!(f, "test `{}::{}`", self.package, self.test),
        }
    }
}

/// Records grouped by [`GroupKey`].
///
/// Groups are ordered by the arrival of their first record, and records within a group are
/// ordered by arrival.
#[derive(Clone, Debug, Default)]
pub struct RecordGroups {
    groups: IndexMap<GroupKey, Vec<Record>>,
}

impl RecordGroups {
    /// Creates a new, empty set of groups.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `record` to the group for its key, creating the group if this is the first record
    /// seen for it.
    pub fn push(&mut self, record: Record) {
        self.groups
            .entry(GroupKey::for_record(&record))
            .or_default()
            .push(record);
    }

    /// Returns the number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns the total number of records across all groups.
    pub fn record_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Returns the records for `key`, in arrival order.
    pub fn get(&self, key: &GroupKey) -> Option<&[Record]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Iterates over groups in first-arrival order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&GroupKey, &[Record])> + '_ {
        self.groups
            .iter()
            .map(|(key, records)| (key, records.as_slice()))
    }
}

impl FromIterator<Record> for RecordGroups {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut groups = Self::new();
        for record in iter {
            groups.push(record);
        }
        groups
    }
}

/// Reads every line of `input`, decodes it into a [`Record`], and groups the records.
///
/// Stops at the first line that fails to decode or the first read error.
pub fn collect_records<R: BufRead>(input: R) -> Result<RecordGroups, ParseError> {
    let mut reader = LineReader::new(input);
    let mut groups = RecordGroups::new();

    while let Some(line) = reader.next_line() {
        let decoded = match line {
            Ok(line) => Record::from_json_slice(line),
            Err(error) => {
                return Err(ParseError::Read {
                    line_number: reader.line_number(),
                    error,
                });
            }
        };
        let record = decoded.map_err(|error| ParseError::Decode {
            line_number: reader.line_number(),
            error,
        })?;
        groups.push(record);
    }

    debug!(
        "collected {} records into {} groups from {} lines",
        groups.record_count(),
        groups.len(),
        reader.line_number(),
    );

    Ok(groups)
}
