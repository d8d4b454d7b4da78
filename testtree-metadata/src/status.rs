// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// The terminal outcome of a test.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// The test failed.
    Fail,

    /// The test passed.
    Pass,

    /// The test was skipped.
    Skip,
}

impl TestStatus {
    /// All statuses, in the order they are reported in.
    pub const ALL: [TestStatus; 3] = [TestStatus::Fail, TestStatus::Pass, TestStatus::Skip];

    /// Returns the string form of this status, as it appears in the event stream.
    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::Fail => "fail",
            TestStatus::Pass => "pass",
            TestStatus::Skip => "skip",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The number of tests with each status, across a subtree.
///
/// All three counts are always present, even if zero. Serialized as a JSON object with the keys
/// `fail`, `pass` and `skip`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct StatusCounts {
    /// The number of failed tests.
    pub fail: usize,

    /// The number of passed tests.
    pub pass: usize,

    /// The number of skipped tests.
    pub skip: usize,
}

impl StatusCounts {
    /// Returns the counts for a single node with the given status.
    ///
    /// A node without a status contributes zero to every count.
    pub fn for_status(status: Option<TestStatus>) -> Self {
        let mut counts = Self::default();
        if let Some(status) = status {
            *counts.get_mut(status) += 1;
        }
        counts
    }

    /// Returns the count for `status`.
    pub fn get(&self, status: TestStatus) -> usize {
        match status {
            TestStatus::Fail => self.fail,
            TestStatus::Pass => self.pass,
            TestStatus::Skip => self.skip,
        }
    }

    fn get_mut(&mut self, status: TestStatus) -> &mut usize {
        match status {
            TestStatus::Fail => &mut self.fail,
            TestStatus::Pass => &mut self.pass,
            TestStatus::Skip => &mut self.skip,
        }
    }

    /// Adds every count in `other` to this one.
    pub fn add(&mut self, other: &StatusCounts) {
        for status in TestStatus::ALL {
            *self.get_mut(status) += other.get(status);
        }
    }

    /// Iterates over `(status, count)` pairs, in [`TestStatus::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (TestStatus, usize)> + '_ {
        TestStatus::ALL
            .into_iter()
            .map(move |status| (status, self.get(status)))
    }

    /// Returns the sum of all counts.
    pub fn total(&self) -> usize {
        self.fail + self.pass + self.skip
    }
}

impl fmt::Display for StatusCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} skipped",
            self.pass, self.fail, self.skip
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_for_status() {
        assert_eq!(StatusCounts::for_status(None), StatusCounts::default());
        assert_eq!(
            StatusCounts::for_status(Some(TestStatus::Skip)),
            StatusCounts {
                fail: 0,
                pass: 0,
                skip: 1
            }
        );
    }

    #[test]
    fn counts_add_and_total() {
        let mut counts = StatusCounts::for_status(Some(TestStatus::Pass));
        counts.add(&StatusCounts {
            fail: 2,
            pass: 3,
            skip: 4,
        });
        assert_eq!(counts.iter().collect::<Vec<_>>(), vec![
            (TestStatus::Fail, 2),
            (TestStatus::Pass, 4),
            (TestStatus::Skip, 4),
        ]);
        assert_eq!(counts.total(), 10);
    }

    #[test]
    fn counts_always_serialize_every_key() {
        let json = serde_json::to_string(&StatusCounts::default()).unwrap();
        assert_eq!(json, r#"{"fail":0,"pass":0,"skip":0}"#);
    }
}
