// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::TestStatus;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, time::Duration};

/// A single event observed in the input stream.
///
/// Each line of the input decodes to one `Record`:
///
/// ```json
/// { "Time": "2024-05-01T10:00:00.5Z", "Action": "pass", "Package": "pkg", "Test": "TestFoo", "Elapsed": 5 }
/// ```
///
/// Every field is optional, and an explicit `null` is treated the same as a missing field. An
/// empty or missing `Test` marks an event that belongs to the overall run rather than to an
/// individual test, and a missing `Action` decodes as an empty [`Action::Unknown`].
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Record {
    /// The name of the test, or the empty string for a run-level event.
    #[serde(default, deserialize_with = "null_as_default")]
    pub test: String,

    /// The package the test belongs to.
    #[serde(default, deserialize_with = "null_as_default")]
    pub package: String,

    /// The time at which the event was observed, if recorded.
    #[serde(default)]
    pub time: Option<DateTime<FixedOffset>>,

    /// The kind of event this is.
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: Action,

    /// A fragment of captured output. Only meaningful for [`Action::Output`].
    #[serde(default, deserialize_with = "null_as_default")]
    pub output: String,

    /// The time the test took, in milliseconds. Only meaningful for terminal actions.
    #[serde(default, deserialize_with = "null_as_default")]
    pub elapsed: f64,
}

impl Record {
    /// Decodes a record from a single line of JSON.
    ///
    /// The line must be a JSON object. Arrays and other values are rejected even when their
    /// elements would line up with the record's fields.
    pub fn from_json_slice(line: &[u8]) -> Result<Self, serde_json::Error> {
        let fields: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(line)?;
        Record::deserialize(serde_json::Value::Object(fields))
    }

    /// Returns true if this is a run-level event (the test name is empty).
    pub fn is_run_level(&self) -> bool {
        self.test.is_empty()
    }

    /// Converts the `Elapsed` field from milliseconds to a [`Duration`], rounded to the nearest
    /// nanosecond.
    ///
    /// Returns `None` if the field is negative, NaN or infinite.
    pub fn elapsed_duration(&self) -> Option<Duration> {
        let nanos = self.elapsed * 1_000_000.0;
        if !nanos.is_finite() || nanos < 0.0 {
            return None;
        }
        // Float-to-int `as` casts saturate, so out-of-range values clamp to u64::MAX.
        Some(Duration::from_nanos(nanos.round() as u64))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The kind of event a [`Record`] represents.
///
/// Decoding never fails on an unrecognized action: it is preserved as [`Action::Unknown`], and it
/// is up to consumers to decide how to handle it.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    /// The test started running.
    Run,

    /// The test produced output.
    Output,

    /// The test passed.
    Pass,

    /// The test failed.
    Fail,

    /// The test was skipped.
    Skip,

    /// Any other action.
    Unknown(String),
}

impl Action {
    /// Returns the string form of this action.
    pub fn as_str(&self) -> &str {
        match self {
            Action::Run => "run",
            Action::Output => "output",
            Action::Pass => "pass",
            Action::Fail => "fail",
            Action::Skip => "skip",
            Action::Unknown(action) => action.as_str(),
        }
    }

    /// Returns the status this action terminates a test with, if it is a terminal action.
    pub fn status(&self) -> Option<TestStatus> {
        match self {
            Action::Pass => Some(TestStatus::Pass),
            Action::Fail => Some(TestStatus::Fail),
            Action::Skip => Some(TestStatus::Skip),
            Action::Run | Action::Output | Action::Unknown(_) => None,
        }
    }
}

impl Default for Action {
    fn default() -> Self {
        Action::Unknown(String::new())
    }
}

impl From<String> for Action {
    fn from(s: String) -> Self {
        match s.as_str() {
            "run" => Action::Run,
            "output" => Action::Output,
            "pass" => Action::Pass,
            "fail" => Action::Fail,
            "skip" => Action::Skip,
            _ => Action::Unknown(s),
        }
    }
}

impl From<TestStatus> for Action {
    fn from(status: TestStatus) -> Self {
        match status {
            TestStatus::Fail => Action::Fail,
            TestStatus::Pass => Action::Pass,
            TestStatus::Skip => Action::Skip,
        }
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        match action {
            Action::Unknown(s) => s,
            other => other.as_str().to_owned(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
