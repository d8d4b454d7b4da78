// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Proptest strategies for event streams, plus readers and log capture for tests.

use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone, Utc};
use proptest::{collection::vec, option, prelude::*};
use std::{
    io::{self, Read},
    sync::{Arc, Mutex},
};
use testtree_metadata::{Action, Record, TestStatus};

/// Strategy for generating arbitrary `DateTime<FixedOffset>` values.
pub(crate) fn arb_datetime_fixed_offset() -> impl Strategy<Value = DateTime<FixedOffset>> {
    // Year 2000-2100, with whole-minute offsets so values survive RFC 3339 round-tripping.
    (946684800i64..4102444800i64, -720i32..720i32).prop_map(|(secs, offset_minutes)| {
        let offset = FixedOffset::east_opt(offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
        let utc = Utc
            .timestamp_opt(secs, 0)
            .single()
            .expect("valid timestamp");
        utc.with_timezone(&offset)
    })
}

pub(crate) fn arb_test_status() -> impl Strategy<Value = TestStatus> {
    prop_oneof![
        Just(TestStatus::Pass),
        Just(TestStatus::Fail),
        Just(TestStatus::Skip),
    ]
}

/// Everything recorded about one test in a generated stream.
#[derive(Clone, Debug)]
struct TestEvents {
    package: &'static str,
    status: Option<TestStatus>,
    outputs: Vec<String>,
    elapsed_ms: u32,
}

fn arb_test_events() -> impl Strategy<Value = TestEvents> {
    (
        prop_oneof![Just("pkg"), Just("pkg/sub")],
        option::of(arb_test_status()),
        vec("[a-z ]{0,8}\n?", 0..4),
        0..10_000u32,
    )
        .prop_map(|(package, status, outputs, elapsed_ms)| TestEvents {
            package,
            status,
            outputs,
            elapsed_ms,
        })
}

fn record(
    package: &str,
    test: &str,
    time: Option<DateTime<FixedOffset>>,
    action: Action,
) -> Record {
    Record {
        test: test.to_owned(),
        package: package.to_owned(),
        time,
        action,
        output: String::new(),
        elapsed: 0.0,
    }
}

/// Strategy for a well-formed event stream: a run-level group for package `pkg` plus up to 8
/// tests, each with a distinct name.
///
/// Every record has a distinct time, so the assembled tree doesn't depend on arrival order.
pub(crate) fn arb_event_stream() -> impl Strategy<Value = Vec<Record>> {
    (arb_datetime_fixed_offset(), vec(arb_test_events(), 0..8)).prop_map(|(start, tests)| {
        let mut records = Vec::new();
        let mut tick = 0;
        let mut next_time = move || {
            tick += 1;
            Some(start + TimeDelta::seconds(tick))
        };

        let mut header = record("pkg", "", next_time(), Action::Output);
        header.output = "running tests\n".to_owned();
        records.push(header);

        let mut total_elapsed = 0.0;
        for (index, test) in tests.iter().enumerate() {
            let name = format!("Test{index}");
            records.push(record(test.package, &name, next_time(), Action::Run));
            for output in &test.outputs {
                let mut output_record = record(test.package, &name, next_time(), Action::Output);
                output_record.output = output.clone();
                records.push(output_record);
            }
            if let Some(status) = test.status {
                let mut terminal = record(test.package, &name, next_time(), status.into());
                terminal.elapsed = f64::from(test.elapsed_ms);
                total_elapsed += terminal.elapsed;
                records.push(terminal);
            }
        }

        let failed = tests
            .iter()
            .any(|test| test.status == Some(TestStatus::Fail));
        let root_action = if failed { Action::Fail } else { Action::Pass };
        let mut footer = record("pkg", "", next_time(), root_action);
        footer.elapsed = total_elapsed;
        records.push(footer);

        records
    })
}

/// Strategy for an event stream along with a shuffled copy of it.
pub(crate) fn arb_event_stream_with_shuffle() -> impl Strategy<Value = (Vec<Record>, Vec<Record>)>
{
    arb_event_stream()
        .prop_flat_map(|records| (Just(records.clone()), Just(records).prop_shuffle()))
}

#[derive(Clone, Debug)]
enum GroupEvent {
    Run,
    Output(String),
    Terminal(TestStatus, u32),
}

fn arb_group_event() -> impl Strategy<Value = GroupEvent> {
    prop_oneof![
        1 => Just(GroupEvent::Run),
        4 => "[a-z]{1,4}".prop_map(GroupEvent::Output),
        1 => (arb_test_status(), 0..1_000u32)
            .prop_map(|(status, elapsed)| GroupEvent::Terminal(status, elapsed)),
    ]
}

/// Strategy for the records of a single group `pkg::T`, in an arbitrary arrival order.
///
/// Times are drawn from a narrow range so that ties and unset times are common.
pub(crate) fn arb_group_records() -> impl Strategy<Value = Vec<Record>> {
    (
        arb_datetime_fixed_offset(),
        vec((option::of(0..5i64), arb_group_event()), 0..16),
    )
        .prop_map(|(start, events)| {
            events
                .into_iter()
                .map(|(offset, event)| {
                    let time = offset.map(|offset| start + TimeDelta::seconds(offset));
                    match event {
                        GroupEvent::Run => record("pkg", "T", time, Action::Run),
                        GroupEvent::Output(output) => Record {
                            output,
                            ..record("pkg", "T", time, Action::Output)
                        },
                        GroupEvent::Terminal(status, elapsed) => Record {
                            elapsed: f64::from(elapsed),
                            ..record("pkg", "T", time, status.into())
                        },
                    }
                })
                .collect()
        })
}

/// A reader that yields `data`, then fails every subsequent read.
pub(crate) struct FailAfter<'a> {
    pub(crate) data: &'a [u8],
}

impl Read for FailAfter<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.data.is_empty() {
            return Err(io::Error::other("stream closed"));
        }
        self.data.read(buf)
    }
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .expect("log buffer lock is not poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a thread-local subscriber, returning whatever it logged at `WARN` or above.
pub(crate) fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(move || writer.clone())
        .finish();

    let value = tracing::subscriber::with_default(subscriber, f);
    let bytes = logs
        .0
        .lock()
        .expect("log buffer lock is not poisoned")
        .clone();
    (value, String::from_utf8(bytes).expect("logs are UTF-8"))
}
