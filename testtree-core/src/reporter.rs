// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-readable rendering of an assembled test tree.

use crate::tree::Test;
use owo_colors::{OwoColorize, Style};
use serde::Deserialize;
use std::{
    fmt,
    io::{self, Write},
    time::Duration,
};
use testtree_metadata::{StatusCounts, TestStatus};

/// When to show the output captured for a test.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShowOutput {
    /// Never show captured output.
    Never,

    /// Show captured output for failed tests only.
    #[default]
    Failing,

    /// Show captured output for every test.
    Always,
}

impl ShowOutput {
    fn is_shown_for(self, status: Option<TestStatus>) -> bool {
        match self {
            Self::Never => false,
            Self::Failing => status == Some(TestStatus::Fail),
            Self::Always => true,
        }
    }
}

/// Writes a [`Test`] tree in a human-readable form.
///
/// ```text
///    Assembled 2 tests for pkg (started 2024-05-01T10:00:01+00:00)
///         PASS [   0.005s] pkg::TestA
///         FAIL [   0.120s] pkg::TestB
///
/// --- OUTPUT: pkg::TestB ---
/// expected 1, got 2
///
///      Summary [   0.130s] 2 tests run: 1 passed, 1 failed, 0 skipped
/// ```
#[derive(Clone, Debug)]
pub struct TreeReporter {
    show_output: ShowOutput,
    styles: Styles,
}

impl TreeReporter {
    /// Creates a new reporter. Output is not colorized until [`colorize`](Self::colorize) is
    /// called.
    pub fn new(show_output: ShowOutput) -> Self {
        Self {
            show_output,
            styles: Styles::default(),
        }
    }

    /// Colorizes output.
    pub fn colorize(&mut self) {
        self.styles.colorize();
    }

    /// Writes `root` and all its children to `writer`.
    pub fn write_tree(&self, root: &Test, writer: &mut dyn Write) -> io::Result<()> {
        self.write_header(root, writer)?;

        for child in root.children() {
            self.write_status_line(child, writer)?;
        }

        // Output sections follow all status lines.
        for child in root.children() {
            if self.show_output.is_shown_for(child.status()) && !child.output().is_empty() {
                self.write_output(child, writer)?;
            }
        }

        self.write_summary(root, writer)
    }

    fn write_header(&self, root: &Test, writer: &mut dyn Write) -> io::Result<()> {
        let test_count = root.children().len();
        write!(
            writer,
            "{:>12} {} {}",
            "Assembled".style(self.styles.pass),
            test_count.style(self.styles.count),
            tests_str(test_count),
        )?;
        if !root.package().is_empty() {
            write!(writer, " for {}", root.package().style(self.styles.package))?;
        }
        if let Some(start_time) = root.start_time() {
            write!(writer, " (started {})", start_time.to_rfc3339())?;
        }
        writeln!(writer)
    }

    fn write_status_line(&self, test: &Test, writer: &mut dyn Write) -> io::Result<()> {
        let (label, style) = match test.status() {
            Some(TestStatus::Pass) => ("PASS", self.styles.pass),
            Some(TestStatus::Fail) => ("FAIL", self.styles.fail),
            Some(TestStatus::Skip) => ("SKIP", self.styles.skip),
            None => ("----", self.styles.skip),
        };
        writeln!(
            writer,
            "{:>12} {}{}",
            label.style(style),
            DisplayBracketedDuration(test.elapsed()),
            DisplayTestName::new(test, &self.styles),
        )
    }

    fn write_output(&self, test: &Test, writer: &mut dyn Write) -> io::Result<()> {
        let header_style = match test.status() {
            Some(TestStatus::Fail) => self.styles.fail,
            _ => self.styles.pass,
        };
        writeln!(writer)?;
        writeln!(
            writer,
            "{} {}{}",
            "--- OUTPUT:".style(header_style),
            DisplayTestName::new(test, &self.styles),
            " ---".style(header_style),
        )?;
        writer.write_all(test.output().as_bytes())?;
        if !test.output().ends_with('\n') {
            writeln!(writer)?;
        }
        Ok(())
    }

    fn write_summary(&self, root: &Test, writer: &mut dyn Write) -> io::Result<()> {
        // The root's own status describes the run as a whole, so it isn't counted as a test.
        let mut counts = StatusCounts::default();
        for child in root.children() {
            counts.add(child.stats());
        }
        let test_count = root.children().len();

        let summary_style = if counts.fail > 0 {
            self.styles.fail
        } else if test_count == 0 {
            self.styles.skip
        } else {
            self.styles.pass
        };

        writeln!(writer)?;
        writeln!(
            writer,
            "{:>12} {}{} {} run: {} {}, {} {}, {} {}",
            "Summary".style(summary_style),
            DisplayBracketedDuration(root.elapsed()),
            test_count.style(self.styles.count),
            tests_str(test_count),
            counts.pass.style(self.styles.count),
            "passed".style(self.styles.pass),
            counts.fail.style(self.styles.count),
            "failed".style(self.styles.fail),
            counts.skip.style(self.styles.count),
            "skipped".style(self.styles.skip),
        )
    }
}

fn tests_str(count: usize) -> &'static str {
    if count == 1 { "test" } else { "tests" }
}

#[derive(Clone, Debug, Default)]
struct Styles {
    count: Style,
    pass: Style,
    fail: Style,
    skip: Style,
    package: Style,
    test_name: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.count = Style::new().bold();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.skip = Style::new().yellow().bold();
        self.package = Style::new().magenta().bold();
        self.test_name = Style::new().blue().bold();
    }
}

struct DisplayBracketedDuration(Duration);

impl fmt::Display for DisplayBracketedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Right-aligned to 8 characters, with millisecond precision.
        write!(f, "[{:>8.3}s] ", self.0.as_secs_f64())
    }
}

struct DisplayTestName<'a> {
    test: &'a Test,
    styles: &'a Styles,
}

impl<'a> DisplayTestName<'a> {
    fn new(test: &'a Test, styles: &'a Styles) -> Self {
        Self { test, styles }
    }
}

impl fmt::Display for DisplayTestName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.test.package().is_empty() {
            write!(f, "{}::", self.test.package().style(self.styles.package))?;
        }
        write!(f, "{}", self.test.name().style(self.styles.test_name))
    }
}
