// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError,
    errors::Result,
    output::{OutputContext, OutputOpts, OutputWriter},
};
use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use std::{
    fs::File,
    io::{self, BufReader, Write},
};
use testtree_core::{
    config::{ChildOrder, ConfigLocation, TesttreeConfig},
    parse,
    reporter::{ShowOutput, TreeReporter},
    tree::Test,
};
use testtree_metadata::TesttreeExitCode;
use tracing::debug;

/// Turn a stream of newline-delimited JSON test events into a test tree.
///
/// Each line of the input is a JSON object with the fields `Test`, `Package`, `Time`, `Action`,
/// `Output` and `Elapsed`.
#[derive(Debug, Parser)]
#[command(
    version,
    bin_name = "testtree",
    max_term_width = 100
)]
pub struct TesttreeApp {
    /// Event stream to read [default: standard input]
    ///
    /// Pass `-` to read from standard input explicitly.
    #[arg(value_name = "INPUT")]
    input: Option<Utf8PathBuf>,

    /// Config file [default: .config/testtree.toml]
    ///
    /// Pass `none` to skip loading configuration entirely.
    #[arg(long, value_name = "PATH", env = "TESTTREE_CONFIG")]
    config: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t, value_name = "FORMAT")]
    message_format: MessageFormat,

    /// When to show captured test output [default: from config, or failing]
    #[arg(long, value_enum, value_name = "WHEN")]
    show_output: Option<ShowOutputOpt>,

    /// The order to list tests in [default: from config, or arrival]
    #[arg(long, value_enum, value_name = "ORDER")]
    child_order: Option<ChildOrderOpt>,

    #[command(flatten)]
    output: OutputOpts,
}

impl TesttreeApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the process exit code on success.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = TesttreeConfig::load(ConfigLocation::from_cli_or_env(self.config.as_deref()))
            .map_err(|err| ExpectedError::ConfigLoadError { err })?;

        let mut assemble_config = config.assemble;
        if let Some(child_order) = self.child_order {
            assemble_config.child_order = child_order.into();
        }
        let show_output = self
            .show_output
            .map_or(config.report.show_output, ShowOutput::from);

        let root = match self.input {
            Some(path) if path.as_str() != "-" => {
                debug!("reading events from {path}");
                let file = File::open(&path)
                    .map_err(|err| ExpectedError::InputOpenError { path, err })?;
                parse(BufReader::new(file), &assemble_config)
            }
            _ => {
                debug!("reading events from standard input");
                parse(io::stdin().lock(), &assemble_config)
            }
        }
        .map_err(|err| ExpectedError::StreamParseError { err })?;

        let mut writer = output_writer.stdout_writer();
        let written = match self.message_format {
            MessageFormat::Human => {
                let mut reporter = TreeReporter::new(show_output);
                if output.color.should_colorize(supports_color::Stream::Stdout) {
                    reporter.colorize();
                }
                reporter.write_tree(&root, &mut writer)
            }
            MessageFormat::Json => write_json(&root, &mut writer),
        };
        written
            .and_then(|()| writer.flush())
            .map_err(|err| ExpectedError::WriteOutputError { err })?;

        if root.stats().fail > 0 {
            Ok(TesttreeExitCode::TESTS_FAILED)
        } else {
            Ok(TesttreeExitCode::OK)
        }
    }
}

fn write_json(root: &Test, writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &root.to_summary())?;
    writeln!(writer)
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum MessageFormat {
    /// A human-readable report
    #[default]
    Human,
    /// The tree as a single JSON document
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShowOutputOpt {
    Never,
    Failing,
    Always,
}

impl From<ShowOutputOpt> for ShowOutput {
    fn from(opt: ShowOutputOpt) -> Self {
        match opt {
            ShowOutputOpt::Never => ShowOutput::Never,
            ShowOutputOpt::Failing => ShowOutput::Failing,
            ShowOutputOpt::Always => ShowOutput::Always,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ChildOrderOpt {
    Arrival,
    Name,
    StartTime,
}

impl From<ChildOrderOpt> for ChildOrder {
    fn from(opt: ChildOrderOpt) -> Self {
        match opt {
            ChildOrderOpt::Arrival => ChildOrder::Arrival,
            ChildOrderOpt::Name => ChildOrder::Name,
            ChildOrderOpt::StartTime => ChildOrder::StartTime,
        }
    }
}
