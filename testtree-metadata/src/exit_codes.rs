// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `testtree` failures.
///
/// `testtree` may fail for a variety of reasons. This structure documents the exit codes that may
/// occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum TesttreeExitCode {}

impl TesttreeExitCode {
    /// No errors occurred, and no test in the tree failed.
    pub const OK: i32 = 0;

    /// The tree was assembled successfully, but one or more tests in it failed.
    pub const TESTS_FAILED: i32 = 100;

    /// The event stream could not be read, or a line in it could not be decoded.
    pub const PARSE_FAILED: i32 = 101;

    /// The event stream was decoded, but a tree could not be assembled from it.
    ///
    /// This happens if a record has an unknown action, or if the stream doesn't contain exactly
    /// one root.
    pub const ASSEMBLY_FAILED: i32 = 102;

    /// A user issue happened while setting up a testtree invocation, for example an invalid
    /// config file or an input path that couldn't be opened.
    pub const SETUP_ERROR: i32 = 96;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
