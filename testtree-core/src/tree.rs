// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The assembled test tree.

use chrono::{DateTime, FixedOffset};
use std::{sync::OnceLock, time::Duration};
use testtree_metadata::{StatusCounts, TestStatus, TestSummary};

/// A node in an assembled test tree.
///
/// The root node represents the overall run and has an empty name; every other test is a direct
/// child of the root.
///
/// A `Test` is immutable once assembled. The only state that changes afterwards is the cached
/// result of [`stats`](Self::stats).
#[derive(Clone, Debug)]
pub struct Test {
    pub(crate) name: String,
    pub(crate) package: String,
    pub(crate) start_time: Option<DateTime<FixedOffset>>,
    pub(crate) status: Option<TestStatus>,
    pub(crate) elapsed: Duration,
    pub(crate) output: String,
    pub(crate) children: Vec<Test>,
    // Computed on first access.
    stats: OnceLock<StatusCounts>,
}

impl Test {
    pub(crate) fn new(
        name: String,
        package: String,
        start_time: Option<DateTime<FixedOffset>>,
        status: Option<TestStatus>,
        elapsed: Duration,
        output: String,
    ) -> Self {
        Self {
            name,
            package,
            start_time,
            status,
            elapsed,
            output,
            children: Vec::new(),
            stats: OnceLock::new(),
        }
    }

    /// Returns the name of this test. Empty for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the package this test belongs to.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Returns the time at which this test started, if known.
    ///
    /// For the root, this is the earliest start time among its children.
    pub fn start_time(&self) -> Option<DateTime<FixedOffset>> {
        self.start_time
    }

    /// Returns the terminal status of this test, if one was observed.
    pub fn status(&self) -> Option<TestStatus> {
        self.status
    }

    /// Returns the time this test took, as reported by its terminal record.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns all output this test produced, in chronological order.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Returns the children of this test.
    pub fn children(&self) -> &[Test] {
        &self.children
    }

    /// Returns true if this is the root of a tree.
    pub fn is_root(&self) -> bool {
        self.name.is_empty()
    }

    /// Returns the number of tests with each status in this subtree, including this test.
    ///
    /// Computed on first call and cached for this node and every descendant.
    pub fn stats(&self) -> &StatusCounts {
        self.stats.get_or_init(|| {
            let mut stats = StatusCounts::for_status(self.status);
            for child in &self.children {
                stats.add(child.stats());
            }
            stats
        })
    }

    /// Returns the number of nodes in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Test::count).sum::<usize>()
    }

    /// Iterates over this subtree in depth-first pre-order, along with the depth of each node
    /// (0 for `self`).
    pub fn iter(&self) -> TestIter<'_> {
        TestIter {
            stack: vec![(0, self)],
        }
    }

    /// Iterates over the direct children of this test that failed.
    pub fn failed(&self) -> impl Iterator<Item = &Test> + '_ {
        self.children
            .iter()
            .filter(|child| child.status == Some(TestStatus::Fail))
    }

    /// Converts this subtree into its machine-readable form.
    pub fn to_summary(&self) -> TestSummary {
        let mut summary = TestSummary::new(
            self.name.clone(),
            self.package.clone(),
            self.start_time,
            self.status,
            self.elapsed.as_secs_f64() * 1000.0,
            self.output.clone(),
        );
        for child in &self.children {
            summary.add_child(child.to_summary());
        }
        summary
    }
}

/// Iterator over a subtree of [`Test`]s, returned by [`Test::iter`].
#[derive(Clone, Debug)]
pub struct TestIter<'a> {
    stack: Vec<(usize, &'a Test)>,
}

impl<'a> Iterator for TestIter<'a> {
    type Item = (usize, &'a Test);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, test) = self.stack.pop()?;
        // Push in reverse so children are visited in order.
        self.stack
            .extend(test.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, test))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn leaf(name: &str, status: Option<TestStatus>) -> Test {
        Test::new(
            name.to_owned(),
            "pkg".to_owned(),
            None,
            status,
            Duration::ZERO,
            String::new(),
        )
    }

    fn sample_tree() -> Test {
        let mut root = leaf("", None);
        root.children = vec![
            leaf("TestA", Some(TestStatus::Pass)),
            leaf("TestB", Some(TestStatus::Fail)),
            leaf("TestC", Some(TestStatus::Skip)),
            leaf("TestD", None),
            leaf("TestE", Some(TestStatus::Pass)),
        ];
        root
    }

    #[test]
    fn stats_and_count() {
        let root = sample_tree();
        assert_eq!(
            *root.stats(),
            StatusCounts {
                fail: 1,
                pass: 2,
                skip: 1
            }
        );
        assert_eq!(root.count(), 6);
        assert_eq!(root.children()[3].count(), 1);
        assert_eq!(*root.children()[3].stats(), StatusCounts::default());
    }

    #[test]
    fn stats_are_cached() {
        let mut root = sample_tree();
        let first = *root.stats();
        assert!(std::ptr::eq(root.stats(), root.stats()));

        // Mutating the tree after the fact (only possible within the crate) doesn't invalidate
        // the cached value.
        root.children.push(leaf("TestF", Some(TestStatus::Fail)));
        assert_eq!(*root.stats(), first);
    }

    #[test]
    fn iter_is_preorder() {
        let mut root = sample_tree();
        root.children[0]
            .children
            .push(leaf("TestA/sub", Some(TestStatus::Pass)));

        let visited: Vec<_> = root
            .iter()
            .map(|(depth, test)| (depth, test.name()))
            .collect();
        assert_eq!(
            visited,
            vec![
                (0, ""),
                (1, "TestA"),
                (2, "TestA/sub"),
                (1, "TestB"),
                (1, "TestC"),
                (1, "TestD"),
                (1, "TestE"),
            ]
        );
    }

    #[test]
    fn failed_children() {
        let root = sample_tree();
        let failed: Vec<_> = root.failed().map(Test::name).collect();
        assert_eq!(failed, vec!["TestB"]);
    }

    #[test]
    fn summary_matches_tree() {
        let root = sample_tree();
        let summary = root.to_summary();
        assert!(summary.is_root());
        assert_eq!(summary.count, root.count());
        assert_eq!(summary.stats, *root.stats());
        assert_eq!(summary.children.len(), 5);
        assert_eq!(summary.children[1].status, Some(TestStatus::Fail));
    }
}
