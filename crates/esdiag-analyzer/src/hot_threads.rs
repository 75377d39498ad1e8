//! Hot-thread block extraction.
//!
//! A hot-threads dump is a sequence of per-thread stack snippets, each
//! opened by an indented header line starting with the thread's CPU share:
//!
//! ```text
//!    95.3% [cpu=95.3%, other=0.0%] (476.5ms out of 500ms) cpu usage by thread 'search[T#3]'
//!      org.apache.lucene.search.BooleanScorer.score(BooleanScorer.java:315)
//!      ...
//! ```
//!
//! [`HotThreadExtractor`] is a two-state machine over the dump's lines that
//! keeps the snippets whose header is at or above the hot threshold. A blank
//! line ends a snippet; an unterminated snippet at end of input is dropped.

use std::fs;
use std::io::Write;
use std::mem;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::HotThreadConfig;
use crate::error::{AnalysisError, Result};
use crate::types::{codes, Finding, FindingValue};

/// Indented header percentage, e.g. `   95.3%`.
static HEADER_PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s+(\d{1,3}(?:\.\d+)?)%").unwrap_or_else(|_| unreachable!()));

/// CPU percentage of a snippet header line, if the line is one.
pub fn header_cpu_percent(line: &str) -> Option<f64> {
    HEADER_PERCENT
        .captures(line)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// One retained stack snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotThreadBlock {
    lines: Vec<String>,
}

impl HotThreadBlock {
    /// Trimmed lines, header first.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The header line.
    #[must_use]
    pub fn header(&self) -> &str {
        self.lines.first().map_or("", String::as_str)
    }
}

/// Extractor state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanState {
    /// Outside any hot snippet.
    #[default]
    Scanning,
    /// Accumulating a hot snippet.
    InBlock(Vec<String>),
}

/// Line-by-line hot snippet extractor.
#[derive(Debug, Clone)]
pub struct HotThreadExtractor {
    hot_cpu_percent: f64,
    max_block_lines: usize,
    state: ScanState,
    blocks: Vec<HotThreadBlock>,
}

impl HotThreadExtractor {
    /// Creates an extractor with the configured threshold and line cap.
    #[must_use]
    pub fn new(config: &HotThreadConfig) -> Self {
        Self {
            hot_cpu_percent: config.hot_cpu_percent,
            max_block_lines: config.max_block_lines,
            state: ScanState::Scanning,
            blocks: Vec::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &ScanState {
        &self.state
    }

    fn is_hot(&self, line: &str) -> bool {
        header_cpu_percent(line).is_some_and(|p| p >= self.hot_cpu_percent)
    }

    /// Consumes one dump line.
    pub fn feed(&mut self, line: &str) {
        let hot = self.is_hot(line);
        self.state = match mem::take(&mut self.state) {
            ScanState::Scanning if hot => ScanState::InBlock(vec![line.trim().to_string()]),
            ScanState::Scanning => ScanState::Scanning,
            ScanState::InBlock(discarded) if hot => {
                debug!(lines = discarded.len(), "unterminated hot block replaced");
                ScanState::InBlock(vec![line.trim().to_string()])
            }
            ScanState::InBlock(lines) if line.trim().is_empty() => {
                self.blocks.push(HotThreadBlock { lines });
                ScanState::Scanning
            }
            ScanState::InBlock(mut lines) => {
                if lines.len() < self.max_block_lines {
                    lines.push(line.trim().to_string());
                }
                ScanState::InBlock(lines)
            }
        };
    }

    /// Ends the input and returns the completed blocks in order.
    #[must_use]
    pub fn finish(self) -> Vec<HotThreadBlock> {
        if let ScanState::InBlock(lines) = &self.state {
            debug!(lines = lines.len(), "trailing hot block dropped");
        }
        self.blocks
    }
}

/// Result of scanning one dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotThreadScan {
    blocks: Vec<HotThreadBlock>,
    hot_cpu_percent: f64,
    export_threshold: usize,
}

impl HotThreadScan {
    /// Extracted blocks in dump order.
    #[must_use]
    pub fn blocks(&self) -> &[HotThreadBlock] {
        &self.blocks
    }

    /// Number of blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if no hot block was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Returns true when there are enough blocks to write them to a sink.
    #[must_use]
    pub fn is_export_worthy(&self) -> bool {
        self.blocks.len() > self.export_threshold
    }

    /// The `HOT_THREADS` finding; `exported_to` names the sink the blocks
    /// were written to, if any.
    #[must_use]
    pub fn finding(&self, exported_to: Option<&str>) -> Finding {
        let count = self.blocks.len();
        let threshold = self.hot_cpu_percent;
        let finding = match (count, exported_to) {
            (0, _) => Finding::ok(
                codes::HOT_THREADS,
                format!("No threads at or above {threshold}% CPU"),
            ),
            (_, Some(location)) => Finding::attention(
                codes::HOT_THREADS,
                format!(
                    "{count} threads at or above {threshold}% CPU, blocks written to {location}"
                ),
            ),
            (_, None) => Finding::attention(
                codes::HOT_THREADS,
                format!("{count} threads at or above {threshold}% CPU"),
            ),
        };
        finding.with_value(FindingValue::Count(count as u64))
    }
}

/// Scans a whole dump.
#[must_use]
pub fn extract_hot_threads(dump: &str, config: &HotThreadConfig) -> HotThreadScan {
    let mut extractor = HotThreadExtractor::new(config);
    for line in dump.lines() {
        extractor.feed(line);
    }
    let blocks = extractor.finish();
    debug!(blocks = blocks.len(), "hot threads scanned");
    HotThreadScan {
        blocks,
        hot_cpu_percent: config.hot_cpu_percent,
        export_threshold: config.export_threshold,
    }
}

/// Destination for exported hot-thread blocks.
pub trait BlockSink {
    /// Writes the blocks and returns a description of where they went.
    fn write_blocks(&mut self, blocks: &[HotThreadBlock]) -> Result<String>;
}

/// Writes blocks to a text file, one blank line between blocks.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Creates a sink for `path`; the file is created or truncated on write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlockSink for FileSink {
    fn write_blocks(&mut self, blocks: &[HotThreadBlock]) -> Result<String> {
        let location = self.path.display().to_string();
        let sink_error = |source| AnalysisError::SinkWrite {
            location: location.clone(),
            source,
        };

        let mut file = fs::File::create(&self.path).map_err(sink_error)?;
        for block in blocks {
            for line in block.lines() {
                writeln!(file, "{line}").map_err(sink_error)?;
            }
            writeln!(file).map_err(sink_error)?;
        }
        file.flush().map_err(sink_error)?;
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> HotThreadConfig {
        HotThreadConfig::default()
    }

    fn extract(lines: &[&str]) -> Vec<HotThreadBlock> {
        let mut extractor = HotThreadExtractor::new(&config());
        for line in lines {
            extractor.feed(line);
        }
        extractor.finish()
    }

    mod header_tests {
        use super::*;

        #[test]
        fn parses_indented_percentages() {
            assert_eq!(header_cpu_percent("   95.3% [cpu=95.3%]"), Some(95.3));
            assert_eq!(header_cpu_percent("  100.0% busy"), Some(100.0));
            assert_eq!(header_cpu_percent("\t90% busy"), Some(90.0));
        }

        #[test]
        fn rejects_unindented_or_non_header_lines() {
            assert_eq!(header_cpu_percent("95.0% foo"), None);
            assert_eq!(header_cpu_percent("   at org.Foo.bar(Foo.java:1)"), None);
            assert_eq!(header_cpu_percent(""), None);
        }
    }

    mod state_machine_tests {
        use super::*;

        #[test]
        fn keeps_only_hot_blocks() {
            let blocks = extract(&["  95.0% foo", "  line2", "", "  10.0% bar", "  line3", ""]);
            assert_eq!(blocks.len(), 1);
            assert_eq!(blocks[0].lines(), &["95.0% foo".to_string(), "line2".to_string()]);
        }

        #[test]
        fn threshold_is_inclusive() {
            let blocks = extract(&["  90.0% edge", "", "  89.9% below", ""]);
            assert_eq!(blocks.len(), 1);
            assert_eq!(blocks[0].header(), "90.0% edge");
        }

        #[test]
        fn hot_header_replaces_open_block() {
            let blocks = extract(&["  95.0% first", "  a", "  97.0% second", "  b", ""]);
            assert_eq!(blocks.len(), 1);
            assert_eq!(blocks[0].lines(), &["97.0% second".to_string(), "b".to_string()]);
        }

        #[test]
        fn trailing_block_is_dropped() {
            let blocks = extract(&["  95.0% done", "", "  99.0% open", "  frame"]);
            assert_eq!(blocks.len(), 1);
            assert_eq!(blocks[0].header(), "95.0% done");
        }

        #[test]
        fn whitespace_only_line_ends_block() {
            let blocks = extract(&["  95.0% foo", "  frame", "   \t", "  frame2"]);
            assert_eq!(blocks.len(), 1);
            assert_eq!(blocks[0].lines().len(), 2);
        }

        #[test]
        fn blocks_are_capped() {
            let mut lines = vec!["  99.9% busy".to_string()];
            lines.extend((0..20).map(|i| format!("    frame {i}")));
            lines.push(String::new());
            let refs: Vec<&str> = lines.iter().map(String::as_str).collect();

            let blocks = extract(&refs);
            assert_eq!(blocks[0].lines().len(), 10);
            assert_eq!(blocks[0].lines()[9], "frame 8");
        }

        #[test]
        fn state_follows_input() {
            let mut extractor = HotThreadExtractor::new(&config());
            assert_eq!(extractor.state(), &ScanState::Scanning);
            extractor.feed("  95.0% foo");
            assert_eq!(extractor.state(), &ScanState::InBlock(vec!["95.0% foo".to_string()]));
            extractor.feed("");
            assert_eq!(extractor.state(), &ScanState::Scanning);
        }
    }

    mod scan_tests {
        use super::*;

        fn dump(blocks: usize) -> String {
            (0..blocks).map(|i| format!("  95.0% t{i}\n  frame\n\n")).collect()
        }

        #[test]
        fn export_needs_more_than_threshold() {
            assert!(!extract_hot_threads(&dump(5), &config()).is_export_worthy());
            assert!(extract_hot_threads(&dump(6), &config()).is_export_worthy());
        }

        #[test]
        fn finding_reflects_count_and_location() {
            let empty = extract_hot_threads("", &config());
            assert!(!empty.finding(None).is_attention());

            let scan = extract_hot_threads(&dump(7), &config());
            let exported = scan.finding(Some("/tmp/hot.txt"));
            assert!(exported.is_attention());
            assert!(exported.message().contains("/tmp/hot.txt"));
            assert_eq!(exported.value(), Some(&FindingValue::Count(7)));

            let unexported = scan.finding(None);
            assert!(!unexported.message().contains("written"));
        }

        #[test]
        fn file_sink_writes_blocks_verbatim() {
            let dir = tempfile::tempdir().expect("temp dir");
            let path = dir.path().join("hot.txt");
            let scan = extract_hot_threads(&dump(2), &config());

            let mut sink = FileSink::new(&path);
            let location = sink.write_blocks(scan.blocks()).expect("write blocks");
            assert_eq!(location, path.display().to_string());

            let written = fs::read_to_string(&path).expect("read back");
            assert_eq!(written, "95.0% t0\nframe\n\n95.0% t1\nframe\n\n");
        }

        #[test]
        fn file_sink_failure_is_sink_write() {
            let dir = tempfile::tempdir().expect("temp dir");
            let mut sink = FileSink::new(dir.path().join("missing").join("hot.txt"));
            let err = sink.write_blocks(&[]).expect_err("parent missing");
            assert!(matches!(err, AnalysisError::SinkWrite { .. }));
            assert!(!err.is_fatal());
        }
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn dump_line() -> impl Strategy<Value = &'static str> {
            prop::sample::select(vec![
                "",
                "   ",
                "  95.0% hot",
                "  100.0% hotter",
                "  10.0% cold",
                "    frame",
                "at top level",
            ])
        }

        proptest! {
            #[test]
            fn blocks_are_bounded_and_start_hot(
                lines in prop::collection::vec(dump_line(), 0..80),
            ) {
                let blocks = extract(&lines);
                let blank_lines = lines.iter().filter(|l| l.trim().is_empty()).count();
                prop_assert!(blocks.len() <= blank_lines);
                for block in &blocks {
                    prop_assert!(!block.lines().is_empty());
                    prop_assert!(block.lines().len() <= 10);
                    let header = block.header();
                    prop_assert!(header.ends_with("hot") || header.ends_with("hotter"));
                    prop_assert!(block.lines().iter().all(|l| !l.is_empty() && l.trim() == l));
                }
            }

            #[test]
            fn cold_dumps_yield_nothing(lines in prop::collection::vec(
                prop::sample::select(vec!["", "  10.0% cold", "    frame"]), 0..40)
            ) {
                prop_assert!(extract(&lines).is_empty());
            }
        }
    }
}
