//! # esdiag-analyzer
//!
//! Offline rule engine for search-cluster diagnostic bundles.
//!
//! A bundle is a directory of documents captured from one cluster: health,
//! node info and stats, the shard inventory, index settings and mappings,
//! field-data stats, the cluster state and a hot-threads dump. The analyzer
//! extracts typed metric sets from them, runs a fixed, ordered rule set and
//! returns a [`Report`] that splits findings into OK and ATTENTION groups,
//! alongside chart series and a hot-thread summary.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use esdiag_analyzer::{Analyzer, DirectoryBundle, FileSink};
//!
//! let bundle = DirectoryBundle::open("/var/tmp/diag")?;
//! let mut sink = FileSink::new("/var/tmp/diag/hot_threads_extract.txt");
//! let report = Analyzer::new().analyze(&bundle, Some(&mut sink))?;
//!
//! for finding in &report.attention {
//!     println!("{}: {}", finding.code(), finding.message());
//! }
//! # Ok::<(), esdiag_analyzer::AnalysisError>(())
//! ```
//!
//! Hot-thread extraction works on its own as well:
//!
//! ```rust
//! use esdiag_analyzer::{extract_hot_threads, AnalyzerConfig};
//!
//! let dump = "   95.0% cpu usage by thread 'search'\n     at Foo.bar\n\n";
//! let scan = extract_hot_threads(dump, &AnalyzerConfig::default().hot_threads);
//! assert_eq!(scan.len(), 1);
//! assert!(scan.finding(None).is_attention());
//! ```

pub mod aggregator;
pub mod analyzer;
pub mod bundle;
pub mod charts;
pub mod config;
pub mod error;
pub mod hot_threads;
pub mod metrics;
pub mod rules;
pub mod types;

pub use aggregator::{Aggregator, Entry, HotThreadSummary, Report};
pub use analyzer::Analyzer;
pub use bundle::{Artifact, Bundle, DirectoryBundle, MemoryBundle};
pub use charts::{build_charts, ChartSeries};
pub use config::AnalyzerConfig;
pub use error::{AnalysisError, Result};
pub use hot_threads::{
    extract_hot_threads, BlockSink, FileSink, HotThreadBlock, HotThreadExtractor, HotThreadScan,
    ScanState,
};
pub use metrics::ClusterMetrics;
pub use rules::{run_all_rules, Rule, RULES};
pub use types::{codes, Finding, FindingValue, Severity};
