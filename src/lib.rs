//! Lab-report parsing for soil and leaf analyses.
//!
//! OCR text in, canonical per-sample measurements out. See
//! [`LabReportParser`] for the single-document entry point and
//! [`parse_report_pair`] for a soil/leaf submission.

pub mod config;
pub mod pipeline;

pub use config::{ConfigError, ParserConfig};
pub use pipeline::extraction::{
    parse_report_pair, Domain, FieldValue, LabReportParser, Parameter, ParsingResult,
    PipelineError, RawDocument, ReportPair, Sample, StrategyKind,
};

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// Honors `RUST_LOG`, falling back to [`config::default_log_filter`]. Safe
/// to call more than once; later calls are ignored.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} v{} logging initialized", config::APP_NAME, config::APP_VERSION);
    }
}
