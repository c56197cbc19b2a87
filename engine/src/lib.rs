//! Engine: configuration, skip rules, and the diagnosis pipeline that
//! connects document events to tool plugins.
//!
//! Hosts construct one [`Orchestrator`] from a [`BosunConfig`] and an
//! injected [`DiagnosticSink`], then feed it document lifecycle events.
//! Everything else (debounce, cancellation, staleness, publication) is
//! internal.

mod config;
mod pipeline;
mod skip;

pub use config::{
    BosunConfig, ConfigError, DiagnosticsSection, FilesSection, ShellcheckSection, ShfmtSection,
    DEFAULT_SKIP, PROJECT_CONFIG,
};
pub use pipeline::{DiagnosticSink, NullSink, Orchestrator};
pub use skip::SkipList;
