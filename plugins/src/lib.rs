//! Tool plugins for shell documents.
//!
//! Each plugin wraps one external binary (a formatter, a linter) behind
//! the [`ToolPlugin`] trait: probe for availability, run a check pass
//! that yields diagnostics, and optionally produce a formatted
//! replacement. The [`PluginRegistry`] owns the set of plugins, tracks
//! which ones are active, and fans document checks out across them.
//!
//! Plugins never panic on tool failure. A missing binary, a timeout, or
//! a cancelled run all degrade into either an inconclusive report or a
//! diagnostic describing the failure, so one broken tool cannot take
//! down the whole pipeline.

mod convert;
mod plugin;
mod registry;
mod shellcheck;
mod shfmt;

pub use convert::{
    execution_diagnostic, finding_to_diagnostic, findings_to_diagnostics, EXECUTION_ERROR_CODE,
    FORMAT_ISSUE_CODE, SYNTAX_ERROR_CODE,
};
pub use plugin::{PluginError, PluginFut, RunOptions, ToolPlugin};
pub use registry::PluginRegistry;
pub use shellcheck::{parse_shellcheck, ShellcheckConfig, ShellcheckPlugin};
pub use shfmt::{parse_shfmt, ShfmtConfig, ShfmtMode, ShfmtPlugin};
