//! Core domain types for bosun.
//!
//! This crate contains pure domain types with no IO and no async.
//! Everything here can be used from any layer: executor reports are
//! parsed into [`ToolReport`]s, adapters turn findings into
//! [`Diagnostic`]s, and the registry merges them into [`CheckReport`]s
//! and [`FormatReport`]s for the host.

mod diagnostic;
mod document;
mod finding;
mod report;

pub use diagnostic::{Diagnostic, Severity, Span};
pub use document::{DocumentId, DocumentSnapshot};
pub use finding::{Finding, FormatIssue, LintIssue, SyntaxError, ToolReport};
pub use report::{CheckReport, FormatReport, PluginInfo, RegistryStats};
