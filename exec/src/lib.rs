//! Subprocess execution for external shell tools.
//!
//! Everything here funnels through [`execute`]: build an [`ExecRequest`]
//! describing one tool invocation, await the report. The call itself never
//! fails; spawn errors, timeouts, and cancellation are all terminal states
//! captured in the [`ExecReport`], so callers branch on data instead of
//! unwinding through error paths.

mod executor;
mod outcome;

pub use executor::{execute, DEFAULT_TIMEOUT, ExecRequest};
pub use outcome::{ExecError, ExecOutcome, ExecReport, SpawnErrorKind};
