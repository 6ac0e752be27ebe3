//! # Command Driver
//!
//! Operator console for the harness. Input is read one line per field from
//! any async reader, each line trimmed:
//!
//! - `QUIT`: stop reading and shut the pool down
//! - `INFO`: print a pool snapshot
//! - any other non-blank line: read a task name, a duration in time units
//!   and a kind (`READ`, `WRITE`, `TRY`, `WAIT`, `SIGNAL`) on the next three
//!   lines, then submit the task
//!
//! Keywords and kinds are case-insensitive. End of input acts as `QUIT`. A
//! line that is not valid UTF-8 skips the command being read.

mod command;
#[allow(clippy::module_inception)]
mod driver;

pub use command::{Command, CommandParser, CommandReader, InputLine, Prompt, TaskRequest};
pub use driver::{Driver, DriverSummary, FORCED_STOP_WAIT};
