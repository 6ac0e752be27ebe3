use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Which coordination primitive a task family exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskFamily {
    /// Reader-writer lock tasks: `READ`, `WRITE`, `TRY`
    Lock,
    /// Condition tasks: `WAIT`, `SIGNAL`
    Condition,
}

impl fmt::Display for TaskFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskFamily::Lock => "lock",
            TaskFamily::Condition => "condition",
        })
    }
}

/// The five task behaviours the harness can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Read,
    Write,
    TryWrite,
    Wait,
    Signal,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown task kind: {0} (expected READ, WRITE, TRY, WAIT or SIGNAL)")]
pub struct UnknownTaskKind(pub String);

impl TaskKind {
    pub const ALL: [TaskKind; 5] = [
        TaskKind::Read,
        TaskKind::Write,
        TaskKind::TryWrite,
        TaskKind::Wait,
        TaskKind::Signal,
    ];

    /// Operator token for this kind.
    pub fn token(self) -> &'static str {
        match self {
            TaskKind::Read => "READ",
            TaskKind::Write => "WRITE",
            TaskKind::TryWrite => "TRY",
            TaskKind::Wait => "WAIT",
            TaskKind::Signal => "SIGNAL",
        }
    }

    pub fn family(self) -> TaskFamily {
        match self {
            TaskKind::Read | TaskKind::Write | TaskKind::TryWrite => TaskFamily::Lock,
            TaskKind::Wait | TaskKind::Signal => TaskFamily::Condition,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for TaskKind {
    type Err = UnknownTaskKind;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        TaskKind::ALL
            .into_iter()
            .find(|kind| kind.token().eq_ignore_ascii_case(token))
            .ok_or_else(|| UnknownTaskKind(token.to_string()))
    }
}
