use std::fmt;
use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::task::{LockTask, TaskKind};

/// A task the operator asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    pub name: String,
    pub duration_units: u64,
    pub kind: TaskKind,
}

impl TaskRequest {
    pub fn into_task(self) -> LockTask {
        LockTask::new(self.name, self.duration_units, self.kind)
    }
}

/// One parsed operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Info,
    Submit(TaskRequest),
    /// A submission that could not be parsed; nothing is submitted.
    Skip(String),
}

/// What the parser needs next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Command,
    Name,
    Duration,
    Kind,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Prompt::Command => "Enter QUIT, INFO, or anything else to add a task: ",
            Prompt::Name => "Task name: ",
            Prompt::Duration => "Duration (time units): ",
            Prompt::Kind => "Kind (READ, WRITE, TRY, WAIT, SIGNAL): ",
        };
        f.write_str(text)
    }
}

/// One line of operator input, line terminator removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    Text(String),
    /// The line was not valid UTF-8.
    Undecodable,
}

#[derive(Debug, Default)]
enum Stage {
    #[default]
    Command,
    Name,
    Duration {
        name: String,
    },
    Kind {
        name: String,
        duration: Result<u64, String>,
    },
}

/// Line-at-a-time parser for the command protocol.
///
/// `QUIT` and `INFO` (any case) are complete commands; blank lines at the
/// command prompt are ignored. Any other line opens a submission that
/// consumes three more lines: name, duration and kind. Each line is one
/// field, so names may contain spaces. A bad duration still consumes the
/// kind line so the stream stays in step.
#[derive(Debug, Default)]
pub struct CommandParser {
    stage: Stage,
}

impl CommandParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompt(&self) -> Prompt {
        match self.stage {
            Stage::Command => Prompt::Command,
            Stage::Name => Prompt::Name,
            Stage::Duration { .. } => Prompt::Duration,
            Stage::Kind { .. } => Prompt::Kind,
        }
    }

    /// Whether a submission is partly read.
    pub fn in_progress(&self) -> bool {
        !matches!(self.stage, Stage::Command)
    }

    /// Feed the next input line. An undecodable line abandons whatever was
    /// being read and yields [`Command::Skip`].
    pub fn accept(&mut self, line: InputLine) -> Option<Command> {
        match line {
            InputLine::Text(text) => self.feed(&text),
            InputLine::Undecodable => {
                let reason = match std::mem::take(&mut self.stage) {
                    Stage::Command | Stage::Name => "input is not valid UTF-8".to_string(),
                    Stage::Duration { name } | Stage::Kind { name, .. } => {
                        format!("{}: input is not valid UTF-8", name)
                    }
                };
                Some(Command::Skip(reason))
            }
        }
    }

    /// Feed the next field. Returns a command once one is complete.
    pub fn feed(&mut self, line: &str) -> Option<Command> {
        let field = line.trim();
        match std::mem::take(&mut self.stage) {
            Stage::Command => {
                if field.eq_ignore_ascii_case("QUIT") {
                    Some(Command::Quit)
                } else if field.eq_ignore_ascii_case("INFO") {
                    Some(Command::Info)
                } else {
                    if !field.is_empty() {
                        self.stage = Stage::Name;
                    }
                    None
                }
            }
            Stage::Name => {
                self.stage = Stage::Duration {
                    name: field.to_string(),
                };
                None
            }
            Stage::Duration { name } => {
                let duration = field
                    .parse::<u64>()
                    .map_err(|_| format!("invalid duration '{}'", field));
                self.stage = Stage::Kind { name, duration };
                None
            }
            Stage::Kind { name, duration } => {
                let command = match (duration, field.parse::<TaskKind>()) {
                    (Ok(duration_units), Ok(kind)) => Command::Submit(TaskRequest {
                        name,
                        duration_units,
                        kind,
                    }),
                    (Err(reason), _) => Command::Skip(format!("{}: {}", name, reason)),
                    (Ok(_), Err(e)) => Command::Skip(format!("{}: {}", name, e)),
                };
                Some(command)
            }
        }
    }
}

/// Reads operator input one line at a time from any async buffered reader.
///
/// Lines are read as raw bytes, so malformed input surfaces as
/// [`InputLine::Undecodable`] instead of an I/O error.
pub struct CommandReader<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> CommandReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    /// Next line, or `None` at end of input.
    pub async fn next_line(&mut self) -> io::Result<Option<InputLine>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
            return Ok(None);
        }
        while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
            self.buf.pop();
        }

        let line = match std::str::from_utf8(&self.buf) {
            Ok(text) => InputLine::Text(text.to_string()),
            Err(_) => InputLine::Undecodable,
        };
        Ok(Some(line))
    }

    /// Next complete command, without prompting. End of input, including in
    /// the middle of a submission, reads as [`Command::Quit`].
    pub async fn next_command(&mut self) -> io::Result<Command> {
        let mut parser = CommandParser::new();
        loop {
            match self.next_line().await? {
                Some(line) => {
                    if let Some(command) = parser.accept(line) {
                        return Ok(command);
                    }
                }
                None => return Ok(Command::Quit),
            }
        }
    }
}
