//! Script and interactive front ends over a [`Session`].

use crate::session::Session;
use std::io::{self, Write};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// Words that end a script or an interactive session.
pub const EXIT_COMMANDS: &[&str] = &["exit", "quit", "!quit"];

#[derive(Clone, Copy)]
pub struct OutputHandlers {
    pub out: fn(&str),
    pub err: fn(&str),
}

/// One line of a script or of interactive input, trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptLine<'a> {
    Blank,
    Comment,
    Exit,
    /// A selector or a `!` directive for [`Session::execute_line`].
    Command(&'a str),
}

pub fn classify(line: &str) -> ScriptLine<'_> {
    let line = line.trim();
    if line.is_empty() {
        ScriptLine::Blank
    } else if line.starts_with('#') {
        ScriptLine::Comment
    } else if EXIT_COMMANDS.contains(&line) {
        ScriptLine::Exit
    } else {
        ScriptLine::Command(line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFailure {
    /// 1-based line number in the script.
    pub line: usize,
    pub command: String,
    pub message: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScriptReport {
    pub executed: usize,
    pub failures: Vec<ScriptFailure>,
}

impl ScriptReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs a script of selectors and directives through `session`.
///
/// Failures are reported as `path:line: message` on the error handler and
/// collected in the report; with `stop_on_error` the first one ends the run.
/// An exit command ends the script early.
pub async fn run_script(
    session: &mut Session,
    output: OutputHandlers,
    path: &Path,
    stop_on_error: bool,
) -> io::Result<ScriptReport> {
    let content = tokio::fs::read_to_string(path).await?;
    let mut report = ScriptReport::default();

    for (index, raw) in content.lines().enumerate() {
        let command = match classify(raw) {
            ScriptLine::Blank | ScriptLine::Comment => continue,
            ScriptLine::Exit => break,
            ScriptLine::Command(command) => command,
        };
        report.executed += 1;

        match session.execute_line(command) {
            Ok(result) => (output.out)(&result),
            Err(err) => {
                let failure = ScriptFailure {
                    line: index + 1,
                    command: command.to_string(),
                    message: err.to_string(),
                };
                (output.err)(&format!("{}:{}: {}", path.display(), failure.line, failure.message));
                report.failures.push(failure);
                if stop_on_error {
                    break;
                }
            }
        }
    }

    debug!(
        executed = report.executed,
        failed = report.failures.len(),
        "script finished"
    );
    Ok(report)
}

/// Prompt showing whether selectors run against a document.
pub fn prompt(session: &Session) -> &'static str {
    if session.document().is_some() {
        "csspath[doc]> "
    } else {
        "csspath> "
    }
}

/// Reads lines from stdin until EOF, an exit command or ctrl-c.
pub async fn run_repl(session: &mut Session, output: OutputHandlers, banner: &[&str]) -> io::Result<()> {
    for line in banner {
        (output.out)(line);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        print!("{}", prompt(session));
        stdout.flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                (output.out)("Interrupted.");
                return Ok(());
            }
        };
        let Some(line) = line else {
            return Ok(());
        };

        match classify(&line) {
            ScriptLine::Blank | ScriptLine::Comment => continue,
            ScriptLine::Exit => return Ok(()),
            ScriptLine::Command(command) => match session.execute_line(command) {
                Ok(result) => (output.out)(&result),
                Err(err) => (output.err)(&format!("Error: {}", err)),
            },
        }
    }
}
