//! Interactive incremental session.
//!
//! New requirements arrive line by line on a channel. Each is paired against
//! the corpus, conflicts are written to a timestamped artifact, and the text
//! joins the corpus for the next entry. The session ends on the exit keyword,
//! when no line arrives within the timeout, when input closes, or on shutdown.

use std::future::Future;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use reqconflict_ai::{Inference, PairingEngine};
use reqconflict_store::ResultSink;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::display;

pub const EXIT_KEYWORD: &str = "exit";

/// Why the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Exit,
    Timeout,
    InputClosed,
    Interrupted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub submitted: usize,
    pub conflicts: usize,
    pub artifacts: Vec<PathBuf>,
    pub end: SessionEnd,
}

/// Forward stdin lines to a channel.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    spawn_line_reader(std::io::BufReader::new(std::io::stdin()))
}

/// Forward lines from `reader` to a channel from a dedicated OS thread.
///
/// A blocked read lives outside the runtime, so the process can exit while it
/// is still waiting. The channel closes at end of input.
pub fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to read input line");
                    break;
                }
            }
        }
    });
    rx
}

pub struct Session<'a> {
    pub sink: &'a ResultSink,
    pub output: &'a str,
    pub timeout: Duration,
}

impl Session<'_> {
    /// Run until the session ends. `corpus` grows with every accepted requirement.
    pub async fn run<I, F>(
        &self,
        engine: &mut PairingEngine<I>,
        corpus: &mut Vec<String>,
        input: &mut mpsc::Receiver<String>,
        shutdown: F,
    ) -> SessionSummary
    where
        I: Inference,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = SessionSummary {
            submitted: 0,
            conflicts: 0,
            artifacts: Vec::new(),
            end: SessionEnd::Exit,
        };

        summary.end = loop {
            print!("\nEnter a new requirement (or '{EXIT_KEYWORD}' to quit): ");
            let _ = std::io::stdout().flush();

            let line = tokio::select! {
                received = tokio::time::timeout(self.timeout, input.recv()) => match received {
                    Ok(Some(line)) => line,
                    Ok(None) => break SessionEnd::InputClosed,
                    Err(_) => {
                        info!(timeout_secs = self.timeout.as_secs(), "no input received, ending session");
                        break SessionEnd::Timeout;
                    }
                },
                _ = &mut shutdown => break SessionEnd::Interrupted,
            };

            let requirement = line.trim();
            if requirement.is_empty() {
                continue;
            }
            if requirement.eq_ignore_ascii_case(EXIT_KEYWORD) {
                break SessionEnd::Exit;
            }

            summary.submitted += 1;
            let report = engine.analyze_new(requirement, corpus.as_slice()).await;

            let mut artifact = None;
            if report.has_conflicts() {
                summary.conflicts += report.conflicts.len();
                match self.sink.write_incremental(self.output, &report.conflicts) {
                    Ok(path) => {
                        summary.artifacts.push(path.clone());
                        artifact = Some(path);
                    }
                    Err(e) => warn!(error = %e, "failed to write incremental results"),
                }
            }
            display::print_incremental(requirement, &report, artifact.as_deref());

            if !corpus.iter().any(|r| r == requirement) {
                corpus.push(requirement.to_string());
            }
        };

        println!();
        info!(
            submitted = summary.submitted,
            conflicts = summary.conflicts,
            end = ?summary.end,
            "interactive session finished"
        );
        summary
    }
}
