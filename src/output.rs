use std::io::{self, IsTerminal, Write};

use crossterm::style::{Color, Stylize};
use serde::Serialize;

use crate::app::BatchReport;
use crate::executor::FinalStatus;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(report: &BatchReport) -> io::Result<()> {
        Self::print_json(report)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Prints the end-of-batch summary, coloured only when stdout is a terminal.
pub fn print_summary(report: &BatchReport) -> io::Result<()> {
    let stdout = io::stdout();
    let color = stdout.is_terminal();
    write_summary(&mut stdout.lock(), report, color)
}

pub fn write_summary<W: Write>(out: &mut W, report: &BatchReport, color: bool) -> io::Result<()> {
    let tag = |text: &str, fg: Color| {
        if color {
            text.with(fg).to_string()
        } else {
            text.to_string()
        }
    };

    let summary = &report.summary;
    writeln!(out, "{} {} task(s)", tag("[SUMMARY]", Color::Cyan), summary.total)?;
    writeln!(out, "{}   succeeded: {}", tag("[OK]", Color::Green), summary.succeeded)?;
    if summary.skipped > 0 {
        writeln!(out, "{} skipped: {}", tag("[WARN]", Color::Yellow), summary.skipped)?;
    }

    for outcome in &report.outcomes {
        let label = match outcome.status {
            FinalStatus::Succeeded => tag("[OK]", Color::Green),
            FinalStatus::Skipped => tag("[ERR]", Color::Red),
        };
        writeln!(
            out,
            "{label} {} {} (attempts: {})",
            outcome.task.id(),
            outcome.task.locator(),
            outcome.attempts_used
        )?;
    }
    writeln!(
        out,
        "{} saved to {}",
        tag("[INFO]", Color::Cyan),
        summary.destination_dir
    )
}
