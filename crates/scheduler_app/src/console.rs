//! Interactive menu console.
//!
//! The console is a thin collaborator over [`Scheduler`]: it reads numbered
//! menu choices, prompts for event fields, and renders results. Malformed
//! input is answered with a message and a re-prompt; nothing typed at the
//! console can make the scheduler fail.

use std::io::Write;

use scheduler_core::EventSpec;
use scheduler_engine::{EngineReport, EngineState, EventListing, Scheduler};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const MENU: &str = "\nOptions:\n\
    1. Add an event\n\
    2. Remove an event\n\
    3. Halt current event\n\
    4. Stop the scheduler\n\
    5. Display current events\n\
    6. Start the system\n\
    7. Display next event to process\n";

/// Errors that end the console session.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Reading input or writing output failed.
    #[error("console I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A report could not be rendered as JSON.
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

/// How engine reports are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Render one report in the requested format.
///
/// # Errors
///
/// Returns [`ConsoleError::Encode`] if JSON encoding fails.
pub fn render_report(report: &EngineReport, format: ReportFormat) -> Result<String, ConsoleError> {
    match format {
        ReportFormat::Text => Ok(report.to_string()),
        ReportFormat::Json => Ok(serde_json::to_string(report)?),
    }
}

/// Print reports to stdout until the engine drops its sender.
pub async fn print_reports(
    mut reports: mpsc::UnboundedReceiver<EngineReport>,
    format: ReportFormat,
) {
    while let Some(report) = reports.recv().await {
        match render_report(&report, format) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!(%e, "dropping engine report"),
        }
    }
}

/// A numbered menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    AddEvent,
    RemoveEvent,
    HaltCurrent,
    StopScheduler,
    DisplayEvents,
    StartSystem,
    DisplayNext,
}

impl MenuOption {
    /// Parse a menu choice (`"1"` to `"7"`).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let option = match input.trim() {
            "1" => Self::AddEvent,
            "2" => Self::RemoveEvent,
            "3" => Self::HaltCurrent,
            "4" => Self::StopScheduler,
            "5" => Self::DisplayEvents,
            "6" => Self::StartSystem,
            "7" => Self::DisplayNext,
            _ => return None,
        };
        Some(option)
    }
}

/// Whether the menu loop should keep going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    /// Input ended mid-command.
    Closed,
}

/// Menu loop over any line-oriented input and writable output.
pub struct Console<R, W> {
    lines: Lines<R>,
    out: W,
    scheduler: Scheduler,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    /// Create a console reading from `input` and writing to `out`.
    pub fn new(input: R, out: W, scheduler: Scheduler) -> Self {
        Self {
            lines: input.lines(),
            out,
            scheduler,
        }
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.out
    }

    /// Run the menu until the scheduler is stopped or input ends. End of
    /// input stops the scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Io`] if reading or writing fails.
    pub async fn run(&mut self) -> Result<(), ConsoleError> {
        while self.scheduler.state().await != EngineState::Stopped {
            write!(self.out, "{MENU}")?;
            let Some(choice) = self.prompt("Choose an option (1-7): ").await? else {
                return self.close().await;
            };

            let flow = match MenuOption::parse(&choice) {
                Some(option) => self.dispatch(option).await?,
                None => {
                    writeln!(self.out, "Invalid option. Please try again.")?;
                    Flow::Continue
                }
            };
            if flow == Flow::Closed {
                return self.close().await;
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self, option: MenuOption) -> Result<Flow, ConsoleError> {
        debug!(?option, "menu option selected");
        match option {
            MenuOption::AddEvent => return self.add_events().await,
            MenuOption::RemoveEvent => {
                let prompt = "Enter the name of the event to remove: ";
                let Some(name) = self.prompt(prompt).await? else {
                    return Ok(Flow::Closed);
                };
                match self.scheduler.remove_by_name(&name).await {
                    0 => writeln!(self.out, "No events named {name}.")?,
                    1 => writeln!(self.out, "Removed event: {name}")?,
                    n => writeln!(self.out, "Removed {n} events named {name}")?,
                }
            }
            MenuOption::HaltCurrent => {
                if self.scheduler.halt().await {
                    writeln!(self.out, "Halted current event processing.")?;
                } else {
                    writeln!(self.out, "No event is currently being processed.")?;
                }
            }
            MenuOption::StopScheduler => {
                self.scheduler.stop().await;
                writeln!(self.out, "Stopping event scheduler...")?;
            }
            MenuOption::DisplayEvents => {
                let events = self.scheduler.list().await;
                writeln!(self.out, "{}", EventListing(&events))?;
            }
            MenuOption::StartSystem => {
                if self.scheduler.start().await {
                    writeln!(self.out, "System started. Events are being processed.")?;
                } else if self.scheduler.state().await == EngineState::Stopped {
                    writeln!(self.out, "The scheduler has been stopped and cannot be restarted.")?;
                } else {
                    writeln!(self.out, "System is already running.")?;
                }
            }
            MenuOption::DisplayNext => match self.scheduler.peek_next().await {
                Some(event) => writeln!(
                    self.out,
                    "Next event to process: {} (Priority: {}, Time remaining: {} mins)",
                    event.name, event.priority, event.time_remaining
                )?,
                None => writeln!(self.out, "No more events to process.")?,
            },
        }
        Ok(Flow::Continue)
    }

    /// Prompt for events until the user declines to add another.
    async fn add_events(&mut self) -> Result<Flow, ConsoleError> {
        loop {
            let Some(spec) = self.prompt_event().await? else {
                return Ok(Flow::Closed);
            };
            let added = self.scheduler.add(spec).await;
            writeln!(
                self.out,
                "Added event: {} with priority {} and time remaining {} mins",
                added.event.name, added.event.priority, added.event.time_remaining
            )?;
            if added.preempted {
                writeln!(
                    self.out,
                    "System halted to recheck priorities after adding new event."
                )?;
            }

            let prompt = "Do you want to add another event? (yes/no): ";
            let Some(answer) = self.prompt(prompt).await? else {
                return Ok(Flow::Closed);
            };
            if !answer.eq_ignore_ascii_case("yes") {
                return Ok(Flow::Continue);
            }
        }
    }

    /// Prompt for one event's fields, re-prompting until they validate.
    async fn prompt_event(&mut self) -> Result<Option<EventSpec>, ConsoleError> {
        loop {
            let Some(name) = self.prompt("Enter event name: ").await? else {
                return Ok(None);
            };
            let Some(priority) = self
                .prompt_number("Enter event priority (lower number = higher priority): ")
                .await?
            else {
                return Ok(None);
            };
            let prompt = "Enter time remaining (in minutes): ";
            let Some(minutes) = self.prompt_number(prompt).await? else {
                return Ok(None);
            };

            match EventSpec::new(name, priority, minutes) {
                Ok(spec) => return Ok(Some(spec)),
                Err(e) => writeln!(self.out, "Invalid event: {e}. Please try again.")?,
            }
        }
    }

    async fn prompt_number(&mut self, message: &str) -> Result<Option<i64>, ConsoleError> {
        loop {
            let Some(raw) = self.prompt(message).await? else {
                return Ok(None);
            };
            match raw.parse::<i64>() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => writeln!(self.out, "'{raw}' is not a whole number. Please try again.")?,
            }
        }
    }

    /// Write `message` and read one trimmed line. `None` at end of input.
    async fn prompt(&mut self, message: &str) -> Result<Option<String>, ConsoleError> {
        write!(self.out, "{message}")?;
        self.out.flush()?;
        let line = self.lines.next_line().await?;
        Ok(line.map(|l| l.trim().to_string()))
    }

    async fn close(&mut self) -> Result<(), ConsoleError> {
        debug!("console input closed, stopping scheduler");
        self.scheduler.stop().await;
        writeln!(self.out)?;
        Ok(())
    }
}
