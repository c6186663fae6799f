//! pavc — adjust sink volume and mute state on a PulseAudio server.
//!
//! Exit code 0 on success. Any fatal error prints a single
//! `pavc: <message>.` line to stderr and exits 1, after the session has
//! been torn down.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use pavc_core::command::{parse_unit, parse_volume_value};
use pavc_core::{dispatch, Action, Command, ControlError, Session, Unit};
use pavc_pulse::PulseBackend;

#[derive(Parser)]
#[command(
    name = "pavc",
    version,
    about = "Control sink (output device) volume and mute on a PulseAudio server",
    after_help = "Examples:\n  \
        pavc toggle            toggle mute on all sink devices\n  \
        pavc up 5              increase volume by 5% on all sink devices\n  \
        pavc down 10 hdmi-out  decrease volume by 10% on sink 'hdmi-out'\n  \
        pavc volume percent    print the current volume as a percentage\n  \
        pavc volume decibel    print the current volume in decibels"
)]
struct Cli {
    #[command(subcommand)]
    verb: Verb,
}

#[derive(Subcommand)]
enum Verb {
    /// Toggle mute.
    Toggle {
        /// Sink device name; all sink devices when omitted.
        sink: Option<String>,
    },
    /// Increase volume, clamped at 100%.
    Up {
        /// Step in percent, 0..100. Values above 100 wrap around.
        #[arg(value_parser = volume_value)]
        value: u32,
        /// Sink device name; all sink devices when omitted.
        sink: Option<String>,
    },
    /// Decrease volume; fails rather than drop below muted.
    Down {
        /// Step in percent, 0..100. Values above 100 wrap around.
        #[arg(value_parser = volume_value)]
        value: u32,
        /// Sink device name; all sink devices when omitted.
        sink: Option<String>,
    },
    /// Print the current average volume without changing it.
    Volume {
        /// Output unit: `percent` or `decibel`.
        #[arg(value_parser = unit_value)]
        unit: Unit,
        /// Sink device name; all sink devices when omitted.
        sink: Option<String>,
    },
}

fn volume_value(text: &str) -> Result<u32, String> {
    parse_volume_value(text).map_err(|e| e.to_string())
}

fn unit_value(text: &str) -> Result<Unit, String> {
    parse_unit(text).map_err(|e| e.to_string())
}

impl From<Verb> for Command {
    fn from(verb: Verb) -> Self {
        match verb {
            Verb::Toggle { sink } => Command::new(Action::Toggle, sink),
            Verb::Up { value, sink } => Command::new(Action::Up(value), sink),
            Verb::Down { value, sink } => Command::new(Action::Down(value), sink),
            Verb::Volume { unit, sink } => Command::new(Action::Report(unit), sink),
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            let _ = err.print();
            return fail(&ControlError::Usage("usage error".into()));
        }
    };

    let command = Command::from(cli.verb);
    match run(&command) {
        Ok(Some(output)) => {
            print!("{output}");
            let _ = io::stdout().flush();
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(err) => fail(&err),
    }
}

/// Full command lifecycle: any error unwinds through session teardown
/// (explicitly on success, via `Drop` on the error path).
fn run(command: &Command) -> Result<Option<String>, ControlError> {
    let backend = PulseBackend::new()?;
    let mut session = Session::new(backend);
    session.start()?;
    session.connect(None)?;
    let output = dispatch::run(&mut session, command)?;
    session.close();
    Ok(output)
}

fn fail(err: &ControlError) -> ExitCode {
    let mut stderr = io::stderr();
    let _ = writeln!(stderr, "pavc: {err}.");
    let _ = stderr.flush();
    ExitCode::FAILURE
}
