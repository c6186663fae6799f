//! Command model: one verb, an optional value or unit, an optional sink
//! name filter. Built once from the command line, consumed once by the
//! dispatcher, never mutated.

use crate::models::error::ControlError;

/// Unit selector for the `volume` report command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Percent,
    Decibel,
}

/// What to do to each resolved sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Flip the mute flag.
    Toggle,
    /// Raise volume by a percentage, clamped at 100%.
    Up(u32),
    /// Lower volume by a percentage; fails on underflow.
    Down(u32),
    /// Print the current average volume. No mutation.
    Report(Unit),
}

impl Action {
    /// True for actions that issue volume/mute-changing requests.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::Report(_))
    }
}

/// A fully parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub action: Action,
    /// Restrict to the sink with this exact name; `None` means all sinks.
    pub sink: Option<String>,
}

impl Command {
    pub fn new(action: Action, sink: Option<String>) -> Self {
        Self { action, sink }
    }
}

/// Parse a volume percentage argument.
///
/// The literal `"0"` maps to 0. Any other digit string is accumulated and
/// folded into 1..=100 as `((n - 1) % 100) + 1` — values above 100 wrap
/// around (`"101"` → 1, `"250"` → 50) instead of being rejected.
pub fn parse_volume_value(text: &str) -> Result<u32, ControlError> {
    if text.is_empty() {
        return Err(ControlError::Usage("invalid volume value".into()));
    }
    if text == "0" {
        return Ok(0);
    }
    let mut value: u32 = 0;
    for c in text.chars() {
        let digit = c
            .to_digit(10)
            .ok_or_else(|| ControlError::Usage("invalid volume value".into()))?;
        value = value.wrapping_mul(10).wrapping_add(digit);
    }
    if value == 0 {
        // strings like "00" are not the literal zero
        return Err(ControlError::Usage("invalid volume value".into()));
    }
    Ok(((value - 1) % 100) + 1)
}

/// Parse the unit selector for the `volume` command.
pub fn parse_unit(text: &str) -> Result<Unit, ControlError> {
    match text {
        "percent" => Ok(Unit::Percent),
        "decibel" => Ok(Unit::Decibel),
        _ => Err(ControlError::Usage(
            "invalid unit for 'volume' (try decibel or percent)".into(),
        )),
    }
}
