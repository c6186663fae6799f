//! Command execution: resolve the sink set, apply the action to each sink
//! in enumeration order, one completed operation at a time.

use crate::command::Command;
use crate::models::error::ControlError;
use crate::session::Session;
use crate::traits::backend::ServerBackend;

/// Run one command against a connected session.
///
/// Returns the text a report command produced (printed verbatim by the
/// caller, no trailing newline), or `None` for mutating commands.
///
/// Fail-fast: a failure on sink *k* aborts without rolling back sinks
/// `0..k`, which may already have been mutated.
pub fn run<B: ServerBackend>(
    session: &mut Session<B>,
    command: &Command,
) -> Result<Option<String>, ControlError> {
    let count = session.resolve_sinks(command.sink.as_deref())?;

    let mut output = String::new();
    for i in 0..count {
        let sink = session
            .sink(i)
            .cloned()
            .ok_or_else(|| ControlError::Operation("sink registry out of sync".into()))?;
        log::debug!("applying {:?} to sink {} ({})", command.action, sink.index, sink.name);
        if let Some(text) = session.apply(&sink, &command.action)? {
            output.push_str(&text);
        }
    }

    if command.action.is_mutating() {
        log::info!("updated {count} sink(s)");
    }

    // descriptors are stale once the command has consumed them
    session.clear_sinks();

    Ok(if output.is_empty() { None } else { Some(output) })
}
