use crate::volume::ChannelVolumes;

/// Owned snapshot of one sink (output device).
///
/// The audio server only lends sink descriptors for the duration of a
/// discovery callback; backends convert to this owned form inside the
/// callback window, so nothing borrowed outlives the operation that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkDevice {
    /// Server-assigned sink index, stable for the sink's lifetime.
    pub index: u32,
    /// Sink name, usable as a lookup key.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Per-channel volume levels.
    pub volumes: ChannelVolumes,
    /// Mute flag.
    pub muted: bool,
}
