//! Software volume math.
//!
//! Reimplements the handful of channel-volume helpers the commands need as
//! pure integer/float math, so the command layer is testable without an
//! audio server. Values are in the server's normalized volume unit, where
//! [`VOLUME_NORM`] is 100%.

/// Normal (100%) software volume.
pub const VOLUME_NORM: u32 = 0x10000;

/// Muted volume.
pub const VOLUME_MUTED: u32 = 0;

/// Decibel value reported for a muted volume (minus-infinity sentinel).
pub const DECIBEL_MININFTY: f64 = -200.0;

/// Scale a percentage (0..100) to the normalized volume unit.
pub fn scale_percent(percent: u32) -> u32 {
    (VOLUME_NORM as f64 * (percent as f64 / 100.0)) as u32
}

/// Convert a normalized volume to an integer percentage (truncating).
pub fn percent_from_norm(volume: u32) -> u32 {
    ((volume as f64 / VOLUME_NORM as f64) * 100.0) as u32
}

/// Convert a normalized software volume to decibels.
///
/// Software volumes map cubically to linear gain, so `VOLUME_NORM` is 0 dB
/// and half volume is roughly -18 dB. Muted reports [`DECIBEL_MININFTY`].
pub fn volume_to_db(volume: u32) -> f64 {
    if volume == VOLUME_MUTED {
        return DECIBEL_MININFTY;
    }
    let linear = (volume as f64 / VOLUME_NORM as f64).powi(3);
    20.0 * linear.log10()
}

/// Format a decibel value compactly: rounded to four decimal places,
/// trailing zeros dropped (`-6.0206`, `0`, `-200`).
pub fn format_db(db: f64) -> String {
    let rounded = (db * 1.0e4).round() / 1.0e4;
    format!("{}", rounded)
}

/// Per-channel volume levels of one sink.
///
/// The raise/lower operations move the loudest channel and rescale the
/// others proportionally, preserving channel balance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelVolumes {
    levels: Vec<u32>,
}

impl ChannelVolumes {
    pub fn new(levels: Vec<u32>) -> Self {
        Self { levels }
    }

    /// Uniform volume across `channels` channels.
    pub fn uniform(channels: usize, level: u32) -> Self {
        Self {
            levels: vec![level; channels],
        }
    }

    pub fn levels(&self) -> &[u32] {
        &self.levels
    }

    pub fn channel_count(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Loudest channel, or [`VOLUME_MUTED`] when there are no channels.
    pub fn max(&self) -> u32 {
        self.levels.iter().copied().max().unwrap_or(VOLUME_MUTED)
    }

    /// Integer mean across channels.
    pub fn average(&self) -> u32 {
        if self.levels.is_empty() {
            return VOLUME_MUTED;
        }
        let sum: u64 = self.levels.iter().map(|&v| v as u64).sum();
        (sum / self.levels.len() as u64) as u32
    }

    /// Rescale all channels so the loudest becomes `target_max`.
    ///
    /// If every channel is muted, all channels are set to `target_max`.
    pub fn scale(&mut self, target_max: u32) {
        let current_max = self.max();
        if current_max == VOLUME_MUTED {
            for level in &mut self.levels {
                *level = target_max;
            }
            return;
        }
        for level in &mut self.levels {
            *level = (*level as u64 * target_max as u64 / current_max as u64) as u32;
        }
    }

    /// Raise the loudest channel by `step`, clamped at `limit`, rescaling
    /// the rest proportionally. Returns `false` when there are no channels.
    pub fn increase_clamped(&mut self, step: u32, limit: u32) -> bool {
        if self.levels.is_empty() {
            return false;
        }
        let current_max = self.max();
        let target = if current_max >= limit.saturating_sub(step) {
            limit
        } else {
            current_max + step
        };
        self.scale(target);
        true
    }

    /// Lower the loudest channel by `step`, rescaling the rest
    /// proportionally. Fails (returns `false`) when the step would push the
    /// loudest channel below muted, or when there are no channels.
    pub fn decrease(&mut self, step: u32) -> bool {
        if self.levels.is_empty() {
            return false;
        }
        let current_max = self.max();
        if current_max < step {
            return false;
        }
        self.scale(current_max - step);
        true
    }
}
