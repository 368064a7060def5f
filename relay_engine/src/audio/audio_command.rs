/// Commands understood by the audio subsystem.

use crate::dispatch::{Command, ensure_name, ensure_positive, ensure_targets, ensure_unit};
use crate::error::Result;
use super::audio_mixer::SourceKey;

#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
    /// Master volume, in [0, 1]
    SetVolume { volume: f32 },
    SetSourceVolume { target: SourceKey, volume: f32 },
    SetPitch { target: SourceKey, pitch: f32 },
    PlayTrack { target: SourceKey, track: String, looping: bool },
    StopSources { targets: Vec<SourceKey> },
    /// Fire-and-forget sound effect
    PlaySfx { name: String, volume: f32 },
    PlayMusic { track: String, volume: f32 },
    StopMusic,
    DestroySource { target: SourceKey },
}

impl Command for AudioCommand {
    fn label(&self) -> &'static str {
        match self {
            AudioCommand::SetVolume { .. } => "SetVolume",
            AudioCommand::SetSourceVolume { .. } => "SetSourceVolume",
            AudioCommand::SetPitch { .. } => "SetPitch",
            AudioCommand::PlayTrack { .. } => "PlayTrack",
            AudioCommand::StopSources { .. } => "StopSources",
            AudioCommand::PlaySfx { .. } => "PlaySfx",
            AudioCommand::PlayMusic { .. } => "PlayMusic",
            AudioCommand::StopMusic => "StopMusic",
            AudioCommand::DestroySource { .. } => "DestroySource",
        }
    }

    fn validate(&self) -> Result<()> {
        let label = self.label();
        match self {
            AudioCommand::SetVolume { volume } => ensure_unit(label, "volume", *volume),
            AudioCommand::SetSourceVolume { volume, .. } => ensure_unit(label, "volume", *volume),
            AudioCommand::SetPitch { pitch, .. } => ensure_positive(label, "pitch", *pitch),
            AudioCommand::PlayTrack { track, .. } => ensure_name(label, "track", track),
            AudioCommand::StopSources { targets } => ensure_targets(label, targets),
            AudioCommand::PlaySfx { name, volume } => {
                ensure_name(label, "name", name)?;
                ensure_unit(label, "volume", *volume)
            }
            AudioCommand::PlayMusic { track, volume } => {
                ensure_name(label, "track", track)?;
                ensure_unit(label, "volume", *volume)
            }
            AudioCommand::StopMusic | AudioCommand::DestroySource { .. } => Ok(()),
        }
    }
}
