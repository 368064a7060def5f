/// Audio subsystem state, owned by the audio thread.
///
/// The mixer tracks what should be audible; it does not talk to an output
/// device. Sound effects have no handle of their own and are recorded in a
/// bounded history instead.

use std::collections::VecDeque;
use slotmap::{new_key_type, SlotMap};
use crate::dispatch::{ApplyOutcome, Subsystem, Timestamp};
use crate::error::Result;
use super::audio_command::AudioCommand;

/// Number of sound effects kept in the history
pub const SFX_HISTORY_CAPACITY: usize = 64;

new_key_type! {
    /// Stable key for an audio source
    pub struct SourceKey;
}

/// Creation parameters for an audio source
#[derive(Debug, Clone)]
pub struct AudioSourceDesc {
    pub volume: f32,
    pub pitch: f32,
    pub looping: bool,
}

impl Default for AudioSourceDesc {
    fn default() -> Self {
        Self { volume: 1.0, pitch: 1.0, looping: false }
    }
}

/// A positional or ambient emitter
#[derive(Debug, Clone)]
pub struct AudioSource {
    volume: f32,
    pitch: f32,
    looping: bool,
    track: Option<String>,
}

impl AudioSource {
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Track currently playing, if any
    pub fn track(&self) -> Option<&str> {
        self.track.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.track.is_some()
    }
}

/// Background music currently playing
#[derive(Debug, Clone, PartialEq)]
pub struct MusicState {
    pub track: String,
    pub volume: f32,
    pub started_at: Timestamp,
}

/// One played sound effect
#[derive(Debug, Clone, PartialEq)]
pub struct SfxPlayback {
    pub name: String,
    /// Volume after master attenuation
    pub volume: f32,
    pub played_at: Timestamp,
}

pub struct AudioMixer {
    master_volume: f32,
    sources: SlotMap<SourceKey, AudioSource>,
    music: Option<MusicState>,
    sfx_history: VecDeque<SfxPlayback>,
}

impl AudioMixer {
    pub fn new() -> Self {
        Self {
            master_volume: 1.0,
            sources: SlotMap::with_key(),
            music: None,
            sfx_history: VecDeque::with_capacity(SFX_HISTORY_CAPACITY),
        }
    }

    pub fn add_source(&mut self, desc: AudioSourceDesc) -> SourceKey {
        self.sources.insert(AudioSource {
            volume: desc.volume,
            pitch: desc.pitch,
            looping: desc.looping,
            track: None,
        })
    }

    pub fn source(&self, key: SourceKey) -> Option<&AudioSource> {
        self.sources.get(key)
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn music(&self) -> Option<&MusicState> {
        self.music.as_ref()
    }

    /// Most recent sound effects, oldest first
    pub fn sfx_history(&self) -> impl Iterator<Item = &SfxPlayback> {
        self.sfx_history.iter()
    }

    fn update_source(&mut self, key: SourceKey, update: impl FnOnce(&mut AudioSource)) -> ApplyOutcome {
        match self.sources.get_mut(key) {
            Some(source) => {
                update(source);
                ApplyOutcome::Applied
            }
            None => ApplyOutcome::Stale,
        }
    }

    fn record_sfx(&mut self, name: String, volume: f32, now: Timestamp) {
        if self.sfx_history.len() == SFX_HISTORY_CAPACITY {
            self.sfx_history.pop_front();
        }
        self.sfx_history.push_back(SfxPlayback {
            name,
            volume: volume * self.master_volume,
            played_at: now,
        });
    }
}

impl Default for AudioMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Subsystem for AudioMixer {
    type Command = AudioCommand;
    const NAME: &'static str = "relay::AudioManager";

    fn apply(&mut self, command: AudioCommand, now: Timestamp) -> Result<ApplyOutcome> {
        let outcome = match command {
            AudioCommand::SetVolume { volume } => {
                self.master_volume = volume;
                ApplyOutcome::Applied
            }
            AudioCommand::SetSourceVolume { target, volume } => {
                self.update_source(target, |s| s.volume = volume)
            }
            AudioCommand::SetPitch { target, pitch } => {
                self.update_source(target, |s| s.pitch = pitch)
            }
            AudioCommand::PlayTrack { target, track, looping } => {
                self.update_source(target, |s| {
                    s.track = Some(track);
                    s.looping = looping;
                })
            }
            AudioCommand::StopSources { targets } => {
                let mut touched = 0;
                for target in targets {
                    if self.update_source(target, |s| s.track = None) == ApplyOutcome::Applied {
                        touched += 1;
                    }
                }
                if touched > 0 { ApplyOutcome::Applied } else { ApplyOutcome::Stale }
            }
            AudioCommand::PlaySfx { name, volume } => {
                self.record_sfx(name, volume, now);
                ApplyOutcome::Applied
            }
            AudioCommand::PlayMusic { track, volume } => {
                self.music = Some(MusicState { track, volume, started_at: now });
                ApplyOutcome::Applied
            }
            AudioCommand::StopMusic => match self.music.take() {
                Some(_) => ApplyOutcome::Applied,
                None => ApplyOutcome::Stale,
            },
            AudioCommand::DestroySource { target } => match self.sources.remove(target) {
                Some(_) => ApplyOutcome::Applied,
                None => ApplyOutcome::Stale,
            },
        };
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "audio_mixer_tests.rs"]
mod tests;
