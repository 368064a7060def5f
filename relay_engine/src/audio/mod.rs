//! Audio subsystem
//!
//! Mixer state mutated on the audio thread by draining AudioCommand.

mod audio_command;
mod audio_mixer;

pub use audio_command::AudioCommand;
pub use audio_mixer::{
    AudioMixer, AudioSource, AudioSourceDesc, MusicState, SfxPlayback, SourceKey,
    SFX_HISTORY_CAPACITY,
};

/// Manager owning the audio mixer
pub type AudioManager = crate::dispatch::SubsystemManager<AudioMixer>;
