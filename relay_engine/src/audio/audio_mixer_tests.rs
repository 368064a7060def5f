/// Tests for AudioMixer and AudioCommand

use super::*;
use crate::dispatch::Command;
use crate::error::Error;

fn apply(mixer: &mut AudioMixer, command: AudioCommand) -> ApplyOutcome {
    mixer.apply(command, Timestamp::from_millis(250)).unwrap()
}

// ============================================================================
// Tests: Master volume and sources
// ============================================================================

#[test]
fn test_new_mixer_defaults() {
    let mixer = AudioMixer::new();
    assert_eq!(mixer.master_volume(), 1.0);
    assert_eq!(mixer.source_count(), 0);
    assert!(mixer.music().is_none());
    assert_eq!(mixer.sfx_history().count(), 0);
}

#[test]
fn test_set_volume_overwrites_master() {
    let mut mixer = AudioMixer::new();
    apply(&mut mixer, AudioCommand::SetVolume { volume: 0.5 });
    apply(&mut mixer, AudioCommand::SetVolume { volume: 0.8 });
    assert_eq!(mixer.master_volume(), 0.8);
}

#[test]
fn test_source_volume_pitch_and_track() {
    let mut mixer = AudioMixer::new();
    let key = mixer.add_source(AudioSourceDesc::default());

    apply(&mut mixer, AudioCommand::SetSourceVolume { target: key, volume: 0.3 });
    apply(&mut mixer, AudioCommand::SetPitch { target: key, pitch: 1.5 });
    apply(&mut mixer, AudioCommand::PlayTrack {
        target: key,
        track: "engine_hum".to_string(),
        looping: true,
    });

    let source = mixer.source(key).unwrap();
    assert_eq!(source.volume(), 0.3);
    assert_eq!(source.pitch(), 1.5);
    assert_eq!(source.track(), Some("engine_hum"));
    assert!(source.is_looping());
    assert!(source.is_playing());
}

#[test]
fn test_stop_sources_skips_destroyed() {
    let mut mixer = AudioMixer::new();
    let a = mixer.add_source(AudioSourceDesc::default());
    let b = mixer.add_source(AudioSourceDesc::default());
    for key in [a, b] {
        apply(&mut mixer, AudioCommand::PlayTrack { target: key, track: "loop".to_string(), looping: true });
    }
    apply(&mut mixer, AudioCommand::DestroySource { target: a });

    let outcome = apply(&mut mixer, AudioCommand::StopSources { targets: vec![a, b] });
    assert_eq!(outcome, ApplyOutcome::Applied);
    assert!(!mixer.source(b).unwrap().is_playing());

    let outcome = apply(&mut mixer, AudioCommand::StopSources { targets: vec![a] });
    assert_eq!(outcome, ApplyOutcome::Stale);
}

#[test]
fn test_destroyed_source_commands_are_stale() {
    let mut mixer = AudioMixer::new();
    let key = mixer.add_source(AudioSourceDesc::default());
    assert_eq!(apply(&mut mixer, AudioCommand::DestroySource { target: key }), ApplyOutcome::Applied);

    assert_eq!(apply(&mut mixer, AudioCommand::SetSourceVolume { target: key, volume: 0.1 }), ApplyOutcome::Stale);
    assert_eq!(apply(&mut mixer, AudioCommand::SetPitch { target: key, pitch: 2.0 }), ApplyOutcome::Stale);
    assert_eq!(
        apply(&mut mixer, AudioCommand::PlayTrack { target: key, track: "x".to_string(), looping: false }),
        ApplyOutcome::Stale
    );
    assert_eq!(apply(&mut mixer, AudioCommand::DestroySource { target: key }), ApplyOutcome::Stale);
    assert_eq!(mixer.source_count(), 0);
}

// ============================================================================
// Tests: Music and sound effects
// ============================================================================

#[test]
fn test_play_and_stop_music() {
    let mut mixer = AudioMixer::new();
    apply(&mut mixer, AudioCommand::PlayMusic { track: "theme".to_string(), volume: 0.6 });

    let music = mixer.music().unwrap();
    assert_eq!(music.track, "theme");
    assert_eq!(music.volume, 0.6);
    assert_eq!(music.started_at, Timestamp::from_millis(250));

    assert_eq!(apply(&mut mixer, AudioCommand::StopMusic), ApplyOutcome::Applied);
    assert!(mixer.music().is_none());
    assert_eq!(apply(&mut mixer, AudioCommand::StopMusic), ApplyOutcome::Stale);
}

#[test]
fn test_sfx_volume_is_attenuated_by_master() {
    let mut mixer = AudioMixer::new();
    apply(&mut mixer, AudioCommand::SetVolume { volume: 0.5 });
    apply(&mut mixer, AudioCommand::PlaySfx { name: "bounce".to_string(), volume: 0.5 });

    let played: Vec<_> = mixer.sfx_history().collect();
    assert_eq!(played.len(), 1);
    assert_eq!(played[0].name, "bounce");
    assert_eq!(played[0].volume, 0.25);
}

#[test]
fn test_sfx_history_is_capped() {
    let mut mixer = AudioMixer::new();
    for i in 0..SFX_HISTORY_CAPACITY + 10 {
        apply(&mut mixer, AudioCommand::PlaySfx { name: format!("sfx_{}", i), volume: 1.0 });
    }

    assert_eq!(mixer.sfx_history().count(), SFX_HISTORY_CAPACITY);
    assert_eq!(mixer.sfx_history().next().unwrap().name, "sfx_10");
}

// ============================================================================
// Tests: Validation
// ============================================================================

#[test]
fn test_validate_rejects_malformed_commands() {
    let mut mixer = AudioMixer::new();
    let key = mixer.add_source(AudioSourceDesc::default());

    let malformed = [
        AudioCommand::SetVolume { volume: 1.5 },
        AudioCommand::SetVolume { volume: f32::NAN },
        AudioCommand::SetSourceVolume { target: key, volume: -0.1 },
        AudioCommand::SetPitch { target: key, pitch: 0.0 },
        AudioCommand::PlayTrack { target: key, track: String::new(), looping: false },
        AudioCommand::StopSources { targets: vec![] },
        AudioCommand::PlaySfx { name: "bounce".to_string(), volume: 2.0 },
        AudioCommand::PlayMusic { track: " ".to_string(), volume: 0.5 },
    ];
    for command in malformed {
        assert!(matches!(command.validate(), Err(Error::MalformedCommand(_))), "{}", command.label());
    }

    assert!(AudioCommand::SetVolume { volume: 0.0 }.validate().is_ok());
    assert!(AudioCommand::SetVolume { volume: 1.0 }.validate().is_ok());
    assert!(AudioCommand::StopMusic.validate().is_ok());
}

// ============================================================================
// Tests: Command values
// ============================================================================

#[test]
fn test_command_clone_and_debug() {
    let command = AudioCommand::PlaySfx { name: "bounce".to_string(), volume: 0.5 };
    let copy = command.clone();

    assert_eq!(copy, command);
    assert!(format!("{:?}", command).contains("bounce"));
    assert_ne!(copy, AudioCommand::StopMusic);
}
