//! Relay demo: a headless Pong match driven across threads
//!
//! - game logic thread: steps the ball, enqueues physics, graphics and audio commands
//! - physics thread: owns the PhysicsWorld
//! - render thread: owns the GraphicsState
//! - audio thread: owns the AudioMixer
//!
//! Runs for about one second, then prints what each subsystem ended up with.

use relay_engine::relay::{Engine, EngineConfig, Error, Result};
use relay_engine::relay::audio::{AudioCommand, AudioMixer};
use relay_engine::relay::dispatch::{Clock, MonotonicClock, Subsystem, SubsystemManager};
use relay_engine::relay::graphics::{GraphicsCommand, GraphicsState, RenderEntityDesc, Light};
use relay_engine::relay::log::LogSeverity;
use relay_engine::relay::physics::{PhysicsCommand, PhysicsWorld, RigidBodyDesc};
use glam::{Vec3, Vec4};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(16);
const RUN_TIME: Duration = Duration::from_millis(1000);
const COURT_HALF_WIDTH: f32 = 8.0;

fn log(message: String) {
    Engine::log(LogSeverity::Info, "relay_demo", message);
}

/// Drain a manager once per frame on its own thread until `running` clears
fn spawn_owner<S, F>(
    name: &str,
    mut manager: SubsystemManager<S>,
    engine_clock: Arc<dyn Clock>,
    running: Arc<AtomicBool>,
    mut per_frame: F,
) -> Result<JoinHandle<SubsystemManager<S>>>
where
    S: Subsystem + 'static,
    F: FnMut(&mut S) + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            while running.load(Ordering::Acquire) {
                manager.drain_and_apply(engine_clock.now());
                per_frame(manager.state_mut());
                thread::sleep(FRAME);
            }
            manager.drain_and_apply(engine_clock.now());
            manager
        })
        .map_err(|e| Error::InitializationFailed(
            format!("cannot spawn {} thread: {}", name, e)
        ))
}

fn main() -> Result<()> {
    // Scene setup happens before the managers leave the main thread
    let mut graphics = GraphicsState::new();
    graphics.register_texture("ball");
    graphics.register_texture("paddle");
    let ball_sprite = graphics.spawn_entity(RenderEntityDesc {
        texture: Some("ball".to_string()),
        scale: Vec3::splat(0.5),
        ..RenderEntityDesc::default()
    });
    let paddles = [
        graphics.spawn_entity(RenderEntityDesc {
            position: Vec3::new(-COURT_HALF_WIDTH, 0.0, 0.0),
            texture: Some("paddle".to_string()),
            ..RenderEntityDesc::default()
        }),
        graphics.spawn_entity(RenderEntityDesc {
            position: Vec3::new(COURT_HALF_WIDTH, 0.0, 0.0),
            texture: Some("paddle".to_string()),
            ..RenderEntityDesc::default()
        }),
    ];

    let mut physics = PhysicsWorld::with_gravity(Vec3::ZERO);
    let ball_body = physics.add_body(RigidBodyDesc {
        velocity: Vec3::new(12.0, 3.0, 0.0),
        ..RigidBodyDesc::default()
    });

    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let mut engine = Engine::with_subsystems(
        EngineConfig::default(),
        clock.clone(),
        graphics,
        physics,
        AudioMixer::new(),
    )?;
    let senders = engine.senders();
    let running = Arc::new(AtomicBool::new(true));

    let render = spawn_owner("render", engine.take_graphics_manager()?, clock.clone(), running.clone(),
        |state: &mut GraphicsState| {
            state.begin_frame();
            state.take_dirty();
        })?;
    let audio = spawn_owner("audio", engine.take_audio_manager()?, clock.clone(), running.clone(),
        |_| {})?;

    // The physics thread publishes the ball position back to the game thread
    let (positions_tx, positions_rx) = std::sync::mpsc::channel();
    let physics = spawn_owner("physics", engine.take_physics_manager()?, clock.clone(), running.clone(),
        move |world: &mut PhysicsWorld| {
            world.step(FRAME.as_secs_f32());
            if let Some(body) = world.body(ball_body) {
                let _ = positions_tx.send(body.position());
            }
        })?;

    senders.graphics.enqueue(GraphicsCommand::AddLight {
        name: "sun".to_string(),
        light: Light { position: Vec3::new(0.0, 10.0, 5.0), color: Vec3::ONE, intensity: 1.5 },
    })?;
    senders.graphics.enqueue(GraphicsCommand::SetClearColor { color: Vec4::new(0.05, 0.05, 0.1, 1.0) })?;
    senders.audio.enqueue(AudioCommand::PlayMusic { track: "theme".to_string(), volume: 0.6 })?;
    // Lower the master volume after half a second
    senders.audio.enqueue_after(AudioCommand::SetVolume { volume: 0.5 }, RUN_TIME / 2)?;

    // Game logic runs on the main thread
    let start = clock.now();
    let mut bounces = 0;
    let mut last = Vec3::ZERO;
    // Sign of the wall hit last on each axis; walls alternate
    let mut last_side = 0.0;
    let mut last_edge = 0.0;
    while clock.now().saturating_duration_since(start) < RUN_TIME {
        while let Ok(position) = positions_rx.try_recv() {
            last = position;
        }
        senders.graphics.enqueue(GraphicsCommand::SetPosition { target: ball_sprite, position: last })?;

        let side = last.x.signum();
        if last.x.abs() >= COURT_HALF_WIDTH && side != last_side {
            last_side = side;
            let paddle = if side < 0.0 { paddles[0] } else { paddles[1] };
            senders.physics.enqueue(PhysicsCommand::ApplyImpulse {
                target: ball_body,
                impulse: Vec3::new(-side * 24.0, 0.0, 0.0),
            })?;
            senders.graphics.enqueue(GraphicsCommand::SetTint {
                target: paddle,
                tint: Vec4::new(1.0, 0.4, 0.4, 1.0),
            })?;
            senders.graphics.enqueue_after(
                GraphicsCommand::SetTint { target: paddle, tint: Vec4::ONE },
                Duration::from_millis(100),
            )?;
            senders.audio.enqueue(AudioCommand::PlaySfx { name: "bounce".to_string(), volume: 0.9 })?;
            bounces += 1;
        }

        let edge = last.y.signum();
        if last.y.abs() >= 4.0 && edge != last_edge {
            last_edge = edge;
            senders.physics.enqueue(PhysicsCommand::ApplyImpulse {
                target: ball_body,
                impulse: Vec3::new(0.0, -edge * 6.0, 0.0),
            })?;
        }
        thread::sleep(FRAME);
    }

    running.store(false, Ordering::Release);
    let panicked = |name: &str| Error::BackendError(format!("{} thread panicked", name));
    let render = render.join().map_err(|_| panicked("render"))?;
    let audio = audio.join().map_err(|_| panicked("audio"))?;
    let physics = physics.join().map_err(|_| panicked("physics"))?;

    log(format!("{} bounces", bounces));
    log(format!("render: {} frames, {} lights, stats {:?}",
        render.state().frame(), render.state().light_count(), render.stats()));
    log(format!("audio: master volume {}, {} sfx, stats {:?}",
        audio.state().master_volume(), audio.state().sfx_history().count(), audio.stats()));
    log(format!("physics: ball at {:?}, stats {:?}",
        physics.state().body(ball_body).map(|b| b.position()), physics.stats()));

    Ok(())
}
