/// Relay Engine - composition root for the command-dispatch subsystems
///
/// `Engine` creates one manager per subsystem, hands out producer senders,
/// and lets the application move each manager onto the thread that owns it.
/// It also hosts the process-wide logging API used by the engine_* macros.

use std::sync::{Arc, OnceLock, RwLock};
use crate::audio::{AudioCommand, AudioManager, AudioMixer};
use crate::config::{EngineConfig, QueueConfig};
use crate::dispatch::{Clock, CommandSender, DrainReport, MonotonicClock, SubsystemManager, Timestamp};
use crate::error::{Error, Result};
use crate::graphics::{GraphicsCommand, GraphicsManager, GraphicsState};
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use crate::physics::{PhysicsCommand, PhysicsManager, PhysicsWorld};

// ===== INTERNAL STATE =====

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::default())))
}

// ===== PUBLIC API =====

/// Producer handles for every subsystem queue
///
/// Cheap to clone; hand a copy to each producer thread.
#[derive(Clone)]
pub struct CommandSenders {
    pub graphics: CommandSender<GraphicsCommand>,
    pub physics: CommandSender<PhysicsCommand>,
    pub audio: CommandSender<AudioCommand>,
}

/// Drain reports of one `Engine::tick`
///
/// `None` for managers that were taken out of the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub now: Timestamp,
    pub graphics: Option<DrainReport>,
    pub physics: Option<DrainReport>,
    pub audio: Option<DrainReport>,
}

/// Engine composition root
///
/// # Example
///
/// ```no_run
/// use relay_engine::relay::{Engine, EngineConfig};
/// use relay_engine::relay::audio::AudioCommand;
///
/// let mut engine = Engine::new(EngineConfig::default())?;
/// let senders = engine.senders();
///
/// let mut audio = engine.take_audio_manager()?;
/// let clock = engine.clock().clone();
/// std::thread::spawn(move || loop {
///     audio.drain_and_apply(clock.now());
///     std::thread::sleep(std::time::Duration::from_millis(5));
/// });
///
/// senders.audio.enqueue(AudioCommand::SetVolume { volume: 0.5 })?;
/// # Ok::<(), relay_engine::relay::Error>(())
/// ```
pub struct Engine {
    clock: Arc<dyn Clock>,
    senders: CommandSenders,
    graphics: Option<GraphicsManager>,
    physics: Option<PhysicsManager>,
    audio: Option<AudioManager>,
}

impl Engine {
    /// Helper to log errors before returning them (internal use)
    fn log_and_return_error(error: Error) -> Error {
        match &error {
            Error::InitializationFailed(msg) => {
                crate::engine_error!("relay::Engine", "Initialization failed: {}", msg);
            }
            _ => {
                crate::engine_error!("relay::Engine", "Engine error: {}", error);
            }
        }
        error
    }

    /// Create an engine driven by a real monotonic clock
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` if a queue configuration is invalid.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(MonotonicClock::new()))
    }

    /// Create an engine driven by the given clock
    ///
    /// Every queue shares the clock, so `ManualClock` makes the whole engine
    /// deterministic.
    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::with_subsystems(
            config,
            clock,
            GraphicsState::new(),
            PhysicsWorld::new(),
            AudioMixer::new(),
        )
    }

    /// Create an engine around pre-populated subsystem states
    pub fn with_subsystems(
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        graphics: GraphicsState,
        physics: PhysicsWorld,
        audio: AudioMixer,
    ) -> Result<Self> {
        Self::check_queue_config("graphics", &config.graphics)?;
        Self::check_queue_config("physics", &config.physics)?;
        Self::check_queue_config("audio", &config.audio)?;

        let mut graphics = SubsystemManager::new(graphics, config.graphics, clock.clone());
        let mut physics = SubsystemManager::new(physics, config.physics, clock.clone());
        let mut audio = SubsystemManager::new(audio, config.audio, clock.clone());
        graphics.set_catch_panics(config.catch_apply_panics);
        physics.set_catch_panics(config.catch_apply_panics);
        audio.set_catch_panics(config.catch_apply_panics);

        let senders = CommandSenders {
            graphics: graphics.sender(),
            physics: physics.sender(),
            audio: audio.sender(),
        };

        crate::engine_info!("relay::Engine", "Engine created (catch_apply_panics: {})",
            config.catch_apply_panics);

        Ok(Self {
            clock,
            senders,
            graphics: Some(graphics),
            physics: Some(physics),
            audio: Some(audio),
        })
    }

    fn check_queue_config(name: &str, config: &QueueConfig) -> Result<()> {
        if config.backlog_warning == 0 {
            return Err(Self::log_and_return_error(Error::InitializationFailed(
                format!("{} queue backlog_warning must be at least 1", name)
            )));
        }
        Ok(())
    }

    /// Producer handles for all three queues
    pub fn senders(&self) -> CommandSenders {
        self.senders.clone()
    }

    /// Clock shared by every queue
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current time on the engine clock
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ===== MANAGER OWNERSHIP =====

    /// Move the graphics manager out, typically onto the render thread
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` if it was already taken.
    pub fn take_graphics_manager(&mut self) -> Result<GraphicsManager> {
        Self::take(&mut self.graphics, "Graphics")
    }

    /// Move the physics manager out
    pub fn take_physics_manager(&mut self) -> Result<PhysicsManager> {
        Self::take(&mut self.physics, "Physics")
    }

    /// Move the audio manager out
    pub fn take_audio_manager(&mut self) -> Result<AudioManager> {
        Self::take(&mut self.audio, "Audio")
    }

    pub fn graphics_manager_mut(&mut self) -> Result<&mut GraphicsManager> {
        Self::held(&mut self.graphics, "Graphics")
    }

    pub fn physics_manager_mut(&mut self) -> Result<&mut PhysicsManager> {
        Self::held(&mut self.physics, "Physics")
    }

    pub fn audio_manager_mut(&mut self) -> Result<&mut AudioManager> {
        Self::held(&mut self.audio, "Audio")
    }

    fn take<M>(slot: &mut Option<M>, name: &str) -> Result<M> {
        let manager = slot.take().ok_or_else(|| Self::log_and_return_error(
            Error::InitializationFailed(format!("{} manager already taken", name))
        ))?;
        crate::engine_debug!("relay::Engine", "{} manager taken", name);
        Ok(manager)
    }

    fn held<'a, M>(slot: &'a mut Option<M>, name: &str) -> Result<&'a mut M> {
        slot.as_mut().ok_or_else(|| Self::log_and_return_error(
            Error::InitializationFailed(format!("{} manager was taken out of the engine", name))
        ))
    }

    /// Drain and apply every manager still held by the engine
    ///
    /// For applications that run all subsystems on one thread. Managers
    /// that were taken are skipped.
    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.now();
        TickReport {
            now,
            graphics: self.graphics.as_mut().map(|m| m.drain_and_apply(now)),
            physics: self.physics.as_mut().map(|m| m.drain_and_apply(now)),
            audio: self.audio.as_mut().map(|m| m.drain_and_apply(now)),
        }
    }

    // ===== LOGGING API =====

    /// Set a custom logger
    ///
    /// Replace the default logger with a custom implementation (file logger,
    /// test capture, etc.)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use relay_engine::relay::{Engine, log::{Logger, LogEntry}};
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger_impl: L) {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(logger_impl);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(DefaultLogger::default());
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry::new(severity, source, message));
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    ///
    /// Used by engine_error! macro to include source location.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry::new(severity, source, message).with_location(file, line));
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
