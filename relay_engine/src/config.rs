//! Engine and queue configuration

/// Per-queue configuration
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Panic on commands that fail `Command::validate` instead of rejecting
    /// them with `Error::MalformedCommand`
    pub strict_validation: bool,
    /// Pending-command count above which a backlog warning is logged
    pub backlog_warning: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            strict_validation: cfg!(debug_assertions),
            backlog_warning: 4096,
        }
    }
}

impl QueueConfig {
    /// Reject malformed commands with an error instead of panicking
    pub fn lenient() -> Self {
        Self {
            strict_validation: false,
            ..Self::default()
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Graphics command queue
    pub graphics: QueueConfig,
    /// Physics command queue
    pub physics: QueueConfig,
    /// Audio command queue
    pub audio: QueueConfig,
    /// Catch panics raised while applying a command so the rest of the
    /// batch still runs
    pub catch_apply_panics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            graphics: QueueConfig::default(),
            physics: QueueConfig::default(),
            audio: QueueConfig::default(),
            catch_apply_panics: true,
        }
    }
}
