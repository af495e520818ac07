//! Application state (the Model in TEA)

use crate::config::AppConfig;
use crate::session_manager::SessionManager;

/// Complete application state
#[derive(Debug, Default)]
pub struct AppState {
    pub sessions: SessionManager,

    pub config: AppConfig,

    quitting: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn request_quit(&mut self) {
        self.quitting = true;
    }

    pub fn should_quit(&self) -> bool {
        self.quitting
    }
}
