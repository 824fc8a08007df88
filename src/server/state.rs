use std::sync::Arc;

use crate::config::Config;
use crate::game::FirstClaim;
use crate::server::registry::RoomRegistry;
use crate::server::room::RoomRules;
use crate::server::session::SessionManager;

/// Shared application state exposed to handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub sessions: Arc<SessionManager>,
    /// Read-only after startup.
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let rules = RoomRules {
            policy: config.assignment.policy(),
            win_rule: Arc::new(FirstClaim),
            default_words: config.words.clone(),
        };
        let registry = Arc::new(RoomRegistry::new(rules));
        let sessions = Arc::new(SessionManager::new(
            Arc::clone(&registry),
            config.reconnect_grace(),
        ));
        Self {
            registry,
            sessions,
            config: Arc::new(config),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
