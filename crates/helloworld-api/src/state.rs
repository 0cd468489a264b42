//! Application state shared by every handler.

use helloworld_core::{HelloworldConfig, SessionState};
use helloworld_services::{FlashMessages, SubmissionProcessor};
use std::sync::Arc;

pub struct AppState {
    pub config: HelloworldConfig,
    pub processor: SubmissionProcessor,
    pub session: Arc<dyn SessionState>,
    pub flash: FlashMessages,
}
