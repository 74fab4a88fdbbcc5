//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use documind_core::ports::{
    DatabaseService, IdentityVerifier, TextExtractionService, TextGenerationService, UsageLimiter,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
/// Requests share nothing else; every handler is a short, independent unit of work.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub usage: Arc<dyn UsageLimiter>,
    pub generator: Arc<dyn TextGenerationService>,
    pub extractor: Arc<dyn TextExtractionService>,
}
