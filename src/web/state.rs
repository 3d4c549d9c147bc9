//! Shared state of the web handlers.

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use crate::context::AppContext;
use crate::{BoerseError, Result};

use super::pages::Pages;

/// Application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Config, database, policy and notifier.
    pub ctx: Arc<AppContext>,
    /// Page renderer.
    pub pages: Arc<Pages>,
    /// Signing key for the flash cookie.
    pub cookie_key: Key,
}

impl AppState {
    /// Build the state; fails on a missing or short cookie secret.
    pub fn new(ctx: Arc<AppContext>) -> Result<Self> {
        let pages = Pages::new(&ctx.config)?;
        let bytes = ctx.config.cookie_key_bytes()?;
        let cookie_key = Key::try_from(bytes.as_slice())
            .map_err(|e| BoerseError::Config(format!("invalid cookie_secret: {e}")))?;

        Ok(Self {
            ctx,
            pages: Arc::new(pages),
            cookie_key,
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}
