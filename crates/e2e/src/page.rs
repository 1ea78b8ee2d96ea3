//! Browser automation surface used by the case runner

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::E2eResult;

/// Load event `navigate` waits for before returning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    Load,
    #[default]
    DomContentLoaded,
    NetworkIdle,
    Commit,
}

impl WaitUntil {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitUntil::Load => "load",
            WaitUntil::DomContentLoaded => "domcontentloaded",
            WaitUntil::NetworkIdle => "networkidle",
            WaitUntil::Commit => "commit",
        }
    }
}

/// One live page, owned by a single case from open to close.
///
/// Selectors are plain CSS strings; a selector is resolved freshly on every
/// call, so there is no separate locator handle.
#[async_trait]
pub trait PageSession: Send {
    async fn navigate(&mut self, url: &str, wait_until: WaitUntil) -> E2eResult<()>;

    /// Wait until `selector` is visible. Fails with `SetupTimeout` when the
    /// deadline passes.
    async fn wait_for_visible(&mut self, selector: &str, timeout: Duration) -> E2eResult<()>;

    /// Replace the control's value in one operation
    async fn set_value(&mut self, selector: &str, text: &str) -> E2eResult<()>;

    /// Type `text` key by key, pausing `delay` between characters
    async fn type_text(&mut self, selector: &str, text: &str, delay: Duration) -> E2eResult<()>;

    async fn get_value(&mut self, selector: &str) -> E2eResult<String>;

    async fn wait(&mut self, duration: Duration) -> E2eResult<()> {
        tokio::time::sleep(duration).await;
        Ok(())
    }

    /// Full-page PNG written to `path`
    async fn screenshot(&mut self, path: &Path) -> E2eResult<()>;

    /// Release the page and anything backing it
    async fn close(&mut self) -> E2eResult<()>;
}

/// Opens a fresh page for every case
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> E2eResult<Box<dyn PageSession>>;
}
