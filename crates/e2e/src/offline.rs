//! In-memory page with a single text control, for dry runs and tests

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{E2eError, E2eResult};
use crate::page::{PageSession, SessionFactory, WaitUntil};

type Transform = Arc<dyn Fn(&str) -> String + Send + Sync>;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// A page holding one text control whose rendered value is derived from the
/// raw input by a transform (identity by default, like a page that keeps the
/// typed text as-is).
pub struct OfflinePage {
    raw: String,
    visible: bool,
    transform: Transform,
    render_lag: usize,
    reads_since_change: usize,
    reads: usize,
    url: Option<String>,
    closed: Option<Arc<AtomicUsize>>,
}

impl OfflinePage {
    pub fn new() -> Self {
        Self {
            raw: String::new(),
            visible: true,
            transform: Arc::new(|s: &str| s.to_string()),
            render_lag: 0,
            reads_since_change: 0,
            reads: 0,
            url: None,
            closed: None,
        }
    }

    pub fn with_transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.transform = Arc::new(f);
        self
    }

    /// Control is never shown
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// The first `reads` reads after each change return partial renderings
    /// (the k-th read yields the first `k % len` characters), so polling
    /// sees the value still moving.
    pub fn with_render_lag(mut self, reads: usize) -> Self {
        self.render_lag = reads;
        self
    }

    /// Number of `get_value` calls so far
    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn rendered(&self) -> String {
        (self.transform)(&self.raw)
    }

    fn changed(&mut self) {
        self.reads_since_change = 0;
    }

    fn check_selector(&self, selector: &str) -> E2eResult<()> {
        if self.visible {
            Ok(())
        } else {
            Err(E2eError::Playwright(format!("no visible element for '{}'", selector)))
        }
    }
}

impl Default for OfflinePage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageSession for OfflinePage {
    async fn navigate(&mut self, url: &str, _wait_until: WaitUntil) -> E2eResult<()> {
        self.url = Some(url.to_string());
        self.raw.clear();
        self.changed();
        Ok(())
    }

    async fn wait_for_visible(&mut self, selector: &str, timeout: Duration) -> E2eResult<()> {
        if self.visible {
            return Ok(());
        }
        tokio::time::sleep(timeout).await;
        Err(E2eError::SetupTimeout {
            selector: selector.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    async fn set_value(&mut self, selector: &str, text: &str) -> E2eResult<()> {
        self.check_selector(selector)?;
        self.raw = text.to_string();
        self.changed();
        Ok(())
    }

    async fn type_text(&mut self, selector: &str, text: &str, delay: Duration) -> E2eResult<()> {
        self.check_selector(selector)?;
        for c in text.chars() {
            self.raw.push(c);
            self.changed();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        Ok(())
    }

    async fn get_value(&mut self, selector: &str) -> E2eResult<String> {
        self.check_selector(selector)?;
        self.reads += 1;
        self.reads_since_change += 1;

        let rendered = self.rendered();
        if self.reads_since_change <= self.render_lag {
            let len = rendered.chars().count().max(1);
            let shown = self.reads_since_change % len;
            return Ok(rendered.chars().take(shown).collect());
        }
        Ok(rendered)
    }

    async fn screenshot(&mut self, path: &Path) -> E2eResult<()> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(self.rendered().as_bytes());
        std::fs::write(path, bytes)?;
        Ok(())
    }

    async fn close(&mut self) -> E2eResult<()> {
        if let Some(closed) = self.closed.take() {
            closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Hands out fresh offline pages and counts their lifecycle
#[derive(Clone)]
pub struct OfflineFactory {
    transform: Transform,
    visible: bool,
    render_lag: usize,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl OfflineFactory {
    pub fn new() -> Self {
        Self {
            transform: Arc::new(|s: &str| s.to_string()),
            visible: true,
            render_lag: 0,
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.transform = Arc::new(f);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Pages opened from here lag by `reads` reads after each change
    pub fn with_render_lag(mut self, reads: usize) -> Self {
        self.render_lag = reads;
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for OfflineFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionFactory for OfflineFactory {
    async fn open(&self) -> E2eResult<Box<dyn PageSession>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let mut page = OfflinePage::new();
        page.transform = Arc::clone(&self.transform);
        page.visible = self.visible;
        page.render_lag = self.render_lag;
        page.closed = Some(Arc::clone(&self.closed));
        Ok(Box::new(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_typing_appends_through_transform() {
        let mut page = OfflinePage::new().with_transform(|s| s.to_uppercase());
        page.type_text("textarea", "vanakkam", Duration::ZERO).await.unwrap();
        assert_eq!(page.get_value("textarea").await.unwrap(), "VANAKKAM");
    }

    #[tokio::test]
    async fn test_navigate_resets_value() {
        let mut page = OfflinePage::new();
        page.set_value("textarea", "abc").await.unwrap();
        page.navigate("https://example.test/", WaitUntil::DomContentLoaded).await.unwrap();
        assert_eq!(page.get_value("textarea").await.unwrap(), "");
        assert_eq!(page.url(), Some("https://example.test/"));
    }

    #[tokio::test]
    async fn test_hidden_control_times_out() {
        let mut page = OfflinePage::new().hidden();
        let err = page
            .wait_for_visible("textarea", Duration::from_millis(5))
            .await
            .unwrap_err();
        assert!(matches!(err, E2eError::SetupTimeout { timeout_ms: 5, .. }));
    }

    #[tokio::test]
    async fn test_factory_pages_inherit_render_lag() {
        let factory = OfflineFactory::new().with_render_lag(2);
        let mut page = factory.open().await.unwrap();
        page.set_value("textarea", "abcd").await.unwrap();
        assert_eq!(page.get_value("textarea").await.unwrap(), "a");
        assert_eq!(page.get_value("textarea").await.unwrap(), "ab");
        assert_eq!(page.get_value("textarea").await.unwrap(), "abcd");
    }

    #[tokio::test]
    async fn test_factory_tracks_close() {
        let factory = OfflineFactory::new();
        let mut page = factory.open().await.unwrap();
        page.close().await.unwrap();
        page.close().await.unwrap();
        assert_eq!(factory.opened(), 1);
        assert_eq!(factory.closed(), 1);
    }
}
