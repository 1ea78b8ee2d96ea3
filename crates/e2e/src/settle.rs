//! Waiting for the page to finish rendering after input

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::error::E2eResult;
use crate::page::PageSession;

/// How the runner decides the control's value is final
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlePolicy {
    /// Pause for a fixed interval, then read once
    Fixed(Duration),

    /// Pause for `min`, then poll every `interval` until two consecutive
    /// reads agree or `timeout` has passed since polling began
    UntilStable {
        min: Duration,
        interval: Duration,
        timeout: Duration,
    },
}

impl SettlePolicy {
    pub fn until_stable(min: Duration) -> Self {
        SettlePolicy::UntilStable {
            min,
            interval: Duration::from_millis(100),
            timeout: Duration::from_secs(3),
        }
    }

    /// Same polling behaviour with a different initial pause
    pub fn with_min(self, min: Duration) -> Self {
        match self {
            SettlePolicy::Fixed(_) => SettlePolicy::Fixed(min),
            SettlePolicy::UntilStable { interval, timeout, .. } => SettlePolicy::UntilStable {
                min,
                interval,
                timeout,
            },
        }
    }

    /// Wait according to the policy and return the settled value.
    ///
    /// Running out of time while the value is still changing is not an
    /// error; the last read is returned.
    pub async fn settle(
        &self,
        page: &mut dyn PageSession,
        selector: &str,
    ) -> E2eResult<String> {
        match *self {
            SettlePolicy::Fixed(delay) => {
                page.wait(delay).await?;
                page.get_value(selector).await
            }
            SettlePolicy::UntilStable { min, interval, timeout } => {
                page.wait(min).await?;
                let deadline = Instant::now() + timeout;
                let mut last = page.get_value(selector).await?;
                let mut polls = 1;

                while Instant::now() < deadline {
                    page.wait(interval).await?;
                    let current = page.get_value(selector).await?;
                    polls += 1;
                    if current == last {
                        debug!("Value stable after {} reads", polls);
                        return Ok(current);
                    }
                    last = current;
                }

                debug!("Value still changing after {} reads, using last", polls);
                Ok(last)
            }
        }
    }
}

impl Default for SettlePolicy {
    fn default() -> Self {
        SettlePolicy::until_stable(Duration::from_millis(250))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::OfflinePage;

    #[tokio::test]
    async fn test_fixed_reads_once_after_delay() {
        let mut page = OfflinePage::new();
        page.set_value("textarea", "abc").await.unwrap();

        let value = SettlePolicy::Fixed(Duration::from_millis(5))
            .settle(&mut page, "textarea")
            .await
            .unwrap();
        assert_eq!(value, "abc");
        assert_eq!(page.reads(), 1);
    }

    #[tokio::test]
    async fn test_until_stable_waits_for_lagging_render() {
        let mut page = OfflinePage::new().with_render_lag(3);
        page.set_value("textarea", "abc").await.unwrap();

        let policy = SettlePolicy::UntilStable {
            min: Duration::ZERO,
            interval: Duration::from_millis(1),
            timeout: Duration::from_secs(2),
        };
        let value = policy.settle(&mut page, "textarea").await.unwrap();
        assert_eq!(value, "abc");
        assert!(page.reads() >= 4);
    }

    #[tokio::test]
    async fn test_until_stable_returns_last_read_on_timeout() {
        let mut page = OfflinePage::new().with_render_lag(1_000_000);
        page.set_value("textarea", "abc").await.unwrap();

        let policy = SettlePolicy::UntilStable {
            min: Duration::ZERO,
            interval: Duration::from_millis(1),
            timeout: Duration::from_millis(20),
        };
        let value = policy.settle(&mut page, "textarea").await.unwrap();
        assert_ne!(value, "abc");
    }

    #[test]
    fn test_with_min_keeps_polling_shape() {
        let policy = SettlePolicy::default().with_min(Duration::from_millis(200));
        match policy {
            SettlePolicy::UntilStable { min, interval, .. } => {
                assert_eq!(min, Duration::from_millis(200));
                assert_eq!(interval, Duration::from_millis(100));
            }
            SettlePolicy::Fixed(_) => panic!("expected polling policy"),
        }
    }
}
