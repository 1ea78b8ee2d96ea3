//! Pre-flight check that the page under test answers at all

use std::time::Duration;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Page under test
pub const DEFAULT_TARGET_URL: &str = "https://tamil.changathi.com/";

/// Issue one GET against `url` and require a success status.
///
/// This runs once before any case and aborts the run when the page is
/// down, so a dead target is not reported as a catalogue full of setup
/// timeouts. It is not retried.
pub async fn probe(url: &str, timeout: Duration) -> E2eResult<u16> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;

    info!("Probing target {}", url);

    match client.get(url).send().await {
        Ok(resp) if resp.status().is_success() => {
            let status = resp.status().as_u16();
            info!("Target answered {}", status);
            Ok(status)
        }
        Ok(resp) => {
            warn!("Target returned {}", resp.status());
            Err(E2eError::TargetUnreachable {
                url: url.to_string(),
                reason: format!("status {}", resp.status()),
            })
        }
        Err(e) => Err(E2eError::TargetUnreachable {
            url: url.to_string(),
            reason: e.to_string(),
        }),
    }
}
