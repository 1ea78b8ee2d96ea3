//! Case runner: drives one page per case and judges the result

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::case::{CaseKind, TestCase};
use crate::catalogue::Catalogue;
use crate::check::{self, AssertionFailure, Observation};
use crate::error::{E2eError, E2eResult};
use crate::page::{PageSession, SessionFactory, WaitUntil};
use crate::settle::SettlePolicy;
use crate::target::DEFAULT_TARGET_URL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Passed,
    /// An expectation did not hold
    Failed,
    /// The case could not be carried out (setup timeout, driver error)
    Errored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshot {
    pub path: PathBuf,
    pub sha256: String,
}

/// Result of running a single case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseOutcome {
    pub id: String,
    pub kind: CaseKind,
    pub status: CaseStatus,
    pub duration_ms: u64,
    pub message: Option<String>,

    /// Value read back from the control, when the case got that far
    pub actual: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<AssertionFailure>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<Screenshot>,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.status == CaseStatus::Passed
    }
}

/// Result of running a set of cases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub duration_ms: u64,
    pub results: Vec<CaseOutcome>,
}

impl SuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    pub fn outcome(&self, id: &str) -> Option<&CaseOutcome> {
        self.results.iter().find(|r| r.id == id)
    }
}

/// Configuration for the case runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Page under test
    pub target_url: String,

    /// The primary text-input control
    pub selector: String,

    pub wait_until: WaitUntil,

    /// How long the control may take to become visible
    pub visible_timeout: Duration,

    /// Settle after a bulk fill
    pub settle: SettlePolicy,

    /// Settle after simulated typing
    pub ui_settle: SettlePolicy,

    /// Pause between typed characters
    pub type_delay: Duration,

    /// Cases in flight at once
    pub workers: usize,

    /// Output directory for results
    pub output_dir: PathBuf,

    /// Capture a full-page screenshot when a case does not pass
    pub screenshots: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            selector: "textarea".to_string(),
            wait_until: WaitUntil::DomContentLoaded,
            visible_timeout: Duration::from_secs(30),
            settle: SettlePolicy::until_stable(Duration::from_millis(250)),
            ui_settle: SettlePolicy::until_stable(Duration::from_millis(200)),
            type_delay: Duration::from_millis(60),
            workers: 1,
            output_dir: PathBuf::from("test-results"),
            screenshots: false,
        }
    }
}

/// Runs catalogue cases, one fresh page each
pub struct CaseRunner {
    config: RunnerConfig,
    factory: Arc<dyn SessionFactory>,
}

impl CaseRunner {
    pub fn new(config: RunnerConfig, factory: impl SessionFactory + 'static) -> Self {
        Self {
            config,
            factory: Arc::new(factory),
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run every case in the catalogue
    pub async fn run_all(&self, catalogue: &Catalogue) -> SuiteResult {
        let cases: Vec<&TestCase> = catalogue.iter().collect();
        self.run_cases(&cases).await
    }

    /// Run a list of cases. Results keep the order of `cases` regardless of
    /// how many run at once.
    pub async fn run_cases(&self, cases: &[&TestCase]) -> SuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let workers = self.config.workers.max(1);

        info!("Running {} case(s) with {} worker(s)...", cases.len(), workers);

        let results: Vec<CaseOutcome> = stream::iter(cases.iter().copied())
            .map(|case| self.run_case(case))
            .buffered(workers)
            .collect()
            .await;

        let passed = results.iter().filter(|r| r.status == CaseStatus::Passed).count();
        let failed = results.iter().filter(|r| r.status == CaseStatus::Failed).count();
        let errored = results.iter().filter(|r| r.status == CaseStatus::Errored).count();
        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!(
            "Test Results: {} passed, {} failed, {} errored ({} ms)",
            passed, failed, errored, duration_ms
        );

        SuiteResult {
            started_at,
            total: cases.len(),
            passed,
            failed,
            errored,
            duration_ms,
            results,
        }
    }

    /// Run a single case on its own page. Never fails: every problem ends up
    /// in the outcome.
    pub async fn run_case(&self, case: &TestCase) -> CaseOutcome {
        let start = Instant::now();
        debug!("Running case: {} ({})", case.id, case.kind);

        let mut page = match self.factory.open().await {
            Ok(page) => page,
            Err(e) => return self.finish(case, start, Err(e), None, None),
        };

        let observed = self.execute(page.as_mut(), case).await;
        let actual = observed.as_ref().ok().map(|obs| obs.actual.clone());
        let verdict = observed.and_then(|obs| {
            check::evaluate(case.kind, &obs).map_err(E2eError::AssertionFailed)
        });

        let screenshot = if verdict.is_err() && self.config.screenshots {
            self.capture(page.as_mut(), case).await
        } else {
            None
        };

        if let Err(e) = page.close().await {
            warn!("Failed to close page for {}: {}", case.id, e);
        }

        self.finish(case, start, verdict, actual, screenshot)
    }

    /// Navigate, wait for the control, submit the input and read it back
    async fn execute(
        &self,
        page: &mut dyn PageSession,
        case: &TestCase,
    ) -> E2eResult<Observation> {
        let selector = self.config.selector.as_str();

        page.navigate(&self.config.target_url, self.config.wait_until)
            .await?;
        page.wait_for_visible(selector, self.config.visible_timeout)
            .await?;

        match case.kind {
            CaseKind::PositiveUi => {
                page.set_value(selector, "").await?;
                let before = page.get_value(selector).await?;
                page.type_text(selector, &case.input, self.config.type_delay)
                    .await?;
                let after = self.config.ui_settle.settle(page, selector).await?;
                Ok(Observation::typed(before, after))
            }
            CaseKind::PositiveFunctional
            | CaseKind::NegativeEmpty
            | CaseKind::NegativeNoSignal
            | CaseKind::NegativeTenseMismatch
            | CaseKind::NegativeStress => {
                page.set_value(selector, "").await?;
                if !case.input.is_empty() {
                    page.set_value(selector, &case.input).await?;
                }
                let actual = self.config.settle.settle(page, selector).await?;
                Ok(Observation::filled(actual))
            }
        }
    }

    async fn capture(&self, page: &mut dyn PageSession, case: &TestCase) -> Option<Screenshot> {
        let dir = self.config.output_dir.join("screenshots");
        let path = dir.join(format!("{}.png", case.id));

        let taken = async {
            std::fs::create_dir_all(&dir)?;
            page.screenshot(&path).await?;
            let bytes = std::fs::read(&path)?;
            Ok::<_, E2eError>(hex::encode(Sha256::digest(&bytes)))
        }
        .await;

        match taken {
            Ok(sha256) => Some(Screenshot { path, sha256 }),
            Err(e) => {
                warn!("Screenshot for {} failed: {}", case.id, e);
                None
            }
        }
    }

    fn finish(
        &self,
        case: &TestCase,
        start: Instant,
        verdict: E2eResult<()>,
        actual: Option<String>,
        screenshot: Option<Screenshot>,
    ) -> CaseOutcome {
        let duration_ms = start.elapsed().as_millis() as u64;

        let (status, message, failure) = match verdict {
            Ok(()) => (
                CaseStatus::Passed,
                check::caveat(case.kind).map(str::to_string),
                None,
            ),
            Err(E2eError::AssertionFailed(failure)) => {
                (CaseStatus::Failed, Some(failure.to_string()), Some(failure))
            }
            Err(e) => (CaseStatus::Errored, Some(e.to_string()), None),
        };

        match status {
            CaseStatus::Passed => info!("✓ {} ({} ms)", case.id, duration_ms),
            _ => error!(
                "✗ {} - {}",
                case.id,
                message.as_deref().unwrap_or("unknown error")
            ),
        }

        CaseOutcome {
            id: case.id.clone(),
            kind: case.kind,
            status,
            duration_ms,
            message,
            actual,
            failure,
            screenshot,
        }
    }

    /// Write suite results to JSON file
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::OfflineFactory;

    fn quick_config() -> RunnerConfig {
        RunnerConfig {
            target_url: "https://example.test/".to_string(),
            visible_timeout: Duration::from_millis(10),
            settle: SettlePolicy::Fixed(Duration::ZERO),
            ui_settle: SettlePolicy::Fixed(Duration::ZERO),
            type_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_functional_case_passes_on_echo_page() {
        let runner = CaseRunner::new(quick_config(), OfflineFactory::new());
        let case = TestCase::new("Pos_Fun_0008", CaseKind::PositiveFunctional, "inge vaa");

        let outcome = runner.run_case(&case).await;
        assert_eq!(outcome.status, CaseStatus::Passed);
        assert_eq!(outcome.actual.as_deref(), Some("inge vaa"));
        assert!(outcome.message.is_none());
    }

    #[tokio::test]
    async fn test_page_that_drops_input_fails_with_diagnostics() {
        let factory = OfflineFactory::new().with_transform(|_| String::new());
        let runner = CaseRunner::new(quick_config(), factory);
        let case = TestCase::new("Pos_Fun_0001", CaseKind::PositiveFunctional, "suriyan");

        let outcome = runner.run_case(&case).await;
        assert_eq!(outcome.status, CaseStatus::Failed);
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.check, "non-empty");
        assert_eq!(failure.actual, "");
    }

    #[tokio::test]
    async fn test_hidden_control_errors_and_closes_page() {
        let factory = OfflineFactory::new().hidden();
        let runner = CaseRunner::new(quick_config(), factory.clone());
        let case = TestCase::new("Pos_Fun_0002", CaseKind::PositiveFunctional, "nan");

        let outcome = runner.run_case(&case).await;
        assert_eq!(outcome.status, CaseStatus::Errored);
        assert!(outcome.message.unwrap().starts_with("Setup timeout"));
        assert!(outcome.actual.is_none());
        assert_eq!(factory.opened(), 1);
        assert_eq!(factory.closed(), 1);
    }

    #[tokio::test]
    async fn test_no_signal_pass_reports_caveat() {
        let runner = CaseRunner::new(quick_config(), OfflineFactory::new());
        let case = TestCase::new("Neg_Fun_0005", CaseKind::NegativeNoSignal, "1234567890");

        let outcome = runner.run_case(&case).await;
        assert!(outcome.passed());
        assert!(outcome.message.unwrap().contains("not asserted"));
    }

    #[tokio::test]
    async fn test_screenshot_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunnerConfig {
            output_dir: dir.path().to_path_buf(),
            screenshots: true,
            ..quick_config()
        };
        let factory = OfflineFactory::new().with_transform(|_| "x".to_string());
        let runner = CaseRunner::new(config, factory);
        let case = TestCase::new("Neg_Fun_0002", CaseKind::NegativeEmpty, "");

        let outcome = runner.run_case(&case).await;
        assert_eq!(outcome.status, CaseStatus::Failed);
        let shot = outcome.screenshot.unwrap();
        assert_eq!(shot.path, dir.path().join("screenshots").join("Neg_Fun_0002.png"));
        assert_eq!(shot.sha256.len(), 64);
        assert!(shot.path.exists());
    }

    #[tokio::test]
    async fn test_write_results() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunnerConfig {
            output_dir: dir.path().join("out"),
            ..quick_config()
        };
        let runner = CaseRunner::new(config, OfflineFactory::new());
        let case = TestCase::new("Pos_UI_0001", CaseKind::PositiveUi, "vanakkam");
        let suite = runner.run_cases(&[&case]).await;

        let path = runner.write_results(&suite).unwrap();
        let parsed: SuiteResult =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed.total, 1);
        assert_eq!(parsed.results[0].kind, CaseKind::PositiveUi);
        assert_eq!(parsed.results[0].status, CaseStatus::Passed);
    }
}
