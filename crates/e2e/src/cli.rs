//! Command-line arguments of the harness binary

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::case::{CaseKind, TestCase};
use crate::catalogue::Catalogue;
use crate::error::E2eResult;
use crate::page::WaitUntil;
use crate::playwright::{Browser, PlaywrightConfig};
use crate::runner::RunnerConfig;
use crate::settle::SettlePolicy;
use crate::target::DEFAULT_TARGET_URL;

#[derive(Parser, Debug)]
#[command(name = "changathi-e2e")]
#[command(about = "E2E checks for the Changathi Tamil transliteration page")]
pub struct HarnessArgs {
    /// Page under test
    #[arg(long, default_value = DEFAULT_TARGET_URL)]
    pub url: String,

    /// Selector of the primary text control
    #[arg(long, default_value = "textarea")]
    pub selector: String,

    /// Run only these case ids (repeatable)
    #[arg(short, long)]
    pub id: Vec<String>,

    /// Run only cases of this kind
    #[arg(short, long)]
    pub kind: Option<String>,

    /// Run only cases whose id matches this regex
    #[arg(short, long)]
    pub filter: Option<String>,

    /// YAML catalogue file or directory instead of the built-in cases
    #[arg(long)]
    pub catalogue: Option<PathBuf>,

    /// List the selected cases and exit
    #[arg(long)]
    pub list: bool,

    /// Browser to use
    #[arg(long, value_enum, default_value = "chromium")]
    pub browser: Browser,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Directory containing the playwright package (NODE_PATH)
    #[arg(long, env = "NODE_PATH")]
    pub node_path: Option<PathBuf>,

    /// How long the text control may take to appear
    #[arg(long, default_value = "30000")]
    pub visible_timeout_ms: u64,

    /// Pause after a bulk fill
    #[arg(long, default_value = "250")]
    pub settle_ms: u64,

    /// Pause after simulated typing
    #[arg(long, default_value = "200")]
    pub ui_settle_ms: u64,

    /// Delay between typed characters
    #[arg(long, default_value = "60")]
    pub type_delay_ms: u64,

    /// Read once after the pause instead of polling until the value is stable
    #[arg(long)]
    pub fixed_settle: bool,

    /// Poll interval while waiting for a stable value
    #[arg(long, default_value = "100")]
    pub stable_interval_ms: u64,

    /// Give up polling for a stable value after this long
    #[arg(long, default_value = "3000")]
    pub stable_timeout_ms: u64,

    /// Cases to run at once
    #[arg(short, long, default_value = "1")]
    pub workers: usize,

    /// Capture a screenshot for every case that does not pass
    #[arg(long)]
    pub screenshots: bool,

    /// Run against an in-memory page instead of a browser
    #[arg(long)]
    pub offline: bool,

    /// Skip the reachability check of the target
    #[arg(long)]
    pub skip_probe: bool,

    /// Fail instead of skipping when Playwright or the target is unavailable
    #[arg(long)]
    pub require_browser: bool,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results")]
    pub output: PathBuf,

    #[command(flatten)]
    pub libtest: LibtestArgs,
}

/// Arguments `cargo test` forwards to every test binary. They are accepted
/// so a filtered or `--nocapture` run does not abort the suite, and
/// otherwise ignored.
#[derive(clap::Args, Debug, Default)]
pub struct LibtestArgs {
    /// Test name filters
    #[arg(hide = true)]
    pub filters: Vec<String>,

    #[arg(long, hide = true)]
    pub nocapture: bool,

    #[arg(long, hide = true)]
    pub exact: bool,

    #[arg(long, hide = true)]
    pub ignored: bool,

    #[arg(long, hide = true)]
    pub include_ignored: bool,

    #[arg(long, hide = true)]
    pub show_output: bool,

    #[arg(short, long, hide = true)]
    pub quiet: bool,

    #[arg(long, hide = true)]
    pub test_threads: Option<usize>,

    #[arg(long, hide = true)]
    pub skip: Vec<String>,

    #[arg(long, hide = true)]
    pub format: Option<String>,

    #[arg(long, hide = true)]
    pub color: Option<String>,

    #[arg(short = 'Z', hide = true)]
    pub unstable: Vec<String>,
}

impl HarnessArgs {
    /// Apply `--id`, `--kind` and `--filter` to a catalogue
    pub fn select_cases<'a>(&self, catalogue: &'a Catalogue) -> E2eResult<Vec<&'a TestCase>> {
        let mut cases = if self.id.is_empty() {
            catalogue.iter().collect()
        } else {
            catalogue.select(self.id.as_slice())?
        };

        if let Some(kind) = &self.kind {
            let kind: CaseKind = kind.parse()?;
            cases.retain(|c| c.kind == kind);
        }

        if let Some(pattern) = &self.filter {
            let matching = catalogue.matching(pattern)?;
            cases.retain(|c| matching.iter().any(|m| m.id == c.id));
        }

        Ok(cases)
    }

    pub fn runner_config(&self) -> RunnerConfig {
        let polling = SettlePolicy::UntilStable {
            min: Duration::ZERO,
            interval: Duration::from_millis(self.stable_interval_ms),
            timeout: Duration::from_millis(self.stable_timeout_ms),
        };
        let settle_for = |ms: u64| {
            if self.fixed_settle {
                SettlePolicy::Fixed(Duration::from_millis(ms))
            } else {
                polling.with_min(Duration::from_millis(ms))
            }
        };

        RunnerConfig {
            target_url: self.url.clone(),
            selector: self.selector.clone(),
            wait_until: WaitUntil::DomContentLoaded,
            visible_timeout: Duration::from_millis(self.visible_timeout_ms),
            settle: settle_for(self.settle_ms),
            ui_settle: settle_for(self.ui_settle_ms),
            type_delay: Duration::from_millis(self.type_delay_ms),
            workers: self.workers,
            output_dir: self.output.clone(),
            screenshots: self.screenshots,
        }
    }

    pub fn playwright_config(&self) -> PlaywrightConfig {
        PlaywrightConfig {
            browser: self.browser,
            headless: !self.headed,
            node_path: self.node_path.clone(),
            ..Default::default()
        }
    }
}
