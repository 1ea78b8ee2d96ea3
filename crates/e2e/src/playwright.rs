//! Playwright browser automation
//!
//! Each session is a `node` process running a generated driver script. The
//! script launches the browser, opens one page, then answers line-delimited
//! JSON commands on stdin with one JSON line per command on stdout.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::page::{PageSession, SessionFactory, WaitUntil};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Node executable
    pub node_binary: PathBuf,

    /// Directory holding the `playwright` package, exported as `NODE_PATH`
    pub node_path: Option<PathBuf>,

    /// Slack allowed on top of a command's own wait before the driver is
    /// considered hung
    pub command_timeout: Duration,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            node_binary: PathBuf::from("node"),
            node_path: std::env::var_os("NODE_PATH").map(PathBuf::from),
            command_timeout: Duration::from_secs(30),
        }
    }
}

/// Command sent to the driver script
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum DriverCommand<'a> {
    Navigate { url: &'a str, wait_until: &'static str },
    WaitVisible { selector: &'a str, timeout_ms: u64 },
    Fill { selector: &'a str, text: &'a str },
    Type { selector: &'a str, text: &'a str, delay_ms: u64 },
    Value { selector: &'a str },
    Screenshot { path: &'a Path },
    Close,
}

impl DriverCommand<'_> {
    fn name(&self) -> &'static str {
        match self {
            DriverCommand::Navigate { .. } => "navigate",
            DriverCommand::WaitVisible { .. } => "wait_visible",
            DriverCommand::Fill { .. } => "fill",
            DriverCommand::Type { .. } => "type",
            DriverCommand::Value { .. } => "value",
            DriverCommand::Screenshot { .. } => "screenshot",
            DriverCommand::Close => "close",
        }
    }

    /// Time the command itself may legitimately take
    fn own_wait(&self) -> Duration {
        match self {
            DriverCommand::WaitVisible { timeout_ms, .. } => Duration::from_millis(*timeout_ms),
            DriverCommand::Type { text, delay_ms, .. } => {
                Duration::from_millis(delay_ms.saturating_mul(text.chars().count() as u64))
            }
            _ => Duration::ZERO,
        }
    }
}

/// One reply line from the driver script
#[derive(Debug, Clone, Default, Deserialize)]
struct DriverReply {
    ok: bool,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    timeout: bool,
}

/// Opens Playwright-backed pages
pub struct PlaywrightDriver {
    config: PlaywrightConfig,

    /// Holds the generated driver script for the driver's lifetime
    script_dir: TempDir,
}

impl PlaywrightDriver {
    /// Verify Playwright is installed and stage the driver script
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed()?;

        let script_dir = tempfile::tempdir()?;
        std::fs::write(script_dir.path().join("driver.js"), build_script(&config))?;

        Ok(Self { config, script_dir })
    }

    /// Check if Playwright is installed
    fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["--no-install", "playwright", "--version"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    fn script_path(&self) -> PathBuf {
        self.script_dir.path().join("driver.js")
    }

    /// Start a driver process and wait for its ready line
    async fn spawn_session(&self) -> E2eResult<PlaywrightSession> {
        let mut cmd = TokioCommand::new(&self.config.node_binary);
        cmd.arg(self.script_path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        if let Some(node_path) = &self.config.node_path {
            cmd.env("NODE_PATH", node_path);
        }

        let mut child = cmd.spawn().map_err(|e| {
            E2eError::Playwright(format!(
                "Failed to spawn {}: {}",
                self.config.node_binary.display(),
                e
            ))
        })?;

        let stdin = child.stdin.take().ok_or(E2eError::DriverClosed)?;
        let stdout = child.stdout.take().ok_or(E2eError::DriverClosed)?;

        let mut session = PlaywrightSession {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            command_timeout: self.config.command_timeout,
            closed: false,
        };

        // The script prints one line once the browser and page are up
        let ready = session.read_reply(self.config.command_timeout).await?;
        if !ready.ok {
            return Err(E2eError::Playwright(
                ready.error.unwrap_or_else(|| "browser launch failed".to_string()),
            ));
        }

        debug!("Playwright session ready ({})", self.config.browser.as_str());
        Ok(session)
    }
}

#[async_trait]
impl SessionFactory for PlaywrightDriver {
    async fn open(&self) -> E2eResult<Box<dyn PageSession>> {
        Ok(Box::new(self.spawn_session().await?))
    }
}

/// A live page in its own driver process
pub struct PlaywrightSession {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    command_timeout: Duration,
    closed: bool,
}

impl PlaywrightSession {
    async fn call(&mut self, command: &DriverCommand<'_>) -> E2eResult<DriverReply> {
        if self.closed {
            return Err(E2eError::DriverClosed);
        }

        let mut line = serde_json::to_string(command)?;
        line.push('\n');
        debug!("driver <- {}", command.name());

        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        let reply = self
            .read_reply(command.own_wait() + self.command_timeout)
            .await?;

        if reply.ok {
            Ok(reply)
        } else {
            let error = reply
                .error
                .unwrap_or_else(|| format!("{} failed", command.name()));
            if reply.timeout {
                Err(E2eError::Timeout(error))
            } else {
                Err(E2eError::Playwright(error))
            }
        }
    }

    async fn read_reply(&mut self, limit: Duration) -> E2eResult<DriverReply> {
        let line = tokio::time::timeout(limit, self.stdout.next_line())
            .await
            .map_err(|_| E2eError::Timeout(format!("driver reply after {:?}", limit)))??
            .ok_or(E2eError::DriverClosed)?;

        Ok(serde_json::from_str(&line)?)
    }
}

#[async_trait]
impl PageSession for PlaywrightSession {
    async fn navigate(&mut self, url: &str, wait_until: WaitUntil) -> E2eResult<()> {
        self.call(&DriverCommand::Navigate {
            url,
            wait_until: wait_until.as_str(),
        })
        .await?;
        Ok(())
    }

    async fn wait_for_visible(&mut self, selector: &str, timeout: Duration) -> E2eResult<()> {
        let timeout_ms = timeout.as_millis() as u64;
        match self
            .call(&DriverCommand::WaitVisible { selector, timeout_ms })
            .await
        {
            Ok(_) => Ok(()),
            Err(E2eError::Timeout(_)) => Err(E2eError::SetupTimeout {
                selector: selector.to_string(),
                timeout_ms,
            }),
            Err(e) => Err(e),
        }
    }

    async fn set_value(&mut self, selector: &str, text: &str) -> E2eResult<()> {
        self.call(&DriverCommand::Fill { selector, text }).await?;
        Ok(())
    }

    async fn type_text(&mut self, selector: &str, text: &str, delay: Duration) -> E2eResult<()> {
        self.call(&DriverCommand::Type {
            selector,
            text,
            delay_ms: delay.as_millis() as u64,
        })
        .await?;
        Ok(())
    }

    async fn get_value(&mut self, selector: &str) -> E2eResult<String> {
        let reply = self.call(&DriverCommand::Value { selector }).await?;
        Ok(reply.value.unwrap_or_default())
    }

    async fn screenshot(&mut self, path: &Path) -> E2eResult<()> {
        self.call(&DriverCommand::Screenshot { path }).await?;
        Ok(())
    }

    async fn close(&mut self) -> E2eResult<()> {
        if self.closed {
            return Ok(());
        }

        let result = self.call(&DriverCommand::Close).await;
        self.closed = true;

        if let Err(e) = &result {
            warn!("Driver close failed, killing: {}", e);
            let _ = self.child.kill().await;
            return Ok(());
        }

        let _ = self.child.wait().await;
        info!("Playwright session closed");
        Ok(())
    }
}

/// Build the driver script for a configuration
pub fn build_script(config: &PlaywrightConfig) -> String {
    format!(
        r#"
const {{ chromium, firefox, webkit }} = require('playwright');
const readline = require('readline');

const reply = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  reply({{ ok: true }});

  const rl = readline.createInterface({{ input: process.stdin }});
  for await (const line of rl) {{
    let cmd;
    try {{
      cmd = JSON.parse(line);
    }} catch (error) {{
      reply({{ ok: false, error: 'bad command: ' + error.message }});
      continue;
    }}

    try {{
      switch (cmd.op) {{
        case 'navigate':
          await page.goto(cmd.url, {{ waitUntil: cmd.wait_until }});
          reply({{ ok: true }});
          break;
        case 'wait_visible':
          await page.locator(cmd.selector).waitFor({{ state: 'visible', timeout: cmd.timeout_ms }});
          reply({{ ok: true }});
          break;
        case 'fill':
          await page.locator(cmd.selector).fill(cmd.text);
          reply({{ ok: true }});
          break;
        case 'type':
          await page.locator(cmd.selector).pressSequentially(cmd.text, {{ delay: cmd.delay_ms }});
          reply({{ ok: true }});
          break;
        case 'value':
          reply({{ ok: true, value: await page.locator(cmd.selector).inputValue() }});
          break;
        case 'screenshot':
          await page.screenshot({{ path: cmd.path, fullPage: true }});
          reply({{ ok: true }});
          break;
        case 'close':
          await browser.close();
          reply({{ ok: true }});
          process.exit(0);
        default:
          reply({{ ok: false, error: 'unknown op: ' + cmd.op }});
      }}
    }} catch (error) {{
      reply({{ ok: false, error: error.message, timeout: error.name === 'TimeoutError' }});
    }}
  }}

  await browser.close();
}})().catch((error) => {{
  reply({{ ok: false, error: error.message }});
  process.exit(1);
}});
"#,
        browser = config.browser.as_str(),
        headless = config.headless,
        width = config.viewport_width,
        height = config.viewport_height,
    )
}
