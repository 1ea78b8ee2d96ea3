//! Changathi E2E Test Framework
//!
//! This crate drives the Changathi Tamil phonetic-input page through
//! Playwright and checks coarse behaviour of its text box against a fixed
//! catalogue of inputs:
//! - Keeps the scenarios as plain data (`Catalogue` of `TestCase`)
//! - Interprets each case by its `CaseKind` (bulk fill or live typing)
//! - Controls Playwright through a per-case Node driver process
//! - Reports a pass/fail/error outcome per case id
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Case Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CaseRunner                                                 │
//! │    ├── factory.open() -> PageSession (one per case)         │
//! │    ├── execute(case) -> Observation                         │
//! │    │     ├── navigate { url }                               │
//! │    │     ├── wait_for_visible { textarea }                  │
//! │    │     ├── set_value | type_text                          │
//! │    │     └── settle -> get_value                            │
//! │    └── check::evaluate(kind, observation) -> CaseOutcome    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Catalogue                                                  │
//! │    ├── builtin(): Pos_Fun_*, Pos_UI_*, Neg_Fun_*            │
//! │    └── from_yaml / load_dir                                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod case;
pub mod catalogue;
pub mod check;
pub mod cli;
pub mod error;
pub mod offline;
pub mod page;
pub mod playwright;
pub mod runner;
pub mod settle;
pub mod target;

pub use case::{CaseKind, TestCase};
pub use catalogue::Catalogue;
pub use error::{E2eError, E2eResult};
pub use page::{PageSession, SessionFactory};
pub use runner::{CaseOutcome, CaseRunner, CaseStatus, RunnerConfig, SuiteResult};
