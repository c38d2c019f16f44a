// crates/kie-engine/tests/common/mod.rs
// ============================================================================
// Module: Engine Test Fixtures
// Description: Deterministic clock, stub environment, and workspace helpers.
// ============================================================================
//! Shared fixtures for engine tests: a logical tick clock, a stubbed
//! environment inspector, and helpers that stand up a workspace with data.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    dead_code,
    reason = "Test-only fixtures; not every test uses every helper."
)]

use std::fs;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use kie_core::Clock;
use kie_core::EnvSnapshot;
use kie_core::EnvironmentInspector;
use kie_core::Timestamp;
use kie_core::WorkspaceLayout;
use kie_engine::CommandKind;
use kie_engine::Engine;
use kie_engine::InterviewInput;

/// Monotonic logical clock for deterministic evidence records.
#[derive(Debug, Default)]
pub struct TickClock {
    /// Next tick to hand out.
    tick: AtomicU64,
}

impl Clock for TickClock {
    fn now(&self) -> Timestamp {
        Timestamp::Logical(self.tick.fetch_add(1, Ordering::SeqCst))
    }
}

/// Stubbed environment with configurable toolchains.
#[derive(Debug, Clone)]
pub struct StubEnvironment {
    /// Node version line, when present.
    pub node: Option<String>,
    /// Python version line, when present.
    pub python: Option<String>,
}

impl Default for StubEnvironment {
    fn default() -> Self {
        Self {
            node: Some("v20.11.1".to_string()),
            python: Some("Python 3.11.4".to_string()),
        }
    }
}

impl EnvironmentInspector for StubEnvironment {
    fn probe(&self) -> EnvSnapshot {
        EnvSnapshot {
            python: self.python.clone(),
            node: self.node.clone(),
            os: "linux".to_string(),
        }
    }
}

/// Stands up an engine over a temp workspace.
pub fn engine_in(dir: &tempfile::TempDir) -> Engine {
    Engine::with_parts(
        WorkspaceLayout::new(dir.path()),
        Box::new(TickClock::default()),
        Box::new(StubEnvironment::default()),
    )
}

/// Stands up an engine with a specific environment stub.
pub fn engine_with_env(dir: &tempfile::TempDir, env: StubEnvironment) -> Engine {
    Engine::with_parts(
        WorkspaceLayout::new(dir.path()),
        Box::new(TickClock::default()),
        Box::new(env),
    )
}

/// Realistic sales data: mixed magnitudes, repeated groups, a date column.
pub const SALES_CSV: &str = "\
order_date,region,revenue,cost\n\
2024-01-05,North,1284.31,803.11\n\
2024-01-19,South,911.02,640.88\n\
2024-02-02,North,1415.77,851.20\n\
2024-02-16,South,954.63,660.45\n\
2024-03-01,North,1733.08,914.92\n\
2024-03-15,South,1012.44,688.13\n\
2024-04-05,North,1918.55,977.31\n\
2024-04-19,South,1104.96,715.27\n";

/// Writes the sales dataset into the workspace.
pub fn write_sales_data(dir: &tempfile::TempDir) {
    let data_dir = dir.path().join("data");
    fs::create_dir_all(&data_dir).expect("data dir");
    fs::write(data_dir.join("sales.csv"), SALES_CSV).expect("write data");
}

/// Runs the interview command that completes the spec.
pub fn capture_intent(engine: &Engine) {
    let outcome = engine.execute(&CommandKind::Interview(InterviewInput {
        project_name: Some("margin-study".to_string()),
        objective: Some("grow revenue across regions".to_string()),
        client: Some("Northwind".to_string()),
        project_type: Some("analytics".to_string()),
        theme: None,
        data: None,
    }));
    assert_eq!(outcome.exit_code, 0, "interview failed: {}", outcome.summary);
}
