// crates/kie-engine/src/probe.rs
// ============================================================================
// Module: Environment Probe
// Description: Host clock and toolchain/platform inspection.
// Purpose: Supply the dispatcher with time and environment facts.
// Dependencies: kie-core, std process
// ============================================================================

//! ## Overview
//! The probe supplies what core code is forbidden to read itself: wall-clock
//! time and toolchain facts. Version strings are observations; gates decide
//! whether they satisfy floors. Probing never fails: a missing toolchain is
//! reported as absent, not as an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::process::Command;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use kie_core::Clock;
use kie_core::EnvSnapshot;
use kie_core::EnvironmentInspector;
use kie_core::Timestamp;

// ============================================================================
// SECTION: System Clock
// ============================================================================

/// Wall-clock time source for the dispatcher.
///
/// # Invariants
/// - Yields unix-millisecond timestamps; tests substitute logical clocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        Timestamp::UnixMillis(millis)
    }
}

// ============================================================================
// SECTION: Environment Probe
// ============================================================================

/// Toolchain and platform prober.
///
/// # Invariants
/// - Probing is observational; it never mutates state.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentProbe;

impl EnvironmentProbe {
    /// Runs `<binary> --version` and returns the first output line.
    fn version_of(binary: &str) -> Option<String> {
        let output = Command::new(binary).arg("--version").output().ok()?;
        if !output.status.success() {
            return None;
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout.lines().next()?.trim();
        if line.is_empty() { None } else { Some(line.to_string()) }
    }
}

impl EnvironmentInspector for EnvironmentProbe {
    fn probe(&self) -> EnvSnapshot {
        EnvSnapshot {
            python: Self::version_of("python3").or_else(|| Self::version_of("python")),
            node: Self::version_of("node"),
            os: std::env::consts::OS.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Version Parsing
// ============================================================================

/// Extracts the major version from a toolchain version line (`v18.19.0`,
/// `Python 3.11.4`, …).
#[must_use]
pub fn major_version(version_line: &str) -> Option<u32> {
    version_line
        .split(|ch: char| !ch.is_ascii_digit())
        .find(|segment| !segment.is_empty())
        .and_then(|segment| segment.parse().ok())
}
