// crates/kie-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Parsing Tests
// Description: Validate argument parsing and spec-action selection.
// ============================================================================
//! ## Overview
//! Ensures the CLI surface parses the documented verbs and that the spec
//! command demands exactly one action.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use clap::Parser;

use crate::Cli;
use crate::Commands;
use crate::SpecArgs;
use crate::parse_spec_action;
use kie_engine::SpecAction;

#[test]
fn parses_build_target() {
    let cli = Cli::try_parse_from(["kie", "build", "dashboard"]).expect("parse");
    assert!(matches!(
        cli.command,
        Commands::Build {
            ..
        }
    ));
}

#[test]
fn rails_is_an_alias_for_status() {
    let cli = Cli::try_parse_from(["kie", "rails"]).expect("parse");
    assert!(matches!(
        cli.command,
        Commands::Status {
            json: false,
        }
    ));
}

#[test]
fn go_accepts_full_and_showcase() {
    let cli = Cli::try_parse_from(["kie", "go", "--full", "--showcase"]).expect("parse");
    assert!(matches!(
        cli.command,
        Commands::Go {
            full: true,
            showcase: true,
        }
    ));
}

#[test]
fn spec_requires_exactly_one_action() {
    let none = SpecArgs {
        init: None,
        set: None,
        repair: false,
    };
    assert!(parse_spec_action(none).is_err());

    let two = SpecArgs {
        init: Some("proj".to_string()),
        set: Some("objective=x".to_string()),
        repair: false,
    };
    assert!(parse_spec_action(two).is_err());
}

#[test]
fn spec_set_splits_key_and_value() {
    let args = SpecArgs {
        init: None,
        set: Some("objective=grow revenue".to_string()),
        repair: false,
    };
    let action = parse_spec_action(args).expect("action");
    assert_eq!(
        action,
        SpecAction::Set {
            key: "objective".to_string(),
            value: "grow revenue".to_string(),
        }
    );
}

#[test]
fn spec_set_rejects_missing_equals() {
    let args = SpecArgs {
        init: None,
        set: Some("objective".to_string()),
        repair: false,
    };
    assert!(parse_spec_action(args).is_err());
}

#[test]
fn theme_parses_both_values() {
    for theme in ["dark", "light"] {
        let cli = Cli::try_parse_from(["kie", "theme", theme]).expect("parse");
        assert!(matches!(
            cli.command,
            Commands::Theme {
                ..
            }
        ));
    }
}
