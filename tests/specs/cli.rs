//! CLI surface specs (spec.md §6: "no subcommands").

use crate::prelude::*;

#[test]
fn no_args_prints_usage_and_exits_nonzero() {
    cli().fails().stderr_has("missing required argument").stdout_has("USAGE:");
}

#[test]
fn help_flag_shows_usage() {
    cli().args(&["--help"]).passes().stdout_has("USAGE:");
}

#[test]
fn short_help_flag_shows_usage() {
    cli().args(&["-h"]).passes().stdout_has("USAGE:");
}

#[test]
fn version_flag_prints_version() {
    cli().args(&["--version"]).passes().stdout_has("panicforged");
}

#[test]
fn short_version_flag_prints_version() {
    cli().args(&["-V"]).passes().stdout_has("panicforged");
}

#[test]
fn missing_config_file_is_a_fatal_error() {
    cli()
        .args(&["/nonexistent/panicforge.toml"])
        .fails()
        .stderr_has("fatal");
}
