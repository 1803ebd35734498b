//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

use assert_cmd::Command;

use std::io::Write;

fn pinelint() -> Command
{
	let mut cmd = Command::cargo_bin("pinelint").unwrap();
	cmd.arg("--color=never");
	cmd
}

fn stdout_of(cmd: &mut Command) -> String
{
	let output = cmd.output().unwrap();
	String::from_utf8(output.stdout).unwrap()
}

#[test]
fn check_clean_indicator()
{
	let mut cmd = pinelint();
	cmd.arg("tests/samples/valid/clean_indicator.pine");
	cmd.assert().success();
	let stdout = stdout_of(&mut cmd);
	assert!(stdout.contains("0 errors, 0 warnings, 0 suggestions"));
}

#[test]
fn check_multiple_files()
{
	let mut cmd = pinelint();
	cmd.arg("tests/samples/valid/clean_indicator.pine");
	cmd.arg("tests/samples/valid/udt_reassigned.pine");
	cmd.arg("tests/samples/valid/drawing_limits.pine");
	cmd.assert().success();
}

#[test]
fn fail_on_short_title()
{
	let mut cmd = pinelint();
	cmd.arg("tests/samples/invalid/short_title_too_long.pine");
	cmd.assert().failure();
}

#[test]
fn fail_on_parse_error()
{
	let mut cmd = pinelint();
	cmd.arg("tests/samples/invalid/unclosed_paren.pine");
	cmd.assert().failure();
}

#[test]
fn fail_on_missing_file()
{
	let mut cmd = pinelint();
	cmd.arg("tests/samples/valid/does_not_exist.pine");
	cmd.assert().failure();
}

#[test]
fn emit_json()
{
	let mut cmd = pinelint();
	cmd.arg("--format=json");
	cmd.arg("tests/samples/invalid/na_object_access.pine");
	cmd.assert().failure();
	let stdout = stdout_of(&mut cmd);
	let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
	assert_eq!(json["file"], "tests/samples/invalid/na_object_access.pine");
	assert_eq!(json["success"], true);
	assert_eq!(json["violations"][0]["rule"], "na_object_access");
	assert_eq!(json["violations"][0]["severity"], "error");
	assert_eq!(json["violations"][0]["line"], 9);
	assert_eq!(json["metrics"]["checksPerformed"], 10);
}

#[test]
fn emit_json_lines_for_multiple_files()
{
	let mut cmd = pinelint();
	cmd.arg("--format=json");
	cmd.arg("tests/samples/valid/clean_indicator.pine");
	cmd.arg("tests/samples/invalid/short_title_too_long.pine");
	cmd.assert().failure();
	let stdout = stdout_of(&mut cmd);
	assert!(!stdout.contains('\u{1b}'));
	let documents: Vec<serde_json::Value> = stdout
		.lines()
		.map(|line| serde_json::from_str(line).unwrap())
		.collect();
	assert_eq!(documents.len(), 2);
	assert_eq!(documents[0]["file"], "tests/samples/valid/clean_indicator.pine");
	assert_eq!(documents[0]["violations"], serde_json::json!([]));
	assert_eq!(documents[1]["violations"][0]["rule"], "SHORT_TITLE_TOO_LONG");
}

#[test]
fn run_single_check()
{
	let mut cmd = pinelint();
	cmd.arg("--only=precision");
	cmd.arg("tests/samples/invalid/precision_out_of_range.pine");
	cmd.assert().failure();

	let mut cmd = pinelint();
	cmd.arg("--only=short-title");
	cmd.arg("tests/samples/invalid/precision_out_of_range.pine");
	cmd.assert().success();
}

#[test]
fn run_single_check_as_json()
{
	let mut cmd = pinelint();
	cmd.arg("--only=na-objects");
	cmd.arg("--format=json");
	cmd.arg("tests/samples/invalid/na_object_history.pine");
	cmd.assert().success();
	let stdout = stdout_of(&mut cmd);
	let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
	assert_eq!(json["violations"][0]["rule"], "na_object_history_access");
	assert_eq!(json["violations"][0]["severity"], "warning");
	assert_eq!(json["metrics"]["checksPerformed"], 1);
}

#[test]
fn skip_optional_checks_without_rules()
{
	let mut cmd = pinelint();
	cmd.arg("--no-rules");
	cmd.arg("tests/samples/invalid/short_title_too_long.pine");
	cmd.assert().success();
}

#[test]
fn reject_rules_with_no_rules()
{
	let mut cmd = pinelint();
	cmd.arg("--no-rules");
	cmd.arg("--rules=builtin:rules.json");
	cmd.arg("tests/samples/valid/clean_indicator.pine");
	cmd.assert().failure();
}

#[test]
fn reject_unknown_builtin()
{
	let mut cmd = pinelint();
	cmd.arg("--rules=builtin:missing.json");
	cmd.arg("tests/samples/valid/clean_indicator.pine");
	cmd.assert().failure();
}

#[test]
fn custom_rules_file()
{
	let mut rules = tempfile::NamedTempFile::new().unwrap();
	writeln!(
		rules,
		r#"{{"errorCodeDefinitions": {{"SHORT_TITLE_TOO_LONG": {{"maxLength": 12}}}}}}"#
	)
	.unwrap();
	let mut cmd = pinelint();
	cmd.arg("--rules");
	cmd.arg(rules.path());
	cmd.arg("tests/samples/invalid/short_title_too_long.pine");
	cmd.assert().success();
}

#[test]
fn load_config_file()
{
	let mut config = tempfile::NamedTempFile::new().unwrap();
	writeln!(config, "no_rules = true").unwrap();
	let mut cmd = pinelint();
	cmd.arg("--config");
	cmd.arg(config.path());
	cmd.arg("tests/samples/invalid/short_title_too_long.pine");
	cmd.assert().success();
}

#[test]
fn reject_unknown_config_key()
{
	let mut config = tempfile::NamedTempFile::new().unwrap();
	writeln!(config, "shorttitle_length = 12").unwrap();
	let mut cmd = pinelint();
	cmd.arg("--config");
	cmd.arg(config.path());
	cmd.arg("tests/samples/valid/clean_indicator.pine");
	cmd.assert().failure();
}

#[test]
fn warnings_fail_only_when_denied()
{
	let mut cmd = pinelint();
	cmd.arg("tests/samples/invalid/line_continuation.pine");
	cmd.assert().success();

	let mut cmd = pinelint();
	cmd.arg("--deny-warnings");
	cmd.arg("tests/samples/invalid/line_continuation.pine");
	cmd.assert().failure();

	let mut config = tempfile::NamedTempFile::new().unwrap();
	writeln!(config, "deny_warnings = true").unwrap();
	let mut cmd = pinelint();
	cmd.arg("--config");
	cmd.arg(config.path());
	cmd.arg("tests/samples/invalid/line_continuation.pine");
	cmd.assert().failure();
}

#[test]
fn verbose_dumps()
{
	let mut cmd = pinelint();
	cmd.arg("--verbose");
	cmd.arg("tests/samples/valid/clean_indicator.pine");
	cmd.assert().success();
	let stdout = stdout_of(&mut cmd);
	assert!(stdout.contains("Lexing"));
	assert!(stdout.contains("input.int"));
	assert!(stdout.contains("Done."));
}
