//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

use pinelint::error::ParseErrorCode;
use pinelint::included;
use pinelint::lexer::{self, Token};
use pinelint::parser::{self, ParserOptions};
use pinelint::*;

use proptest::prelude::*;

/// Pieces of Pine Script that, glued together at random, produce both
/// plausible scripts and every kind of malformed input.
const FRAGMENTS: &[&str] = &[
	"//@version=6\n",
	"//@version=4\n",
	"indicator(",
	"strategy(",
	"\"Title\"",
	"\"TwelveCharsX\"",
	", ",
	"shorttitle=",
	"precision=",
	"max_bars_back=",
	"max_lines_count=",
	"9",
	"2.5",
	"0",
	")",
	"(",
	"[1]",
	"\n",
	"    ",
	"  ",
	"\t",
	"var ",
	"Pivot ",
	"p",
	" = ",
	" := ",
	"na",
	".price",
	"type Pivot\n    float price\n",
	"Pivot.new(close)",
	"ta.sma(close, 14)",
	"sma(close)",
	"textColor=",
	"qtyPercent=",
	"color.red",
	"math",
	" + ",
	" and ",
	"=>",
	"<float>",
	"/*",
	"*/",
	"// note",
	"'",
	"\"",
	"é",
	"#ff00aa",
	"$",
];

fn pine_like_strategy() -> impl Strategy<Value = String>
{
	prop::collection::vec(prop::sample::select(FRAGMENTS), 0..60)
		.prop_map(|fragments| fragments.concat())
}

fn any_text_strategy() -> impl Strategy<Value = String>
{
	"\\PC{0,200}"
}

fn check_lex_ends_with_empty_eof(source: &str) -> Result<(), TestCaseError>
{
	let tokens = lexer::lex(source, "prop.pine");
	let last = tokens.last();
	prop_assert!(last.is_some());
	if let Some(token) = last
	{
		prop_assert_eq!(&token.result, &Ok(Token::EndOfFile));
		prop_assert_eq!(token.location.length(), 0);
	}
	for token in &tokens
	{
		prop_assert!(token.location.span.end <= source.len());
		prop_assert!(token.location.line_number >= 1);
	}
	Ok(())
}

fn check_parse_respects_budget(
	source: &str,
	max_recovery_attempts: usize,
) -> Result<(), TestCaseError>
{
	let options = ParserOptions {
		max_recovery_attempts,
	};
	let parsed = parser::parse_with_options(source, "prop.pine", &options);
	let attempts = parsed.metrics.recovery_attempts;
	prop_assert!(attempts <= max_recovery_attempts + 1);
	prop_assert_eq!(parsed.is_halted(), attempts > max_recovery_attempts);
	let timeouts = parsed
		.errors
		.iter()
		.filter(|x| x.code == ParseErrorCode::ParseTimeout)
		.count();
	prop_assert!(timeouts <= 1);
	Ok(())
}

fn check_analysis_is_deterministic(source: &str) -> Result<(), TestCaseError>
{
	let rules = included::default_rules()
		.map_err(|e| TestCaseError::fail(e.to_string()))?;
	let documentation = included::default_documentation()
		.map_err(|e| TestCaseError::fail(e.to_string()))?;
	let config = Config::new("prop.pine")
		.with_rules(&rules)
		.with_documentation(&documentation);
	let first = analyze(source, &config);
	let second = analyze(source, &config);
	prop_assert_eq!(&first.violations, &second.violations);
	prop_assert_eq!(&first.errors, &second.errors);
	prop_assert_eq!(first.success, second.success);
	prop_assert_eq!(first.metrics.checks_failed, 0);

	let line_count = source.split('\n').count();
	for violation in &first.violations
	{
		let location = &violation.location;
		prop_assert!(location.span.start <= location.span.end);
		prop_assert!(location.span.end <= source.len());
		prop_assert!(location.line_number >= 1);
		prop_assert!(location.line_number <= line_count);
	}
	Ok(())
}

proptest! {
	#[test]
	fn lex_any_text(source in any_text_strategy())
	{
		check_lex_ends_with_empty_eof(&source)?;
	}

	#[test]
	fn lex_pine_like_text(source in pine_like_strategy())
	{
		check_lex_ends_with_empty_eof(&source)?;
	}

	#[test]
	fn parse_any_text(source in any_text_strategy(), budget in 0usize..12)
	{
		check_parse_respects_budget(&source, budget)?;
	}

	#[test]
	fn parse_pine_like_text(source in pine_like_strategy(), budget in 0usize..12)
	{
		check_parse_respects_budget(&source, budget)?;
	}

	#[test]
	fn analyze_pine_like_text(source in pine_like_strategy())
	{
		check_analysis_is_deterministic(&source)?;
	}
}
