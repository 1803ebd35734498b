//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

//! Checks on the arguments of the script declaration, `indicator(...)` or
//! `strategy(...)`: the short title length and numeric bounds.

use crate::analyzer::{Checker, CheckerKind, Context};
use crate::error::{Rule, Violation};
use crate::text::{self, CallSite};

pub const DEFAULT_SHORT_TITLE_MAX_LENGTH: usize = 10;

struct Bounds
{
	parameter: &'static str,
	rule: Rule,
	min: f64,
	max: f64,
}

static PRECISION: [Bounds; 1] = [Bounds {
	parameter: "precision",
	rule: Rule::InvalidPrecision,
	min: 0.0,
	max: 8.0,
}];

static MAX_BARS_BACK: [Bounds; 1] = [Bounds {
	parameter: "max_bars_back",
	rule: Rule::InvalidMaxBarsBack,
	min: 1.0,
	max: 5000.0,
}];

static DRAWING_LIMITS: [Bounds; 3] = [
	Bounds {
		parameter: "max_lines_count",
		rule: Rule::InvalidMaxLinesCount,
		min: 1.0,
		max: 500.0,
	},
	Bounds {
		parameter: "max_labels_count",
		rule: Rule::InvalidMaxLabelsCount,
		min: 1.0,
		max: 500.0,
	},
	Bounds {
		parameter: "max_boxes_count",
		rule: Rule::InvalidMaxBoxesCount,
		min: 1.0,
		max: 500.0,
	},
];

fn is_declaration(site: &CallSite) -> bool
{
	match site.name.as_str()
	{
		"indicator" | "strategy" | "study" => !site.is_definition,
		_ => false,
	}
}

pub struct RangeChecker
{
	pub kind: CheckerKind,
}

impl RangeChecker
{
	fn bounds(&self) -> Result<&'static [Bounds], anyhow::Error>
	{
		match self.kind
		{
			CheckerKind::Precision => Ok(&PRECISION),
			CheckerKind::MaxBarsBack => Ok(&MAX_BARS_BACK),
			CheckerKind::DrawingLimits => Ok(&DRAWING_LIMITS),
			kind => Err(anyhow::anyhow!("{} is not a range check", kind)),
		}
	}
}

impl Checker for RangeChecker
{
	fn kind(&self) -> CheckerKind
	{
		self.kind
	}

	fn run(&self, context: &Context) -> Result<Vec<Violation>, anyhow::Error>
	{
		let bounds = self.bounds()?;
		let mut violations = Vec::new();
		for site in text::call_sites(&context.masked)
		{
			if !is_declaration(&site)
			{
				continue;
			}
			for argument in
				text::named_arguments(&context.masked, site.arguments.clone())
			{
				let bound = match bounds
					.iter()
					.find(|bound| bound.parameter == argument.name)
				{
					Some(bound) => bound,
					None => continue,
				};
				let raw = &context.masked[argument.value.clone()];
				let value: f64 = match raw.parse::<f64>()
				{
					Ok(value) if value.is_finite() => value,
					Ok(_) => continue,
					Err(_) => continue,
				};
				let code = bound.rule.code();
				let definition = context.rule_definition(&code);
				let min = definition.and_then(|x| x.min).unwrap_or(bound.min);
				let max = definition.and_then(|x| x.max).unwrap_or(bound.max);
				let is_non_integer = value.fract() != 0.0;
				let is_out_of_range = value < min || value > max;
				if !is_non_integer && !is_out_of_range
				{
					continue;
				}
				let (kind, message) = if is_non_integer
				{
					(
						"non_integer",
						format!(
							"'{}' must be a whole number, found {}",
							bound.parameter, raw
						),
					)
				}
				else
				{
					(
						"out_of_range",
						format!(
							"'{}' must be between {} and {}, found {}",
							bound.parameter, min, max, raw
						),
					)
				};
				let location = context.location(
					argument.name_offset,
					argument.value.end - argument.name_offset,
				);
				let violation = Violation::new(bound.rule, location, message)
					.with_metadata("parameter", bound.parameter)
					.with_metadata("violation", kind)
					.with_metadata("actual", number(value))
					.with_metadata("min", number(min))
					.with_metadata("max", number(max))
					.with_metadata("isOutOfRange", is_out_of_range)
					.with_metadata("isNonInteger", is_non_integer)
					.with_suggested_fix(format!(
						"Use a whole number from {} to {}",
						min, max
					));
				violations.push(violation);
			}
		}
		Ok(violations)
	}
}

/// Whole numbers are reported without a fractional part.
fn number(value: f64) -> serde_json::Value
{
	if value.fract() == 0.0 && value.abs() < 1e15
	{
		serde_json::Value::from(value as i64)
	}
	else
	{
		serde_json::Value::from(value)
	}
}

pub struct ShortTitleChecker;

impl Checker for ShortTitleChecker
{
	fn kind(&self) -> CheckerKind
	{
		CheckerKind::ShortTitle
	}

	fn run(&self, context: &Context) -> Result<Vec<Violation>, anyhow::Error>
	{
		let code = Rule::ShortTitleTooLong.code();
		let max_length = context
			.rule_definition(&code)
			.and_then(|x| x.max_length)
			.unwrap_or(DEFAULT_SHORT_TITLE_MAX_LENGTH);
		let mut violations = Vec::new();
		for site in text::call_sites(&context.masked)
		{
			if !is_declaration(&site)
			{
				continue;
			}
			let range = match short_title_argument(&context.masked, &site)
			{
				Some(range) => range,
				None => continue,
			};
			let short_title = match context
				.source
				.get(range.clone())
				.and_then(text::unquote)
			{
				Some(short_title) => short_title,
				None => continue,
			};
			let actual_length = short_title.chars().count();
			if actual_length <= max_length
			{
				continue;
			}
			let violation = Violation::new(
				Rule::ShortTitleTooLong,
				context.location(range.start, range.end - range.start),
				format!(
					"Short title \"{}\" is {} characters long, the maximum is {}",
					short_title, actual_length, max_length
				),
			)
			.with_metadata("shorttitle", short_title)
			.with_metadata("actualLength", actual_length)
			.with_metadata("maxLength", max_length)
			.with_suggested_fix(format!(
				"Shorten the short title to at most {} characters",
				max_length
			));
			violations.push(violation);
		}
		Ok(violations)
	}
}

/// The `shorttitle` argument, given by name or as the second positional
/// argument.
fn short_title_argument(
	masked: &str,
	site: &CallSite,
) -> Option<std::ops::Range<usize>>
{
	let named = text::named_arguments(masked, site.arguments.clone());
	if let Some(argument) = named.iter().find(|x| x.name == "shorttitle")
	{
		return Some(argument.value.clone());
	}
	let parts = text::split_arguments(masked, site.arguments.clone());
	let is_positional = |part: &std::ops::Range<usize>| {
		!named.iter().any(|x| x.name_offset == part.start)
	};
	match parts.as_slice()
	{
		[first, second, ..] if is_positional(first) && is_positional(second) =>
		{
			Some(second.clone())
		}
		_ => None,
	}
}

#[cfg(test)]
mod tests
{
	use crate::analyzer::{run_single, CheckerKind, Config};
	use crate::error::Violation;
	use crate::registry::RuleRegistry;

	use pretty_assertions::assert_eq;

	fn codes(violations: &[Violation]) -> Vec<String>
	{
		violations.iter().map(|x| x.code()).collect()
	}

	fn check(kind: CheckerKind, source: &str) -> Vec<Violation>
	{
		run_single(kind, source, &Config::default()).violations
	}

	#[test]
	fn precision_out_of_range()
	{
		let violations = check(
			CheckerKind::Precision,
			"indicator(\"Test\", precision=9)\n",
		);
		assert_eq!(codes(&violations), vec!["INVALID_PRECISION"]);
		assert_eq!(violations[0].metadata["isOutOfRange"], true);
		assert_eq!(violations[0].metadata["isNonInteger"], false);
		assert_eq!(violations[0].metadata["actual"], 9);
		assert_eq!(violations[0].metadata["max"], 8);
	}

	#[test]
	fn precision_in_range()
	{
		let violations = check(
			CheckerKind::Precision,
			"indicator(\"Test\", precision = 4)\n",
		);
		assert_eq!(violations, vec![]);
	}

	#[test]
	fn non_integer_precision()
	{
		let violations = check(
			CheckerKind::Precision,
			"indicator(\"Test\", precision=2.5)\n",
		);
		assert_eq!(violations[0].metadata["violation"], "non_integer");
		assert_eq!(violations[0].metadata["isNonInteger"], true);
	}

	#[test]
	fn commented_declarations_are_ignored()
	{
		let violations = check(
			CheckerKind::MaxBarsBack,
			"// indicator(\"Test\", max_bars_back=0)\nindicator(\"Test\")\n",
		);
		assert_eq!(violations, vec![]);
	}

	#[test]
	fn drawing_limits()
	{
		let source = "strategy(\"S\", max_lines_count=600, max_labels_count=0, \
		              max_boxes_count=50)\n";
		let violations = check(CheckerKind::DrawingLimits, source);
		assert_eq!(
			codes(&violations),
			vec!["INVALID_MAX_LINES_COUNT", "INVALID_MAX_LABELS_COUNT"]
		);
	}

	#[test]
	fn registry_overrides_bounds()
	{
		let json = r#"{ "errorCodeDefinitions": {
			"INVALID_PRECISION": { "max": 10 }
		} }"#;
		let registry = RuleRegistry::load_from_str(json).unwrap();
		let config = Config::default().with_rules(&registry);
		let source = "indicator(\"Test\", precision=9)\n";
		let result = run_single(CheckerKind::Precision, source, &config);
		assert_eq!(result.violations, vec![]);
	}

	#[test]
	fn positional_short_title_too_long()
	{
		let violations = check(
			CheckerKind::ShortTitle,
			"indicator(\"Test\", \"TwelveCharsX\", overlay=true)\n",
		);
		assert_eq!(codes(&violations), vec!["SHORT_TITLE_TOO_LONG"]);
		assert_eq!(violations[0].metadata["actualLength"], 12);
		assert_eq!(violations[0].metadata["maxLength"], 10);
	}

	#[test]
	fn named_short_title()
	{
		let violations = check(
			CheckerKind::ShortTitle,
			"indicator(title=\"Test\", shorttitle=\"Short\")\n",
		);
		assert_eq!(violations, vec![]);
		let violations = check(
			CheckerKind::ShortTitle,
			"indicator(title=\"Test\", overlay=true, shorttitle=\"Much Too Long\")\n",
		);
		assert_eq!(violations[0].metadata["actualLength"], 13);
	}

	#[test]
	fn short_title_length_from_registry()
	{
		let json = r#"{ "errorCodeDefinitions": {
			"SHORT_TITLE_TOO_LONG": { "maxLength": 12 }
		} }"#;
		let registry = RuleRegistry::load_from_str(json).unwrap();
		let config = Config::default().with_rules(&registry);
		let source = "indicator(\"Test\", \"TwelveCharsX\")\n";
		let result = run_single(CheckerKind::ShortTitle, source, &config);
		assert_eq!(result.violations, vec![]);
	}
}
