//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

//! The analyzer runs the checkers over a parsed script and merges their
//! violations into one result.
//!
//! Signatures, object state and naming are always checked. The remaining
//! checkers only run when the rule registry defines one of their codes.

mod naming;
mod object_state;
mod ranges;
mod signatures;
mod syntax;

pub use crate::parser::ParserOptions;
pub use naming::check_naming;
pub use object_state::detect_unsafe_access;
pub use signatures::check_signatures;

use crate::common::*;
use crate::error::{ParseError, Rule, Severity, Violation};
use crate::parser::{self, elapsed_ms, Parsed};
use crate::registry::{Documentation, RuleDefinition, RuleRegistry};
use crate::text::SourceMap;

use std::panic::AssertUnwindSafe;
use std::time::Instant;

use enumset::{EnumSet, EnumSetType};
use log::{debug, warn};
use serde::Serialize;

#[derive(Debug, Hash, Serialize, EnumSetType)]
#[serde(rename_all = "kebab-case")]
pub enum CheckerKind
{
	Signatures,
	ObjectState,
	Naming,
	ShortTitle,
	Precision,
	MaxBarsBack,
	DrawingLimits,
	NamespaceShadowing,
	LineContinuation,
	SyntaxCompatibility,
}

serde_plain::derive_display_from_serialize!(CheckerKind);

impl CheckerKind
{
	/// Every checker, in the order in which the aggregator runs them.
	pub const ALL: [CheckerKind; 10] = [
		CheckerKind::Signatures,
		CheckerKind::ObjectState,
		CheckerKind::Naming,
		CheckerKind::ShortTitle,
		CheckerKind::Precision,
		CheckerKind::MaxBarsBack,
		CheckerKind::DrawingLimits,
		CheckerKind::NamespaceShadowing,
		CheckerKind::LineContinuation,
		CheckerKind::SyntaxCompatibility,
	];

	pub fn code_prefix(&self) -> &'static str
	{
		match self
		{
			CheckerKind::Signatures => "SIGNATURE",
			CheckerKind::ObjectState => "NA_OBJECT",
			CheckerKind::Naming => "NAMING",
			CheckerKind::ShortTitle => "SHORT_TITLE",
			CheckerKind::Precision => "PRECISION",
			CheckerKind::MaxBarsBack => "MAX_BARS_BACK",
			CheckerKind::DrawingLimits => "DRAWING_LIMITS",
			CheckerKind::NamespaceShadowing => "NAMESPACE_SHADOWING",
			CheckerKind::LineContinuation => "LINE_CONTINUATION",
			CheckerKind::SyntaxCompatibility => "SYNTAX_COMPATIBILITY",
		}
	}

	pub fn is_always_on(&self) -> bool
	{
		match self
		{
			CheckerKind::Signatures => true,
			CheckerKind::ObjectState => true,
			CheckerKind::Naming => true,
			_ => false,
		}
	}

	/// The codes an optional checker can emit. It runs when the rule
	/// registry defines at least one of them, and only emits those that
	/// are defined.
	pub fn required_codes(&self) -> &'static [&'static str]
	{
		match self
		{
			CheckerKind::Signatures => &[],
			CheckerKind::ObjectState => &[],
			CheckerKind::Naming => &[],
			CheckerKind::ShortTitle => &["SHORT_TITLE_TOO_LONG"],
			CheckerKind::Precision => &["INVALID_PRECISION"],
			CheckerKind::MaxBarsBack => &["INVALID_MAX_BARS_BACK"],
			CheckerKind::DrawingLimits => &[
				"INVALID_MAX_LINES_COUNT",
				"INVALID_MAX_LABELS_COUNT",
				"INVALID_MAX_BOXES_COUNT",
			],
			CheckerKind::NamespaceShadowing => &["NAMESPACE_SHADOWING"],
			CheckerKind::LineContinuation => &["INVALID_LINE_CONTINUATION"],
			CheckerKind::SyntaxCompatibility => &[
				"DEPRECATED_FUNCTION",
				"OUTDATED_VERSION",
				"MISSING_VERSION_DIRECTIVE",
				"MISSING_NAMESPACE",
			],
		}
	}

	fn needs_program(&self) -> bool
	{
		match self
		{
			CheckerKind::Signatures => true,
			_ => false,
		}
	}

	fn checker(&self) -> Box<dyn Checker>
	{
		match self
		{
			CheckerKind::Signatures => Box::new(signatures::SignatureChecker),
			CheckerKind::ObjectState => Box::new(object_state::ObjectStateChecker),
			CheckerKind::Naming => Box::new(naming::NamingChecker),
			CheckerKind::ShortTitle => Box::new(ranges::ShortTitleChecker),
			CheckerKind::Precision
			| CheckerKind::MaxBarsBack
			| CheckerKind::DrawingLimits => Box::new(ranges::RangeChecker {
				kind: *self,
			}),
			CheckerKind::NamespaceShadowing =>
			{
				Box::new(syntax::NamespaceShadowingChecker)
			}
			CheckerKind::LineContinuation =>
			{
				Box::new(syntax::LineContinuationChecker)
			}
			CheckerKind::SyntaxCompatibility =>
			{
				Box::new(syntax::CompatibilityChecker)
			}
		}
	}
}

/// One independent concern. Checkers share no state; each reads the
/// context and returns its own violations.
pub trait Checker
{
	fn kind(&self) -> CheckerKind;

	fn run(&self, context: &Context) -> Result<Vec<Violation>, anyhow::Error>;
}

/// Everything that influences an analysis besides the source itself.
#[derive(Clone, Copy)]
pub struct Config<'a>
{
	pub rules: Option<&'a RuleRegistry>,
	pub documentation: Option<&'a dyn Documentation>,
	pub parser: ParserOptions,
	pub source_filename: &'a str,
}

impl<'a> Default for Config<'a>
{
	fn default() -> Config<'a>
	{
		Config {
			rules: None,
			documentation: None,
			parser: ParserOptions::default(),
			source_filename: "<source>",
		}
	}
}

impl<'a> Config<'a>
{
	pub fn new(source_filename: &'a str) -> Config<'a>
	{
		Config {
			source_filename,
			..Default::default()
		}
	}

	pub fn with_rules(self, rules: &'a RuleRegistry) -> Config<'a>
	{
		Config {
			rules: Some(rules),
			..self
		}
	}

	pub fn with_documentation(
		self,
		documentation: &'a dyn Documentation,
	) -> Config<'a>
	{
		Config {
			documentation: Some(documentation),
			..self
		}
	}

	/// The checkers that run during a full analysis.
	pub fn enabled_checkers(&self) -> EnumSet<CheckerKind>
	{
		CheckerKind::ALL
			.iter()
			.copied()
			.filter(|kind| {
				kind.is_always_on()
					|| kind
						.required_codes()
						.iter()
						.any(|code| self.defines(code))
			})
			.collect()
	}

	fn defines(&self, code: &str) -> bool
	{
		match self.rules
		{
			Some(rules) => rules.defines(code),
			None => false,
		}
	}
}

/// The read-only input shared by all checkers of one analysis.
pub struct Context<'a>
{
	pub source: &'a str,
	/// The source with comments and string contents blanked out.
	pub masked: String,
	pub source_map: SourceMap<'a>,
	pub program: Program,
	pub rules: Option<&'a RuleRegistry>,
	pub documentation: Option<&'a dyn Documentation>,
}

impl<'a> Context<'a>
{
	pub fn new(
		source: &'a str,
		program: Program,
		config: &Config<'a>,
	) -> Context<'a>
	{
		Context {
			source,
			masked: crate::text::mask(source),
			source_map: SourceMap::new(source, config.source_filename),
			program,
			rules: config.rules,
			documentation: config.documentation,
		}
	}

	pub fn location(&self, offset: usize, length: usize) -> Location
	{
		self.source_map.location(offset, length)
	}

	pub fn rule_definition(&self, code: &str) -> Option<&'a RuleDefinition>
	{
		self.rules.and_then(|rules| rules.definition(code))
	}
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics
{
	pub total_time_ms: f64,
	pub parse_time_ms: f64,
	pub functions_found: usize,
	pub errors_found: usize,
	pub checks_performed: usize,
	pub checks_failed: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis
{
	/// False only when parsing was abandoned. Checker failures appear as
	/// `*_VALIDATION_ERROR` violations and in `metrics.checksFailed`.
	pub success: bool,
	pub violations: Vec<Violation>,
	pub function_calls: Vec<FunctionCall>,
	pub metrics: Metrics,
	pub errors: Vec<ParseError>,
	pub warnings: Vec<ParseError>,
}

impl Analysis
{
	pub fn has_errors(&self) -> bool
	{
		self.violations.iter().any(|x| x.severity.is_error())
			|| self.errors.iter().any(|x| x.severity.is_error())
	}

	pub fn has_warnings(&self) -> bool
	{
		self.violations.iter().any(|x| x.severity == Severity::Warning)
			|| !self.warnings.is_empty()
	}
}

pub fn analyze(source: &str, config: &Config) -> Analysis
{
	let start = Instant::now();
	let Parsed {
		program,
		errors,
		warnings,
		metrics: parse_metrics,
	} = parser::parse_with_options(source, config.source_filename, &config.parser);
	let parse_time_ms = elapsed_ms(start);
	let context = Context::new(source, program, config);

	let mut violations = Vec::new();
	let mut checks_performed = 0;
	let mut checks_failed = 0;
	for kind in config.enabled_checkers()
	{
		checks_performed += 1;
		match run_checker(kind.checker().as_ref(), &context)
		{
			Ok(found) => violations.extend(
				found
					.into_iter()
					.filter(|violation| is_emitted(kind, violation, config)),
			),
			Err(failure) =>
			{
				checks_failed += 1;
				violations.push(failure);
			}
		}
	}

	let function_calls: Vec<FunctionCall> = context
		.program
		.function_calls()
		.into_iter()
		.cloned()
		.collect();
	let errors_found = violations
		.iter()
		.filter(|violation| violation.severity.is_error())
		.count() + errors.len();
	let success = !errors
		.iter()
		.any(|error| error.severity == Severity::Critical);
	let metrics = Metrics {
		total_time_ms: elapsed_ms(start),
		parse_time_ms,
		functions_found: function_calls.len(),
		errors_found,
		checks_performed,
		checks_failed,
	};
	debug!(
		"analyzed {} in {:.3}ms ({} tokens): {} violations",
		config.source_filename,
		metrics.total_time_ms,
		parse_metrics.token_count,
		violations.len()
	);
	Analysis {
		success,
		violations,
		function_calls,
		metrics,
		errors,
		warnings,
	}
}

/// Optional checkers only emit the codes that the registry defines.
fn is_emitted(kind: CheckerKind, violation: &Violation, config: &Config) -> bool
{
	if kind.is_always_on()
	{
		return true;
	}
	match violation.rule
	{
		Rule::ValidationFailure(_) => true,
		rule => config.defines(&rule.code()),
	}
}

/// Runs one checker, turning an error or a panic into a single
/// integration violation.
fn run_checker(
	checker: &dyn Checker,
	context: &Context,
) -> Result<Vec<Violation>, Violation>
{
	let kind = checker.kind();
	let start = Instant::now();
	let outcome =
		std::panic::catch_unwind(AssertUnwindSafe(|| checker.run(context)));
	let reason = match outcome
	{
		Ok(Ok(violations)) =>
		{
			debug!(
				"{} found {} violations in {:.3}ms",
				kind,
				violations.len(),
				elapsed_ms(start)
			);
			return Ok(violations);
		}
		Ok(Err(error)) => format!("{:#}", error),
		Err(panic) => match panic.downcast_ref::<&str>()
		{
			Some(message) => message.to_string(),
			None => match panic.downcast_ref::<String>()
			{
				Some(message) => message.clone(),
				None => "unknown panic".to_string(),
			},
		},
	};
	warn!("{} checker failed: {}", kind, reason);
	let violation = Violation::new(
		Rule::ValidationFailure(kind),
		context.location(0, 0),
		format!("The {} check could not be completed: {}", kind, reason),
	)
	.with_metadata("checker", kind.to_string())
	.with_metadata("reason", reason);
	Err(violation)
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickMetrics
{
	pub total_time_ms: f64,
	pub checks_performed: usize,
	pub checks_failed: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickResult
{
	pub violations: Vec<Violation>,
	pub metrics: QuickMetrics,
}

/// Runs a single checker regardless of the rule registry. The source is
/// only parsed if the checker needs the syntax tree.
pub fn run_single(kind: CheckerKind, source: &str, config: &Config) -> QuickResult
{
	let start = Instant::now();
	let program = if kind.needs_program()
	{
		parser::parse_with_options(source, config.source_filename, &config.parser)
			.program
	}
	else
	{
		Program::default()
	};
	let context = Context::new(source, program, config);
	let (violations, checks_failed) = match run_checker(kind.checker().as_ref(), &context)
	{
		Ok(violations) => (violations, 0),
		Err(failure) => (vec![failure], 1),
	};
	QuickResult {
		violations,
		metrics: QuickMetrics {
			total_time_ms: elapsed_ms(start),
			checks_performed: 1,
			checks_failed,
		},
	}
}

pub fn validate_short_title(source: &str) -> QuickResult
{
	run_single(CheckerKind::ShortTitle, source, &Config::default())
}

pub fn validate_precision(source: &str) -> QuickResult
{
	run_single(CheckerKind::Precision, source, &Config::default())
}

pub fn validate_max_bars_back(source: &str) -> QuickResult
{
	run_single(CheckerKind::MaxBarsBack, source, &Config::default())
}

pub fn validate_drawing_limits(source: &str) -> QuickResult
{
	run_single(CheckerKind::DrawingLimits, source, &Config::default())
}

pub fn validate_naming(source: &str) -> QuickResult
{
	run_single(CheckerKind::Naming, source, &Config::default())
}

pub fn validate_na_objects(source: &str) -> QuickResult
{
	run_single(CheckerKind::ObjectState, source, &Config::default())
}

pub fn validate_syntax_compatibility(source: &str) -> QuickResult
{
	run_single(CheckerKind::SyntaxCompatibility, source, &Config::default())
}
