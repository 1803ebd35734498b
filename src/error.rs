//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

//! Diagnostics produced by the parser and the checkers. They are plain
//! values, collected into vectors and never raised.

pub use crate::lexer::Location;

use crate::analyzer::CheckerKind;

use std::collections::BTreeMap;

use ariadne::{Fmt, Report, ReportKind};
use serde::Serialize;

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity
{
	Info,
	Warning,
	Error,
	Critical,
}

serde_plain::derive_display_from_serialize!(Severity);

impl Severity
{
	/// The three-level severity used in serialized violation records.
	pub fn wire_name(&self) -> &'static str
	{
		match self
		{
			Severity::Info => "suggestion",
			Severity::Warning => "warning",
			Severity::Error => "error",
			Severity::Critical => "error",
		}
	}

	pub fn is_error(&self) -> bool
	{
		*self >= Severity::Error
	}

	fn report_kind(&self) -> ReportKind
	{
		match self
		{
			Severity::Info => ReportKind::Advice,
			Severity::Warning => ReportKind::Warning,
			Severity::Error => ReportKind::Error,
			Severity::Critical => ReportKind::Error,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass
{
	Lexical,
	Syntax,
	Semantic,
	Validation,
	Performance,
	Integration,
}

serde_plain::derive_display_from_serialize!(ErrorClass);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category
{
	Lexical,
	Syntax,
	TypeChecking,
	ParameterValidation,
	RuntimeSafety,
	NamingConvention,
	Deprecation,
	Compatibility,
	RangeValidation,
	Performance,
	Integration,
}

serde_plain::derive_display_from_serialize!(Category);

impl Category
{
	pub fn class(&self) -> ErrorClass
	{
		match self
		{
			Category::Lexical => ErrorClass::Lexical,
			Category::Syntax => ErrorClass::Syntax,
			Category::TypeChecking => ErrorClass::Semantic,
			Category::ParameterValidation => ErrorClass::Semantic,
			Category::RuntimeSafety => ErrorClass::Semantic,
			Category::NamingConvention => ErrorClass::Validation,
			Category::Deprecation => ErrorClass::Validation,
			Category::Compatibility => ErrorClass::Validation,
			Category::RangeValidation => ErrorClass::Validation,
			Category::Performance => ErrorClass::Performance,
			Category::Integration => ErrorClass::Integration,
		}
	}
}

/// Every kind of violation a checker can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule
{
	MissingRequiredParameters,
	TooManyParameters,
	TypeMismatch,
	NaObjectAccess,
	NaObjectHistoryAccess,
	DeprecatedParameterName,
	InvalidParameterNamingConvention,
	ShortTitleTooLong,
	InvalidPrecision,
	InvalidMaxBarsBack,
	InvalidMaxLinesCount,
	InvalidMaxLabelsCount,
	InvalidMaxBoxesCount,
	NamespaceShadowing,
	InvalidLineContinuation,
	DeprecatedFunction,
	OutdatedVersion,
	MissingVersionDirective,
	MissingNamespace,
	ValidationFailure(CheckerKind),
}

impl Rule
{
	pub fn code(&self) -> String
	{
		match self
		{
			Rule::ValidationFailure(kind) =>
			{
				format!("{}_VALIDATION_ERROR", kind.code_prefix())
			}
			_ => self.static_code().to_string(),
		}
	}

	fn static_code(&self) -> &'static str
	{
		match self
		{
			Rule::MissingRequiredParameters => "missing_required_parameters",
			Rule::TooManyParameters => "too_many_parameters",
			Rule::TypeMismatch => "type_mismatch",
			Rule::NaObjectAccess => "na_object_access",
			Rule::NaObjectHistoryAccess => "na_object_history_access",
			Rule::DeprecatedParameterName => "DEPRECATED_PARAMETER_NAME",
			Rule::InvalidParameterNamingConvention =>
			{
				"INVALID_PARAMETER_NAMING_CONVENTION"
			}
			Rule::ShortTitleTooLong => "SHORT_TITLE_TOO_LONG",
			Rule::InvalidPrecision => "INVALID_PRECISION",
			Rule::InvalidMaxBarsBack => "INVALID_MAX_BARS_BACK",
			Rule::InvalidMaxLinesCount => "INVALID_MAX_LINES_COUNT",
			Rule::InvalidMaxLabelsCount => "INVALID_MAX_LABELS_COUNT",
			Rule::InvalidMaxBoxesCount => "INVALID_MAX_BOXES_COUNT",
			Rule::NamespaceShadowing => "NAMESPACE_SHADOWING",
			Rule::InvalidLineContinuation => "INVALID_LINE_CONTINUATION",
			Rule::DeprecatedFunction => "DEPRECATED_FUNCTION",
			Rule::OutdatedVersion => "OUTDATED_VERSION",
			Rule::MissingVersionDirective => "MISSING_VERSION_DIRECTIVE",
			Rule::MissingNamespace => "MISSING_NAMESPACE",
			Rule::ValidationFailure(_) => "VALIDATION_ERROR",
		}
	}

	pub fn category(&self) -> Category
	{
		match self
		{
			Rule::MissingRequiredParameters => Category::ParameterValidation,
			Rule::TooManyParameters => Category::ParameterValidation,
			Rule::TypeMismatch => Category::TypeChecking,
			Rule::NaObjectAccess => Category::RuntimeSafety,
			Rule::NaObjectHistoryAccess => Category::RuntimeSafety,
			Rule::DeprecatedParameterName => Category::Deprecation,
			Rule::InvalidParameterNamingConvention =>
			{
				Category::NamingConvention
			}
			Rule::ShortTitleTooLong => Category::ParameterValidation,
			Rule::InvalidPrecision
			| Rule::InvalidMaxBarsBack
			| Rule::InvalidMaxLinesCount
			| Rule::InvalidMaxLabelsCount
			| Rule::InvalidMaxBoxesCount => Category::RangeValidation,
			Rule::NamespaceShadowing => Category::Syntax,
			Rule::InvalidLineContinuation => Category::Syntax,
			Rule::DeprecatedFunction
			| Rule::OutdatedVersion
			| Rule::MissingVersionDirective
			| Rule::MissingNamespace => Category::Compatibility,
			Rule::ValidationFailure(_) => Category::Integration,
		}
	}

	pub fn default_severity(&self) -> Severity
	{
		match self
		{
			Rule::NaObjectHistoryAccess => Severity::Warning,
			Rule::DeprecatedParameterName => Severity::Warning,
			Rule::InvalidParameterNamingConvention => Severity::Warning,
			Rule::InvalidLineContinuation => Severity::Warning,
			Rule::DeprecatedFunction => Severity::Warning,
			Rule::OutdatedVersion => Severity::Warning,
			Rule::MissingVersionDirective => Severity::Info,
			_ => Severity::Error,
		}
	}
}

impl std::fmt::Display for Rule
{
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result
	{
		write!(f, "{}", self.code())
	}
}

impl Serialize for Rule
{
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(&self.code())
	}
}

#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub struct Violation
{
	pub rule: Rule,
	pub message: String,
	pub location: Location,
	pub severity: Severity,
	pub category: Category,
	pub metadata: BTreeMap<String, serde_json::Value>,
	pub suggested_fix: Option<String>,
}

impl Violation
{
	pub fn new(rule: Rule, location: Location, message: String) -> Violation
	{
		Violation {
			rule,
			message,
			location,
			severity: rule.default_severity(),
			category: rule.category(),
			metadata: BTreeMap::new(),
			suggested_fix: None,
		}
	}

	pub fn with_metadata(
		mut self,
		key: &str,
		value: impl Into<serde_json::Value>,
	) -> Violation
	{
		self.metadata.insert(key.to_string(), value.into());
		self
	}

	pub fn with_suggested_fix(self, fix: impl Into<String>) -> Violation
	{
		Violation {
			suggested_fix: Some(fix.into()),
			..self
		}
	}

	pub fn code(&self) -> String
	{
		self.rule.code()
	}

	pub fn build_report(
		&self,
		config: ariadne::Config,
	) -> Report<(String, std::ops::Range<usize>)>
	{
		let mut colors = ariadne::ColorGenerator::new();
		let a = colors.next();
		let builder = Report::build(
			self.severity.report_kind(),
			self.location.source_filename.clone(),
			self.location.span.start,
		)
		.with_config(config)
		.with_code(self.rule.code())
		.with_message(&self.message)
		.with_label(
			self.location
				.label()
				.with_message(format!("{}", self.category.fg(a)))
				.with_color(a),
		)
		.with_note(format!("{} error", self.category.class()));
		match &self.suggested_fix
		{
			Some(fix) => builder.with_help(fix).finish(),
			None => builder.finish(),
		}
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireViolation<'a>
{
	rule: String,
	severity: &'static str,
	category: Category,
	message: &'a str,
	line: usize,
	column: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	metadata: Option<&'a BTreeMap<String, serde_json::Value>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	suggested_fix: Option<&'a str>,
}

impl Serialize for Violation
{
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		WireViolation {
			rule: self.rule.code(),
			severity: self.severity.wire_name(),
			category: self.category,
			message: &self.message,
			line: self.location.line_number,
			column: self.location.line_offset,
			metadata: Some(&self.metadata).filter(|x| !x.is_empty()),
			suggested_fix: self.suggested_fix.as_deref(),
		}
		.serialize(serializer)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParseErrorCode
{
	LexicalError,
	UnexpectedToken,
	UnexpectedEndOfFile,
	MissingClosingParen,
	MissingValue,
	TrailingComma,
	PositionalAfterNamed,
	ParseTimeout,
}

serde_plain::derive_display_from_serialize!(ParseErrorCode);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStrategy
{
	SkipToken,
	SkipToNewline,
	SkipToClosingParen,
	InsertMissingToken,
	ContinueParsing,
	Halt,
}

serde_plain::derive_display_from_serialize!(RecoveryStrategy);

#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseError
{
	pub code: ParseErrorCode,
	pub message: String,
	#[serde(skip)]
	pub location: Location,
	pub severity: Severity,
	pub category: Category,
	pub recovery: RecoveryStrategy,
	#[serde(rename = "line")]
	line_number: usize,
	#[serde(rename = "column")]
	line_offset: usize,
}

impl ParseError
{
	pub fn new(
		code: ParseErrorCode,
		severity: Severity,
		location: Location,
		message: String,
		recovery: RecoveryStrategy,
	) -> ParseError
	{
		let category = match code
		{
			ParseErrorCode::LexicalError => Category::Lexical,
			ParseErrorCode::ParseTimeout => Category::Performance,
			_ => Category::Syntax,
		};
		ParseError {
			code,
			message,
			line_number: location.line_number,
			line_offset: location.line_offset,
			location,
			severity,
			category,
			recovery,
		}
	}

	pub fn build_report(
		&self,
		config: ariadne::Config,
	) -> Report<(String, std::ops::Range<usize>)>
	{
		let mut colors = ariadne::ColorGenerator::new();
		let a = colors.next();
		Report::build(
			self.severity.report_kind(),
			self.location.source_filename.clone(),
			self.location.span.start,
		)
		.with_config(config)
		.with_code(self.code)
		.with_message(&self.message)
		.with_label(self.location.label().with_color(a))
		.with_note(format!(
			"{} error. Recovery: {}.",
			self.category.class(),
			self.recovery.fg(a)
		))
		.finish()
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	use pretty_assertions::assert_eq;

	fn location() -> Location
	{
		Location {
			source_filename: "test.pine".to_string(),
			span: 4..9,
			line_number: 2,
			line_offset: 3,
		}
	}

	#[test]
	fn serialize_violation_in_wire_shape()
	{
		let violation = Violation::new(
			Rule::ShortTitleTooLong,
			location(),
			"too long".to_string(),
		)
		.with_metadata("actualLength", 12);
		let json = serde_json::to_value(&violation).unwrap();
		assert_eq!(
			json,
			serde_json::json!({
				"rule": "SHORT_TITLE_TOO_LONG",
				"severity": "error",
				"category": "parameter_validation",
				"message": "too long",
				"line": 2,
				"column": 3,
				"metadata": {"actualLength": 12},
			})
		);
	}

	#[test]
	fn validation_failure_code_names_checker()
	{
		let rule = Rule::ValidationFailure(CheckerKind::Naming);
		assert_eq!(rule.code(), "NAMING_VALIDATION_ERROR");
		assert_eq!(rule.category(), Category::Integration);
	}

	#[test]
	fn categories_belong_to_one_class()
	{
		assert_eq!(Category::Lexical.class(), ErrorClass::Lexical);
		assert_eq!(Category::RuntimeSafety.class(), ErrorClass::Semantic);
		assert_eq!(Category::Deprecation.class(), ErrorClass::Validation);
		assert_eq!(Category::Performance.class(), ErrorClass::Performance);
		let rule = Rule::ValidationFailure(CheckerKind::Precision);
		assert_eq!(rule.category().class(), ErrorClass::Integration);
		assert_eq!(ErrorClass::Semantic.to_string(), "semantic");
	}

	#[test]
	fn report_names_the_error_class()
	{
		let violation = Violation::new(
			Rule::NaObjectAccess,
			location(),
			"field of na object".to_string(),
		)
		.with_suggested_fix("initialize it first");
		let config = ariadne::Config::default().with_color(false);
		let source = "a\nb  o.field\n".to_string();
		let mut buffer = Vec::new();
		violation
			.build_report(config)
			.write(ariadne::sources(vec![("test.pine".to_string(), source)]), &mut buffer)
			.unwrap();
		let rendered = String::from_utf8_lossy(&buffer);
		assert!(rendered.contains("na_object_access"));
		assert!(rendered.contains("semantic error"));
		assert!(rendered.contains("initialize it first"));
	}

	#[test]
	fn critical_is_reported_as_error()
	{
		assert_eq!(Severity::Critical.wire_name(), "error");
		assert_eq!(Severity::Info.wire_name(), "suggestion");
		assert!(Severity::Critical.is_error());
		assert!(!Severity::Warning.is_error());
		assert_eq!(Severity::Critical.to_string(), "critical");
	}

	#[test]
	fn serialize_parse_error_with_position()
	{
		let error = ParseError::new(
			ParseErrorCode::ParseTimeout,
			Severity::Critical,
			location(),
			"too many recovery attempts".to_string(),
			RecoveryStrategy::Halt,
		);
		let json = serde_json::to_value(&error).unwrap();
		assert_eq!(json["code"], "PARSE_TIMEOUT");
		assert_eq!(json["category"], "performance");
		assert_eq!(json["recovery"], "halt");
		assert_eq!(json["line"], 2);
	}
}
