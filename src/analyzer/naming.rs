//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

use crate::analyzer::{Checker, CheckerKind, Context};
use crate::builtin;
use crate::error::{Rule, Violation};
use crate::registry::Documentation;
use crate::text::{self, SourceMap};

pub struct NamingChecker;

impl Checker for NamingChecker
{
	fn kind(&self) -> CheckerKind
	{
		CheckerKind::Naming
	}

	fn run(&self, context: &Context) -> Result<Vec<Violation>, anyhow::Error>
	{
		Ok(check_masked(
			&context.masked,
			&context.source_map,
			context.documentation,
		))
	}
}

/// Checks the names of named arguments: migrated parameter names and
/// names that do not follow snake_case.
pub fn check_naming(
	source: &str,
	source_filename: &str,
	documentation: Option<&dyn Documentation>,
) -> Vec<Violation>
{
	let masked = text::mask(source);
	let source_map = SourceMap::new(source, source_filename);
	check_masked(&masked, &source_map, documentation)
}

fn check_masked(
	masked: &str,
	source_map: &SourceMap,
	documentation: Option<&dyn Documentation>,
) -> Vec<Violation>
{
	let mut violations = Vec::new();
	for site in text::call_sites(masked)
	{
		if site.is_definition
		{
			continue;
		}
		for argument in text::named_arguments(masked, site.arguments.clone())
		{
			let location =
				source_map.location(argument.name_offset, argument.name.len());
			if let Some(replacement) =
				builtin::deprecated_parameter(&site.name, &argument.name)
			{
				let violation = Violation::new(
					Rule::DeprecatedParameterName,
					location,
					format!(
						"Parameter '{}' of '{}' has been renamed to '{}'",
						argument.name, site.name, replacement
					),
				)
				.with_metadata("function", site.name.as_str())
				.with_metadata("parameter", argument.name.as_str())
				.with_metadata("replacement", replacement)
				.with_suggested_fix(format!(
					"Replace '{}' with '{}'",
					argument.name, replacement
				));
				violations.push(violation);
				continue;
			}
			if is_known_parameter(&site.name, &argument.name, documentation)
			{
				continue;
			}
			let convention = match classify(&argument.name)
			{
				Some(convention) => convention,
				None => continue,
			};
			let suggestion = match convention
			{
				Convention::AllCaps => argument.name.to_lowercase(),
				_ => to_snake_case(&argument.name),
			};
			let violation = Violation::new(
				Rule::InvalidParameterNamingConvention,
				location,
				format!(
					"Parameter '{}' is {}, but parameter names are snake_case",
					argument.name,
					convention.description()
				),
			)
			.with_metadata("function", site.name.as_str())
			.with_metadata("parameter", argument.name.as_str())
			.with_metadata("convention", convention.description());
			let violation = if suggestion != argument.name
			{
				violation
					.with_metadata("suggestion", suggestion.as_str())
					.with_suggested_fix(format!(
						"Rename '{}' to '{}'",
						argument.name, suggestion
					))
			}
			else
			{
				violation
			};
			violations.push(violation);
		}
	}
	violations
}

fn is_known_parameter(
	function_name: &str,
	parameter_name: &str,
	documentation: Option<&dyn Documentation>,
) -> bool
{
	if builtin::is_common_parameter_name(parameter_name)
		|| builtin::is_function_parameter(function_name, parameter_name)
	{
		return true;
	}
	match documentation
	{
		Some(documentation) if documentation.is_loaded() =>
		{
			documentation.is_valid_parameter(function_name, parameter_name)
		}
		_ => false,
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Convention
{
	SingleCharacter,
	CamelCase,
	PascalCase,
	AllCaps,
}

impl Convention
{
	fn description(&self) -> &'static str
	{
		match self
		{
			Convention::SingleCharacter => "a single character",
			Convention::CamelCase => "camelCase",
			Convention::PascalCase => "PascalCase",
			Convention::AllCaps => "ALL_CAPS",
		}
	}
}

fn classify(name: &str) -> Option<Convention>
{
	let first = name.chars().next()?;
	let has_upper = name.chars().any(|x| x.is_ascii_uppercase());
	let has_lower = name.chars().any(|x| x.is_ascii_lowercase());
	if name.chars().count() == 1
	{
		Some(Convention::SingleCharacter)
	}
	else if has_upper && !has_lower
	{
		Some(Convention::AllCaps)
	}
	else if first.is_ascii_lowercase() && has_upper
	{
		Some(Convention::CamelCase)
	}
	else if first.is_ascii_uppercase()
	{
		Some(Convention::PascalCase)
	}
	else
	{
		None
	}
}

fn to_snake_case(name: &str) -> String
{
	let mut snake = String::with_capacity(name.len() + 4);
	for (i, x) in name.chars().enumerate()
	{
		if x.is_ascii_uppercase()
		{
			if i > 0 && !snake.ends_with('_')
			{
				snake.push('_');
			}
			snake.push(x.to_ascii_lowercase());
		}
		else
		{
			snake.push(x);
		}
	}
	snake
}
