//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

use crate::analyzer::{Checker, CheckerKind, Context};
use crate::builtin::{self, Signature};
use crate::common::*;
use crate::error::{Rule, Violation};
use crate::registry::Documentation;
use crate::value_type::ValueType;

pub struct SignatureChecker;

impl Checker for SignatureChecker
{
	fn kind(&self) -> CheckerKind
	{
		CheckerKind::Signatures
	}

	fn run(&self, context: &Context) -> Result<Vec<Violation>, anyhow::Error>
	{
		let mut calls = Vec::new();
		for call in context.program.function_calls()
		{
			call.walk(&mut |x| calls.push(x));
		}
		Ok(check_signatures(&calls, context.documentation))
	}
}

/// Checks argument counts and argument types of calls to functions with a
/// known signature. Calls to unknown functions are not flagged.
pub fn check_signatures(
	calls: &[&FunctionCall],
	documentation: Option<&dyn Documentation>,
) -> Vec<Violation>
{
	let mut violations = Vec::new();
	for call in calls
	{
		let signature = match lookup(&call.name, documentation)
		{
			Some(signature) => signature,
			None => continue,
		};
		check_call(call, &signature, &mut violations);
	}
	violations
}

fn lookup(
	function_name: &str,
	documentation: Option<&dyn Documentation>,
) -> Option<Signature>
{
	builtin::signature(function_name).or_else(|| {
		documentation.and_then(|documentation| {
			documentation.signature(function_name)
		})
	})
}

fn check_call(
	call: &FunctionCall,
	signature: &Signature,
	violations: &mut Vec<Violation>,
)
{
	let count = call.parameters.len();
	let required = signature.required_count();
	let total = signature.total_count();
	if count < required
	{
		let missing: Vec<&str> = signature
			.parameters
			.iter()
			.enumerate()
			.filter(|(i, descriptor)| {
				descriptor.is_required
					&& *i >= count && call.named_parameter(&descriptor.name).is_none()
			})
			.map(|(_, descriptor)| descriptor.name.as_str())
			.collect();
		let violation = Violation::new(
			Rule::MissingRequiredParameters,
			call.location.clone(),
			format!(
				"'{}' requires at least {} arguments, but {} were given",
				call.name, required, count
			),
		)
		.with_metadata("function", call.name.as_str())
		.with_metadata("expected", required)
		.with_metadata("actual", count)
		.with_metadata("missing", missing.clone());
		let violation = match missing.is_empty()
		{
			true => violation,
			false => violation.with_suggested_fix(format!(
				"Add the missing arguments: {}",
				missing.join(", ")
			)),
		};
		violations.push(violation);
	}
	else if count > total
	{
		violations.push(
			Violation::new(
				Rule::TooManyParameters,
				call.location.clone(),
				format!(
					"'{}' accepts at most {} arguments, but {} were given",
					call.name, total, count
				),
			)
			.with_metadata("function", call.name.as_str())
			.with_metadata("expected", total)
			.with_metadata("actual", count),
		);
	}
	else
	{
		for parameter in &call.parameters
		{
			if let Some(violation) = check_argument(call, signature, parameter)
			{
				violations.push(violation);
			}
		}
	}
}

fn check_argument(
	call: &FunctionCall,
	signature: &Signature,
	parameter: &Parameter,
) -> Option<Violation>
{
	if parameter.is_expression
	{
		return None;
	}
	let descriptor = match &parameter.name
	{
		Some(name) => signature.parameter(&name.name)?,
		None => signature.parameters.get(parameter.position)?,
	};
	let expected = descriptor.value_type;
	let actual = ValueType::of(&parameter.value);
	if expected.accepts(actual)
	{
		return None;
	}
	let violation = Violation::new(
		Rule::TypeMismatch,
		parameter.location.clone(),
		format!(
			"Argument '{}' of '{}' should be {}, found {}",
			descriptor.name, call.name, expected, actual
		),
	)
	.with_metadata("function", call.name.as_str())
	.with_metadata("parameter", descriptor.name.as_str())
	.with_metadata("index", parameter.position)
	.with_metadata("expected", expected.to_string())
	.with_metadata("actual", actual.to_string());
	Some(violation)
}
