//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

//! Type tags for arguments and parameters, and the compatibility lattice
//! used to decide whether an argument satisfies a parameter.

use crate::builtin;
use crate::common::*;

use serde::{Deserialize, Serialize};

#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType
{
	#[serde(rename = "int")]
	Int,
	#[serde(rename = "float")]
	Float,
	#[serde(rename = "bool")]
	Bool,
	#[serde(rename = "string")]
	String,
	#[serde(rename = "color")]
	Color,
	#[serde(rename = "series int")]
	SeriesInt,
	#[serde(rename = "series float")]
	SeriesFloat,
	#[serde(rename = "series bool")]
	SeriesBool,
	#[serde(rename = "series int/float")]
	SeriesIntOrFloat,
	#[serde(rename = "int/float")]
	IntOrFloat,
	#[serde(rename = "identifier")]
	Identifier,
}

serde_plain::derive_display_from_serialize!(ValueType);
serde_plain::derive_fromstr_from_deserialize!(ValueType);

impl ValueType
{
	/// Whether an argument of type `actual` may be passed where `self` is
	/// expected.
	pub fn accepts(self, actual: ValueType) -> bool
	{
		if self == actual
		{
			return true;
		}
		match (self, actual)
		{
			(ValueType::SeriesIntOrFloat, ValueType::Int) => true,
			(ValueType::SeriesIntOrFloat, ValueType::Float) => true,
			(ValueType::SeriesIntOrFloat, ValueType::SeriesInt) => true,
			(ValueType::SeriesIntOrFloat, ValueType::SeriesFloat) => true,
			(ValueType::SeriesInt, ValueType::Int) => true,
			(ValueType::IntOrFloat, ValueType::Int) => true,
			(ValueType::IntOrFloat, ValueType::Float) => true,
			(_, _) => false,
		}
	}

	pub fn of(value: &Value) -> ValueType
	{
		match value
		{
			Value::Literal(literal) => match literal.kind
			{
				LiteralKind::String => ValueType::String,
				LiteralKind::Number if literal.is_integral() => ValueType::Int,
				LiteralKind::Number => ValueType::Float,
				LiteralKind::Boolean => ValueType::Bool,
				LiteralKind::Color => ValueType::Color,
			},
			Value::Identifier(identifier)
				if builtin::is_series_identifier(&identifier.name) =>
			{
				ValueType::SeriesFloat
			}
			Value::Identifier(_) => ValueType::Identifier,
			Value::FunctionCall(_) => ValueType::SeriesFloat,
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn series_int_or_float_accepts_numbers()
	{
		let expected = ValueType::SeriesIntOrFloat;
		assert!(expected.accepts(ValueType::Int));
		assert!(expected.accepts(ValueType::Float));
		assert!(expected.accepts(ValueType::SeriesInt));
		assert!(expected.accepts(ValueType::SeriesFloat));
		assert!(!expected.accepts(ValueType::String));
		assert!(!expected.accepts(ValueType::Identifier));
	}

	#[test]
	fn series_int_accepts_plain_int_only()
	{
		assert!(ValueType::SeriesInt.accepts(ValueType::Int));
		assert!(!ValueType::SeriesInt.accepts(ValueType::Float));
		assert!(!ValueType::SeriesInt.accepts(ValueType::SeriesFloat));
	}

	#[test]
	fn parse_type_tags()
	{
		assert_eq!(
			"series int/float".parse::<ValueType>().ok(),
			Some(ValueType::SeriesIntOrFloat)
		);
		assert_eq!(ValueType::IntOrFloat.to_string(), "int/float");
		assert!("series table".parse::<ValueType>().is_err());
	}
}
