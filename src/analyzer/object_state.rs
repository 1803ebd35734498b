//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

//! Line-sequential tracking of user-defined type (UDT) objects that may
//! hold `na`.
//!
//! The analysis is flow-insensitive: the most recent assignment above a
//! line decides the state used for that line, regardless of the branches
//! it sits in.

use crate::analyzer::{Checker, CheckerKind, Context};
use crate::error::{Rule, Violation};
use crate::text::{self, identifier_end, is_identifier_byte, skip_spaces};
use crate::text::{Line, SourceMap};

use std::collections::HashMap;

pub struct ObjectStateChecker;

impl Checker for ObjectStateChecker
{
	fn kind(&self) -> CheckerKind
	{
		CheckerKind::ObjectState
	}

	fn run(&self, context: &Context) -> Result<Vec<Violation>, anyhow::Error>
	{
		Ok(analyze_lines(&context.masked, &context.source_map))
	}
}

/// Flags field access on objects that are `na` at that point, and field
/// access through a historical reference on any tracked object.
pub fn detect_unsafe_access(source: &str, source_filename: &str) -> Vec<Violation>
{
	let masked = text::mask(source);
	let source_map = SourceMap::new(source, source_filename);
	analyze_lines(&masked, &source_map)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State
{
	Na,
	Initialized,
}

#[derive(Debug, Clone)]
struct Transition
{
	line_number: usize,
	state: State,
	type_name: String,
	is_var: bool,
}

/// The fields of every declared type, by type name.
type Types = HashMap<String, Vec<String>>;

/// For every tracked object, its state changes in line order.
type Timeline = HashMap<String, Vec<Transition>>;

fn analyze_lines(masked: &str, source_map: &SourceMap) -> Vec<Violation>
{
	let lines = text::lines(masked);
	let types = collect_types(&lines);
	let timeline = collect_transitions(&lines, &types);
	if timeline.is_empty()
	{
		return Vec::new();
	}
	let mut violations = Vec::new();
	for line in &lines
	{
		find_direct_access(line, &timeline, source_map, &mut violations);
		find_historical_access(line, &timeline, source_map, &mut violations);
	}
	violations
}

fn collect_types(lines: &[Line]) -> Types
{
	let mut types = Types::new();
	let mut current: Option<String> = None;
	for line in lines
	{
		if line.is_blank()
		{
			continue;
		}
		if line.is_indented()
		{
			if let Some(type_name) = &current
			{
				if let Some(field) = field_name(line.text)
				{
					types.entry(type_name.clone()).or_default().push(field);
				}
			}
			continue;
		}
		current = type_header(line.text);
		if let Some(type_name) = &current
		{
			types.entry(type_name.clone()).or_default();
		}
	}
	types
}

fn type_header(text: &str) -> Option<String>
{
	let text = text.trim();
	let text = text.strip_prefix("export ").unwrap_or(text).trim_start();
	let rest = text.strip_prefix("type ")?.trim_start();
	let end = identifier_end(rest.as_bytes(), 0)?;
	Some(rest[..end].to_string())
}

/// The field declared by a line such as `float price = 0.0`.
fn field_name(text: &str) -> Option<String>
{
	let head = match split_assignment(text)
	{
		Some((head, _)) => head,
		None => text,
	};
	let word = head.split_whitespace().last()?;
	match identifier_end(word.as_bytes(), 0)
	{
		Some(end) if end == word.len() => Some(word.to_string()),
		_ => None,
	}
}

/// Splits `lhs = rhs` or `lhs := rhs`, ignoring comparison operators.
fn split_assignment(text: &str) -> Option<(&str, &str)>
{
	let bytes = text.as_bytes();
	for (i, &x) in bytes.iter().enumerate()
	{
		if x != b'='
		{
			continue;
		}
		let previous = if i > 0 { bytes[i - 1] } else { b' ' };
		let next = bytes.get(i + 1).copied().unwrap_or(b' ');
		match (previous, next)
		{
			(_, b'=') | (_, b'>') => return None,
			(b'=', _) | (b'!', _) | (b'<', _) | (b'>', _) => return None,
			(b'+', _) | (b'-', _) | (b'*', _) | (b'/', _) | (b'%', _) =>
			{
				return None
			}
			(b':', _) => return Some((&text[..i - 1], &text[i + 1..])),
			_ => return Some((&text[..i], &text[i + 1..])),
		}
	}
	None
}

fn is_primitive_type(type_name: &str) -> bool
{
	match type_name
	{
		"int" | "float" | "bool" | "string" | "color" => true,
		_ => false,
	}
}

fn collect_transitions(lines: &[Line], types: &Types) -> Timeline
{
	let mut timeline = Timeline::new();
	for line in lines
	{
		let (lhs, rhs) = match split_assignment(line.text)
		{
			Some(parts) => parts,
			None => continue,
		};
		let words: Vec<&str> = lhs.split_whitespace().collect();
		let rhs = rhs.trim();
		let (is_var, type_name, object) = match words.as_slice()
		{
			[keyword, type_name, object]
				if *keyword == "var" || *keyword == "varip" =>
			{
				(true, Some(*type_name), *object)
			}
			[type_name, object] => (false, Some(*type_name), *object),
			[object] => (false, None, *object),
			_ => continue,
		};
		if !is_identifier(object)
		{
			continue;
		}
		let is_tracked = timeline.contains_key(object);
		let transition = if rhs == "na"
		{
			let type_name = match type_name
			{
				Some(type_name) if is_var && !is_primitive_type(type_name) =>
				{
					type_name
				}
				Some(type_name) if types.contains_key(type_name) => type_name,
				Some(type_name) if is_qualified_type(type_name) => type_name,
				Some(_) => continue,
				None if is_tracked => "",
				None => continue,
			};
			Transition {
				line_number: line.number,
				state: State::Na,
				type_name: type_name.to_string(),
				is_var,
			}
		}
		else
		{
			let constructed = match constructor_type(rhs)
			{
				Some(constructed) => constructed,
				None => continue,
			};
			if !types.contains_key(constructed) && !is_tracked
			{
				continue;
			}
			Transition {
				line_number: line.number,
				state: State::Initialized,
				type_name: constructed.to_string(),
				is_var,
			}
		};
		let transitions = timeline.entry(object.to_string()).or_default();
		let transition = match (transition.type_name.is_empty(), transitions.last())
		{
			(true, Some(previous)) => Transition {
				type_name: previous.type_name.clone(),
				..transition
			},
			_ => transition,
		};
		transitions.push(transition);
	}
	timeline
}

/// The type in `Type.new(...)` or `lib.Type.new(...)`.
fn constructor_type(rhs: &str) -> Option<&str>
{
	let open = rhs.find(|x: char| x == '(' || x == '<')?;
	let type_name = rhs[..open].trim_end().strip_suffix(".new")?;
	match type_name.split('.').all(is_identifier)
	{
		true => Some(type_name),
		false => None,
	}
}

/// A type imported from a library, such as `lib.Pivot`.
fn is_qualified_type(type_name: &str) -> bool
{
	type_name.contains('.') && type_name.split('.').all(is_identifier)
}

fn is_identifier(word: &str) -> bool
{
	match identifier_end(word.as_bytes(), 0)
	{
		Some(end) => end == word.len(),
		None => false,
	}
}

/// The latest transition strictly before the given line.
fn state_before<'a>(
	timeline: &'a Timeline,
	object: &str,
	line_number: usize,
) -> Option<&'a Transition>
{
	timeline
		.get(object)?
		.iter()
		.take_while(|transition| transition.line_number < line_number)
		.last()
}

/// The field in `.field` at `i`, if it is not a method call.
fn field_access(bytes: &[u8], i: usize) -> Option<(usize, usize)>
{
	if bytes.get(i) != Some(&b'.')
	{
		return None;
	}
	let start = i + 1;
	let end = identifier_end(bytes, start)?;
	match bytes.get(skip_spaces(bytes, end))
	{
		Some(b'(') => None,
		_ => Some((start, end)),
	}
}

fn find_direct_access(
	line: &Line,
	timeline: &Timeline,
	source_map: &SourceMap,
	violations: &mut Vec<Violation>,
)
{
	let bytes = line.text.as_bytes();
	let mut i = 0;
	while i < bytes.len()
	{
		let is_word_start = i == 0
			|| !(is_identifier_byte(bytes[i - 1]) || bytes[i - 1] == b'.');
		let end = match identifier_end(bytes, i)
		{
			Some(end) if is_word_start => end,
			Some(end) =>
			{
				i = end;
				continue;
			}
			None =>
			{
				i += 1;
				continue;
			}
		};
		let object = &line.text[i..end];
		let transition = match state_before(timeline, object, line.number)
		{
			Some(transition) if transition.state == State::Na => transition,
			_ =>
			{
				i = end;
				continue;
			}
		};
		if let Some((field_start, field_end)) = field_access(bytes, end)
		{
			let field = &line.text[field_start..field_end];
			let location =
				source_map.location(line.offset + i, field_end - i);
			let origin = match transition.is_var
			{
				true => "declared with `var` as na",
				false => "assigned na",
			};
			let violation = Violation::new(
				Rule::NaObjectAccess,
				location,
				format!(
					"Accessing field '{}' of '{}', which was {} on line {}",
					field, object, origin, transition.line_number
				),
			)
			.with_metadata("object", object)
			.with_metadata("field", field)
			.with_metadata("typeName", transition.type_name.as_str())
			.with_metadata("declarationLine", transition.line_number)
			.with_suggested_fix(format!(
				"Initialize '{}' with {}.new() before accessing its fields",
				object, transition.type_name
			));
			violations.push(violation);
			i = field_end;
		}
		else
		{
			i = end;
		}
	}
}

fn find_historical_access(
	line: &Line,
	timeline: &Timeline,
	source_map: &SourceMap,
	violations: &mut Vec<Violation>,
)
{
	let bytes = line.text.as_bytes();
	for (open, _) in line.text.match_indices('(')
	{
		let start = skip_spaces(bytes, open + 1);
		let end = match identifier_end(bytes, start)
		{
			Some(end) => end,
			None => continue,
		};
		let object = &line.text[start..end];
		if !timeline.contains_key(object)
		{
			continue;
		}
		let bracket = skip_spaces(bytes, end);
		if bytes.get(bracket) != Some(&b'[')
		{
			continue;
		}
		let close_bracket = match text::matching_bracket(bytes, bracket)
		{
			Some(x) => x,
			None => continue,
		};
		let close = skip_spaces(bytes, close_bracket + 1);
		if bytes.get(close) != Some(&b')')
		{
			continue;
		}
		let (field_start, field_end) = match field_access(bytes, close + 1)
		{
			Some(field) => field,
			None => continue,
		};
		let offset = line.text[bracket + 1..close_bracket].trim();
		let field = &line.text[field_start..field_end];
		let location = source_map.location(line.offset + open, field_end - open);
		let violation = Violation::new(
			Rule::NaObjectHistoryAccess,
			location,
			format!(
				"Historical value '{}[{}]' may be na, so reading its field '{}' \
				 can fail",
				object, offset, field
			),
		)
		.with_metadata("object", object)
		.with_metadata("field", field)
		.with_metadata("historyOffset", offset)
		.with_suggested_fix(format!(
			"Check `not na({}[{}])` before reading '{}'",
			object, offset, field
		));
		violations.push(violation);
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	use pretty_assertions::assert_eq;

	fn codes(violations: &[Violation]) -> Vec<String>
	{
		violations.iter().map(|x| x.code()).collect()
	}

	#[test]
	fn collect_type_fields()
	{
		let source = "type Point\n    float x = 0.0\n    float y\n\nplot(close)\n";
		let masked = text::mask(source);
		let types = collect_types(&text::lines(&masked));
		assert_eq!(
			types.get("Point"),
			Some(&vec!["x".to_string(), "y".to_string()])
		);
	}

	#[test]
	fn flag_access_on_na_object()
	{
		let source = "type MyType\n    float field\n\n\
		              var MyType o = na\nx = o.field\n";
		let violations = detect_unsafe_access(source, "test.pine");
		assert_eq!(codes(&violations), vec!["na_object_access"]);
		assert_eq!(violations[0].metadata["object"], "o");
		assert_eq!(violations[0].metadata["field"], "field");
		assert_eq!(violations[0].metadata["declarationLine"], 4);
		assert_eq!(violations[0].location.line_number, 5);
		assert_eq!(violations[0].location.line_offset, 4);
	}

	#[test]
	fn initialized_object_is_safe()
	{
		let source = "type MyType\n    float field\n\
		              var MyType o = na\no := MyType.new(1.0)\nx = o.field\n";
		let violations = detect_unsafe_access(source, "test.pine");
		assert_eq!(violations, vec![]);
	}

	#[test]
	fn method_calls_are_not_field_access()
	{
		let source = "type MyType\n    float field\n\
		              MyType o = na\no.update()\n";
		assert_eq!(detect_unsafe_access(source, "test.pine"), vec![]);
	}

	#[test]
	fn history_access_is_always_flagged()
	{
		let source = "type MyType\n    float field\n\
		              o = MyType.new(1.0)\nx = (o[1]).field\n";
		let violations = detect_unsafe_access(source, "test.pine");
		assert_eq!(codes(&violations), vec!["na_object_history_access"]);
		assert_eq!(violations[0].metadata["historyOffset"], "1");
	}

	#[test]
	fn history_access_on_na_object()
	{
		let source = "type MyType\n    float field\n\
		              var MyType o = na\nx = (o[1]).field\n";
		let violations = detect_unsafe_access(source, "test.pine");
		assert_eq!(codes(&violations), vec!["na_object_history_access"]);
		assert_eq!(violations[0].location.line_number, 4);
	}

	#[test]
	fn history_access_with_nested_index()
	{
		let source = "type MyType\n    float field\n\
		              var MyType o = MyType.new(1.0)\n\
		              x = (o[arr[i]]).field\n\
		              y = (o[math.max(1, n[0])]).field\n";
		let violations = detect_unsafe_access(source, "test.pine");
		assert_eq!(
			codes(&violations),
			vec!["na_object_history_access", "na_object_history_access"]
		);
		assert_eq!(violations[0].metadata["historyOffset"], "arr[i]");
		assert_eq!(violations[1].metadata["historyOffset"], "math.max(1, n[0])");
	}

	#[test]
	fn library_types_are_tracked()
	{
		let source = "import user/lib/1\n\
		              lib.Pivot p = na\nx = p.price\n\
		              p := lib.Pivot.new(1.0)\ny = p.price\n";
		let violations = detect_unsafe_access(source, "test.pine");
		assert_eq!(codes(&violations), vec!["na_object_access"]);
		assert_eq!(violations[0].metadata["typeName"], "lib.Pivot");
		assert_eq!(violations[0].location.line_number, 3);
	}

	#[test]
	fn comments_and_strings_are_ignored()
	{
		let source = "type MyType\n    float field\n\
		              var MyType o = na\n// x = o.field\nlabel.new(bar_index, high, \"o.field\")\n";
		assert_eq!(detect_unsafe_access(source, "test.pine"), vec![]);
	}

	#[test]
	fn untyped_primitives_are_not_tracked()
	{
		let source = "var float x = na\ny = x.field\n";
		assert_eq!(detect_unsafe_access(source, "test.pine"), vec![]);
	}

	#[test]
	fn split_assignments()
	{
		assert_eq!(split_assignment("a := b"), Some(("a ", " b")));
		assert_eq!(split_assignment("a = b"), Some(("a ", " b")));
		assert_eq!(split_assignment("a == b"), None);
		assert_eq!(split_assignment("a >= b"), None);
		assert_eq!(split_assignment("f(x) => x"), None);
	}

	#[test]
	fn constructor_types()
	{
		assert_eq!(constructor_type("Pivot.new(high)"), Some("Pivot"));
		assert_eq!(constructor_type("lib.Pivot.new (high)"), Some("lib.Pivot"));
		assert_eq!(constructor_type("Pair.new<float>(1.0)"), Some("Pair"));
		assert_eq!(constructor_type("f(Pivot.new(high))"), None);
		assert_eq!(constructor_type("na"), None);
	}
}
