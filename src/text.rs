//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

//! Helpers for the checkers that work directly on source text instead of
//! the syntax tree. They are cheaper than a full parse and keep working
//! when the parse is partial.
//!
//! Most helpers operate on a *masked* copy of the source, in which the
//! contents of string literals and comments are replaced by spaces. The
//! masked copy has the same length and line structure as the original,
//! so offsets found in one are valid in the other.

use crate::lexer::Location;

use std::ops::Range;

pub struct SourceMap<'a>
{
	source: &'a str,
	source_filename: String,
	line_starts: Vec<usize>,
}

impl<'a> SourceMap<'a>
{
	pub fn new(source: &'a str, source_filename: &str) -> SourceMap<'a>
	{
		let mut line_starts = vec![0];
		line_starts.extend(
			source
				.bytes()
				.enumerate()
				.filter(|(_, x)| *x == b'\n')
				.map(|(i, _)| i + 1),
		);
		SourceMap {
			source,
			source_filename: source_filename.to_string(),
			line_starts,
		}
	}

	/// The location of `length` bytes starting at `offset`, clamped to the
	/// bounds of the source.
	pub fn location(&self, offset: usize, length: usize) -> Location
	{
		let start = floor_char_boundary(self.source, offset);
		let end =
			floor_char_boundary(self.source, start.saturating_add(length));
		let line_index =
			self.line_starts.partition_point(|&x| x <= start).max(1) - 1;
		let line_start = self.line_starts[line_index];
		let line_offset = self.source[line_start..start].chars().count();
		Location {
			source_filename: self.source_filename.clone(),
			span: start..end,
			line_number: line_index + 1,
			line_offset,
		}
	}
}

fn floor_char_boundary(source: &str, offset: usize) -> usize
{
	let mut offset = offset.min(source.len());
	while !source.is_char_boundary(offset)
	{
		offset -= 1;
	}
	offset
}

#[derive(Debug, Clone, Copy)]
pub struct Line<'a>
{
	/// One-based.
	pub number: usize,
	pub offset: usize,
	/// The text of the line without its line terminator.
	pub text: &'a str,
}

impl<'a> Line<'a>
{
	pub fn indentation(&self) -> usize
	{
		self.text
			.chars()
			.take_while(|x| *x == ' ' || *x == '\t')
			.map(|x| if x == '\t' { crate::lexer::TAB_WIDTH } else { 1 })
			.sum()
	}

	pub fn is_blank(&self) -> bool
	{
		self.text.trim().is_empty()
	}

	pub fn is_indented(&self) -> bool
	{
		self.text.starts_with(' ') || self.text.starts_with('\t')
	}
}

pub fn lines(text: &str) -> Vec<Line>
{
	let mut offset = 0;
	let mut lines = Vec::new();
	for (i, raw) in text.split('\n').enumerate()
	{
		let line = raw.strip_suffix('\r').unwrap_or(raw);
		lines.push(Line {
			number: i + 1,
			offset,
			text: line,
		});
		offset += raw.len() + 1;
	}
	lines
}

enum MaskState
{
	Code,
	String(u8),
	LineComment,
	BlockComment,
}

/// Replaces the contents of string literals and comments with spaces.
/// Quote characters and line breaks are kept.
pub fn mask(source: &str) -> String
{
	let bytes = source.as_bytes();
	let mut masked = Vec::with_capacity(bytes.len());
	let mut state = MaskState::Code;
	let mut i = 0;
	while i < bytes.len()
	{
		let x = bytes[i];
		let next = bytes.get(i + 1).copied();
		match state
		{
			MaskState::Code => match (x, next)
			{
				(b'/', Some(b'/')) =>
				{
					state = MaskState::LineComment;
					masked.push(b' ');
				}
				(b'/', Some(b'*')) =>
				{
					state = MaskState::BlockComment;
					masked.extend_from_slice(b"  ");
					i += 1;
				}
				(b'"' | b'\'', _) =>
				{
					state = MaskState::String(x);
					masked.push(x);
				}
				_ => masked.push(x),
			},
			MaskState::String(quote) => match x
			{
				b'\n' =>
				{
					state = MaskState::Code;
					masked.push(x);
				}
				b'\\' if next.map_or(false, |y| y != b'\n') =>
				{
					masked.extend_from_slice(b"  ");
					i += 1;
				}
				_ if x == quote =>
				{
					state = MaskState::Code;
					masked.push(x);
				}
				_ => masked.push(b' '),
			},
			MaskState::LineComment => match x
			{
				b'\n' =>
				{
					state = MaskState::Code;
					masked.push(x);
				}
				_ => masked.push(b' '),
			},
			MaskState::BlockComment => match (x, next)
			{
				(b'*', Some(b'/')) =>
				{
					state = MaskState::Code;
					masked.extend_from_slice(b"  ");
					i += 1;
				}
				(b'\n', _) => masked.push(x),
				_ => masked.push(b' '),
			},
		}
		i += 1;
	}
	match String::from_utf8(masked)
	{
		Ok(masked) => masked,
		Err(error) => String::from_utf8_lossy(error.as_bytes()).into_owned(),
	}
}

pub fn is_identifier_start(x: u8) -> bool
{
	x.is_ascii_alphabetic() || x == b'_'
}

pub fn is_identifier_byte(x: u8) -> bool
{
	x.is_ascii_alphanumeric() || x == b'_'
}

/// The end of the identifier starting at `start`, if there is one.
pub fn identifier_end(bytes: &[u8], start: usize) -> Option<usize>
{
	if !bytes.get(start).map_or(false, |&x| is_identifier_start(x))
	{
		return None;
	}
	let mut end = start + 1;
	while bytes.get(end).map_or(false, |&x| is_identifier_byte(x))
	{
		end += 1;
	}
	Some(end)
}

pub fn skip_spaces(bytes: &[u8], mut i: usize) -> usize
{
	while let Some(b' ' | b'\t') = bytes.get(i)
	{
		i += 1;
	}
	i
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite
{
	/// The function name including its namespace.
	pub name: String,
	pub name_offset: usize,
	/// The text between the parentheses.
	pub arguments: Range<usize>,
	pub is_closed: bool,
	/// Whether this is the head of a function definition, `f(x) =>`.
	pub is_definition: bool,
}

/// Finds every call site in masked source text, including nested calls,
/// in order of their position.
pub fn call_sites(masked: &str) -> Vec<CallSite>
{
	let bytes = masked.as_bytes();
	let mut sites = Vec::new();
	let mut i = 0;
	while i < bytes.len()
	{
		let is_word_start = is_identifier_start(bytes[i])
			&& (i == 0
				|| !(is_identifier_byte(bytes[i - 1]) || bytes[i - 1] == b'.'));
		if !is_word_start
		{
			i += 1;
			continue;
		}
		let start = i;
		let mut end = match identifier_end(bytes, start)
		{
			Some(end) => end,
			None => start + 1,
		};
		while bytes.get(end) == Some(&b'.')
		{
			match identifier_end(bytes, end + 1)
			{
				Some(next) => end = next,
				None => break,
			}
		}
		let name = &masked[start..end];
		let open = skip_spaces(bytes, end);
		if bytes.get(open) == Some(&b'(')
			&& !crate::builtin::is_keyword(name)
		{
			let (close, is_closed) = matching_paren(bytes, open);
			let after = skip_spaces(bytes, close + 1);
			let is_definition = is_closed
				&& bytes.get(after) == Some(&b'=')
				&& bytes.get(after + 1) == Some(&b'>');
			sites.push(CallSite {
				name: name.to_string(),
				name_offset: start,
				arguments: (open + 1)..close,
				is_closed,
				is_definition,
			});
		}
		i = end;
	}
	sites
}

/// The offset of the parenthesis that closes the one at `open`, or the end
/// of the text if it is never closed.
fn matching_paren(bytes: &[u8], open: usize) -> (usize, bool)
{
	matching_delimiter(bytes, open, b'(', b')')
}

/// The offset of the bracket that closes the one at `open`, skipping over
/// nested indexing such as `o[arr[i]]`.
pub fn matching_bracket(bytes: &[u8], open: usize) -> Option<usize>
{
	match matching_delimiter(bytes, open, b'[', b']')
	{
		(close, true) => Some(close),
		(_, false) => None,
	}
}

fn matching_delimiter(
	bytes: &[u8],
	open: usize,
	opening: u8,
	closing: u8,
) -> (usize, bool)
{
	let mut depth = 0;
	for (i, &x) in bytes.iter().enumerate().skip(open)
	{
		if x == opening
		{
			depth += 1;
		}
		else if x == closing
		{
			depth -= 1;
			if depth == 0
			{
				return (i, true);
			}
		}
	}
	(bytes.len(), false)
}

/// Splits an argument list at the commas that are not nested inside
/// parentheses or brackets. Each part is trimmed of surrounding whitespace.
pub fn split_arguments(masked: &str, arguments: Range<usize>) -> Vec<Range<usize>>
{
	let bytes = masked.as_bytes();
	let end = arguments.end.min(bytes.len());
	let mut parts = Vec::new();
	let mut depth = 0i32;
	let mut part_start = arguments.start;
	for i in arguments.start..end
	{
		match bytes[i]
		{
			b'(' | b'[' => depth += 1,
			b')' | b']' => depth -= 1,
			b',' if depth == 0 =>
			{
				parts.push(trim(bytes, part_start..i));
				part_start = i + 1;
			}
			_ => (),
		}
	}
	let last = trim(bytes, part_start..end);
	if !last.is_empty() || !parts.is_empty()
	{
		parts.push(last);
	}
	parts
}

fn trim(bytes: &[u8], mut range: Range<usize>) -> Range<usize>
{
	while range.start < range.end && bytes[range.start].is_ascii_whitespace()
	{
		range.start += 1;
	}
	while range.start < range.end && bytes[range.end - 1].is_ascii_whitespace()
	{
		range.end -= 1;
	}
	range
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedArgument
{
	pub name: String,
	pub name_offset: usize,
	pub value: Range<usize>,
}

/// Extracts `name = value` pairs from an argument list.
pub fn named_arguments(
	masked: &str,
	arguments: Range<usize>,
) -> Vec<NamedArgument>
{
	let bytes = masked.as_bytes();
	split_arguments(masked, arguments)
		.into_iter()
		.filter_map(|part| {
			let name_end = identifier_end(bytes, part.start)?;
			if name_end > part.end
			{
				return None;
			}
			let equals = skip_spaces(bytes, name_end);
			if equals >= part.end
				|| bytes[equals] != b'='
				|| bytes.get(equals + 1) == Some(&b'=')
				|| bytes.get(equals + 1) == Some(&b'>')
			{
				return None;
			}
			let value = trim(bytes, (equals + 1)..part.end);
			Some(NamedArgument {
				name: masked[part.start..name_end].to_string(),
				name_offset: part.start,
				value,
			})
		})
		.collect()
}

/// The contents of a quoted string literal, without unescaping.
pub fn unquote(text: &str) -> Option<&str>
{
	let text = text.trim();
	let quote = text.chars().next()?;
	if (quote == '"' || quote == '\'') && text.len() >= 2 && text.ends_with(quote)
	{
		Some(&text[1..text.len() - 1])
	}
	else
	{
		None
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	use pretty_assertions::assert_eq;

	#[test]
	fn mask_blanks_strings_and_comments()
	{
		let source = "f(\"a)b\", x) // g(y)\nh(1)";
		let masked = mask(source);
		assert_eq!(masked.len(), source.len());
		assert_eq!(masked, "f(\"   \", x)        \nh(1)");
	}

	#[test]
	fn find_nested_call_sites()
	{
		let masked = mask("plot(ta.sma(close, 14), title = \"(x\")");
		let names: Vec<String> =
			call_sites(&masked).into_iter().map(|x| x.name).collect();
		assert_eq!(names, vec!["plot".to_string(), "ta.sma".to_string()]);
	}

	#[test]
	fn call_sites_skip_keywords_and_mark_definitions()
	{
		let masked = mask("if (a)\n    b\nf(x, len = 3) => x\n");
		let sites = call_sites(&masked);
		assert_eq!(sites.len(), 1);
		assert_eq!(sites[0].name, "f");
		assert!(sites[0].is_definition);
	}

	#[test]
	fn extract_named_arguments()
	{
		let source = "table.cell(t, 0, 0, \"a,b\", textColor=color.white, \
		              width = f(a, b = 1))";
		let masked = mask(source);
		let site = &call_sites(&masked)[0];
		let named = named_arguments(&masked, site.arguments.clone());
		let names: Vec<&str> = named.iter().map(|x| x.name.as_str()).collect();
		assert_eq!(names, vec!["textColor", "width"]);
		assert_eq!(&source[named[0].value.clone()], "color.white");
	}

	#[test]
	fn comparison_is_not_a_named_argument()
	{
		let masked = mask("f(a == b, c => d)");
		let site = &call_sites(&masked)[0];
		assert!(named_arguments(&masked, site.arguments.clone()).is_empty());
	}

	#[test]
	fn locations_are_clamped()
	{
		let source = "ab\ncd";
		let map = SourceMap::new(source, "test.pine");
		let location = map.location(4, 100);
		assert_eq!(location.line_number, 2);
		assert_eq!(location.line_offset, 1);
		assert_eq!(location.span, 4..5);
	}

	#[test]
	fn match_nested_brackets()
	{
		let masked = mask("(o[arr[i]]).f + (p[math.max(1, n[0])]).g + q[1");
		let bytes = masked.as_bytes();
		assert_eq!(matching_bracket(bytes, 2), Some(9));
		assert_eq!(&masked[18..37], "[math.max(1, n[0])]");
		assert_eq!(matching_bracket(bytes, 18), Some(36));
		assert_eq!(matching_bracket(bytes, masked.len() - 2), None);
	}

	#[test]
	fn unquote_strings()
	{
		assert_eq!(unquote("\"abc\""), Some("abc"));
		assert_eq!(unquote("'x'"), Some("x"));
		assert_eq!(unquote("abc"), None);
		assert_eq!(unquote("\""), None);
	}
}
