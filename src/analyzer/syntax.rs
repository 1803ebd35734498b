//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

use crate::analyzer::{Checker, CheckerKind, Context};
use crate::builtin;
use crate::error::{Rule, Violation};
use crate::text::{self, identifier_end, is_identifier_byte};

use std::collections::HashSet;

/// Flags top-level assignments to the name of a built-in namespace, such as
/// `ta = 1`, which hide every function in that namespace.
pub struct NamespaceShadowingChecker;

impl Checker for NamespaceShadowingChecker
{
	fn kind(&self) -> CheckerKind
	{
		CheckerKind::NamespaceShadowing
	}

	fn run(&self, context: &Context) -> Result<Vec<Violation>, anyhow::Error>
	{
		let mut violations = Vec::new();
		for line in text::lines(&context.masked)
		{
			if line.is_indented()
			{
				continue;
			}
			let (name_offset, name) = match assigned_name(line.text)
			{
				Some(assigned) => assigned,
				None => continue,
			};
			if !builtin::is_reserved_namespace(name)
			{
				continue;
			}
			let violation = Violation::new(
				Rule::NamespaceShadowing,
				context.location(line.offset + name_offset, name.len()),
				format!(
					"Assigning to '{}' shadows the built-in '{}' namespace",
					name, name
				),
			)
			.with_metadata("namespace", name)
			.with_suggested_fix(format!(
				"Rename the variable, for example to '{}_value'",
				name
			));
			violations.push(violation);
		}
		Ok(violations)
	}
}

/// The variable assigned on a line such as `x = 1`, `var float x = na` or
/// `x := 2`, with its offset in the line.
fn assigned_name(text: &str) -> Option<(usize, &str)>
{
	let bytes = text.as_bytes();
	let mut i = 0;
	let mut last: Option<(usize, usize)> = None;
	loop
	{
		i = text::skip_spaces(bytes, i);
		match bytes.get(i)
		{
			Some(b'=') if bytes.get(i + 1) != Some(&b'=') =>
			{
				break;
			}
			Some(b':') if bytes.get(i + 1) == Some(&b'=') => break,
			Some(_) =>
			{
				let end = identifier_end(bytes, i)?;
				last = Some((i, end));
				i = end;
				if let Some(b'<') = bytes.get(i)
				{
					i += text[i..].find('>')? + 1;
				}
				if let Some(b'[') = bytes.get(i)
				{
					if bytes.get(i + 1) != Some(&b']')
					{
						return None;
					}
					i += 2;
				}
			}
			None => return None,
		}
	}
	let (start, end) = last?;
	let name = &text[start..end];
	if builtin::is_keyword(name)
	{
		return None;
	}
	Some((start, name))
}

/// Flags continuation lines that Pine would parse as a new statement or as
/// a local block: the previous line ends in an operator or a comma outside
/// of any parentheses, and the next line is indented by a multiple of four.
pub struct LineContinuationChecker;

impl Checker for LineContinuationChecker
{
	fn kind(&self) -> CheckerKind
	{
		CheckerKind::LineContinuation
	}

	fn run(&self, context: &Context) -> Result<Vec<Violation>, anyhow::Error>
	{
		let lines = text::lines(&context.masked);
		let mut violations = Vec::new();
		let mut depth: i32 = 0;
		for (i, line) in lines.iter().enumerate()
		{
			for x in line.text.bytes()
			{
				match x
				{
					b'(' | b'[' => depth += 1,
					b')' | b']' => depth = (depth - 1).max(0),
					_ => (),
				}
			}
			if depth > 0
			{
				continue;
			}
			let trailing = match line.text.trim_end().bytes().last()
			{
				Some(x) => x,
				None => continue,
			};
			if !is_continuation_operator(trailing, line.text.trim_end())
			{
				continue;
			}
			let next = match lines[i + 1..].iter().find(|x| !x.is_blank())
			{
				Some(next) => next,
				None => continue,
			};
			let indentation = next.indentation();
			if indentation == 0 || indentation % 4 != 0
			{
				continue;
			}
			let violation = Violation::new(
				Rule::InvalidLineContinuation,
				context.location(next.offset, next.text.len()),
				format!(
					"Line {} continues line {} but is indented by {} spaces, \
					 which starts a local block",
					next.number, line.number, indentation
				),
			)
			.with_metadata("indentation", indentation)
			.with_metadata("continuedLine", line.number)
			.with_suggested_fix(
				"Indent continuation lines by a number of spaces that is not \
				 a multiple of four",
			);
			violations.push(violation);
		}
		Ok(violations)
	}
}

fn is_continuation_operator(trailing: u8, line: &str) -> bool
{
	match trailing
	{
		b',' | b'+' | b'-' | b'*' | b'/' | b'%' | b'?' | b':' | b'<' => true,
		b'>' => !line.ends_with("=>"),
		b'=' => false,
		_ =>
		{
			let last_word_start = line
				.bytes()
				.rposition(|x| !is_identifier_byte(x))
				.map_or(0, |i| i + 1);
			match &line[last_word_start..]
			{
				"and" | "or" => last_word_start > 0,
				_ => false,
			}
		}
	}
}

/// Version directive, renamed and un-namespaced functions.
pub struct CompatibilityChecker;

impl Checker for CompatibilityChecker
{
	fn kind(&self) -> CheckerKind
	{
		CheckerKind::SyntaxCompatibility
	}

	fn run(&self, context: &Context) -> Result<Vec<Violation>, anyhow::Error>
	{
		let mut violations = Vec::new();
		check_version(context, &mut violations);

		let sites = text::call_sites(&context.masked);
		let user_defined: HashSet<&str> = sites
			.iter()
			.filter(|site| site.is_definition)
			.map(|site| site.name.as_str())
			.collect();
		for site in &sites
		{
			if site.is_definition || user_defined.contains(site.name.as_str())
			{
				continue;
			}
			let location = context.location(site.name_offset, site.name.len());
			if let Some(replacement) = builtin::deprecated_function(&site.name)
			{
				let violation = Violation::new(
					Rule::DeprecatedFunction,
					location,
					format!(
						"'{}' is deprecated, use {} instead",
						site.name, replacement
					),
				)
				.with_metadata("function", site.name.as_str())
				.with_metadata("replacement", replacement)
				.with_suggested_fix(format!(
					"Replace '{}' with {}",
					site.name, replacement
				));
				violations.push(violation);
			}
			else if let Some(namespaced) = builtin::namespaced_function(&site.name)
			{
				let violation = Violation::new(
					Rule::MissingNamespace,
					location,
					format!(
						"'{}' must be called as '{}' in version {}",
						site.name,
						namespaced,
						builtin::CURRENT_VERSION
					),
				)
				.with_metadata("function", site.name.as_str())
				.with_metadata("namespaced", namespaced.as_str())
				.with_suggested_fix(format!(
					"Replace '{}' with '{}'",
					site.name, namespaced
				));
				violations.push(violation);
			}
		}
		Ok(violations)
	}
}

fn check_version(context: &Context, violations: &mut Vec<Violation>)
{
	let directive = text::lines(context.source).into_iter().find_map(|line| {
		let rest = line.text.trim_start().strip_prefix("//")?;
		let rest = rest.trim_start().strip_prefix("@version")?;
		let rest = rest.trim_start().strip_prefix('=')?.trim();
		Some((line, rest))
	});
	let (line, value) = match directive
	{
		Some(directive) => directive,
		None =>
		{
			let violation = Violation::new(
				Rule::MissingVersionDirective,
				context.location(0, 0),
				"The script has no //@version directive".to_string(),
			)
			.with_suggested_fix(format!(
				"Add //@version={} as the first line",
				builtin::CURRENT_VERSION
			));
			violations.push(violation);
			return;
		}
	};
	let version: u32 = match value.parse()
	{
		Ok(version) => version,
		Err(_) => return,
	};
	if version >= builtin::CURRENT_VERSION
	{
		return;
	}
	let violation = Violation::new(
		Rule::OutdatedVersion,
		context.location(line.offset, line.text.len()),
		format!(
			"Version {} is outdated, the current version is {}",
			version,
			builtin::CURRENT_VERSION
		),
	)
	.with_metadata("version", version)
	.with_metadata("currentVersion", builtin::CURRENT_VERSION)
	.with_suggested_fix(format!(
		"Migrate the script and use //@version={}",
		builtin::CURRENT_VERSION
	));
	violations.push(violation);
}
