//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

//! The default rule registry and function documentation are embedded
//! within the binary, so that a plain `pinelint script.pine` runs every
//! check without any files next to it.
//!
//! Embedded files can also be named explicitly with the `builtin:` scheme,
//! for instance `--rules builtin:rules.json`.

use crate::registry::{DocumentationRegistry, RuleRegistry};

use anyhow::anyhow;
use anyhow::Context;
use include_dir::include_dir;

static DATA: include_dir::Dir = include_dir!("$CARGO_MANIFEST_DIR/data");

const SCHEME_PREFIX: &str = "builtin:";
const RULES_FILENAME: &str = "rules.json";
const DOCUMENTATION_FILENAME: &str = "documentation.json";

/// The contents of an embedded file, if `filepath` names one.
pub fn find(filepath: &str) -> Option<&'static str>
{
	let subpath = filepath.strip_prefix(SCHEME_PREFIX)?;
	DATA.get_file(subpath)?.contents_utf8()
}

pub fn filenames() -> impl Iterator<Item = String>
{
	DATA.files()
		.map(|file| format!("{}{}", SCHEME_PREFIX, file.path().to_string_lossy()))
}

pub fn default_rules() -> Result<RuleRegistry, anyhow::Error>
{
	load_rules(&format!("{}{}", SCHEME_PREFIX, RULES_FILENAME))
}

pub fn default_documentation() -> Result<DocumentationRegistry, anyhow::Error>
{
	load_documentation(&format!("{}{}", SCHEME_PREFIX, DOCUMENTATION_FILENAME))
}

/// Loads a rule registry from an embedded file or from disk.
pub fn load_rules(filepath: &str) -> Result<RuleRegistry, anyhow::Error>
{
	match find(filepath)
	{
		Some(content) => RuleRegistry::load_from_str(content)
			.with_context(|| format!("failed to load '{}'", filepath)),
		None if filepath.starts_with(SCHEME_PREFIX) => Err(missing(filepath)),
		None => RuleRegistry::from_path(std::path::Path::new(filepath)),
	}
}

/// Loads function documentation from an embedded file or from disk.
pub fn load_documentation(
	filepath: &str,
) -> Result<DocumentationRegistry, anyhow::Error>
{
	match find(filepath)
	{
		Some(content) => DocumentationRegistry::load_from_str(content)
			.with_context(|| format!("failed to load '{}'", filepath)),
		None if filepath.starts_with(SCHEME_PREFIX) => Err(missing(filepath)),
		None => DocumentationRegistry::from_path(std::path::Path::new(filepath)),
	}
}

fn missing(filepath: &str) -> anyhow::Error
{
	let available: Vec<String> = filenames().collect();
	anyhow!(
		"no embedded file named '{}' (available: {})",
		filepath,
		available.join(", ")
	)
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::registry::Documentation;

	#[test]
	fn embedded_rules_define_every_optional_code()
	{
		let rules = default_rules().unwrap();
		for kind in crate::analyzer::CheckerKind::ALL
		{
			for code in kind.required_codes()
			{
				assert!(rules.defines(code), "{} is not defined", code);
			}
		}
	}

	#[test]
	fn embedded_documentation_is_loaded()
	{
		let documentation = default_documentation().unwrap();
		assert!(documentation.is_loaded());
		assert!(documentation.is_valid_parameter("table.cell", "text_color"));
		assert!(!documentation.is_valid_parameter("table.cell", "textColor"));
	}

	#[test]
	fn unknown_embedded_file()
	{
		assert!(find("builtin:missing.json").is_none());
		assert!(load_rules("builtin:missing.json").is_err());
		assert!(find("rules.json").is_none());
	}
}
