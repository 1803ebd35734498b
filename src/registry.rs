//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

//! The rule registry decides which optional checkers run and carries their
//! per-code settings. The documentation registry knows the parameters of
//! built-in functions beyond the static tables in `builtin`.
//!
//! Both are loaded once, then passed by reference into every analysis and
//! never mutated.

use crate::builtin::{ParameterDescriptor, Signature};
use crate::value_type::ValueType;

use std::collections::{BTreeMap, HashMap};

use anyhow::anyhow;
use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleDefinition
{
	pub enabled: bool,
	pub max_length: Option<usize>,
	pub min: Option<f64>,
	pub max: Option<f64>,
}

impl Default for RuleDefinition
{
	fn default() -> RuleDefinition
	{
		RuleDefinition {
			enabled: true,
			max_length: None,
			min: None,
			max: None,
		}
	}
}

#[derive(Debug, Clone, Default)]
pub struct RuleRegistry
{
	definitions: BTreeMap<String, RuleDefinition>,
}

impl RuleRegistry
{
	/// Accepts either a flat `errorCodeDefinitions` map keyed by error code
	/// or the legacy `functionValidationRules` tree, in which every object
	/// with an `errorCode` field defines that code.
	pub fn load_from_str(content: &str) -> Result<RuleRegistry, anyhow::Error>
	{
		let root: serde_json::Value = serde_json::from_str(content)
			.context("rule registry is not valid JSON")?;
		let mut definitions = BTreeMap::new();
		if let Some(flat) = root.get("errorCodeDefinitions")
		{
			let flat = flat.as_object().ok_or_else(|| {
				anyhow!("'errorCodeDefinitions' must be an object")
			})?;
			for (code, value) in flat
			{
				let definition = parse_definition(value)
					.with_context(|| format!("invalid definition of {}", code))?;
				definitions.insert(code.clone(), definition);
			}
		}
		else if let Some(legacy) = root.get("functionValidationRules")
		{
			collect_legacy_definitions(legacy, &mut definitions)?;
		}
		else
		{
			return Err(anyhow!(
				"rule registry has neither 'errorCodeDefinitions' \
				 nor 'functionValidationRules'"
			));
		}
		log::debug!("loaded {} rule definitions", definitions.len());
		Ok(RuleRegistry { definitions })
	}

	pub fn from_path(path: &std::path::Path) -> Result<RuleRegistry, anyhow::Error>
	{
		let content = std::fs::read_to_string(path).with_context(|| {
			format!("failed to read '{}'", path.to_string_lossy())
		})?;
		RuleRegistry::load_from_str(&content).with_context(|| {
			format!("failed to load '{}'", path.to_string_lossy())
		})
	}

	pub fn from_codes<'a>(codes: impl IntoIterator<Item = &'a str>) -> RuleRegistry
	{
		let definitions = codes
			.into_iter()
			.map(|code| (code.to_string(), RuleDefinition::default()))
			.collect();
		RuleRegistry { definitions }
	}

	/// Whether the code is present and enabled.
	pub fn defines(&self, code: &str) -> bool
	{
		match self.definitions.get(code)
		{
			Some(definition) => definition.enabled,
			None => false,
		}
	}

	pub fn definition(&self, code: &str) -> Option<&RuleDefinition>
	{
		self.definitions.get(code)
	}

	pub fn codes(&self) -> impl Iterator<Item = &str>
	{
		self.definitions.keys().map(|code| code.as_str())
	}

	pub fn len(&self) -> usize
	{
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool
	{
		self.definitions.is_empty()
	}
}

fn parse_definition(
	value: &serde_json::Value,
) -> Result<RuleDefinition, anyhow::Error>
{
	match value
	{
		serde_json::Value::Object(_) =>
		{
			let definition = RuleDefinition::deserialize(value)?;
			Ok(definition)
		}
		_ => Ok(RuleDefinition::default()),
	}
}

fn collect_legacy_definitions(
	value: &serde_json::Value,
	definitions: &mut BTreeMap<String, RuleDefinition>,
) -> Result<(), anyhow::Error>
{
	match value
	{
		serde_json::Value::Object(fields) =>
		{
			if let Some(serde_json::Value::String(code)) = fields.get("errorCode")
			{
				let definition = parse_definition(value)
					.with_context(|| format!("invalid definition of {}", code))?;
				definitions.insert(code.clone(), definition);
			}
			for field in fields.values()
			{
				collect_legacy_definitions(field, definitions)?;
			}
			Ok(())
		}
		serde_json::Value::Array(elements) =>
		{
			for element in elements
			{
				collect_legacy_definitions(element, definitions)?;
			}
			Ok(())
		}
		_ => Ok(()),
	}
}

/// Synchronous queries against documentation of built-in functions.
pub trait Documentation
{
	fn is_loaded(&self) -> bool;

	fn is_valid_parameter(&self, function_name: &str, parameter_name: &str)
		-> bool;

	fn parameters_of(&self, function_name: &str) -> Option<Vec<&str>>;

	/// A signature is only available when every parameter has a known type.
	fn signature(&self, function_name: &str) -> Option<Signature>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct DocumentationFile
{
	#[serde(default)]
	version: Option<String>,
	functions: Vec<FunctionDocumentation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionDocumentation
{
	pub name: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub parameters: Vec<ParameterDocumentation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParameterDocumentation
{
	pub name: String,
	#[serde(rename = "type", default)]
	pub value_type: Option<String>,
	#[serde(default)]
	pub required: bool,
}

/// Documentation loaded from JSON. The default value is the unloaded
/// state, in which every query answers negatively.
#[derive(Debug, Clone, Default)]
pub struct DocumentationRegistry
{
	functions: HashMap<String, FunctionDocumentation>,
	is_loaded: bool,
}

impl DocumentationRegistry
{
	pub fn load_from_str(
		content: &str,
	) -> Result<DocumentationRegistry, anyhow::Error>
	{
		let file: DocumentationFile = serde_json::from_str(content)
			.context("documentation registry is not valid")?;
		log::debug!(
			"loaded documentation {} for {} functions",
			file.version.as_deref().unwrap_or("(unversioned)"),
			file.functions.len()
		);
		let functions = file
			.functions
			.into_iter()
			.map(|function| (function.name.clone(), function))
			.collect();
		Ok(DocumentationRegistry {
			functions,
			is_loaded: true,
		})
	}

	pub fn from_path(
		path: &std::path::Path,
	) -> Result<DocumentationRegistry, anyhow::Error>
	{
		let content = std::fs::read_to_string(path).with_context(|| {
			format!("failed to read '{}'", path.to_string_lossy())
		})?;
		DocumentationRegistry::load_from_str(&content).with_context(|| {
			format!("failed to load '{}'", path.to_string_lossy())
		})
	}

	pub fn function(&self, function_name: &str) -> Option<&FunctionDocumentation>
	{
		self.functions.get(function_name)
	}

	pub fn len(&self) -> usize
	{
		self.functions.len()
	}

	pub fn is_empty(&self) -> bool
	{
		self.functions.is_empty()
	}
}

impl Documentation for DocumentationRegistry
{
	fn is_loaded(&self) -> bool
	{
		self.is_loaded
	}

	fn is_valid_parameter(&self, function_name: &str, parameter_name: &str)
		-> bool
	{
		match self.function(function_name)
		{
			Some(function) => function
				.parameters
				.iter()
				.any(|parameter| parameter.name == parameter_name),
			None => false,
		}
	}

	fn parameters_of(&self, function_name: &str) -> Option<Vec<&str>>
	{
		let function = self.function(function_name)?;
		let names = function
			.parameters
			.iter()
			.map(|parameter| parameter.name.as_str())
			.collect();
		Some(names)
	}

	fn signature(&self, function_name: &str) -> Option<Signature>
	{
		let function = self.function(function_name)?;
		let parameters = function
			.parameters
			.iter()
			.map(|parameter| {
				let value_type: ValueType =
					parameter.value_type.as_deref()?.parse().ok()?;
				Some(ParameterDescriptor {
					name: parameter.name.clone(),
					value_type,
					is_required: parameter.required,
				})
			})
			.collect::<Option<Vec<ParameterDescriptor>>>()?;
		Some(Signature {
			name: function.name.clone(),
			parameters,
		})
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	use pretty_assertions::assert_eq;

	#[test]
	fn load_flat_definitions()
	{
		let json = r#"{
			"errorCodeDefinitions": {
				"SHORT_TITLE_TOO_LONG": { "maxLength": 12, "description": "x" },
				"INVALID_PRECISION": { "enabled": false },
				"INVALID_MAX_BARS_BACK": "on"
			}
		}"#;
		let registry = RuleRegistry::load_from_str(json).unwrap();
		assert_eq!(registry.len(), 3);
		assert!(registry.defines("SHORT_TITLE_TOO_LONG"));
		assert!(!registry.defines("INVALID_PRECISION"));
		assert!(registry.defines("INVALID_MAX_BARS_BACK"));
		assert_eq!(
			registry
				.definition("SHORT_TITLE_TOO_LONG")
				.and_then(|x| x.max_length),
			Some(12)
		);
	}

	#[test]
	fn load_legacy_definitions()
	{
		let json = r#"{
			"functionValidationRules": {
				"indicator": {
					"parameters": [
						{ "name": "precision", "errorCode": "INVALID_PRECISION", "max": 6 },
						{ "name": "shorttitle", "errorCode": "SHORT_TITLE_TOO_LONG" }
					]
				}
			}
		}"#;
		let registry = RuleRegistry::load_from_str(json).unwrap();
		let codes: Vec<&str> = registry.codes().collect();
		assert_eq!(codes, vec!["INVALID_PRECISION", "SHORT_TITLE_TOO_LONG"]);
		assert_eq!(
			registry.definition("INVALID_PRECISION").and_then(|x| x.max),
			Some(6.0)
		);
	}

	#[test]
	fn reject_registry_without_rules()
	{
		assert!(RuleRegistry::load_from_str("{}").is_err());
		assert!(RuleRegistry::load_from_str("[").is_err());
	}

	#[test]
	fn query_documentation()
	{
		let json = r#"{
			"functions": [
				{
					"name": "ta.sma",
					"parameters": [
						{ "name": "source", "type": "series int/float", "required": true },
						{ "name": "length", "type": "series int", "required": true }
					]
				},
				{
					"name": "box.new",
					"parameters": [ { "name": "border_color", "type": "series color" } ]
				}
			]
		}"#;
		let registry = DocumentationRegistry::load_from_str(json).unwrap();
		assert!(registry.is_loaded());
		assert!(registry.is_valid_parameter("ta.sma", "length"));
		assert!(!registry.is_valid_parameter("ta.sma", "len"));
		assert_eq!(registry.parameters_of("box.new"), Some(vec!["border_color"]));
		let signature = registry.signature("ta.sma").unwrap();
		assert_eq!(signature.required_count(), 2);
		assert!(registry.signature("box.new").is_none());
	}

	#[test]
	fn unloaded_documentation_knows_nothing()
	{
		let registry = DocumentationRegistry::default();
		assert!(!registry.is_loaded());
		assert!(!registry.is_valid_parameter("ta.sma", "length"));
		assert_eq!(registry.parameters_of("ta.sma"), None);
	}
}
