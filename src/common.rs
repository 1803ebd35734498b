//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

//! The approximate abstract syntax tree built by the parser.

pub use crate::lexer::Location;

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Program
{
	pub nodes: Vec<Node>,
	#[serde(skip)]
	pub location: Option<Location>,
}

impl Program
{
	/// All outermost function calls, including those on the right-hand side
	/// of declarations, in source order.
	pub fn function_calls(&self) -> Vec<&FunctionCall>
	{
		let mut calls = Vec::new();
		for node in &self.nodes
		{
			match node
			{
				Node::FunctionCall(call) => calls.push(call),
				Node::Declaration(Declaration {
					value: Some(Value::FunctionCall(call)),
					..
				}) => calls.push(call),
				Node::Declaration(_) => (),
				Node::Literal(_) => (),
				Node::Identifier(_) => (),
			}
		}
		calls
	}

	pub fn declarations(&self) -> impl Iterator<Item = &Declaration>
	{
		self.nodes.iter().filter_map(|node| match node
		{
			Node::Declaration(declaration) => Some(declaration),
			_ => None,
		})
	}
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Node
{
	FunctionCall(FunctionCall),
	Declaration(Declaration),
	Literal(Literal),
	Identifier(Identifier),
}

impl Node
{
	pub fn location(&self) -> &Location
	{
		match self
		{
			Node::FunctionCall(call) => &call.location,
			Node::Declaration(declaration) => &declaration.location,
			Node::Literal(literal) => &literal.location,
			Node::Identifier(identifier) => &identifier.location,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCall
{
	/// The name including its namespace, such as `ta.sma`.
	pub name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub namespace: Option<String>,
	pub parameters: Vec<Parameter>,
	#[serde(skip)]
	pub location: Location,
	#[serde(rename = "line")]
	pub line_number: usize,
}

impl FunctionCall
{
	pub fn new(
		name: String,
		parameters: Vec<Parameter>,
		location: Location,
	) -> FunctionCall
	{
		let namespace = name.rsplit_once('.').map(|(x, _)| x.to_string());
		FunctionCall {
			name,
			namespace,
			parameters,
			line_number: location.line_number,
			location,
		}
	}

	pub fn bare_name(&self) -> &str
	{
		match self.name.rsplit_once('.')
		{
			Some((_, name)) => name,
			None => &self.name,
		}
	}

	pub fn named_parameter(&self, name: &str) -> Option<&Parameter>
	{
		self.parameters.iter().find(|parameter| match &parameter.name
		{
			Some(identifier) => identifier.name == name,
			None => false,
		})
	}

	/// Visits this call and every call nested in its arguments, depth first.
	pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a FunctionCall))
	{
		visit(self);
		for parameter in &self.parameters
		{
			if let Value::FunctionCall(call) = &parameter.value
			{
				call.walk(visit);
			}
		}
	}
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter
{
	#[serde(serialize_with = "serialize_optional_identifier")]
	pub name: Option<Identifier>,
	pub value: Value,
	/// Zero-based index among all arguments of the call.
	pub position: usize,
	/// Whether the value is only the leading operand of a larger expression,
	/// such as `close` in `close - open`.
	#[serde(skip_serializing_if = "std::ops::Not::not")]
	pub is_expression: bool,
	#[serde(skip)]
	pub location: Location,
}

impl Parameter
{
	pub fn is_named(&self) -> bool
	{
		self.name.is_some()
	}
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Value
{
	Literal(Literal),
	Identifier(Identifier),
	FunctionCall(Box<FunctionCall>),
}

impl Value
{
	pub fn location(&self) -> &Location
	{
		match self
		{
			Value::Literal(literal) => &literal.location,
			Value::Identifier(identifier) => &identifier.location,
			Value::FunctionCall(call) => &call.location,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralKind
{
	String,
	Number,
	Boolean,
	Color,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Literal
{
	pub kind: LiteralKind,
	/// The literal as written, or the unescaped contents for strings.
	pub raw: String,
	#[serde(skip)]
	pub location: Location,
}

impl Literal
{
	pub fn is_integral(&self) -> bool
	{
		self.kind == LiteralKind::Number
			&& !self.raw.contains(|x| match x
			{
				'.' | 'e' | 'E' => true,
				_ => false,
			})
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct Identifier
{
	pub name: String,
	#[serde(skip)]
	pub location: Location,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration
{
	pub name: Identifier,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub type_name: Option<String>,
	pub is_var: bool,
	pub is_reassignment: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub value: Option<Value>,
	#[serde(skip)]
	pub location: Location,
}

fn serialize_optional_identifier<S>(
	identifier: &Option<Identifier>,
	serializer: S,
) -> Result<S::Ok, S::Error>
where
	S: serde::Serializer,
{
	match identifier
	{
		Some(identifier) => serializer.serialize_some(&identifier.name),
		None => serializer.serialize_none(),
	}
}
