//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

//! The parser takes lexed tokens and builds an approximate AST.
//!
//! It never fails: malformed input is recorded as a ParseError together
//! with the recovery that was applied, and parsing continues. Only the
//! recovery budget can stop it early.

use crate::common::*;
use crate::error::{ParseError, ParseErrorCode, RecoveryStrategy, Severity};
use crate::lexer::{self, LexedToken, Token};

use std::collections::VecDeque;
use std::time::Instant;

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_RECOVERY_ATTEMPTS: usize = 10;
pub const MAX_NESTING_DEPTH: usize = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ParserOptions
{
	pub max_recovery_attempts: usize,
}

impl Default for ParserOptions
{
	fn default() -> ParserOptions
	{
		ParserOptions {
			max_recovery_attempts: DEFAULT_MAX_RECOVERY_ATTEMPTS,
		}
	}
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseMetrics
{
	pub token_count: usize,
	pub node_count: usize,
	pub recovery_attempts: usize,
	pub parse_time_ms: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Parsed
{
	pub program: Program,
	pub errors: Vec<ParseError>,
	pub warnings: Vec<ParseError>,
	pub metrics: ParseMetrics,
}

impl Parsed
{
	pub fn is_halted(&self) -> bool
	{
		self.errors
			.iter()
			.any(|error| error.code == ParseErrorCode::ParseTimeout)
	}
}

pub fn parse(source: &str, source_filename: &str) -> Parsed
{
	parse_with_options(source, source_filename, &ParserOptions::default())
}

pub fn parse_with_options(
	source: &str,
	source_filename: &str,
	options: &ParserOptions,
) -> Parsed
{
	let start = Instant::now();
	let tokens = lexer::lex(source, source_filename);
	let mut parsed = parse_tokens(tokens, options);
	parsed.metrics.parse_time_ms = elapsed_ms(start);
	debug!(
		"parsed {} nodes from {} tokens with {} errors in {:.3}ms",
		parsed.metrics.node_count,
		parsed.metrics.token_count,
		parsed.errors.len(),
		parsed.metrics.parse_time_ms
	);
	parsed
}

pub fn parse_tokens(tokens: Vec<LexedToken>, options: &ParserOptions) -> Parsed
{
	let token_count = tokens.len();
	let first_location = tokens.first().map(|token| token.location.clone());
	let mut parser = Parser::new(tokens, options);
	let mut nodes = Vec::new();
	loop
	{
		if parser.is_halted
		{
			break;
		}
		match parser.tokens.peek()
		{
			None | Some(Token::EndOfFile) => break,
			Some(Token::Newline) | Some(Token::Indent) | Some(Token::Dedent) =>
			{
				parser.tokens.pop_front();
			}
			Some(_) => parser.parse_statement(&mut nodes),
		}
	}
	let location = first_location
		.map(|location| location.combined_with(&parser.tokens.last_location));
	let metrics = ParseMetrics {
		token_count,
		node_count: nodes.len(),
		recovery_attempts: parser.recovery_attempts,
		parse_time_ms: 0.0,
	};
	Parsed {
		program: Program { nodes, location },
		errors: parser.errors,
		warnings: parser.warnings,
		metrics,
	}
}

/// Collects only the function calls in the source, outermost first, with
/// their arguments resolved. Declarations and parse errors are ignored.
pub fn extract_function_parameters(
	source: &str,
	source_filename: &str,
) -> Vec<FunctionCall>
{
	let tokens = lexer::lex(source, source_filename);
	let mut parser = Parser::new(tokens, &ParserOptions::default());
	let mut calls = Vec::new();
	loop
	{
		if parser.is_halted
		{
			break;
		}
		match parser.tokens.peek()
		{
			None | Some(Token::EndOfFile) => break,
			Some(Token::Identifier(_))
				if parser.is_function_definition_ahead() =>
			{
				parser.skip_function_head();
			}
			Some(Token::Identifier(_)) if parser.is_call_ahead() =>
			{
				let mut nested = Vec::new();
				let call = parser.parse_call(&mut nested);
				calls.push(call);
				calls.append(&mut nested);
			}
			Some(_) =>
			{
				parser.tokens.pop_front();
			}
		}
	}
	calls
}

pub(crate) fn elapsed_ms(start: Instant) -> f64
{
	start.elapsed().as_secs_f64() * 1000.0
}

struct Tokens
{
	tokens: VecDeque<LexedToken>,
	last_location: Location,
}

impl Tokens
{
	fn pop_front(&mut self) -> Option<LexedToken>
	{
		let popped = self.tokens.pop_front();
		match &popped
		{
			Some(LexedToken {
				result: _,
				location,
			}) =>
			{
				self.last_location = location.clone();
			}
			None => (),
		}
		popped
	}

	fn peek(&self) -> Option<&Token>
	{
		self.peek_nth(0)
	}

	fn peek_nth(&self, n: usize) -> Option<&Token>
	{
		match self.tokens.get(n)
		{
			Some(LexedToken {
				result: Ok(token),
				location: _,
			}) => Some(token),
			Some(LexedToken {
				result: Err(_),
				location: _,
			}) => None,
			None => None,
		}
	}

	fn location_nth(&self, n: usize) -> Option<&Location>
	{
		self.tokens.get(n).map(|token| &token.location)
	}

	fn start_location_span(&self) -> Option<Location>
	{
		self.location_nth(0).cloned()
	}

	fn location_of_span(&self, start: Option<Location>) -> Location
	{
		match start
		{
			Some(location) => location.combined_with(&self.last_location),
			None => self.last_location.clone(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context
{
	Statement,
	Arguments,
}

struct Parser
{
	tokens: Tokens,
	errors: Vec<ParseError>,
	warnings: Vec<ParseError>,
	recovery_attempts: usize,
	max_recovery_attempts: usize,
	is_halted: bool,
	depth: usize,
}

impl Parser
{
	fn new(tokens: Vec<LexedToken>, options: &ParserOptions) -> Parser
	{
		let last_location = match tokens.first()
		{
			Some(token) => token.location.clone(),
			None => Location {
				source_filename: String::new(),
				span: 0..0,
				line_number: 1,
				line_offset: 0,
			},
		};
		let mut errors = Vec::new();
		let mut kept = VecDeque::with_capacity(tokens.len());
		for token in tokens
		{
			match token.result
			{
				Ok(Token::Comment(_)) => (),
				Ok(_) => kept.push_back(token),
				Err(error) =>
				{
					errors.push(ParseError::new(
						ParseErrorCode::LexicalError,
						Severity::Error,
						token.location,
						error.to_string(),
						RecoveryStrategy::SkipToken,
					));
				}
			}
		}
		Parser {
			tokens: Tokens {
				tokens: kept,
				last_location,
			},
			errors,
			warnings: Vec::new(),
			recovery_attempts: 0,
			max_recovery_attempts: options.max_recovery_attempts,
			is_halted: false,
			depth: 0,
		}
	}

	fn current_location(&self) -> Location
	{
		match self.tokens.start_location_span()
		{
			Some(location) => location,
			None => self.tokens.last_location.clone(),
		}
	}

	fn record(
		&mut self,
		code: ParseErrorCode,
		severity: Severity,
		message: &str,
		recovery: RecoveryStrategy,
	)
	{
		if self.is_halted
		{
			return;
		}
		let location = self.current_location();
		trace!("{} {} ({})", code, location.format(), recovery);
		let error = ParseError::new(
			code,
			severity,
			location.clone(),
			message.to_string(),
			recovery,
		);
		if severity == Severity::Warning
		{
			self.warnings.push(error);
			return;
		}
		self.errors.push(error);
		self.recovery_attempts += 1;
		if self.recovery_attempts > self.max_recovery_attempts
		{
			warn!(
				"giving up after {} recovery attempts {}",
				self.max_recovery_attempts,
				location.format()
			);
			self.errors.push(ParseError::new(
				ParseErrorCode::ParseTimeout,
				Severity::Critical,
				location,
				format!(
					"Parsing stopped after {} recovery attempts",
					self.max_recovery_attempts
				),
				RecoveryStrategy::Halt,
			));
			self.is_halted = true;
		}
	}

	fn parse_statement(&mut self, nodes: &mut Vec<Node>)
	{
		let mut calls = Vec::new();
		match self.tokens.peek()
		{
			Some(Token::Type) | Some(Token::Enum) => self.skip_definition_block(),
			Some(Token::Import) => self.skip_line(),
			Some(Token::Export) | Some(Token::Method) =>
			{
				self.tokens.pop_front();
			}
			Some(Token::Var) | Some(Token::Varip) =>
			{
				self.parse_declaration(nodes, &mut calls)
			}
			Some(Token::Identifier(_)) if self.is_function_definition_ahead() =>
			{
				self.skip_function_head()
			}
			Some(Token::Identifier(_)) if self.declaration_shape().is_some() =>
			{
				self.parse_declaration(nodes, &mut calls)
			}
			Some(_) => self.scan_line(&mut calls),
			None => (),
		}
		nodes.extend(calls.into_iter().map(Node::FunctionCall));
	}

	fn parse_declaration(
		&mut self,
		nodes: &mut Vec<Node>,
		calls: &mut Vec<FunctionCall>,
	)
	{
		let start = self.tokens.start_location_span();
		let is_var = match self.tokens.peek()
		{
			Some(Token::Var) | Some(Token::Varip) =>
			{
				self.tokens.pop_front();
				true
			}
			_ => false,
		};
		let name_index = match self.declaration_shape()
		{
			Some(name_index) => name_index,
			None =>
			{
				self.record(
					ParseErrorCode::UnexpectedToken,
					Severity::Error,
					"Expected a variable declaration",
					RecoveryStrategy::SkipToNewline,
				);
				self.skip_line();
				return;
			}
		};
		let type_name = match name_index
		{
			0 => None,
			n => Some(self.type_name_text(n)),
		};
		for _ in 0..name_index
		{
			self.tokens.pop_front();
		}
		let name = match self.tokens.pop_front()
		{
			Some(LexedToken {
				result: Ok(Token::Identifier(name)),
				location,
			}) => Identifier { name, location },
			_ => return,
		};
		let is_reassignment = match self.tokens.pop_front()
		{
			Some(LexedToken {
				result: Ok(Token::Assignment),
				location: _,
			}) => false,
			_ => true,
		};
		let value = match self.tokens.peek()
		{
			Some(Token::If) | Some(Token::Switch) => None,
			None
			| Some(Token::Newline)
			| Some(Token::Indent)
			| Some(Token::Dedent)
			| Some(Token::EndOfFile) =>
			{
				self.record(
					ParseErrorCode::MissingValue,
					Severity::Error,
					"Expected a value after the assignment",
					RecoveryStrategy::SkipToNewline,
				);
				None
			}
			Some(_) => match self.parse_expression(Context::Statement, calls)
			{
				Some((value, false)) => Some(value),
				Some((Value::FunctionCall(call), true)) =>
				{
					calls.insert(0, *call);
					None
				}
				Some((_, true)) => None,
				None =>
				{
					self.record(
						ParseErrorCode::MissingValue,
						Severity::Error,
						"Expected a value after the assignment",
						RecoveryStrategy::SkipToNewline,
					);
					self.skip_line();
					None
				}
			},
		};
		self.scan_line(calls);
		let location = self.tokens.location_of_span(start);
		nodes.push(Node::Declaration(Declaration {
			name,
			type_name,
			is_var,
			is_reassignment,
			value,
			location,
		}));
	}

	/// Collects the outermost calls up to the end of the logical line.
	fn scan_line(&mut self, calls: &mut Vec<FunctionCall>)
	{
		let mut depth = 0usize;
		loop
		{
			if self.is_halted
			{
				break;
			}
			match self.tokens.peek()
			{
				None | Some(Token::EndOfFile) => break,
				Some(Token::Newline) | Some(Token::Indent) | Some(Token::Dedent)
					if depth == 0 =>
				{
					break
				}
				Some(Token::Identifier(_)) if self.is_call_ahead() =>
				{
					let mut nested = Vec::new();
					let call = self.parse_call(&mut nested);
					calls.push(call);
					calls.append(&mut nested);
				}
				Some(Token::ParenLeft) | Some(Token::BracketLeft) =>
				{
					depth += 1;
					self.tokens.pop_front();
				}
				Some(Token::ParenRight) | Some(Token::BracketRight)
					if depth == 0 =>
				{
					self.record(
						ParseErrorCode::UnexpectedToken,
						Severity::Error,
						"Unmatched closing bracket",
						RecoveryStrategy::SkipToken,
					);
					self.tokens.pop_front();
				}
				Some(Token::ParenRight) | Some(Token::BracketRight) =>
				{
					depth -= 1;
					self.tokens.pop_front();
				}
				Some(_) =>
				{
					self.tokens.pop_front();
				}
			}
		}
	}

	fn skip_line(&mut self)
	{
		loop
		{
			match self.tokens.peek()
			{
				None | Some(Token::EndOfFile) | Some(Token::Newline) => break,
				Some(_) =>
				{
					self.tokens.pop_front();
				}
			}
		}
	}

	/// Skips a `type` or `enum` header together with its indented body.
	fn skip_definition_block(&mut self)
	{
		self.skip_line();
		let mut n = 0;
		while let Some(Token::Newline) = self.tokens.peek_nth(n)
		{
			n += 1;
		}
		match self.tokens.peek_nth(n)
		{
			Some(Token::Indent) => (),
			_ => return,
		}
		for _ in 0..=n
		{
			self.tokens.pop_front();
		}
		let mut depth = 1usize;
		loop
		{
			match self.tokens.peek()
			{
				None | Some(Token::EndOfFile) => break,
				Some(Token::Indent) => depth += 1,
				Some(Token::Dedent) if depth == 1 =>
				{
					self.tokens.pop_front();
					break;
				}
				Some(Token::Dedent) => depth -= 1,
				Some(_) => (),
			}
			self.tokens.pop_front();
		}
	}

	/// Skips `f(x, y) =>`; the body is parsed as ordinary statements.
	fn skip_function_head(&mut self)
	{
		loop
		{
			match self.tokens.pop_front()
			{
				None => break,
				Some(LexedToken {
					result: Ok(Token::Arrow),
					location: _,
				}) => break,
				Some(LexedToken {
					result: Ok(Token::EndOfFile),
					location: _,
				}) => break,
				Some(_) => (),
			}
		}
	}

	fn parse_expression(
		&mut self,
		context: Context,
		calls: &mut Vec<FunctionCall>,
	) -> Option<(Value, bool)>
	{
		let (value, is_compound) = self.parse_primary(calls)?;
		let has_tail = self.skip_expression_tail(context, calls);
		Some((value, is_compound || has_tail))
	}

	fn parse_primary(
		&mut self,
		calls: &mut Vec<FunctionCall>,
	) -> Option<(Value, bool)>
	{
		let start = self.tokens.start_location_span();
		let token = self.tokens.peek()?.clone();
		let (value, is_compound) = match token
		{
			Token::Number(raw) =>
			{
				self.tokens.pop_front();
				let location = self.tokens.location_of_span(start);
				(literal(LiteralKind::Number, raw, location), false)
			}
			Token::StringLiteral(raw) =>
			{
				self.tokens.pop_front();
				let location = self.tokens.location_of_span(start);
				(literal(LiteralKind::String, raw, location), false)
			}
			Token::Bool(x) =>
			{
				self.tokens.pop_front();
				let location = self.tokens.location_of_span(start);
				(literal(LiteralKind::Boolean, x.to_string(), location), false)
			}
			Token::Color(raw) =>
			{
				self.tokens.pop_front();
				let location = self.tokens.location_of_span(start);
				(literal(LiteralKind::Color, raw, location), false)
			}
			Token::Identifier(_) if self.is_call_ahead() =>
			{
				let call = self.parse_call(calls);
				(Value::FunctionCall(Box::new(call)), false)
			}
			Token::Identifier(_) =>
			{
				let name = self.parse_name_chain();
				let location = self.tokens.location_of_span(start);
				if is_color_constant(&name)
				{
					(literal(LiteralKind::Color, name, location), false)
				}
				else
				{
					(Value::Identifier(Identifier { name, location }), false)
				}
			}
			Token::ParenLeft =>
			{
				if !self.enter()
				{
					return None;
				}
				self.tokens.pop_front();
				let inner = self.parse_expression(Context::Arguments, calls);
				match self.tokens.peek()
				{
					Some(Token::ParenRight) =>
					{
						self.tokens.pop_front();
					}
					_ => self.record(
						ParseErrorCode::MissingClosingParen,
						Severity::Error,
						"Expected ')'",
						RecoveryStrategy::InsertMissingToken,
					),
				}
				self.depth -= 1;
				inner?
			}
			Token::Minus | Token::Plus | Token::Not =>
			{
				self.tokens.pop_front();
				let (value, _) = self.parse_primary(calls)?;
				(value, true)
			}
			Token::BracketLeft =>
			{
				self.skip_brackets();
				let location = self.tokens.location_of_span(start);
				let name = "[]".to_string();
				(Value::Identifier(Identifier { name, location }), true)
			}
			_ => return None,
		};
		if let Some(Token::BracketLeft) = self.tokens.peek()
		{
			self.skip_brackets();
		}
		Some((value, is_compound))
	}

	/// Consumes the operators and operands that follow a primary value and
	/// returns whether there were any. Calls found along the way are
	/// collected.
	fn skip_expression_tail(
		&mut self,
		context: Context,
		calls: &mut Vec<FunctionCall>,
	) -> bool
	{
		let mut depth = 0usize;
		let mut consumed = false;
		loop
		{
			if self.is_halted
			{
				break;
			}
			match self.tokens.peek()
			{
				None | Some(Token::EndOfFile) => break,
				Some(Token::Newline) | Some(Token::Indent) | Some(Token::Dedent) =>
				{
					if (context == Context::Statement && depth == 0)
						|| self.next_is_interruption()
					{
						break;
					}
					self.tokens.pop_front();
					continue;
				}
				Some(Token::Comma)
				| Some(Token::Assignment)
				| Some(Token::Arrow)
					if depth == 0 && context == Context::Arguments =>
				{
					break
				}
				Some(Token::ParenRight) | Some(Token::BracketRight)
					if depth == 0 =>
				{
					break
				}
				Some(Token::ParenLeft) | Some(Token::BracketLeft) =>
				{
					depth += 1;
					self.tokens.pop_front();
				}
				Some(Token::ParenRight) | Some(Token::BracketRight) =>
				{
					depth -= 1;
					self.tokens.pop_front();
				}
				Some(Token::Identifier(_)) if self.is_call_ahead() =>
				{
					let mut nested = Vec::new();
					let call = self.parse_call(&mut nested);
					calls.push(call);
					calls.append(&mut nested);
				}
				Some(_) =>
				{
					self.tokens.pop_front();
				}
			}
			consumed = true;
		}
		consumed
	}

	fn parse_call(&mut self, calls: &mut Vec<FunctionCall>) -> FunctionCall
	{
		let start = self.tokens.start_location_span();
		let name = self.parse_name_chain();
		let end = self.generic_arguments_end(0);
		for _ in 0..end
		{
			self.tokens.pop_front();
		}
		// The opening parenthesis.
		self.tokens.pop_front();
		let parameters = if self.enter()
		{
			let parameters = self.parse_arguments(calls);
			self.depth -= 1;
			parameters
		}
		else
		{
			self.skip_to_closing_paren();
			Vec::new()
		};
		let location = self.tokens.location_of_span(start);
		FunctionCall::new(name, parameters, location)
	}

	fn parse_arguments(&mut self, calls: &mut Vec<FunctionCall>)
		-> Vec<Parameter>
	{
		let mut parameters = Vec::new();
		let mut has_named = false;
		let mut after_comma = false;
		loop
		{
			if self.is_halted
			{
				break;
			}
			if self.skip_continuation()
			{
				self.record(
					ParseErrorCode::MissingClosingParen,
					Severity::Error,
					"Expected ')' before the next statement",
					RecoveryStrategy::InsertMissingToken,
				);
				break;
			}
			match self.tokens.peek()
			{
				Some(Token::ParenRight) =>
				{
					if after_comma
					{
						self.record(
							ParseErrorCode::TrailingComma,
							Severity::Warning,
							"Trailing comma in argument list",
							RecoveryStrategy::ContinueParsing,
						);
					}
					self.tokens.pop_front();
					break;
				}
				None | Some(Token::EndOfFile) =>
				{
					self.record(
						ParseErrorCode::UnexpectedEndOfFile,
						Severity::Error,
						"Expected ')' before the end of the file",
						RecoveryStrategy::InsertMissingToken,
					);
					break;
				}
				Some(Token::Comma) =>
				{
					self.record(
						ParseErrorCode::MissingValue,
						Severity::Error,
						"Expected an argument before ','",
						RecoveryStrategy::SkipToken,
					);
					self.tokens.pop_front();
					after_comma = true;
					continue;
				}
				Some(_) => (),
			}
			after_comma = false;

			let start = self.tokens.start_location_span();
			let name = self.parse_argument_name();
			match name
			{
				Some(_) => has_named = true,
				None if has_named => self.record(
					ParseErrorCode::PositionalAfterNamed,
					Severity::Error,
					"Positional argument after a named argument",
					RecoveryStrategy::ContinueParsing,
				),
				None => (),
			}
			match self.parse_expression(Context::Arguments, calls)
			{
				Some((value, is_expression)) =>
				{
					let position = parameters.len();
					let location = self.tokens.location_of_span(start);
					parameters.push(Parameter {
						name,
						value,
						position,
						is_expression,
						location,
					});
				}
				None =>
				{
					self.record(
						ParseErrorCode::MissingValue,
						Severity::Error,
						"Expected an argument value",
						RecoveryStrategy::SkipToken,
					);
					match self.tokens.peek()
					{
						None
						| Some(Token::Comma)
						| Some(Token::ParenRight)
						| Some(Token::Newline)
						| Some(Token::Indent)
						| Some(Token::Dedent)
						| Some(Token::EndOfFile) => (),
						Some(_) =>
						{
							self.tokens.pop_front();
						}
					}
				}
			}

			if self.skip_continuation()
			{
				continue;
			}
			match self.tokens.peek()
			{
				Some(Token::Comma) =>
				{
					self.tokens.pop_front();
					after_comma = true;
				}
				None | Some(Token::ParenRight) | Some(Token::EndOfFile) => (),
				Some(_) =>
				{
					self.record(
						ParseErrorCode::UnexpectedToken,
						Severity::Error,
						"Expected ',' or ')'",
						RecoveryStrategy::SkipToClosingParen,
					);
					self.skip_to_closing_paren();
					break;
				}
			}
		}
		parameters
	}

	fn parse_argument_name(&mut self) -> Option<Identifier>
	{
		match (self.tokens.peek_nth(0), self.tokens.peek_nth(1))
		{
			(Some(Token::Identifier(_)), Some(Token::Assignment)) => (),
			_ => return None,
		}
		match self.tokens.pop_front()
		{
			Some(LexedToken {
				result: Ok(Token::Identifier(name)),
				location,
			}) =>
			{
				self.tokens.pop_front();
				Some(Identifier { name, location })
			}
			_ => None,
		}
	}

	fn parse_name_chain(&mut self) -> String
	{
		let mut name = String::new();
		loop
		{
			match self.tokens.peek().cloned()
			{
				Some(Token::Identifier(x)) =>
				{
					self.tokens.pop_front();
					name.push_str(&x);
				}
				_ => break,
			}
			match (self.tokens.peek_nth(0), self.tokens.peek_nth(1))
			{
				(Some(Token::Dot), Some(Token::Identifier(_))) =>
				{
					self.tokens.pop_front();
					name.push('.');
				}
				_ => break,
			}
		}
		name
	}

	/// Returns false once nesting is too deep to continue safely.
	fn enter(&mut self) -> bool
	{
		if self.depth >= MAX_NESTING_DEPTH
		{
			self.record(
				ParseErrorCode::UnexpectedToken,
				Severity::Error,
				"Expression is nested too deeply",
				RecoveryStrategy::SkipToClosingParen,
			);
			false
		}
		else
		{
			self.depth += 1;
			true
		}
	}

	/// Consumes line breaks inside an argument list, unless the next line
	/// starts at column zero, in which case it returns true and consumes
	/// nothing.
	fn skip_continuation(&mut self) -> bool
	{
		if self.next_is_interruption()
		{
			return true;
		}
		while let Some(Token::Newline)
		| Some(Token::Indent)
		| Some(Token::Dedent) = self.tokens.peek()
		{
			self.tokens.pop_front();
		}
		false
	}

	fn next_is_interruption(&self) -> bool
	{
		let mut has_line_break = false;
		let mut n = 0;
		loop
		{
			match self.tokens.peek_nth(n)
			{
				Some(Token::Newline) => has_line_break = true,
				Some(Token::Indent) | Some(Token::Dedent) => (),
				None | Some(Token::EndOfFile) | Some(Token::ParenRight) =>
				{
					return false
				}
				Some(_) =>
				{
					return has_line_break
						&& self
							.tokens
							.location_nth(n)
							.map_or(false, |x| x.line_offset == 0)
				}
			}
			n += 1;
		}
	}

	fn skip_to_closing_paren(&mut self)
	{
		let mut depth = 0usize;
		loop
		{
			if self.next_is_interruption()
			{
				break;
			}
			match self.tokens.peek()
			{
				None | Some(Token::EndOfFile) => break,
				Some(Token::ParenLeft) => depth += 1,
				Some(Token::ParenRight) if depth == 0 =>
				{
					self.tokens.pop_front();
					break;
				}
				Some(Token::ParenRight) => depth -= 1,
				Some(_) => (),
			}
			self.tokens.pop_front();
		}
	}

	fn skip_brackets(&mut self)
	{
		let mut depth = 0usize;
		loop
		{
			match self.tokens.peek()
			{
				None | Some(Token::EndOfFile) => break,
				Some(Token::BracketLeft) => depth += 1,
				Some(Token::BracketRight) if depth <= 1 =>
				{
					self.tokens.pop_front();
					break;
				}
				Some(Token::BracketRight) => depth -= 1,
				Some(_) => (),
			}
			self.tokens.pop_front();
		}
	}

	/// The index just past an `a.b.c` chain starting at `n`.
	fn name_chain_end(&self, n: usize) -> Option<usize>
	{
		match self.tokens.peek_nth(n)
		{
			Some(Token::Identifier(_)) => (),
			_ => return None,
		}
		let mut end = n + 1;
		loop
		{
			match (self.tokens.peek_nth(end), self.tokens.peek_nth(end + 1))
			{
				(Some(Token::Dot), Some(Token::Identifier(_))) => end += 2,
				_ => return Some(end),
			}
		}
	}

	/// The index just past a generic argument list such as `<float>`, or
	/// `n` itself if there is none.
	fn generic_arguments_end(&self, n: usize) -> usize
	{
		match self.tokens.peek_nth(n)
		{
			Some(Token::Less) => (),
			_ => return n,
		}
		let mut end = n + 1;
		loop
		{
			match self.tokens.peek_nth(end)
			{
				Some(Token::Greater) => return end + 1,
				Some(Token::Identifier(_)) | Some(Token::Dot) | Some(Token::Comma) =>
				{
					end += 1
				}
				_ => return n,
			}
		}
	}

	fn is_call_ahead(&self) -> bool
	{
		match self.name_chain_end(0)
		{
			Some(end) =>
			{
				let end = self.generic_arguments_end(end);
				self.tokens.peek_nth(end) == Some(&Token::ParenLeft)
			}
			None => false,
		}
	}

	fn is_function_definition_ahead(&self) -> bool
	{
		let mut n = match self.name_chain_end(0)
		{
			Some(end) => end,
			None => return false,
		};
		if self.tokens.peek_nth(n) != Some(&Token::ParenLeft)
		{
			return false;
		}
		let mut depth = 0usize;
		loop
		{
			match self.tokens.peek_nth(n)
			{
				None | Some(Token::EndOfFile) => return false,
				Some(Token::ParenLeft) => depth += 1,
				Some(Token::ParenRight) =>
				{
					depth -= 1;
					if depth == 0
					{
						return self.tokens.peek_nth(n + 1) == Some(&Token::Arrow);
					}
				}
				Some(_) => (),
			}
			n += 1;
		}
	}

	/// Recognizes `name =`, `name :=`, `name += ...` and `Type name =`,
	/// returning the index of the declared name.
	fn declaration_shape(&self) -> Option<usize>
	{
		let end = self.name_chain_end(0)?;
		if is_assignment_operator(self.tokens.peek_nth(end))
		{
			return match end
			{
				1 => Some(0),
				_ => None,
			};
		}
		let mut end = self.generic_arguments_end(end);
		match (self.tokens.peek_nth(end), self.tokens.peek_nth(end + 1))
		{
			(Some(Token::BracketLeft), Some(Token::BracketRight)) => end += 2,
			_ => (),
		}
		match (self.tokens.peek_nth(end), self.tokens.peek_nth(end + 1))
		{
			(Some(Token::Identifier(_)), Some(Token::Assignment))
			| (Some(Token::Identifier(_)), Some(Token::Reassignment)) =>
			{
				Some(end)
			}
			_ => None,
		}
	}

	fn type_name_text(&self, end: usize) -> String
	{
		(0..end)
			.filter_map(|n| self.tokens.peek_nth(n))
			.map(|token| match token
			{
				Token::Identifier(x) => x.as_str(),
				Token::Dot => ".",
				Token::Less => "<",
				Token::Greater => ">",
				Token::Comma => ",",
				Token::BracketLeft => "[",
				Token::BracketRight => "]",
				_ => "",
			})
			.collect()
	}
}

fn literal(kind: LiteralKind, raw: String, location: Location) -> Value
{
	Value::Literal(Literal {
		kind,
		raw,
		location,
	})
}

fn is_color_constant(name: &str) -> bool
{
	match name.split_once('.')
	{
		Some(("color", member)) => !member.contains('.'),
		_ => false,
	}
}

fn is_assignment_operator(token: Option<&Token>) -> bool
{
	match token
	{
		Some(Token::Assignment)
		| Some(Token::Reassignment)
		| Some(Token::PlusAssign)
		| Some(Token::MinusAssign)
		| Some(Token::TimesAssign)
		| Some(Token::DivideAssign)
		| Some(Token::ModuloAssign) => true,
		_ => false,
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	use pretty_assertions::assert_eq;

	fn codes(errors: &[ParseError]) -> Vec<ParseErrorCode>
	{
		errors.iter().map(|error| error.code).collect()
	}

	#[test]
	fn parse_named_and_positional_arguments()
	{
		let parsed = parse("plot(ta.sma(close, 14), title = \"SMA\")\n", "t");
		assert_eq!(codes(&parsed.errors), vec![]);
		let calls = parsed.program.function_calls();
		assert_eq!(calls.len(), 1);
		let plot = calls[0];
		assert_eq!(plot.name, "plot");
		assert_eq!(plot.parameters.len(), 2);
		assert!(plot.named_parameter("title").is_some());
		match &plot.parameters[0].value
		{
			Value::FunctionCall(call) =>
			{
				assert_eq!(call.name, "ta.sma");
				assert_eq!(call.namespace.as_deref(), Some("ta"));
				assert_eq!(call.parameters.len(), 2);
			}
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn parse_declarations()
	{
		let source = "var MyType o = na\nlen := 3\nx = close - open\n";
		let parsed = parse(source, "t");
		assert_eq!(codes(&parsed.errors), vec![]);
		let declarations: Vec<&Declaration> =
			parsed.program.declarations().collect();
		assert_eq!(declarations.len(), 3);
		assert!(declarations[0].is_var);
		assert_eq!(declarations[0].type_name.as_deref(), Some("MyType"));
		assert_eq!(declarations[0].name.name, "o");
		assert!(declarations[1].is_reassignment);
		assert!(declarations[2].value.is_none());
	}

	#[test]
	fn expression_arguments_are_marked()
	{
		let parsed = parse("plot(close - open, color = color.red)\n", "t");
		let plot = parsed.program.function_calls()[0];
		assert!(plot.parameters[0].is_expression);
		match &plot.parameters[1].value
		{
			Value::Literal(literal) =>
			{
				assert_eq!(literal.kind, LiteralKind::Color)
			}
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn multiline_arguments_continue()
	{
		let source = "indicator(\"Test\",\n    overlay = true,\n    precision = 2)\n";
		let parsed = parse(source, "t");
		assert_eq!(codes(&parsed.errors), vec![]);
		let call = parsed.program.function_calls()[0];
		assert_eq!(call.parameters.len(), 3);
	}

	#[test]
	fn missing_paren_before_new_statement()
	{
		let parsed = parse("plot(close,\nx = 1\n", "t");
		assert_eq!(
			codes(&parsed.errors),
			vec![ParseErrorCode::MissingClosingParen]
		);
		assert_eq!(
			parsed.errors[0].recovery,
			RecoveryStrategy::InsertMissingToken
		);
		assert_eq!(parsed.program.declarations().count(), 1);
	}

	#[test]
	fn trailing_comma_is_a_warning()
	{
		let parsed = parse("plot(close, )\n", "t");
		assert_eq!(codes(&parsed.errors), vec![]);
		assert_eq!(codes(&parsed.warnings), vec![ParseErrorCode::TrailingComma]);
	}

	#[test]
	fn positional_after_named_is_an_error()
	{
		let parsed = parse("plot(series = close, 1)\n", "t");
		assert_eq!(
			codes(&parsed.errors),
			vec![ParseErrorCode::PositionalAfterNamed]
		);
	}

	#[test]
	fn recovery_budget_halts_parsing()
	{
		let source = "f(,)\n".repeat(20);
		let parsed = parse(&source, "t");
		assert!(parsed.is_halted());
		let last = parsed.errors.last().map(|x| (x.code, x.severity));
		assert_eq!(
			last,
			Some((ParseErrorCode::ParseTimeout, Severity::Critical))
		);
		assert_eq!(parsed.metrics.recovery_attempts, 11);
	}

	#[test]
	fn lexical_errors_are_collected()
	{
		let parsed = parse("x = \"abc\nplot(x)\n", "t");
		assert_eq!(codes(&parsed.errors)[0], ParseErrorCode::LexicalError);
		assert_eq!(parsed.program.function_calls().len(), 1);
	}

	#[test]
	fn type_blocks_and_definitions_are_skipped()
	{
		let source = "type Point\n    float x = 0.0\n    float y\n\n\
		              f(a, b) =>\n    a + ta.sma(b, 3)\nplot(f(1, 2))\n";
		let parsed = parse(source, "t");
		assert_eq!(codes(&parsed.errors), vec![]);
		assert_eq!(parsed.program.declarations().count(), 0);
		let names: Vec<&str> = parsed
			.program
			.function_calls()
			.into_iter()
			.map(|x| x.name.as_str())
			.collect();
		assert_eq!(names, vec!["ta.sma", "plot"]);
	}

	#[test]
	fn extract_calls_only()
	{
		let source = "//@version=6\nindicator(\"A\")\nx = ta.ema(close, 9)\n";
		let calls = extract_function_parameters(source, "t");
		let names: Vec<&str> = calls.iter().map(|x| x.name.as_str()).collect();
		assert_eq!(names, vec!["indicator", "ta.ema"]);
		assert_eq!(calls[1].line_number, 3);
	}

	#[test]
	fn generic_constructor_is_a_call()
	{
		let parsed = parse("a = array.new<float>(10, 0.0)\n", "t");
		let calls = parsed.program.function_calls();
		assert_eq!(calls.len(), 1);
		assert_eq!(calls[0].name, "array.new");
		assert_eq!(calls[0].parameters.len(), 2);
	}
}
