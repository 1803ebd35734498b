//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

//! The lexer turns source text into tokens with precise source locations.
//! It never fails: malformed input becomes an error token and scanning
//! continues with the next character.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token
{
	// Single-character tokens.
	ParenLeft,
	ParenRight,
	BracketLeft,
	BracketRight,
	Comma,
	Dot,
	Colon,
	Question,
	Plus,
	Minus,
	Times,
	Divide,
	Modulo,
	Assignment, // =
	Less,
	Greater,

	// Double-character tokens.
	Reassignment, // :=
	Equals,
	NotEquals,
	LessEquals,
	GreaterEquals,
	Arrow, // =>
	PlusAssign,
	MinusAssign,
	TimesAssign,
	DivideAssign,
	ModuloAssign,

	// Keywords.
	If,
	Else,
	For,
	To,
	By,
	In,
	While,
	Switch,
	Var,
	Varip,
	Import,
	Export,
	As,
	Type,
	Enum,
	Method,
	And,
	Or,
	Not,
	Continue,
	Break,

	// Literals.
	Identifier(String),
	Number(String),
	StringLiteral(String),
	Bool(bool),
	Color(String),

	// Layout.
	Comment(String),
	Newline,
	Indent,
	Dedent,
	EndOfFile,
}

/// The coarse classification of a token, independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind
{
	String,
	Number,
	Boolean,
	Color,
	Identifier,
	Keyword,
	Operator,
	Punctuation,
	Newline,
	Indent,
	Dedent,
	Comment,
	Eof,
	Error,
}

impl Token
{
	pub fn kind(&self) -> TokenKind
	{
		match self
		{
			Token::ParenLeft
			| Token::ParenRight
			| Token::BracketLeft
			| Token::BracketRight
			| Token::Comma
			| Token::Dot
			| Token::Colon
			| Token::Question => TokenKind::Punctuation,
			Token::Plus
			| Token::Minus
			| Token::Times
			| Token::Divide
			| Token::Modulo
			| Token::Assignment
			| Token::Less
			| Token::Greater
			| Token::Reassignment
			| Token::Equals
			| Token::NotEquals
			| Token::LessEquals
			| Token::GreaterEquals
			| Token::Arrow
			| Token::PlusAssign
			| Token::MinusAssign
			| Token::TimesAssign
			| Token::DivideAssign
			| Token::ModuloAssign => TokenKind::Operator,
			Token::If
			| Token::Else
			| Token::For
			| Token::To
			| Token::By
			| Token::In
			| Token::While
			| Token::Switch
			| Token::Var
			| Token::Varip
			| Token::Import
			| Token::Export
			| Token::As
			| Token::Type
			| Token::Enum
			| Token::Method
			| Token::And
			| Token::Or
			| Token::Not
			| Token::Continue
			| Token::Break => TokenKind::Keyword,
			Token::Identifier(_) => TokenKind::Identifier,
			Token::Number(_) => TokenKind::Number,
			Token::StringLiteral(_) => TokenKind::String,
			Token::Bool(_) => TokenKind::Boolean,
			Token::Color(_) => TokenKind::Color,
			Token::Comment(_) => TokenKind::Comment,
			Token::Newline => TokenKind::Newline,
			Token::Indent => TokenKind::Indent,
			Token::Dedent => TokenKind::Dedent,
			Token::EndOfFile => TokenKind::Eof,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{
	UnexpectedCharacter(char),
	UnterminatedString,
	InvalidColorLiteral,
	UnmatchedCommentEnd,
}

impl fmt::Display for Error
{
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		match self
		{
			Error::UnexpectedCharacter(x) =>
			{
				write!(f, "unexpected character {:?}", x)
			}
			Error::UnterminatedString => write!(f, "unterminated string"),
			Error::InvalidColorLiteral => write!(f, "invalid color literal"),
			Error::UnmatchedCommentEnd =>
			{
				write!(f, "'*/' without matching '/*'")
			}
		}
	}
}

#[derive(Debug, Clone)]
pub struct LexedToken
{
	pub result: Result<Token, Error>,
	pub location: Location,
}

impl LexedToken
{
	pub fn kind(&self) -> TokenKind
	{
		match &self.result
		{
			Ok(token) => token.kind(),
			Err(_) => TokenKind::Error,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location
{
	pub source_filename: String,
	pub span: std::ops::Range<usize>,
	/// One-based.
	pub line_number: usize,
	/// Zero-based, counted in characters.
	pub line_offset: usize,
}

impl Location
{
	pub fn offset(&self) -> usize
	{
		self.span.start
	}

	pub fn length(&self) -> usize
	{
		self.span.end - self.span.start
	}

	pub fn format(&self) -> String
	{
		format!(
			"at {}:{}:{}",
			self.source_filename, self.line_number, self.line_offset
		)
	}

	pub fn label(&self) -> ariadne::Label<(String, std::ops::Range<usize>)>
	{
		ariadne::Label::new((self.source_filename.clone(), self.span.clone()))
	}

	pub fn combined_with(&self, other: &Location) -> Location
	{
		if other.span.end > self.span.end
		{
			Location {
				span: self.span.start..other.span.end,
				..self.clone()
			}
		}
		else
		{
			self.clone()
		}
	}
}

pub const TAB_WIDTH: usize = 4;

pub fn lex(source: &str, source_filename: &str) -> Vec<LexedToken>
{
	let mut scanner = Scanner {
		source,
		source_filename,
		chars: source.char_indices().collect(),
		cursor: 0,
		line_number: 1,
		line_start: 0,
		indentation: vec![0],
		is_at_line_start: true,
		tokens: Vec::new(),
	};
	scanner.scan();
	log::trace!("lexed {} tokens", scanner.tokens.len());
	scanner.tokens
}

struct Scanner<'a>
{
	source: &'a str,
	source_filename: &'a str,
	chars: Vec<(usize, char)>,
	cursor: usize,
	line_number: usize,
	line_start: usize,
	indentation: Vec<usize>,
	is_at_line_start: bool,
	tokens: Vec<LexedToken>,
}

impl<'a> Scanner<'a>
{
	fn peek(&self) -> Option<char>
	{
		self.chars.get(self.cursor).map(|(_, x)| *x)
	}

	fn peek_nth(&self, n: usize) -> Option<char>
	{
		self.chars.get(self.cursor + n).map(|(_, x)| *x)
	}

	fn offset(&self) -> usize
	{
		match self.chars.get(self.cursor)
		{
			Some((offset, _)) => *offset,
			None => self.source.len(),
		}
	}

	fn advance(&mut self) -> Option<char>
	{
		let x = self.peek()?;
		self.cursor += 1;
		if x == '\n'
		{
			self.line_number += 1;
			self.line_start = self.cursor;
		}
		Some(x)
	}

	fn advance_if(&mut self, expected: char) -> bool
	{
		if self.peek() == Some(expected)
		{
			self.cursor += 1;
			true
		}
		else
		{
			false
		}
	}

	fn mark(&self) -> Mark
	{
		Mark {
			offset: self.offset(),
			line_number: self.line_number,
			line_offset: self.cursor - self.line_start,
		}
	}

	fn location_from(&self, mark: &Mark) -> Location
	{
		Location {
			source_filename: self.source_filename.to_string(),
			span: mark.offset..self.offset(),
			line_number: mark.line_number,
			line_offset: mark.line_offset,
		}
	}

	fn emit(&mut self, mark: &Mark, result: Result<Token, Error>)
	{
		let location = self.location_from(mark);
		self.tokens.push(LexedToken { result, location });
	}

	fn scan(&mut self)
	{
		loop
		{
			if self.is_at_line_start
			{
				self.is_at_line_start = false;
				self.measure_indentation();
			}
			let x = match self.peek()
			{
				Some(x) => x,
				None => break,
			};
			let mark = self.mark();
			match x
			{
				'\n' =>
				{
					self.advance();
					self.emit(&mark, Ok(Token::Newline));
					self.is_at_line_start = true;
				}
				' ' | '\t' | '\r' =>
				{
					self.advance();
				}
				'"' | '\'' => self.scan_string(mark, x),
				'0'..='9' => self.scan_number(mark),
				'-' if self.peek_nth(1).map_or(false, |y| y.is_ascii_digit()) =>
				{
					self.scan_number(mark)
				}
				'a'..='z' | 'A'..='Z' | '_' => self.scan_identifier(mark),
				'#' => self.scan_color(mark),
				'/' if self.peek_nth(1) == Some('/') =>
				{
					self.scan_line_comment(mark)
				}
				'/' if self.peek_nth(1) == Some('*') =>
				{
					self.scan_block_comment(mark)
				}
				_ =>
				{
					self.advance();
					let result = self.scan_operator(x);
					self.emit(&mark, result);
				}
			}
		}

		let mark = self.mark();
		while self.indentation.len() > 1
		{
			self.indentation.pop();
			self.emit(&mark, Ok(Token::Dedent));
		}
		self.emit(&mark, Ok(Token::EndOfFile));
	}

	fn measure_indentation(&mut self)
	{
		let mark = self.mark();
		let mut width = 0;
		loop
		{
			match self.peek()
			{
				Some(' ') => width += 1,
				Some('\t') => width += TAB_WIDTH,
				_ => break,
			}
			self.advance();
		}
		let is_blank = match self.peek()
		{
			None | Some('\n') | Some('\r') => true,
			Some('/') => self.peek_nth(1) == Some('/'),
			Some(_) => false,
		};
		if is_blank
		{
			return;
		}

		let top = self.indentation.last().copied().unwrap_or(0);
		if width > top
		{
			self.indentation.push(width);
			self.emit(&mark, Ok(Token::Indent));
		}
		else if width < top
		{
			let dedent_mark = self.mark();
			while self.indentation.last().map_or(false, |&top| top > width)
			{
				self.indentation.pop();
				self.emit(&dedent_mark, Ok(Token::Dedent));
			}
			if self.indentation.last().map_or(true, |&top| top < width)
			{
				self.indentation.push(width);
				self.emit(&mark, Ok(Token::Indent));
			}
		}
	}

	fn scan_string(&mut self, mark: Mark, quote: char)
	{
		self.advance();
		let mut value = String::new();
		loop
		{
			match self.peek()
			{
				None | Some('\n') =>
				{
					self.emit(&mark, Err(Error::UnterminatedString));
					return;
				}
				Some('\\') =>
				{
					self.advance();
					match self.peek()
					{
						None | Some('\n') =>
						{
							self.emit(&mark, Err(Error::UnterminatedString));
							return;
						}
						Some(y) =>
						{
							self.advance();
							match y
							{
								'n' => value.push('\n'),
								't' => value.push('\t'),
								'r' => value.push('\r'),
								'\\' | '"' | '\'' => value.push(y),
								_ =>
								{
									value.push('\\');
									value.push(y);
								}
							}
						}
					}
				}
				Some(y) if y == quote =>
				{
					self.advance();
					self.emit(&mark, Ok(Token::StringLiteral(value)));
					return;
				}
				Some(y) =>
				{
					self.advance();
					value.push(y);
				}
			}
		}
	}

	fn scan_number(&mut self, mark: Mark)
	{
		self.advance_if('-');
		self.skip_digits();
		if self.peek() == Some('.')
			&& self.peek_nth(1).map_or(true, |y| !y.is_alphabetic())
		{
			self.advance();
			self.skip_digits();
		}
		if let Some('e' | 'E') = self.peek()
		{
			let has_exponent = match self.peek_nth(1)
			{
				Some('+' | '-') =>
				{
					self.peek_nth(2).map_or(false, |y| y.is_ascii_digit())
				}
				Some(y) => y.is_ascii_digit(),
				None => false,
			};
			if has_exponent
			{
				self.advance();
				if let Some('+' | '-') = self.peek()
				{
					self.advance();
				}
				self.skip_digits();
			}
		}
		let literal = self.source[mark.offset..self.offset()].to_string();
		self.emit(&mark, Ok(Token::Number(literal)));
	}

	fn skip_digits(&mut self)
	{
		while self.peek().map_or(false, |y| y.is_ascii_digit())
		{
			self.advance();
		}
	}

	fn scan_identifier(&mut self, mark: Mark)
	{
		while self.peek().map_or(false, is_identifier_continuation)
		{
			self.advance();
		}
		let identifier = &self.source[mark.offset..self.offset()];
		let token = match identifier
		{
			"if" => Token::If,
			"else" => Token::Else,
			"for" => Token::For,
			"to" => Token::To,
			"by" => Token::By,
			"in" => Token::In,
			"while" => Token::While,
			"switch" => Token::Switch,
			"var" => Token::Var,
			"varip" => Token::Varip,
			"import" => Token::Import,
			"export" => Token::Export,
			"as" => Token::As,
			"type" => Token::Type,
			"enum" => Token::Enum,
			"method" => Token::Method,
			"and" => Token::And,
			"or" => Token::Or,
			"not" => Token::Not,
			"continue" => Token::Continue,
			"break" => Token::Break,
			"true" => Token::Bool(true),
			"false" => Token::Bool(false),
			_ => Token::Identifier(identifier.to_string()),
		};
		self.emit(&mark, Ok(token));
	}

	fn scan_color(&mut self, mark: Mark)
	{
		self.advance();
		let mut digits = 0;
		while self.peek().map_or(false, is_identifier_continuation)
		{
			if !self.peek().map_or(false, |y| y.is_ascii_hexdigit())
			{
				digits = usize::MAX;
			}
			self.advance();
			digits = digits.saturating_add(1);
		}
		let result = match digits
		{
			0 => Err(Error::UnexpectedCharacter('#')),
			6 | 8 =>
			{
				let literal = self.source[mark.offset..self.offset()].to_string();
				Ok(Token::Color(literal))
			}
			_ => Err(Error::InvalidColorLiteral),
		};
		self.emit(&mark, result);
	}

	fn scan_line_comment(&mut self, mark: Mark)
	{
		while self.peek().map_or(false, |y| y != '\n')
		{
			self.advance();
		}
		let text = self.source[mark.offset..self.offset()].to_string();
		self.emit(&mark, Ok(Token::Comment(text)));
	}

	fn scan_block_comment(&mut self, mark: Mark)
	{
		self.advance();
		self.advance();
		loop
		{
			match self.peek()
			{
				None => break,
				Some('*') if self.peek_nth(1) == Some('/') =>
				{
					self.advance();
					self.advance();
					break;
				}
				Some(_) =>
				{
					self.advance();
				}
			}
		}
		let text = self.source[mark.offset..self.offset()].to_string();
		self.emit(&mark, Ok(Token::Comment(text)));
	}

	fn scan_operator(&mut self, x: char) -> Result<Token, Error>
	{
		let token = match x
		{
			'(' => Token::ParenLeft,
			')' => Token::ParenRight,
			'[' => Token::BracketLeft,
			']' => Token::BracketRight,
			',' => Token::Comma,
			'.' => Token::Dot,
			'?' => Token::Question,
			':' if self.advance_if('=') => Token::Reassignment,
			':' => Token::Colon,
			'=' if self.advance_if('=') => Token::Equals,
			'=' if self.advance_if('>') => Token::Arrow,
			'=' => Token::Assignment,
			'!' if self.advance_if('=') => Token::NotEquals,
			'<' if self.advance_if('=') => Token::LessEquals,
			'<' => Token::Less,
			'>' if self.advance_if('=') => Token::GreaterEquals,
			'>' => Token::Greater,
			'+' if self.advance_if('=') => Token::PlusAssign,
			'+' => Token::Plus,
			'-' if self.advance_if('=') => Token::MinusAssign,
			'-' => Token::Minus,
			'*' if self.advance_if('/') =>
			{
				return Err(Error::UnmatchedCommentEnd)
			}
			'*' if self.advance_if('=') => Token::TimesAssign,
			'*' => Token::Times,
			'/' if self.advance_if('=') => Token::DivideAssign,
			'/' => Token::Divide,
			'%' if self.advance_if('=') => Token::ModuloAssign,
			'%' => Token::Modulo,
			_ => return Err(Error::UnexpectedCharacter(x)),
		};
		Ok(token)
	}
}

struct Mark
{
	offset: usize,
	line_number: usize,
	line_offset: usize,
}

fn is_identifier_continuation(x: char) -> bool
{
	match x
	{
		'a'..='z' | 'A'..='Z' | '0'..='9' | '_' => true,
		_ => false,
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	use pretty_assertions::assert_eq;

	fn tokens(source: &str) -> Vec<Token>
	{
		lex(source, "test.pine")
			.into_iter()
			.filter_map(|x| x.result.ok())
			.collect()
	}

	#[test]
	fn lex_two_character_operators_first()
	{
		assert_eq!(
			tokens("a := b == c != d <= e >= f"),
			vec![
				Token::Identifier("a".to_string()),
				Token::Reassignment,
				Token::Identifier("b".to_string()),
				Token::Equals,
				Token::Identifier("c".to_string()),
				Token::NotEquals,
				Token::Identifier("d".to_string()),
				Token::LessEquals,
				Token::Identifier("e".to_string()),
				Token::GreaterEquals,
				Token::Identifier("f".to_string()),
				Token::EndOfFile,
			]
		);
	}

	#[test]
	fn lex_numbers()
	{
		assert_eq!(
			tokens("-12 3.5 1e9 2.5E-3"),
			vec![
				Token::Number("-12".to_string()),
				Token::Number("3.5".to_string()),
				Token::Number("1e9".to_string()),
				Token::Number("2.5E-3".to_string()),
				Token::EndOfFile,
			]
		);
	}

	#[test]
	fn lex_string_escapes()
	{
		assert_eq!(
			tokens(r#""a\"b\n" 'c\qd'"#),
			vec![
				Token::StringLiteral("a\"b\n".to_string()),
				Token::StringLiteral("c\\qd".to_string()),
				Token::EndOfFile,
			]
		);
	}

	#[test]
	fn lex_booleans_and_keywords()
	{
		let kinds: Vec<TokenKind> = lex("var x = true", "test.pine")
			.iter()
			.map(|x| x.kind())
			.collect();
		assert_eq!(
			kinds,
			vec![
				TokenKind::Keyword,
				TokenKind::Identifier,
				TokenKind::Operator,
				TokenKind::Boolean,
				TokenKind::Eof,
			]
		);
	}

	#[test]
	fn lex_indentation()
	{
		let source = "type A\n    float x\n    int y\nb = 1\n";
		let kinds: Vec<TokenKind> = lex(source, "test.pine")
			.iter()
			.map(|x| x.kind())
			.filter(|x| match x
			{
				TokenKind::Indent | TokenKind::Dedent => true,
				_ => false,
			})
			.collect();
		assert_eq!(kinds, vec![TokenKind::Indent, TokenKind::Dedent]);
	}

	#[test]
	fn lex_tab_counts_as_four_columns()
	{
		let source = "if a\n\tb\n    c\n";
		let indents = lex(source, "test.pine")
			.iter()
			.filter(|x| x.kind() == TokenKind::Indent)
			.count();
		assert_eq!(indents, 1);
	}

	#[test]
	fn lex_unterminated_string_stops_at_end_of_line()
	{
		let lexed = lex("x = \"abc\ny = 1", "test.pine");
		let error = lexed.iter().find(|x| x.kind() == TokenKind::Error);
		match error
		{
			Some(token) =>
			{
				assert_eq!(token.result, Err(Error::UnterminatedString));
				assert_eq!(token.location.line_number, 1);
			}
			None => panic!("broken test"),
		}
		assert!(lexed.iter().any(|x| x.result == Ok(Token::Newline)));
	}

	#[test]
	fn lex_error_token_does_not_stop_scanning()
	{
		let lexed = lex("a $ b", "test.pine");
		assert_eq!(lexed[1].result, Err(Error::UnexpectedCharacter('$')));
		assert_eq!(lexed[2].result, Ok(Token::Identifier("b".to_string())));
	}

	#[test]
	fn lex_locations()
	{
		let lexed = lex("a\n  bc", "test.pine");
		let bc = lexed
			.iter()
			.find(|x| x.result == Ok(Token::Identifier("bc".to_string())));
		match bc
		{
			Some(token) =>
			{
				assert_eq!(token.location.line_number, 2);
				assert_eq!(token.location.line_offset, 2);
				assert_eq!(token.location.span, 4..6);
			}
			None => panic!("broken test"),
		}
	}

	#[test]
	fn lex_color_literal()
	{
		assert_eq!(
			tokens("#ff00aa"),
			vec![Token::Color("#ff00aa".to_string()), Token::EndOfFile]
		);
	}

	#[test]
	fn lex_always_ends_with_empty_eof()
	{
		for source in ["", "\n", "/* open", "\"open", "a\n    b"]
		{
			let lexed = lex(source, "test.pine");
			match lexed.last()
			{
				Some(token) =>
				{
					assert_eq!(token.result, Ok(Token::EndOfFile));
					assert_eq!(token.location.length(), 0);
				}
				None => panic!("broken test"),
			}
		}
	}
}
