//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

use pinelint::lexer::{self, Token, TokenKind};

use pretty_assertions::assert_eq;

fn lex_file(filename: &str) -> Vec<lexer::LexedToken>
{
	let source = std::fs::read_to_string(filename).unwrap();
	lexer::lex(&source, filename)
}

fn count(tokens: &[lexer::LexedToken], expected: Token) -> usize
{
	tokens
		.iter()
		.filter(|x| x.result.as_ref() == Ok(&expected))
		.count()
}

#[test]
fn lex_samples_without_errors()
{
	for entry in std::fs::read_dir("tests/samples/valid").unwrap()
	{
		let path = entry.unwrap().path();
		let tokens = lex_file(path.to_str().unwrap());
		let errors: Vec<TokenKind> = tokens
			.iter()
			.map(|x| x.kind())
			.filter(|x| *x == TokenKind::Error)
			.collect();
		assert_eq!(errors, vec![], "in {:?}", path);
	}
}

#[test]
fn lex_udt_blocks()
{
	let tokens = lex_file("tests/samples/valid/udt_reassigned.pine");
	assert_eq!(count(&tokens, Token::Type), 1);
	assert_eq!(count(&tokens, Token::Var), 1);
	assert_eq!(count(&tokens, Token::If), 1);
	assert_eq!(count(&tokens, Token::Reassignment), 1);
	assert_eq!(count(&tokens, Token::Indent), 2);
	assert_eq!(count(&tokens, Token::Dedent), 2);
	assert_eq!(tokens[0].kind(), TokenKind::Comment);
}

#[test]
fn lex_locations_in_sample()
{
	let tokens = lex_file("tests/samples/invalid/short_title_too_long.pine");
	let short_title = tokens.iter().find(|x| {
		x.result == Ok(Token::StringLiteral("TwelveCharsX".to_string()))
	});
	match short_title
	{
		Some(token) =>
		{
			assert_eq!(token.location.line_number, 2);
			assert_eq!(token.location.line_offset, 33);
			assert_eq!(token.location.length(), 14);
		}
		None => panic!("broken test"),
	}
}

#[test]
fn lex_unterminated_string_recovers()
{
	let tokens = lexer::lex("//@version=6\nindicator(\"Open\nplot(close)\n", "t");
	let kinds: Vec<TokenKind> = tokens.iter().map(|x| x.kind()).collect();
	assert!(kinds.contains(&TokenKind::Error));
	assert_eq!(count(&tokens, Token::Identifier("plot".to_string())), 1);
}
