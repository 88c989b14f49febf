//! The directive-level scan table.
//!
//! Splits a whole template body into flat tokens: text runs, `#name(...)`
//! directives, `${...}` / `$!{...}` / `#{...}` / `#!{...}` interpolations,
//! `##` line comments, `#* *#` block comments, `#[ ]#` literal spans and
//! backslash escapes of `#`/`$`. Directive parameters and interpolation
//! bodies each track their own nesting counter, and string literals inside
//! them get quote-aware sub-states so a `)` or `}` inside a literal does
//! not close the surrounding bracket.

use once_cell::sync::Lazy;

use crate::{
	error::scanner::ScannerError,
	scanner::{scan, Counter, ScanTable, Step, Token},
};

// States. TEXT accumulates plain runs; the HASH/DOLLAR families decide
// between directives, comments, literal spans and interpolations; the
// *_CLOSED states accept a balanced construct on one character of
// lookahead.
const START: usize = 0;
const TEXT: usize = 1;
const HASH: usize = 2;
const HASH_BANG: usize = 3;
const NAME: usize = 4;
const PAREN: usize = 5;
const PAREN_DQ: usize = 6;
const PAREN_DQ_ESC: usize = 7;
const PAREN_SQ: usize = 8;
const PAREN_SQ_ESC: usize = 9;
const PAREN_BQ: usize = 10;
const PAREN_BQ_ESC: usize = 11;
const DIRECTIVE_CLOSED: usize = 12;
const LINE_COMMENT: usize = 13;
const BLOCK_COMMENT: usize = 14;
const BLOCK_COMMENT_STAR: usize = 15;
const LITERAL: usize = 16;
const LITERAL_BRACKET: usize = 17;
const DOLLAR: usize = 18;
const DOLLAR_BANG: usize = 19;
const BRACE: usize = 20;
const BRACE_DQ: usize = 21;
const BRACE_DQ_ESC: usize = 22;
const BRACE_SQ: usize = 23;
const BRACE_SQ_ESC: usize = 24;
const BRACE_BQ: usize = 25;
const BRACE_BQ_ESC: usize = 26;
const INTERP_CLOSED: usize = 27;
const ESCAPE: usize = 28;
const STATES: usize = 29;

// Character classes.
const C_LETTER: usize = 0;
const C_DIGIT: usize = 1;
const C_HASH: usize = 2;
const C_DOLLAR: usize = 3;
const C_LPAREN: usize = 4;
const C_RPAREN: usize = 5;
const C_LBRACE: usize = 6;
const C_RBRACE: usize = 7;
const C_LBRACKET: usize = 8;
const C_RBRACKET: usize = 9;
const C_STAR: usize = 10;
const C_BANG: usize = 11;
const C_DQUOTE: usize = 12;
const C_SQUOTE: usize = 13;
const C_BQUOTE: usize = 14;
const C_BACKSLASH: usize = 15;
const C_NEWLINE: usize = 16;
const C_OTHER: usize = 17;
const C_EOF: usize = 18;
const CLASSES: usize = 19;

fn classify(c: char) -> usize {
	match c {
		'a'..='z' | 'A'..='Z' | '_' => C_LETTER,
		'0'..='9' => C_DIGIT,
		'#' => C_HASH,
		'$' => C_DOLLAR,
		'(' => C_LPAREN,
		')' => C_RPAREN,
		'{' => C_LBRACE,
		'}' => C_RBRACE,
		'[' => C_LBRACKET,
		']' => C_RBRACKET,
		'*' => C_STAR,
		'!' => C_BANG,
		'"' => C_DQUOTE,
		'\'' => C_SQUOTE,
		'`' => C_BQUOTE,
		'\\' => C_BACKSLASH,
		'\n' => C_NEWLINE,
		_ => C_OTHER,
	}
}

/// Three quote-aware sub-states shared by directive parameters and
/// interpolation bodies: (double, single, back), each with an escape state.
fn string_states(t: &mut ScanTable, resume: usize, first: usize) {
	for (i, quote) in [C_DQUOTE, C_SQUOTE, C_BQUOTE].into_iter().enumerate() {
		let body = first + i * 2;
		let esc = body + 1;
		t.fill(body, Step::Shift(body));
		t.set(body, quote, Step::Shift(resume));
		t.set(body, C_BACKSLASH, Step::Shift(esc));
		t.set(body, C_EOF, Step::Error);
		t.fill(esc, Step::Shift(body));
		t.set(esc, C_EOF, Step::Error);
	}
}

static TABLE: Lazy<ScanTable> = Lazy::new(|| {
	use Step::*;
	let mut t = ScanTable::new(STATES, CLASSES, classify);

	t.fill(START, Shift(TEXT));
	t.set(START, C_HASH, Shift(HASH));
	t.set(START, C_DOLLAR, Shift(DOLLAR));
	t.set(START, C_BACKSLASH, Shift(ESCAPE));
	t.set(START, C_EOF, EmitBack(0));

	t.fill(TEXT, Shift(TEXT));
	t.set(TEXT, C_HASH, EmitBack(1));
	t.set(TEXT, C_DOLLAR, EmitBack(1));
	t.set(TEXT, C_BACKSLASH, EmitBack(1));
	t.set(TEXT, C_EOF, EmitBack(0));

	// `#` decides: directive name, comment, literal span, interpolation or
	// plain text.
	t.fill(HASH, EmitBack(1));
	t.set(HASH, C_LETTER, Shift(NAME));
	t.set(HASH, C_HASH, Shift(LINE_COMMENT));
	t.set(HASH, C_STAR, Shift(BLOCK_COMMENT));
	t.set(HASH, C_LBRACKET, Shift(LITERAL));
	t.set(HASH, C_LBRACE, Push(Counter::Brace, BRACE));
	t.set(HASH, C_BANG, Shift(HASH_BANG));
	t.set(HASH, C_EOF, EmitBack(0));

	t.fill(HASH_BANG, EmitBack(2));
	t.set(HASH_BANG, C_LBRACE, Push(Counter::Brace, BRACE));
	t.set(HASH_BANG, C_EOF, EmitBack(0));

	t.fill(NAME, EmitBack(1));
	t.set(NAME, C_LETTER, Shift(NAME));
	t.set(NAME, C_DIGIT, Shift(NAME));
	t.set(NAME, C_LPAREN, Push(Counter::Paren, PAREN));
	t.set(NAME, C_EOF, EmitBack(0));

	t.fill(PAREN, Shift(PAREN));
	t.set(PAREN, C_LPAREN, Push(Counter::Paren, PAREN));
	t.set(PAREN, C_RPAREN, Pop(Counter::Paren, PAREN, DIRECTIVE_CLOSED));
	t.set(PAREN, C_DQUOTE, Shift(PAREN_DQ));
	t.set(PAREN, C_SQUOTE, Shift(PAREN_SQ));
	t.set(PAREN, C_BQUOTE, Shift(PAREN_BQ));
	t.set(PAREN, C_EOF, Error);
	string_states(&mut t, PAREN, PAREN_DQ);

	t.fill(DIRECTIVE_CLOSED, EmitBack(1));
	t.set(DIRECTIVE_CLOSED, C_EOF, EmitBack(0));

	t.fill(LINE_COMMENT, Shift(LINE_COMMENT));
	t.set(LINE_COMMENT, C_NEWLINE, Emit);
	t.set(LINE_COMMENT, C_EOF, EmitBack(0));

	t.fill(BLOCK_COMMENT, Shift(BLOCK_COMMENT));
	t.set(BLOCK_COMMENT, C_STAR, Shift(BLOCK_COMMENT_STAR));
	t.set(BLOCK_COMMENT, C_EOF, Error);
	t.fill(BLOCK_COMMENT_STAR, Shift(BLOCK_COMMENT));
	t.set(BLOCK_COMMENT_STAR, C_HASH, Emit);
	t.set(BLOCK_COMMENT_STAR, C_STAR, Shift(BLOCK_COMMENT_STAR));
	t.set(BLOCK_COMMENT_STAR, C_EOF, Error);

	t.fill(LITERAL, Shift(LITERAL));
	t.set(LITERAL, C_RBRACKET, Shift(LITERAL_BRACKET));
	t.set(LITERAL, C_EOF, Error);
	t.fill(LITERAL_BRACKET, Shift(LITERAL));
	t.set(LITERAL_BRACKET, C_HASH, Emit);
	t.set(LITERAL_BRACKET, C_RBRACKET, Shift(LITERAL_BRACKET));
	t.set(LITERAL_BRACKET, C_EOF, Error);

	t.fill(DOLLAR, EmitBack(1));
	t.set(DOLLAR, C_LBRACE, Push(Counter::Brace, BRACE));
	t.set(DOLLAR, C_BANG, Shift(DOLLAR_BANG));
	t.set(DOLLAR, C_EOF, EmitBack(0));

	t.fill(DOLLAR_BANG, EmitBack(2));
	t.set(DOLLAR_BANG, C_LBRACE, Push(Counter::Brace, BRACE));
	t.set(DOLLAR_BANG, C_EOF, EmitBack(0));

	t.fill(BRACE, Shift(BRACE));
	t.set(BRACE, C_LBRACE, Push(Counter::Brace, BRACE));
	t.set(BRACE, C_RBRACE, Pop(Counter::Brace, BRACE, INTERP_CLOSED));
	t.set(BRACE, C_DQUOTE, Shift(BRACE_DQ));
	t.set(BRACE, C_SQUOTE, Shift(BRACE_SQ));
	t.set(BRACE, C_BQUOTE, Shift(BRACE_BQ));
	t.set(BRACE, C_EOF, Error);
	string_states(&mut t, BRACE, BRACE_DQ);

	t.fill(INTERP_CLOSED, EmitBack(1));
	t.set(INTERP_CLOSED, C_EOF, EmitBack(0));

	// A backslash run escapes a following `#` or `$`; anything else keeps
	// the backslashes as plain text.
	t.fill(ESCAPE, EmitBack(1));
	t.set(ESCAPE, C_BACKSLASH, Shift(ESCAPE));
	t.set(ESCAPE, C_HASH, Emit);
	t.set(ESCAPE, C_DOLLAR, Emit);
	t.set(ESCAPE, C_EOF, EmitBack(0));

	t
});

/// Scan a whole template body into flat directive-level tokens.
pub(crate) fn scan_directives(source: &str, base: usize) -> Result<Vec<Token<'_>>, ScannerError> {
	scan(&TABLE, source, base)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn texts(source: &str) -> Vec<&str> {
		scan_directives(source, 0).unwrap().iter().map(|t| t.text).collect()
	}

	fn fails(source: &str) -> bool { scan_directives(source, 0).is_err() }

	#[test]
	fn scan_plain_text() {
		assert_eq!(texts("hello world"), vec!["hello world"]);
		assert_eq!(texts(""), Vec::<&str>::new());
		assert_eq!(texts("line\nline"), vec!["line\nline"]);
	}

	#[test]
	fn scan_directives_with_params() {
		assert_eq!(texts("#if(x > 0)yes#end"), vec!["#if(x > 0)", "yes", "#end"]);
		assert_eq!(texts("#for(i : 1 .. 3)${i}#end"), vec!["#for(i : 1 .. 3)", "${i}", "#end"]);
		assert_eq!(texts("#end\n"), vec!["#end", "\n"]);
	}

	#[test]
	fn scan_nested_parens_in_params() {
		assert_eq!(texts("#if(f(x, g(y)))a#end"), vec!["#if(f(x, g(y)))", "a", "#end"]);
		assert!(fails("#if(f(x)"));
	}

	#[test]
	fn scan_literal_in_params_hides_brackets() {
		assert_eq!(texts(r##"#if(a == ")")b#end"##), vec![r##"#if(a == ")")"##, "b", "#end"]);
		assert_eq!(texts("#if(c == '}')x#end"), vec!["#if(c == '}')", "x", "#end"]);
	}

	#[test]
	fn scan_interpolations() {
		assert_eq!(texts("a${x}b"), vec!["a", "${x}", "b"]);
		assert_eq!(texts("$!{x}"), vec!["$!{x}"]);
		assert_eq!(texts("#{x + 1}"), vec!["#{x + 1}"]);
		assert_eq!(texts("#!{x}"), vec!["#!{x}"]);
		assert_eq!(texts("${m['}']}"), vec!["${m['}']}"]);
		assert!(fails("${x"));
	}

	#[test]
	fn scan_comments_and_literal_spans() {
		assert_eq!(texts("a## note\nb"), vec!["a", "## note\n", "b"]);
		assert_eq!(texts("## eof comment"), vec!["## eof comment"]);
		assert_eq!(texts("a#* inner *#b"), vec!["a", "#* inner *#", "b"]);
		assert_eq!(texts("#[ raw ${x} ]#t"), vec!["#[ raw ${x} ]#", "t"]);
		assert!(fails("#* unterminated"));
		assert!(fails("#[ unterminated"));
	}

	#[test]
	fn scan_escapes_and_bare_sigils() {
		assert_eq!(texts(r"\#end"), vec![r"\#", "end"]);
		assert_eq!(texts(r"\\#if(x)#end"), vec![r"\\#", "if(x)", "#end"]);
		assert_eq!(texts(r"\$"), vec![r"\$"]);
		assert_eq!(texts(r"a\b"), vec!["a", r"\", "b"]);
		assert_eq!(texts("a $ b # c"), vec!["a ", "$", " b ", "#", " c"]);
		assert_eq!(texts("$"), vec!["$"]);
		assert_eq!(texts("#"), vec!["#"]);
	}

	#[test]
	fn scan_round_trip() {
		for source in [
			"#if(x > 0)\nyes\n#end",
			"a${x}b#* c *### d\n#[ e ]#",
			r"\#literal and ${v}",
			"#macro(m(a, b))${a}#end",
		] {
			let joined: String = texts(source).concat();
			assert_eq!(joined, source);
		}
	}
}
