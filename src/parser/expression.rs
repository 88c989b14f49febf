//! Expression tokenizer and operator-precedence parser.
//!
//! Expression text is first split by a small scan table (identifiers,
//! numeric literals with width suffixes, quoted literals, punctuation
//! runs), then resolved into an expression tree with two stacks: operands
//! and operators. Each operator carries a priority from a static ranking;
//! a binary reduction pops the right operand first, then the left, and an
//! empty operand stack raises "missing operand" citing the operator's
//! offset.
//!
//! |Priority|Operators
//! --|--
//! 99|function call, constructor
//! 95|`.` member access, `[` index
//! 90|prefix `+ - ! ~`, cast
//! 80|`* / %`
//! 70|`+ -`
//! 60|`<< >> >>>`
//! 55|`..` range
//! 50|`< <= > >= instanceof`
//! 45|`== !=`
//! 40..20|`& ^ \| && \|\|`
//! 15|`?` `:`
//! 10|`,`

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::{
	error::parser::{ParseError, ParseErrorKind, ParserError},
	scanner::{scan, ScanTable, Step},
};

/// A constant value known at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
	Null,
	/// The auto-inserted placeholder for an empty argument list.
	Empty,
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(String),
	Char(char),
}

/// A prefix or postfix-applied operator taking one operand.
#[derive(Debug, Clone, PartialEq)]
pub enum UnaryOp {
	Pos,
	Neg,
	Not,
	BitNot,
	/// `(type) expr`
	Cast(String),
	/// `new name(...)`, name merged across dots
	New(String),
	/// `name(...)` function or macro call; the operand is the argument tree
	Call(String),
	/// `[...]` list literal
	List,
	/// `{...}` map literal
	Map,
}

/// An operator taking two operands.
#[derive(Debug, Clone, PartialEq)]
pub enum BinaryOp {
	Add,
	Sub,
	Mul,
	Div,
	Rem,
	Shl,
	Shr,
	UShr,
	Range,
	Lt,
	Le,
	Gt,
	Ge,
	Is,
	Eq,
	Ne,
	BitAnd,
	BitXor,
	BitOr,
	And,
	Or,
	Question,
	Colon,
	Comma,
	Dot,
	/// `left[right]`
	Index,
	/// `left.name(right)`
	MethodCall(String),
}

impl BinaryOp {
	/// The operator-name table: symbol to semantic op plus stack priority.
	fn from_symbol(symbol: &str) -> Option<(BinaryOp, u8)> {
		use BinaryOp::*;
		Some(match symbol {
			"." => (Dot, 95),
			"*" => (Mul, 80),
			"/" => (Div, 80),
			"%" => (Rem, 80),
			"+" => (Add, 70),
			"-" => (Sub, 70),
			"<<" => (Shl, 60),
			">>" => (Shr, 60),
			">>>" => (UShr, 60),
			".." => (Range, 55),
			"<" => (Lt, 50),
			"<=" => (Le, 50),
			">" => (Gt, 50),
			">=" => (Ge, 50),
			"instanceof" => (Is, 50),
			"==" => (Eq, 45),
			"!=" => (Ne, 45),
			"&" => (BitAnd, 40),
			"^" => (BitXor, 35),
			"|" => (BitOr, 30),
			"&&" => (And, 25),
			"||" => (Or, 20),
			"?" => (Question, 15),
			":" => (Colon, 15),
			"," => (Comma, 10),
			_ => return None,
		})
	}

	pub fn symbol(&self) -> &str {
		use BinaryOp::*;
		match self {
			Add => "+",
			Sub => "-",
			Mul => "*",
			Div => "/",
			Rem => "%",
			Shl => "<<",
			Shr => ">>",
			UShr => ">>>",
			Range => "..",
			Lt => "<",
			Le => "<=",
			Gt => ">",
			Ge => ">=",
			Is => "instanceof",
			Eq => "==",
			Ne => "!=",
			BitAnd => "&",
			BitXor => "^",
			BitOr => "|",
			And => "&&",
			Or => "||",
			Question => "?",
			Colon => ":",
			Comma => ",",
			Dot => ".",
			Index => "index",
			MethodCall(name) => name,
		}
	}
}

/// An expression tree node. Operand slots are set exactly once at
/// construction and never mutated afterwards, so parsed expressions are
/// freely shareable across concurrent renders.
#[derive(Debug, PartialEq)]
pub enum Expression {
	Constant { value: Constant, literal: String, offset: usize },
	Variable { name: String, offset: usize },
	Unary { op: UnaryOp, priority: u8, operand: Box<Expression>, offset: usize },
	Binary { op: BinaryOp, priority: u8, left: Box<Expression>, right: Box<Expression>, offset: usize },
}

impl Expression {
	pub fn offset(&self) -> usize {
		match self {
			Expression::Constant { offset, .. }
			| Expression::Variable { offset, .. }
			| Expression::Unary { offset, .. }
			| Expression::Binary { offset, .. } => *offset,
		}
	}

	pub(crate) fn constant(value: Constant, literal: impl Into<String>, offset: usize) -> Self {
		Expression::Constant { value, literal: literal.into(), offset }
	}
}

impl std::fmt::Display for Expression {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Expression::Constant { literal, value, .. } => {
				if literal.is_empty() {
					write!(f, "{value:?}")
				} else {
					write!(f, "{literal}")
				}
			}
			Expression::Variable { name, .. } => write!(f, "{name}"),
			Expression::Unary { op, operand, .. } => {
				use UnaryOp::*;
				match op {
					Pos => write!(f, "(+ {operand})"),
					Neg => write!(f, "(- {operand})"),
					Not => write!(f, "(! {operand})"),
					BitNot => write!(f, "(~ {operand})"),
					Cast(ty) => write!(f, "(({ty}) {operand})"),
					New(name) => write!(f, "(new {name} {operand})"),
					Call(name) => write!(f, "(call {name} {operand})"),
					List => write!(f, "(list {operand})"),
					Map => write!(f, "(map {operand})"),
				}
			}
			Expression::Binary { op, left, right, .. } => match op {
				BinaryOp::MethodCall(name) => write!(f, "(.{name} {left} {right})"),
				_ => write!(f, "({} {left} {right})", op.symbol()),
			},
		}
	}
}

// Expression scan table states.
const WS: usize = 1;
const IDENT: usize = 2;
const NUM: usize = 3;
const NUM_DOT: usize = 4;
const NUM_FRAC: usize = 5;
const NUM_SUF: usize = 6;
const DQ: usize = 7;
const SQ: usize = 9;
const BQ: usize = 11;
const OP: usize = 13;
const STATES: usize = 14;

// Expression character classes.
const C_SPACE: usize = 0;
const C_LETTER: usize = 1;
const C_DIGIT: usize = 2;
const C_DOT: usize = 3;
const C_DQUOTE: usize = 4;
const C_SQUOTE: usize = 5;
const C_BQUOTE: usize = 6;
const C_BACKSLASH: usize = 7;
const C_BRACKET: usize = 8;
const C_OTHER: usize = 9;
const C_EOF: usize = 10;
const CLASSES: usize = 11;

fn classify(c: char) -> usize {
	match c {
		' ' | '\t' | '\r' | '\n' => C_SPACE,
		'a'..='z' | 'A'..='Z' | '_' => C_LETTER,
		'0'..='9' => C_DIGIT,
		'.' => C_DOT,
		'"' => C_DQUOTE,
		'\'' => C_SQUOTE,
		'`' => C_BQUOTE,
		'\\' => C_BACKSLASH,
		'(' | ')' | '[' | ']' | '{' | '}' => C_BRACKET,
		_ => C_OTHER,
	}
}

static TABLE: Lazy<ScanTable> = Lazy::new(|| {
	use Step::*;
	let mut t = ScanTable::new(STATES, CLASSES, classify);

	t.set(0, C_SPACE, Shift(WS));
	t.set(0, C_LETTER, Shift(IDENT));
	t.set(0, C_DIGIT, Shift(NUM));
	t.set(0, C_DOT, Shift(OP));
	t.set(0, C_DQUOTE, Shift(DQ));
	t.set(0, C_SQUOTE, Shift(SQ));
	t.set(0, C_BQUOTE, Shift(BQ));
	t.set(0, C_BRACKET, Emit);
	t.set(0, C_OTHER, Shift(OP));
	t.set(0, C_EOF, EmitBack(0));

	t.fill(WS, EmitBack(1));
	t.set(WS, C_SPACE, Shift(WS));
	t.set(WS, C_EOF, EmitBack(0));

	t.fill(IDENT, EmitBack(1));
	t.set(IDENT, C_LETTER, Shift(IDENT));
	t.set(IDENT, C_DIGIT, Shift(IDENT));
	t.set(IDENT, C_EOF, EmitBack(0));

	// Numbers: digits, an optional fraction, an optional width-suffix
	// letter. Two dots end the number so `1..3` lexes as a range.
	t.fill(NUM, EmitBack(1));
	t.set(NUM, C_DIGIT, Shift(NUM));
	t.set(NUM, C_DOT, Shift(NUM_DOT));
	t.set(NUM, C_LETTER, Shift(NUM_SUF));
	t.set(NUM, C_EOF, EmitBack(0));
	t.fill(NUM_DOT, EmitBack(1));
	t.set(NUM_DOT, C_DIGIT, Shift(NUM_FRAC));
	t.set(NUM_DOT, C_DOT, EmitBack(2));
	t.set(NUM_DOT, C_LETTER, Shift(NUM_SUF));
	t.set(NUM_DOT, C_EOF, EmitBack(0));
	t.fill(NUM_FRAC, EmitBack(1));
	t.set(NUM_FRAC, C_DIGIT, Shift(NUM_FRAC));
	t.set(NUM_FRAC, C_LETTER, Shift(NUM_SUF));
	t.set(NUM_FRAC, C_EOF, EmitBack(0));
	t.fill(NUM_SUF, EmitBack(1));
	t.set(NUM_SUF, C_EOF, EmitBack(0));

	for (body, quote) in [(DQ, C_DQUOTE), (SQ, C_SQUOTE), (BQ, C_BQUOTE)] {
		let esc = body + 1;
		t.fill(body, Shift(body));
		t.set(body, quote, Emit);
		t.set(body, C_BACKSLASH, Shift(esc));
		t.set(body, C_EOF, Error);
		t.fill(esc, Shift(body));
		t.set(esc, C_EOF, Error);
	}

	t.fill(OP, EmitBack(1));
	t.set(OP, C_DOT, Shift(OP));
	t.set(OP, C_OTHER, Shift(OP));
	t.set(OP, C_EOF, EmitBack(0));

	t
});

/// Punctuation symbols recognized when splitting operator runs, longest
/// first so `>>>` wins over `>>` over `>`. `=` and `=>` are directive-level
/// separators: they tokenize here but are rejected by the expression
/// parser itself.
static SYMBOLS: Lazy<Vec<&'static str>> = Lazy::new(|| {
	vec![
		">>>", "=>", "..", "&&", "||", "==", "!=", "<=", ">=", "<<", ">>", "+", "-", "*", "/", "%", "<", ">",
		"!", "~", "&", "^", "|", "?", ":", ",", ".", "=", "$", ";",
	]
});

/// One lexical token of an expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Tok<'a> {
	pub kind:   TokKind,
	pub text:   &'a str,
	pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum TokKind {
	Ident,
	Number,
	/// A quoted literal; the char is the quote.
	Str(char),
	Punct,
}

/// Scan expression text into tokens, dropping whitespace and splitting
/// punctuation runs into known operator symbols.
pub(crate) fn tokenize(text: &str, base: usize) -> Result<Vec<Tok<'_>>, ParserError> {
	let mut out = Vec::new();
	for token in scan(&TABLE, text, base)? {
		let first = token.text.chars().next().expect("scanner never emits empty tokens");
		let offset = token.offset;
		match first {
			' ' | '\t' | '\r' | '\n' => {}
			'a'..='z' | 'A'..='Z' | '_' => out.push(Tok { kind: TokKind::Ident, text: token.text, offset }),
			'0'..='9' => out.push(Tok { kind: TokKind::Number, text: token.text, offset }),
			'"' | '\'' | '`' => out.push(Tok { kind: TokKind::Str(first), text: token.text, offset }),
			'(' | ')' | '[' | ']' | '{' | '}' => {
				out.push(Tok { kind: TokKind::Punct, text: token.text, offset })
			}
			_ => {
				// A punctuation run; split greedily.
				let mut rest = token.text;
				let mut at = offset;
				'split: while !rest.is_empty() {
					for symbol in SYMBOLS.iter() {
						if let Some(tail) = rest.strip_prefix(symbol) {
							out.push(Tok { kind: TokKind::Punct, text: &rest[..symbol.len()], offset: at });
							at += symbol.len();
							rest = tail;
							continue 'split;
						}
					}
					return Err(ParseError::new(
						at,
						ParseErrorKind::UnknownOperator(rest.chars().next().unwrap_or('?').to_string()),
					)
					.into());
				}
			}
		}
	}
	Ok(out)
}

enum StackOp {
	Bin { op: BinaryOp, priority: u8, offset: usize },
	Un { op: UnaryOp, priority: u8, offset: usize },
	Paren { offset: usize },
	Bracket { offset: usize, index: bool },
	Brace { offset: usize },
}

/// Resolves token streams into expression trees. Holds the declared-name
/// symbol table used to reject undeclared variables under strict checking.
pub(crate) struct ExprParser<'s> {
	symbols: &'s HashSet<String>,
	strict:  bool,
}

impl<'s> ExprParser<'s> {
	pub fn new(symbols: &'s HashSet<String>, strict: bool) -> Self { Self { symbols, strict } }

	/// Parse expression text, reporting errors at absolute offsets.
	pub fn parse(&self, text: &str, base: usize) -> Result<Expression, ParserError> {
		let toks = tokenize(text, base)?;
		self.parse_tokens(&toks, base)
	}

	/// Parse an already-tokenized expression; `at` is the offset cited when
	/// the token list is empty.
	pub fn parse_tokens(&self, toks: &[Tok<'_>], at: usize) -> Result<Expression, ParserError> {
		let mut operands: Vec<Expression> = Vec::new();
		let mut ops: Vec<StackOp> = Vec::new();
		let mut before_operand = true;
		// Set when a call/constructor/method operator was just pushed, so
		// the following `(` is its argument list rather than a cast or a
		// grouping.
		let mut pending_call = false;
		let mut i = 0;

		while i < toks.len() {
			let t = &toks[i];
			match t.kind {
				TokKind::Number => {
					self.expect_operand_position(before_operand, t)?;
					operands.push(parse_number(t)?);
					before_operand = false;
				}
				TokKind::Str(quote) => {
					self.expect_operand_position(before_operand, t)?;
					operands.push(parse_quoted(t, quote)?);
					before_operand = false;
				}
				TokKind::Ident if before_operand => match t.text {
					"true" | "false" => {
						operands.push(Expression::constant(Constant::Bool(t.text == "true"), t.text, t.offset));
						before_operand = false;
					}
					"null" => {
						operands.push(Expression::constant(Constant::Null, t.text, t.offset));
						before_operand = false;
					}
					"new" => {
						let (name, next) = merge_constructor_name(toks, i)?;
						if matches!(toks.get(next), Some(n) if n.kind == TokKind::Punct && n.text == "(") {
							ops.push(StackOp::Un { op: UnaryOp::New(name), priority: 99, offset: t.offset });
							pending_call = true;
						} else {
							// No argument list: insert the empty placeholder.
							operands.push(Expression::Unary {
								op:       UnaryOp::New(name),
								priority: 99,
								operand:  Box::new(Expression::constant(Constant::Empty, "", t.offset)),
								offset:   t.offset,
							});
							before_operand = false;
						}
						i = next - 1;
					}
					name => {
						if matches!(toks.get(i + 1), Some(n) if n.kind == TokKind::Punct && n.text == "(") {
							ops.push(StackOp::Un {
								op:       UnaryOp::Call(name.to_string()),
								priority: 99,
								offset:   t.offset,
							});
							pending_call = true;
						} else {
							// Member names after `.` are resolved against the
							// left operand at render time, not the symbol table.
							let member = i > 0 && toks[i - 1].kind == TokKind::Punct && toks[i - 1].text == ".";
							if self.strict && !member && !self.symbols.contains(name) {
								return Err(ParseError::new(
									t.offset,
									ParseErrorKind::UndeclaredVariable(name.to_string()),
								)
								.into());
							}
							operands.push(Expression::Variable { name: name.to_string(), offset: t.offset });
							before_operand = false;
						}
					}
				},
				TokKind::Ident => {
					// Operator position: keyword aliases. `lt` has always
					// mapped to `>` here, same as `gt`; existing templates
					// depend on it, so it stays.
					let symbol = match t.text {
						"gt" => ">",
						"ge" => ">=",
						"lt" => ">",
						"le" => "<=",
						"is" | "instanceof" => "instanceof",
						other => {
							return Err(
								ParseError::new(t.offset, ParseErrorKind::UnexpectedToken(other.to_string()))
									.into(),
							);
						}
					};
					push_binary(&mut ops, &mut operands, symbol, t.offset)?;
					before_operand = true;
				}
				TokKind::Punct => match t.text {
					"(" if before_operand => {
						if pending_call {
							ops.push(StackOp::Paren { offset: t.offset });
							pending_call = false;
						} else if let Some(ty) = cast_target(toks, i) {
							ops.push(StackOp::Un { op: UnaryOp::Cast(ty), priority: 90, offset: t.offset });
							i += 2; // consume the identifier and the `)`
						} else {
							ops.push(StackOp::Paren { offset: t.offset });
						}
					}
					"(" => {
						return Err(
							ParseError::new(t.offset, ParseErrorKind::UnexpectedToken("(".to_string())).into(),
						);
					}
					")" => {
						if before_operand {
							operands.push(Expression::constant(Constant::Empty, "", t.offset));
						}
						reduce_to_paren(&mut ops, &mut operands, t.offset)?;
						before_operand = false;
					}
					"[" if before_operand => ops.push(StackOp::Bracket { offset: t.offset, index: false }),
					"[" => {
						pop_while(&mut ops, &mut operands, 95)?;
						ops.push(StackOp::Bracket { offset: t.offset, index: true });
						before_operand = true;
					}
					"]" => {
						if before_operand {
							operands.push(Expression::constant(Constant::Empty, "", t.offset));
						}
						reduce_to_bracket(&mut ops, &mut operands, t.offset)?;
						before_operand = false;
					}
					"{" if before_operand => ops.push(StackOp::Brace { offset: t.offset }),
					"{" => {
						return Err(
							ParseError::new(t.offset, ParseErrorKind::UnexpectedToken("{".to_string())).into(),
						);
					}
					"}" => {
						if before_operand {
							operands.push(Expression::constant(Constant::Empty, "", t.offset));
						}
						reduce_to_brace(&mut ops, &mut operands, t.offset)?;
						before_operand = false;
					}
					"." if !before_operand && method_call_name(toks, i).is_some() => {
						let name = method_call_name(toks, i).expect("checked above");
						pop_while(&mut ops, &mut operands, 95)?;
						ops.push(StackOp::Bin { op: BinaryOp::MethodCall(name), priority: 95, offset: t.offset });
						pending_call = true;
						before_operand = true;
						i += 1; // consume the method name; `(` follows
					}
					symbol if before_operand => {
						let op = match symbol {
							"+" => UnaryOp::Pos,
							"-" => UnaryOp::Neg,
							"!" => UnaryOp::Not,
							"~" => UnaryOp::BitNot,
							_ => {
								return Err(ParseError::new(
									t.offset,
									ParseErrorKind::MissingOperand(symbol.to_string()),
								)
								.into());
							}
						};
						ops.push(StackOp::Un { op, priority: 90, offset: t.offset });
					}
					symbol => {
						push_binary(&mut ops, &mut operands, symbol, t.offset)?;
						before_operand = true;
					}
				},
			}
			i += 1;
		}

		while let Some(op) = ops.pop() {
			match op {
				StackOp::Paren { offset } => {
					return Err(ParseError::new(offset, ParseErrorKind::UnclosedBracket('(')).into());
				}
				StackOp::Bracket { offset, .. } => {
					return Err(ParseError::new(offset, ParseErrorKind::UnclosedBracket('[')).into());
				}
				StackOp::Brace { offset } => {
					return Err(ParseError::new(offset, ParseErrorKind::UnclosedBracket('{')).into());
				}
				op => reduce(op, &mut operands)?,
			}
		}

		match operands.len() {
			1 => Ok(operands.pop().expect("length checked")),
			0 => Err(ParseError::new(at, ParseErrorKind::ExpectedExpression).into()),
			_ => Err(anyhow::anyhow!("operand stack imbalance after reduction").into()),
		}
	}

	fn expect_operand_position(&self, before_operand: bool, t: &Tok<'_>) -> Result<(), ParserError> {
		if before_operand {
			Ok(())
		} else {
			Err(ParseError::new(t.offset, ParseErrorKind::UnexpectedToken(t.text.to_string())).into())
		}
	}
}

/// `new a.b.c` merges the dotted identifier run into one constructor name.
/// Returns the name and the index just past the run.
fn merge_constructor_name<'a>(toks: &[Tok<'a>], new_at: usize) -> Result<(String, usize), ParserError> {
	let first = toks.get(new_at + 1).filter(|t| t.kind == TokKind::Ident).ok_or_else(|| {
		ParseError::new(toks[new_at].offset, ParseErrorKind::UnexpectedToken("new".to_string()))
	})?;
	let mut name = first.text.to_string();
	let mut i = new_at + 2;
	while matches!(toks.get(i), Some(d) if d.kind == TokKind::Punct && d.text == ".")
		&& matches!(toks.get(i + 1), Some(n) if n.kind == TokKind::Ident)
	{
		name.push('.');
		name.push_str(toks[i + 1].text);
		i += 2;
	}
	Ok((name, i))
}

/// `( ident )` followed by an identifier or `(` is a type cast.
fn cast_target<'a>(toks: &[Tok<'a>], paren_at: usize) -> Option<String> {
	let ty = toks.get(paren_at + 1).filter(|t| t.kind == TokKind::Ident)?;
	toks.get(paren_at + 2).filter(|t| t.kind == TokKind::Punct && t.text == ")")?;
	let after = toks.get(paren_at + 3)?;
	match after.kind {
		TokKind::Ident => Some(ty.text.to_string()),
		TokKind::Punct if after.text == "(" => Some(ty.text.to_string()),
		_ => None,
	}
}

/// `.name(` marks a method call against the preceding operand.
fn method_call_name<'a>(toks: &[Tok<'a>], dot_at: usize) -> Option<String> {
	let name = toks.get(dot_at + 1).filter(|t| t.kind == TokKind::Ident)?;
	toks.get(dot_at + 2).filter(|t| t.kind == TokKind::Punct && t.text == "(")?;
	Some(name.text.to_string())
}

fn push_binary(
	ops: &mut Vec<StackOp>,
	operands: &mut Vec<Expression>,
	symbol: &str,
	offset: usize,
) -> Result<(), ParserError> {
	let (op, priority) = BinaryOp::from_symbol(symbol)
		.ok_or_else(|| ParseError::new(offset, ParseErrorKind::UnknownOperator(symbol.to_string())))?;
	pop_while(ops, operands, priority)?;
	ops.push(StackOp::Bin { op, priority, offset });
	Ok(())
}

/// Pop and reduce stacked operators with priority at or above `floor`,
/// never crossing a bracket sentinel. Equal priority reduces, which keeps
/// same-rank operators left-associative.
fn pop_while(ops: &mut Vec<StackOp>, operands: &mut Vec<Expression>, floor: u8) -> Result<(), ParserError> {
	while let Some(StackOp::Bin { priority, .. } | StackOp::Un { priority, .. }) = ops.last() {
		if *priority < floor {
			break;
		}
		let Some(op) = ops.pop() else { break };
		reduce(op, operands)?;
	}
	Ok(())
}

/// Reduce one stacked operator against the operand stack. The right
/// operand pops first.
fn reduce(op: StackOp, operands: &mut Vec<Expression>) -> Result<(), ParserError> {
	match op {
		StackOp::Bin { op, priority, offset } => {
			let right = pop_operand(operands, op.symbol(), offset)?;
			let left = pop_operand(operands, op.symbol(), offset)?;
			operands.push(Expression::Binary { op, priority, left: Box::new(left), right: Box::new(right), offset });
		}
		StackOp::Un { op, priority, offset } => {
			let symbol = match &op {
				UnaryOp::Call(name) | UnaryOp::New(name) | UnaryOp::Cast(name) => name.clone(),
				UnaryOp::Pos => "+".to_string(),
				UnaryOp::Neg => "-".to_string(),
				UnaryOp::Not => "!".to_string(),
				UnaryOp::BitNot => "~".to_string(),
				UnaryOp::List => "[".to_string(),
				UnaryOp::Map => "{".to_string(),
			};
			let operand = pop_operand(operands, &symbol, offset)?;
			operands.push(Expression::Unary { op, priority, operand: Box::new(operand), offset });
		}
		_ => return Err(anyhow::anyhow!("bracket sentinel reached reduction").into()),
	}
	Ok(())
}

fn pop_operand(operands: &mut Vec<Expression>, symbol: &str, offset: usize) -> Result<Expression, ParserError> {
	operands
		.pop()
		.ok_or_else(|| ParseError::new(offset, ParseErrorKind::MissingOperand(symbol.to_string())).into())
}

fn reduce_to_paren(
	ops: &mut Vec<StackOp>,
	operands: &mut Vec<Expression>,
	offset: usize,
) -> Result<(), ParserError> {
	while let Some(op) = ops.pop() {
		match op {
			StackOp::Paren { .. } => return Ok(()),
			StackOp::Bracket { .. } | StackOp::Brace { .. } => break,
			op => reduce(op, operands)?,
		}
	}
	Err(ParseError::new(offset, ParseErrorKind::MissingLeftParenthesis).into())
}

fn reduce_to_bracket(
	ops: &mut Vec<StackOp>,
	operands: &mut Vec<Expression>,
	offset: usize,
) -> Result<(), ParserError> {
	while let Some(op) = ops.pop() {
		match op {
			StackOp::Bracket { offset: open, index: true } => {
				let right = pop_operand(operands, "[", open)?;
				let left = pop_operand(operands, "[", open)?;
				operands.push(Expression::Binary {
					op:       BinaryOp::Index,
					priority: 95,
					left:     Box::new(left),
					right:    Box::new(right),
					offset:   open,
				});
				return Ok(());
			}
			StackOp::Bracket { offset: open, index: false } => {
				let operand = pop_operand(operands, "[", open)?;
				operands.push(Expression::Unary {
					op:       UnaryOp::List,
					priority: 99,
					operand:  Box::new(operand),
					offset:   open,
				});
				return Ok(());
			}
			StackOp::Paren { .. } | StackOp::Brace { .. } => break,
			op => reduce(op, operands)?,
		}
	}
	Err(ParseError::new(offset, ParseErrorKind::MissingLeftBracket(']')).into())
}

fn reduce_to_brace(
	ops: &mut Vec<StackOp>,
	operands: &mut Vec<Expression>,
	offset: usize,
) -> Result<(), ParserError> {
	while let Some(op) = ops.pop() {
		match op {
			StackOp::Brace { offset: open } => {
				let operand = pop_operand(operands, "{", open)?;
				operands.push(Expression::Unary {
					op:       UnaryOp::Map,
					priority: 99,
					operand:  Box::new(operand),
					offset:   open,
				});
				return Ok(());
			}
			StackOp::Paren { .. } | StackOp::Bracket { .. } => break,
			op => reduce(op, operands)?,
		}
	}
	Err(ParseError::new(offset, ParseErrorKind::MissingLeftBracket('}')).into())
}

/// Parse a numeric literal, honoring the width suffixes `b/s/i/l` (integer)
/// and `f/d` (floating); the capitalized forms request boxed results, which
/// collapse to the same runtime representation here.
fn parse_number(t: &Tok<'_>) -> Result<Expression, ParserError> {
	let invalid = || ParseError::new(t.offset, ParseErrorKind::InvalidNumber(t.text.to_string()));
	let last = t.text.chars().last().ok_or_else(invalid)?;
	let (body, float) = match last {
		'b' | 'B' | 's' | 'S' | 'i' | 'I' | 'l' | 'L' => (&t.text[..t.text.len() - 1], false),
		'f' | 'F' | 'd' | 'D' => (&t.text[..t.text.len() - 1], true),
		c if c.is_ascii_alphabetic() => return Err(invalid().into()),
		_ => (t.text, t.text.contains('.')),
	};
	let value = if float {
		Constant::Float(body.parse::<f64>().map_err(|_| invalid())?)
	} else {
		Constant::Int(body.parse::<i64>().map_err(|_| invalid())?)
	};
	Ok(Expression::constant(value, t.text, t.offset))
}

/// Parse a quoted literal: `"` and `'` delimit strings, a back-quoted
/// literal of length 1 is a character constant.
fn parse_quoted(t: &Tok<'_>, quote: char) -> Result<Expression, ParserError> {
	let inner = &t.text[1..t.text.len() - 1];
	let unescaped = unescape(inner);
	if quote == '`' {
		let mut chars = unescaped.chars();
		match (chars.next(), chars.next()) {
			(Some(c), None) => Ok(Expression::constant(Constant::Char(c), t.text, t.offset)),
			_ => Err(ParseError::new(t.offset, ParseErrorKind::InvalidCharLiteral(t.text.to_string())).into()),
		}
	} else {
		Ok(Expression::constant(Constant::Str(unescaped), t.text, t.offset))
	}
}

fn unescape(inner: &str) -> String {
	let mut out = String::with_capacity(inner.len());
	let mut chars = inner.chars();
	while let Some(c) = chars.next() {
		if c != '\\' {
			out.push(c);
			continue;
		}
		match chars.next() {
			Some('n') => out.push('\n'),
			Some('t') => out.push('\t'),
			Some('r') => out.push('\r'),
			Some('0') => out.push('\0'),
			Some(other) => out.push(other),
			None => out.push('\\'),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(input: &str, equals: &str) {
		let symbols = HashSet::new();
		let parser = ExprParser::new(&symbols, false);
		let ast = parser.parse(input, 0).unwrap();
		assert_eq!(ast.to_string(), equals);
	}

	fn parse_err(input: &str, equals: ParseErrorKind) {
		let symbols = HashSet::new();
		let parser = ExprParser::new(&symbols, false);
		match parser.parse(input, 0) {
			Err(ParserError::ParseError(e)) => assert_eq!(*e.kind(), equals),
			other => panic!("expected a parse error, got {other:?}"),
		}
	}

	#[test]
	fn parse_precedence() {
		parse("1 + 2 * 3", "(+ 1 (* 2 3))");
		parse("1 * 2 + 3", "(+ (* 1 2) 3)");
		parse("1 + 2 - 3", "(- (+ 1 2) 3)");
		parse("1 .. n * 2", "(.. 1 (* n 2))");
		parse("a < b == c", "(== (< a b) c)");
		parse("a && b || c", "(|| (&& a b) c)");
		parse("1 << 2 + 3", "(<< 1 (+ 2 3))");
	}

	#[test]
	fn parse_unary() {
		parse("-a * b", "(* (- a) b)");
		parse("!done", "(! done)");
		parse("!!a", "(! (! a))");
		parse("~x & y", "(& (~ x) y)");
		parse("-(a + b)", "(- (+ a b))");
	}

	#[test]
	fn parse_member_access() {
		parse("a.b.c", "(. (. a b) c)");
		parse("a.b[0]", "(index (. a b) 0)");
		parse("!a.b", "(! (. a b))");
		parse("a.m(x, y)", "(.m a (, x y))");
		parse("a.m()", "(.m a Empty)");
	}

	#[test]
	fn parse_calls_and_constructors() {
		parse("f(x)", "(call f x)");
		parse("f()", "(call f Empty)");
		parse("f(x, y)", "(call f (, x y))");
		parse("f(x) + 1", "(+ (call f x) 1)");
		parse("new a.b.C(x)", "(new a.b.C x)");
		parse("new Thing", "(new Thing Empty)");
	}

	#[test]
	fn parse_casts() {
		parse("(int) x", "((int) x)");
		parse("(double) f(x)", "((double) (call f x))");
		parse("(a) + b", "(+ a b)");
	}

	#[test]
	fn parse_keyword_aliases() {
		parse("a gt b", "(> a b)");
		parse("a ge b", "(>= a b)");
		// `lt` reproduces the long-standing `>` mapping.
		parse("a lt b", "(> a b)");
		parse("a le b", "(<= a b)");
		parse("a is b", "(instanceof a b)");
	}

	#[test]
	fn parse_ternary_and_comma() {
		parse("a ? b : c", "(: (? a b) c)");
		parse("a == 1 ? b : c", "(: (? (== a 1) b) c)");
		parse("a, b, c", "(, (, a b) c)");
	}

	#[test]
	fn parse_literals() {
		parse("42", "42");
		parse("3.14", "3.14");
		parse("12L", "12L");
		parse("1.5f", "1.5f");
		parse("\"hi\"", "\"hi\"");
		parse("'hi'", "'hi'");
		parse("`x`", "`x`");
		parse("true", "true");
		parse("null", "null");
	}

	#[test]
	fn parse_collections() {
		parse("[1, 2, 3]", "(list (, (, 1 2) 3))");
		parse("[]", "(list Empty)");
		parse("m[k]", "(index m k)");
		parse("m[\"a\"]", "(index m \"a\")");
		parse("{\"a\": 1}", "(map (: \"a\" 1))");
	}

	#[test]
	fn parse_ranges() {
		parse("1 .. 3", "(.. 1 3)");
		parse("1..3", "(.. 1 3)");
		parse("1 .. n - 1", "(.. 1 (- n 1))");
	}

	#[test]
	fn parse_errors() {
		parse_err("1 +", ParseErrorKind::MissingOperand("+".to_string()));
		parse_err("* 2", ParseErrorKind::MissingOperand("*".to_string()));
		parse_err("(a", ParseErrorKind::UnclosedBracket('('));
		parse_err("a)", ParseErrorKind::MissingLeftParenthesis);
		parse_err("a]", ParseErrorKind::MissingLeftBracket(']'));
		parse_err("[a)", ParseErrorKind::MissingLeftParenthesis);
		parse_err("", ParseErrorKind::ExpectedExpression);
		parse_err("a @ b", ParseErrorKind::UnknownOperator("@".to_string()));
		parse_err("12x", ParseErrorKind::InvalidNumber("12x".to_string()));
		parse_err("`ab`", ParseErrorKind::InvalidCharLiteral("`ab`".to_string()));
	}

	#[test]
	fn parse_strict_rejects_undeclared() {
		let mut symbols = HashSet::new();
		symbols.insert("x".to_string());
		let parser = ExprParser::new(&symbols, true);
		assert!(parser.parse("x + 1", 0).is_ok());
		let err = parser.parse("y + 1", 0).unwrap_err();
		match err {
			ParserError::ParseError(e) => {
				assert_eq!(*e.kind(), ParseErrorKind::UndeclaredVariable("y".to_string()));
			}
			other => panic!("expected a parse error, got {other:?}"),
		}
	}

	#[test]
	fn parse_error_offsets_are_absolute() {
		let symbols = HashSet::new();
		let parser = ExprParser::new(&symbols, false);
		let err = parser.parse("a @ b", 100).unwrap_err();
		match err {
			ParserError::ParseError(e) => assert_eq!(e.offset(), 102),
			other => panic!("expected a parse error, got {other:?}"),
		}
		// Lexical errors are rebased too, not left text-relative.
		let err = parser.parse("x + 'oops", 100).unwrap_err();
		match err {
			ParserError::ScanError(e) => assert_eq!(e.offset(), 109),
			other => panic!("expected a scan error, got {other:?}"),
		}
	}
}
