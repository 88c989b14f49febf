//! The directive interpreter and block reducer.
//!
//! Turns the flat token stream of the directive scanner into statements,
//! delegating every embedded expression substring to the expression parser
//! with its absolute offset preserved. Adjacent plain text tokens are
//! merged, blank-line padding around structural directives is trimmed, and
//! a frame stack reduces the flat statement list into nested blocks.

pub mod expression;

use std::{collections::HashSet, sync::Arc};

use expression::{BinaryOp, Constant, ExprParser, Expression, Tok, TokKind};

use crate::{
	error::parser::{ParseError, ParseErrorKind, ParserError},
	scanner::directive::scan_directives,
	statement::{MacroDef, SetClause, Statement, Template},
};

/// The configurable directive vocabulary. Each directive kind may carry
/// several accepted names; the first name of each list is the canonical one.
#[derive(Debug, Clone)]
pub struct Syntax {
	pub var:     Vec<String>,
	pub r#if:    Vec<String>,
	pub r#else:  Vec<String>,
	pub r#for:   Vec<String>,
	pub r#break: Vec<String>,
	pub r#macro: Vec<String>,
	pub end:     Vec<String>,
}

impl Default for Syntax {
	fn default() -> Self {
		let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
		Self {
			var:     names(&["var"]),
			r#if:    names(&["if"]),
			r#else:  names(&["else"]),
			r#for:   names(&["for"]),
			r#break: names(&["break"]),
			r#macro: names(&["macro"]),
			end:     names(&["end"]),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DirectiveKind {
	Var,
	If,
	Else,
	For,
	Break,
	Macro,
	End,
}

impl Syntax {
	fn kind_of(&self, name: &str) -> Option<DirectiveKind> {
		let hit = |list: &[String]| list.iter().any(|n| n == name);
		if hit(&self.var) {
			Some(DirectiveKind::Var)
		} else if hit(&self.r#if) {
			Some(DirectiveKind::If)
		} else if hit(&self.r#else) {
			Some(DirectiveKind::Else)
		} else if hit(&self.r#for) {
			Some(DirectiveKind::For)
		} else if hit(&self.r#break) {
			Some(DirectiveKind::Break)
		} else if hit(&self.r#macro) {
			Some(DirectiveKind::Macro)
		} else if hit(&self.end) {
			Some(DirectiveKind::End)
		} else {
			None
		}
	}
}

/// A statement-or-marker in the flat stream, before reduction. `start` and
/// `end` are source offsets; trimming relies on them to decide adjacency.
struct FlatItem {
	flat:  Flat,
	start: usize,
	end:   usize,
}

enum Flat {
	Stmt(Statement),
	Open(OpenBlock),
	Else { condition: Option<Expression> },
	End,
}

enum OpenBlock {
	If { condition: Expression },
	Else { condition: Option<Expression> },
	For { name: String, collection: Expression },
	Macro { def: MacroDef },
}

/// Parses template source into a [`Template`]. Declared names accumulate in
/// the symbol table as `#var`, `#for` and `#macro` directives are seen, so
/// strict checking accepts uses after declaration.
pub(crate) struct Parser {
	syntax:  Syntax,
	strict:  bool,
	trim:    bool,
	symbols: HashSet<String>,
}

impl Parser {
	pub fn new(syntax: Syntax, strict: bool, trim: bool, mut symbols: HashSet<String>) -> Self {
		// The loop-status variable is always in scope.
		symbols.insert("for".to_string());
		Self { syntax, strict, trim, symbols }
	}

	pub fn parse(&mut self, source: &str, base: usize) -> Result<Template, ParserError> {
		let tokens = scan_directives(source, base)?;
		let mut items = Vec::with_capacity(tokens.len());
		for token in &tokens {
			items.push(self.classify(token.text, token.offset)?);
		}
		merge_texts(&mut items);
		if self.trim {
			trim_flat(&mut items);
		}
		reduce(items)
	}

	fn classify(&mut self, text: &str, offset: usize) -> Result<FlatItem, ParserError> {
		let end = offset + text.len();
		let item = |flat| Ok(FlatItem { flat, start: offset, end });
		let stmt = |s| item(Flat::Stmt(s));

		if let Some(rest) = text.strip_prefix("#[") {
			let content = rest.strip_suffix("]#").unwrap_or(rest).to_string();
			return stmt(Statement::Text { content, literal: true });
		}
		if let Some(rest) = text.strip_prefix("#*") {
			let content = rest.strip_suffix("*#").unwrap_or(rest).to_string();
			return stmt(Statement::Comment { content, block: true });
		}
		if let Some(rest) = text.strip_prefix("##") {
			return stmt(Statement::Comment { content: rest.to_string(), block: false });
		}
		for (prefix, suppress) in [("${", false), ("$!{", true), ("#{", false), ("#!{", true)] {
			if let Some(rest) = text.strip_prefix(prefix) {
				let body = rest.strip_suffix('}').unwrap_or(rest);
				let expression = self.expr().parse(body, offset + prefix.len())?;
				return stmt(Statement::Value { expression, suppress_filter: suppress });
			}
		}
		if text.starts_with('\\') {
			// A backslash run; if it ends in a sigil, pairs halve and the
			// sigil is literal.
			let content = match text.strip_suffix(['#', '$']) {
				Some(run) => {
					let sigil = &text[text.len() - 1..];
					format!("{}{}", "\\".repeat(run.len() / 2), sigil)
				}
				None => text.to_string(),
			};
			return stmt(Statement::Text { content, literal: false });
		}
		if text.len() > 1 && text.starts_with('#') {
			return self.classify_directive(text, offset);
		}
		stmt(Statement::Text { content: text.to_string(), literal: false })
	}

	fn classify_directive(&mut self, text: &str, offset: usize) -> Result<FlatItem, ParserError> {
		let end = offset + text.len();
		let item = |flat| Ok(FlatItem { flat, start: offset, end });

		let (name, params, base) = match text.find('(') {
			Some(paren) => (&text[1..paren], Some(&text[paren + 1..text.len() - 1]), offset + paren + 1),
			None => (&text[1..], None, end),
		};
		let kind = match self.syntax.kind_of(name) {
			Some(kind) => kind,
			// An unknown directive name passes through as text.
			None => return item(Flat::Stmt(Statement::Text { content: text.to_string(), literal: false })),
		};
		match kind {
			DirectiveKind::Var => {
				let clauses = self.parse_var(params.unwrap_or(""), base)?;
				item(Flat::Stmt(Statement::Set(clauses)))
			}
			DirectiveKind::If => {
				let condition = self.require_expr(params, base)?;
				item(Flat::Open(OpenBlock::If { condition }))
			}
			DirectiveKind::Else => {
				let condition = self.optional_expr(params, base)?;
				item(Flat::Else { condition })
			}
			DirectiveKind::For => {
				let (name, collection) = self.parse_for(params, base)?;
				item(Flat::Open(OpenBlock::For { name, collection }))
			}
			DirectiveKind::Break => {
				let condition = self.optional_expr(params, base)?;
				item(Flat::Stmt(Statement::Break { condition, offset }))
			}
			DirectiveKind::Macro => {
				let def = self.parse_macro(params, base, offset)?;
				item(Flat::Open(OpenBlock::Macro { def }))
			}
			DirectiveKind::End => item(Flat::End),
		}
	}

	fn expr(&self) -> ExprParser<'_> { ExprParser::new(&self.symbols, self.strict) }

	fn require_expr(&self, params: Option<&str>, base: usize) -> Result<Expression, ParserError> {
		match params {
			Some(text) => self.expr().parse(text, base),
			None => Err(ParseError::new(base, ParseErrorKind::ExpectedExpression).into()),
		}
	}

	fn optional_expr(&self, params: Option<&str>, base: usize) -> Result<Option<Expression>, ParserError> {
		match params {
			Some(text) if !text.trim().is_empty() => Ok(Some(self.expr().parse(text, base)?)),
			_ => Ok(None),
		}
	}

	/// `#var(name = expr, ...)` assignments, or `#var(Type name, ...)`
	/// declarations when no top-level `=` is present. A `:` before the `=`
	/// exports the binding to the enclosing scope, a `.` hides it.
	fn parse_var(&mut self, params: &str, base: usize) -> Result<Vec<SetClause>, ParserError> {
		let toks = expression::tokenize(params, base)?;
		if toks.is_empty() {
			return Err(ParseError::new(base, ParseErrorKind::ExpectedExpression).into());
		}
		let assignment = has_top_level(&toks, "=");
		let mut clauses = Vec::new();
		for clause in split_top_level(&toks, ",", !assignment) {
			let first = clause.first().ok_or_else(|| {
				ParseError::new(base, ParseErrorKind::InvalidDirective("Empty #var clause".to_string()))
			})?;
			let invalid = |msg: &str| {
				ParserError::from(ParseError::new(
					first.offset,
					ParseErrorKind::InvalidDirective(msg.to_string()),
				))
			};
			if assignment {
				if first.kind != TokKind::Ident {
					return Err(invalid("#var assignment must start with a name"));
				}
				let (export, hide, eq_at) = match clause.get(1).map(|t| t.text) {
					Some(":") if matches!(clause.get(2).map(|t| t.text), Some("=")) => (true, false, 2),
					Some(".") if matches!(clause.get(2).map(|t| t.text), Some("=")) => (false, true, 2),
					Some("=") => (false, false, 1),
					_ => return Err(invalid("#var assignment must use '=', ':=' or '.='")),
				};
				let expression = self.expr().parse_tokens(&clause[eq_at + 1..], first.offset)?;
				self.symbols.insert(first.text.to_string());
				clauses.push(SetClause {
					r#type: None,
					name: first.text.to_string(),
					expression: Some(expression),
					export,
					hide,
					offset: first.offset,
				});
			} else {
				// Declaration: the last identifier names the variable,
				// everything before it is the type text.
				let name = clause.last().filter(|t| t.kind == TokKind::Ident).ok_or_else(|| {
					invalid("#var declaration must end with a name")
				})?;
				let r#type = if clause.len() > 1 {
					Some(params[clause[0].offset - base..name.offset - base].trim().to_string())
				} else {
					None
				};
				self.symbols.insert(name.text.to_string());
				clauses.push(SetClause {
					r#type,
					name: name.text.to_string(),
					expression: None,
					export: false,
					hide: false,
					offset: first.offset,
				});
			}
		}
		Ok(clauses)
	}

	/// `#for(var : collection)` or `#for(var in collection)`; a bare
	/// integer literal collection expands to `1 .. N`.
	fn parse_for(&mut self, params: Option<&str>, base: usize) -> Result<(String, Expression), ParserError> {
		let params =
			params.ok_or_else(|| ParserError::from(ParseError::new(base, ParseErrorKind::ExpectedExpression)))?;
		let toks = expression::tokenize(params, base)?;
		let invalid = |msg: &str| {
			ParserError::from(ParseError::new(base, ParseErrorKind::InvalidDirective(msg.to_string())))
		};
		let name = toks.first().filter(|t| t.kind == TokKind::Ident).ok_or_else(|| {
			invalid("#for must start with a loop variable")
		})?;
		let sep = toks.get(1).filter(|t| t.text == ":" || t.text == "in").ok_or_else(|| {
			invalid("#for separates variable and collection with ':' or 'in'")
		})?;
		let collection = self.expr().parse_tokens(&toks[2..], sep.offset + sep.text.len())?;
		let collection = match collection {
			Expression::Constant { value: Constant::Int(n), literal, offset } => Expression::Binary {
				op:       BinaryOp::Range,
				priority: 55,
				left:     Box::new(Expression::constant(Constant::Int(1), "1", offset)),
				right:    Box::new(Expression::constant(Constant::Int(n), literal, offset)),
				offset,
			},
			other => other,
		};
		self.symbols.insert(name.text.to_string());
		Ok((name.text.to_string(), collection))
	}

	/// `#macro([target [:|.]=] [$] name [(params)] [=> filter])`.
	fn parse_macro(&mut self, params: Option<&str>, base: usize, offset: usize) -> Result<MacroDef, ParserError> {
		let params =
			params.ok_or_else(|| ParserError::from(ParseError::new(base, ParseErrorKind::ExpectedExpression)))?;
		let toks = expression::tokenize(params, base)?;
		let invalid = |msg: &str| {
			ParserError::from(ParseError::new(base, ParseErrorKind::InvalidDirective(msg.to_string())))
		};

		let (head, filter) = match position_top_level(&toks, "=>") {
			Some(at) => {
				let filter = self.expr().parse_tokens(&toks[at + 1..], toks[at].offset + 2)?;
				(&toks[..at], Some(filter))
			}
			None => (&toks[..], None),
		};

		let (target, head) = match position_top_level(head, "=") {
			Some(at) => {
				let name = head.first().filter(|t| t.kind == TokKind::Ident).ok_or_else(|| {
					invalid("#macro capture target must be a name")
				})?;
				let (export, hide) = match at {
					1 => (false, false),
					2 if head[1].text == ":" => (true, false),
					2 if head[1].text == "." => (false, true),
					_ => return Err(invalid("#macro capture target must use '=', ':=' or '.='")),
				};
				self.symbols.insert(name.text.to_string());
				(Some((name.text.to_string(), export, hide)), &head[at + 1..])
			}
			None => (None, head),
		};

		let (auto_output, head) = match head.first() {
			Some(t) if t.kind == TokKind::Punct && t.text == "$" => (true, &head[1..]),
			_ => (false, head),
		};

		let name = head.first().filter(|t| t.kind == TokKind::Ident).ok_or_else(|| {
			invalid("#macro requires a name")
		})?;

		let mut macro_params = Vec::new();
		match head.get(1) {
			None => {}
			Some(t) if t.kind == TokKind::Punct && t.text == "(" => {
				let last = head.last().expect("head holds at least the opening parenthesis");
				if last.kind != TokKind::Punct || last.text != ")" {
					return Err(invalid("#macro parameter list is not closed"));
				}
				let inner = &head[2..head.len() - 1];
				if !inner.is_empty() {
					for clause in split_top_level(inner, ",", true) {
						// The last identifier names the parameter; anything
						// before it is a type annotation, kept out of the tree.
						let param = clause.last().filter(|t| t.kind == TokKind::Ident).ok_or_else(|| {
							invalid("#macro parameter must end with a name")
						})?;
						self.symbols.insert(param.text.to_string());
						macro_params.push(param.text.to_string());
					}
				}
			}
			Some(t) => {
				return Err(ParseError::new(t.offset, ParseErrorKind::UnexpectedToken(t.text.to_string())).into());
			}
		}

		self.symbols.insert(name.text.to_string());
		Ok(MacroDef {
			name: name.text.to_string(),
			params: macro_params,
			filter,
			target,
			auto_output,
			children: Vec::new(),
			offset,
		})
	}
}

/// Whether `symbol` occurs outside any bracket nesting.
fn has_top_level(toks: &[Tok<'_>], symbol: &str) -> bool { position_top_level(toks, symbol).is_some() }

fn position_top_level(toks: &[Tok<'_>], symbol: &str) -> Option<usize> {
	let mut depth = 0usize;
	for (i, t) in toks.iter().enumerate() {
		if t.kind == TokKind::Punct {
			match t.text {
				"(" | "[" | "{" => depth += 1,
				")" | "]" | "}" => depth = depth.saturating_sub(1),
				s if s == symbol && depth == 0 => return Some(i),
				_ => {}
			}
		}
	}
	None
}

/// Split a token slice on a top-level separator. With `angles` set, `<`/`>`
/// also nest, which keeps generic type arguments in one clause; that is only
/// safe for declaration lists, never expression text.
fn split_top_level<'a, 'b>(toks: &'a [Tok<'b>], separator: &str, angles: bool) -> Vec<&'a [Tok<'b>]> {
	let mut out = Vec::new();
	let mut depth = 0isize;
	let mut start = 0usize;
	for (i, t) in toks.iter().enumerate() {
		if t.kind != TokKind::Punct {
			continue;
		}
		match t.text {
			"(" | "[" | "{" => depth += 1,
			")" | "]" | "}" => depth -= 1,
			"<" if angles => depth += 1,
			">" if angles => depth -= 1,
			s if s == separator && depth == 0 => {
				out.push(&toks[start..i]);
				start = i + 1;
			}
			_ => {}
		}
	}
	out.push(&toks[start..]);
	out
}

/// Merge adjacent non-literal text statements so later passes see
/// contiguous spans.
fn merge_texts(items: &mut Vec<FlatItem>) {
	let mut merged: Vec<FlatItem> = Vec::with_capacity(items.len());
	for item in items.drain(..) {
		if let (
			Some(FlatItem { flat: Flat::Stmt(Statement::Text { content: prev, literal: false }), end, .. }),
			FlatItem { flat: Flat::Stmt(Statement::Text { content, literal: false }), end: item_end, .. },
		) = (merged.last_mut(), &item)
		{
			prev.push_str(content);
			*end = *item_end;
			continue;
		}
		merged.push(item);
	}
	*items = merged;
}

/// Trim blank-line padding around structural directives.
///
/// A preceding text ending in a newline plus blanks loses the blanks; a
/// following text starting with blanks up to and including its first
/// newline loses that run. Both only apply while the text span is
/// source-adjacent to the directive span, and trimming moves the span
/// boundary, so a second pass finds nothing left to remove.
fn trim_flat(items: &mut Vec<FlatItem>) {
	let structural = |flat: &Flat| {
		matches!(
			flat,
			Flat::Open(_)
				| Flat::Else { .. }
				| Flat::End
				| Flat::Stmt(Statement::Set(_))
				| Flat::Stmt(Statement::Break { .. })
				| Flat::Stmt(Statement::Comment { .. })
		)
	};
	for i in 0..items.len() {
		if !structural(&items[i].flat) {
			continue;
		}
		let (start, end) = (items[i].start, items[i].end);
		if i > 0 {
			if let FlatItem {
				flat: Flat::Stmt(Statement::Text { content, literal: false }),
				end: text_end,
				..
			} = &mut items[i - 1]
			{
				if *text_end == start {
					if let Some(at) = trailing_blank_run(content) {
						*text_end -= content.len() - at;
						content.truncate(at);
					}
				}
			}
		}
		if let Some(FlatItem {
			flat: Flat::Stmt(Statement::Text { content, literal: false }),
			start: text_start,
			..
		}) = items.get_mut(i + 1)
		{
			if *text_start == end {
				if let Some(at) = leading_blank_line(content) {
					*text_start += at;
					content.drain(..at);
				}
			}
		}
	}
	items.retain(|item| {
		!matches!(&item.flat, Flat::Stmt(Statement::Text { content, literal: false }) if content.is_empty())
	});
}

/// The byte position after the last newline, when only blanks follow it.
fn trailing_blank_run(content: &str) -> Option<usize> {
	let at = content.rfind('\n')? + 1;
	content[at..].chars().all(|c| c == ' ' || c == '\t').then_some(at)
}

/// The byte position just past the first newline, when only blanks precede it.
fn leading_blank_line(content: &str) -> Option<usize> {
	for (i, c) in content.char_indices() {
		match c {
			' ' | '\t' | '\r' => {}
			'\n' => return Some(i + 1),
			_ => return None,
		}
	}
	None
}

struct Frame {
	open:     Option<OpenBlock>,
	start:    usize,
	children: Vec<Statement>,
}

/// Reduce the flat item list into a nested statement tree.
fn reduce(items: Vec<FlatItem>) -> Result<Template, ParserError> {
	let mut frames = vec![Frame { open: None, start: 0, children: Vec::new() }];

	for item in items {
		match item.flat {
			Flat::Stmt(statement) => {
				frames.last_mut().expect("the root frame is never popped").children.push(statement)
			}
			Flat::Open(open) => frames.push(Frame { open: Some(open), start: item.start, children: Vec::new() }),
			Flat::Else { condition } => {
				let closed = close_frame(&mut frames, "else", item.start)?;
				match &closed {
					Statement::If { .. } | Statement::Else { .. } => {}
					_ => {
						return Err(ParseError::new(
							item.start,
							ParseErrorKind::UnmatchedEnd("else".to_string()),
						)
						.into());
					}
				}
				frames.last_mut().expect("the root frame is never popped").children.push(closed);
				frames.push(Frame {
					open:     Some(OpenBlock::Else { condition }),
					start:    item.start,
					children: Vec::new(),
				});
			}
			Flat::End => {
				let closed = close_frame(&mut frames, "end", item.start)?;
				frames.last_mut().expect("the root frame is never popped").children.push(closed);
			}
		}
	}

	if let Some(frame) = frames.get(1..).and_then(|rest| rest.last()) {
		return Err(ParseError::new(frame.start, ParseErrorKind::MissingEnd).into());
	}
	let root = frames.pop().expect("the root frame is never popped");
	Ok(Template::new(root.children))
}

fn close_frame(frames: &mut Vec<Frame>, closer: &str, offset: usize) -> Result<Statement, ParserError> {
	if frames.len() < 2 {
		return Err(ParseError::new(offset, ParseErrorKind::UnmatchedEnd(closer.to_string())).into());
	}
	let frame = frames.pop().expect("length checked");
	let children = frame.children;
	Ok(match frame.open.expect("only the root frame has no open block") {
		OpenBlock::If { condition } => Statement::If { condition, children },
		OpenBlock::Else { condition } => Statement::Else { condition, children },
		OpenBlock::For { name, collection } => Statement::For { name, collection, children },
		OpenBlock::Macro { mut def } => {
			def.children = children;
			Statement::Macro(Arc::new(def))
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(input: &str, equals: &str) {
		let mut parser = Parser::new(Syntax::default(), false, true, HashSet::new());
		let template = parser.parse(input, 0).unwrap();
		assert_eq!(template.to_string(), equals);
	}

	fn parse_err(input: &str, equals: ParseErrorKind) {
		let mut parser = Parser::new(Syntax::default(), false, true, HashSet::new());
		match parser.parse(input, 0) {
			Err(ParserError::ParseError(e)) => assert_eq!(*e.kind(), equals),
			other => panic!("expected a parse error, got {other:?}"),
		}
	}

	#[test]
	fn parse_text_and_interpolations() {
		parse("hello", "hello");
		parse("a${x}b", "a${x}b");
		parse("$!{x}", "$!{x}");
		parse("#{x + 1}", "${(+ x 1)}");
		parse("#!{x}", "$!{x}");
	}

	#[test]
	fn parse_if_blocks() {
		parse("#if(x)a#end", "#if(x)a#end");
		parse("#if(x > 0)a#else b#end", "#if((> x 0))a#end#else b#end");
		parse("#if(a)1#else(b)2#else 3#end", "#if(a)1#end#else(b)2#end#else 3#end");
		parse("#if(x)#if(y)a#end#end", "#if(x)#if(y)a#end#end");
	}

	#[test]
	fn parse_for_blocks() {
		parse("#for(i : 1 .. 3)${i}#end", "#for(i : (.. 1 3))${i}#end");
		parse("#for(i in list)${i}#end", "#for(i : list)${i}#end");
		parse("#for(i : 5)x#end", "#for(i : (.. 1 5))x#end");
	}

	#[test]
	fn parse_var_directives() {
		parse("#var(x = 1)", "#var(x = 1)");
		parse("#var(x = 1, y := 2, z .= 3)", "#var(x = 1, y := 2, z .= 3)");
		parse("#var(int x)", "#var(int x)");
		parse("#var(Map<String, Object> m, int n)", "#var(Map<String, Object> m, int n)");
	}

	#[test]
	fn parse_break_directives() {
		parse("#for(i : 5)#break(i > 2)${i}#end", "#for(i : (.. 1 5))#break((> i 2))${i}#end");
		parse("#for(i : 5)#break#end", "#for(i : (.. 1 5))#break#end");
	}

	#[test]
	fn parse_macro_directives() {
		parse("#macro(m(a, b))${a}#end", "#macro(m(a, b))${a}#end");
		parse("#macro(m)x#end", "#macro(m)x#end");
		parse("#macro($m)x#end", "#macro($m)x#end");
		parse("#macro(t = m(a))${a}#end", "#macro(t = m(a))${a}#end");
		parse("#macro(t := m)x#end", "#macro(t := m)x#end");
	}

	#[test]
	fn parse_comments() {
		parse("a## note\nb", "a## note\nb");
		parse("a#* note *#b", "a#* note *#b");
		parse("#[ raw ${x} ]#", "#[ raw ${x} ]#");
	}

	#[test]
	fn parse_escapes() {
		parse(r"\#end", "#end");
		parse(r"\\#if", r"\#if");
		parse(r"\$", "$");
		parse("a $ b", "a $ b");
	}

	#[test]
	fn parse_unknown_directive_is_text() {
		parse("#unknown(x) t", "#unknown(x) t");
		parse("#endif", "#endif");
	}

	#[test]
	fn parse_trims_directive_lines() {
		parse("#if(x > 0)\nyes\n#end", "#if((> x 0))yes\n#end");
		parse("a\n  #if(x)\nb\n  #end\nc", "a\n#if(x)b\n#endc");
		parse("${x}\n", "${x}\n");
	}

	#[test]
	fn parse_structural_errors() {
		parse_err("#if(x)a", ParseErrorKind::MissingEnd);
		parse_err("#end", ParseErrorKind::UnmatchedEnd("end".to_string()));
		parse_err("a#else b#end", ParseErrorKind::UnmatchedEnd("else".to_string()));
		parse_err("#for(i : 3)a", ParseErrorKind::MissingEnd);
	}

	#[test]
	fn parse_directive_param_errors() {
		parse_err("#if()a#end", ParseErrorKind::ExpectedExpression);
		parse_err("#if(1 +)a#end", ParseErrorKind::MissingOperand("+".to_string()));
	}

	#[test]
	fn trim_is_idempotent() {
		let mut parser = Parser::new(Syntax::default(), false, false, HashSet::new());
		let source = "a\n  #if(x)\n b \n #end\nb";
		let tokens = scan_directives(source, 0).unwrap();
		let mut items: Vec<FlatItem> =
			tokens.iter().map(|t| parser.classify(t.text, t.offset).unwrap()).collect();
		merge_texts(&mut items);
		trim_flat(&mut items);
		let once: Vec<String> = items
			.iter()
			.filter_map(|i| match &i.flat {
				Flat::Stmt(Statement::Text { content, .. }) => Some(content.clone()),
				_ => None,
			})
			.collect();
		trim_flat(&mut items);
		let twice: Vec<String> = items
			.iter()
			.filter_map(|i| match &i.flat {
				Flat::Stmt(Statement::Text { content, .. }) => Some(content.clone()),
				_ => None,
			})
			.collect();
		assert_eq!(once, twice);
	}
}
