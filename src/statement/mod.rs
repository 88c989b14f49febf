//! The statement tree a template parses into.
//!
//! A template is a list of statements; block statements carry their body as
//! a child list. `#if`/`#else` chains stay flat: the branches are adjacent
//! siblings and the evaluator tracks, per child list, whether a branch has
//! already matched. Parsed trees are immutable, so one [`Template`] can
//! serve concurrent renders.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::parser::expression::Expression;

#[derive(Debug)]
pub enum Statement {
	/// Literal output text. `literal` marks `#[ ... ]#` spans, which are
	/// exempt from whitespace trimming and output filtering.
	Text { content: String, literal: bool },
	/// A `##` line or `#* *#` block comment. Produces no output; kept in
	/// the tree so tooling can see it.
	Comment { content: String, block: bool },
	/// An interpolation. `suppress_filter` marks the `$!{}`/`#!{}` forms
	/// that bypass the engine's output filter.
	Value { expression: Expression, suppress_filter: bool },
	/// A `#var` directive: one or more declaration or assignment clauses.
	Set(Vec<SetClause>),
	/// A `#break` with an optional guard; the guard defaults to true.
	Break { condition: Option<Expression>, offset: usize },
	If { condition: Expression, children: Vec<Statement> },
	/// An `#else` branch, optionally guarded. Taken when no earlier branch
	/// among the preceding siblings has matched.
	Else { condition: Option<Expression>, children: Vec<Statement> },
	For { name: String, collection: Expression, children: Vec<Statement> },
	Macro(Arc<MacroDef>),
}

/// One clause of a `#var` directive, either a typed declaration or an
/// assignment.
#[derive(Debug)]
pub struct SetClause {
	/// Declared type name, for `#var(Type name)` declarations.
	pub r#type:     Option<String>,
	pub name:       String,
	/// The assigned expression; `None` for pure declarations.
	pub expression: Option<Expression>,
	/// `name := expr` assigns into the enclosing scope.
	pub export:     bool,
	/// `name .= expr`, advisory only: the flag is parsed and round-tripped
	/// but the evaluator assigns the binding like a plain `=`.
	pub hide:       bool,
	pub offset:     usize,
}

/// A parsed `#macro` definition.
#[derive(Debug)]
pub struct MacroDef {
	pub name:        String,
	pub params:      Vec<String>,
	/// A per-macro output filter expression, from `#macro(name => filter)`.
	pub filter:      Option<Expression>,
	/// A capture target from `#macro(target = name)`: the variable the
	/// rendered body is assigned to, with export and hide flags.
	pub target:      Option<(String, bool, bool)>,
	/// A `$` prefix on the name makes the definition also render in place.
	pub auto_output: bool,
	pub children:    Vec<Statement>,
	pub offset:      usize,
}

/// A parsed template: the statement tree plus an index of every macro
/// defined anywhere in it, at any depth.
#[derive(Debug)]
pub struct Template {
	pub statements: Vec<Statement>,
	pub macros:     HashMap<String, Arc<MacroDef>>,
}

impl Template {
	pub fn new(statements: Vec<Statement>) -> Self {
		let mut macros = HashMap::new();
		collect_macros(&statements, &mut macros);
		Self { statements, macros }
	}
}

fn collect_macros(statements: &[Statement], into: &mut HashMap<String, Arc<MacroDef>>) {
	for statement in statements {
		match statement {
			Statement::Macro(def) => {
				into.insert(def.name.clone(), Arc::clone(def));
				collect_macros(&def.children, into);
			}
			Statement::If { children, .. }
			| Statement::Else { children, .. }
			| Statement::For { children, .. } => collect_macros(children, into),
			_ => {}
		}
	}
}

impl fmt::Display for Template {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for statement in &self.statements {
			write!(f, "{statement}")?;
		}
		Ok(())
	}
}

fn write_children(f: &mut fmt::Formatter<'_>, children: &[Statement]) -> fmt::Result {
	for child in children {
		write!(f, "{child}")?;
	}
	Ok(())
}

/// Prints a canonical directive form, used by parser tests.
impl fmt::Display for Statement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Statement::Text { content, literal: false } => write!(f, "{content}"),
			Statement::Text { content, literal: true } => write!(f, "#[{content}]#"),
			Statement::Comment { content, block: false } => write!(f, "##{content}"),
			Statement::Comment { content, block: true } => write!(f, "#*{content}*#"),
			Statement::Value { expression, suppress_filter: false } => write!(f, "${{{expression}}}"),
			Statement::Value { expression, suppress_filter: true } => write!(f, "$!{{{expression}}}"),
			Statement::Set(clauses) => {
				write!(f, "#var(")?;
				for (i, clause) in clauses.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{clause}")?;
				}
				write!(f, ")")
			}
			Statement::Break { condition: None, .. } => write!(f, "#break"),
			Statement::Break { condition: Some(c), .. } => write!(f, "#break({c})"),
			Statement::If { condition, children } => {
				write!(f, "#if({condition})")?;
				write_children(f, children)?;
				write!(f, "#end")
			}
			Statement::Else { condition, children } => {
				match condition {
					None => write!(f, "#else")?,
					Some(c) => write!(f, "#else({c})")?,
				}
				write_children(f, children)?;
				write!(f, "#end")
			}
			Statement::For { name, collection, children } => {
				write!(f, "#for({name} : {collection})")?;
				write_children(f, children)?;
				write!(f, "#end")
			}
			Statement::Macro(def) => {
				write!(f, "#macro(")?;
				if let Some((target, export, hide)) = &def.target {
					let sep = if *export { ":=" } else if *hide { ".=" } else { "=" };
					write!(f, "{target} {sep} ")?;
				}
				if def.auto_output {
					write!(f, "$")?;
				}
				write!(f, "{}", def.name)?;
				if !def.params.is_empty() {
					write!(f, "({})", def.params.join(", "))?;
				}
				if let Some(filter) = &def.filter {
					write!(f, " => {filter}")?;
				}
				write!(f, ")")?;
				write_children(f, &def.children)?;
				write!(f, "#end")
			}
		}
	}
}

impl fmt::Display for SetClause {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if let Some(ty) = &self.r#type {
			write!(f, "{ty} ")?;
		}
		write!(f, "{}", self.name)?;
		if let Some(expression) = &self.expression {
			let sep = if self.export { ":=" } else if self.hide { ".=" } else { "=" };
			write!(f, " {sep} {expression}")?;
		}
		Ok(())
	}
}
