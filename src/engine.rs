use std::{
	collections::{HashMap, HashSet},
	fs::read_to_string,
	io::Write,
	path::Path,
};

use anyhow::Context as _;

use crate::{
	environment::Context,
	error::TemplateError,
	interpreter::{
		resolver::{BuiltinResolver, MemberResolver},
		value::Value,
		Interpreter,
	},
	parser::{Parser, Syntax},
	statement::Template,
};

/// An output filter applied to rendered text and interpolation results;
/// `$!{...}` bypasses it for a single interpolation.
pub trait Filter {
	fn filter(&self, text: &str) -> String;
}

/// A host function callable from template expressions. A returned error
/// message is wrapped into an evaluation error at the call site's offset.
pub type NativeFunction = Box<dyn Fn(&[Value]) -> Result<Value, String>>;

/// Engine is the main entry: it holds the parse and render configuration
/// and turns template text into parsed [`Template`]s and rendered output.
pub struct Engine {
	pub(crate) syntax:    Syntax,
	pub(crate) strict:    bool,
	pub(crate) trim:      bool,
	pub(crate) functions: HashMap<String, NativeFunction>,
	pub(crate) resolver:  Box<dyn MemberResolver>,
	pub(crate) filter:    Option<Box<dyn Filter>>,
	pub(crate) symbols:   HashSet<String>,
}

impl Default for Engine {
	fn default() -> Self {
		Self {
			syntax:    Syntax::default(),
			strict:    false,
			trim:      true,
			functions: HashMap::new(),
			resolver:  Box::new(BuiltinResolver),
			filter:    None,
			symbols:   HashSet::new(),
		}
	}
}

impl Engine {
	pub fn new() -> Self { Self::default() }

	pub fn with_syntax(mut self, syntax: Syntax) -> Self {
		self.syntax = syntax;
		self
	}

	/// Reject undeclared variables at parse time instead of treating them
	/// as null at render time.
	pub fn strict(mut self, strict: bool) -> Self {
		self.strict = strict;
		self
	}

	/// Toggle blank-line trimming around structural directives; on by default.
	pub fn trim(mut self, trim: bool) -> Self {
		self.trim = trim;
		self
	}

	pub fn with_filter(mut self, filter: impl Filter + 'static) -> Self {
		self.filter = Some(Box::new(filter));
		self
	}

	pub fn with_resolver(mut self, resolver: impl MemberResolver + 'static) -> Self {
		self.resolver = Box::new(resolver);
		self
	}

	pub fn register_function(
		mut self,
		name: impl Into<String>,
		function: impl Fn(&[Value]) -> Result<Value, String> + 'static,
	) -> Self {
		let name = name.into();
		self.symbols.insert(name.clone());
		self.functions.insert(name, Box::new(function));
		self
	}

	/// Pre-declare a variable name for strict parsing.
	pub fn declare(mut self, name: impl Into<String>) -> Self {
		self.symbols.insert(name.into());
		self
	}

	pub fn parse(&self, source: &str) -> Result<Template, TemplateError> { self.parse_at(source, 0) }

	/// Parse with a starting offset, for templates embedded in a larger
	/// document whose error coordinates should stay absolute.
	pub fn parse_at(&self, source: &str, base: usize) -> Result<Template, TemplateError> {
		let mut parser = Parser::new(self.syntax.clone(), self.strict, self.trim, self.symbols.clone());
		Ok(parser.parse(source, base)?)
	}

	pub fn render(&self, template: &Template, context: Context) -> Result<String, TemplateError> {
		let mut interpreter = Interpreter::new(self, &template.macros, context);
		let mut out = String::new();
		interpreter.render(&template.statements, &mut out)?;
		Ok(out)
	}

	pub fn render_str(&self, source: &str, context: Context) -> Result<String, TemplateError> {
		let template = self.parse(source)?;
		self.render(&template, context)
	}
}

impl Engine {
	/// Render a template file against `name=value` context bindings and
	/// print the output.
	pub fn run_file<P: AsRef<Path>>(&self, path: P, defines: &[String]) -> Result<(), TemplateError> {
		let source = read_to_string(path).context("Failed open template file")?;
		let output = self.render_str(&source, context_from_defines(defines))?;
		print!("{output}");
		Ok(())
	}

	/// Run the REPL prompt, rendering each line as a template.
	pub fn run_prompt(&self) {
		let mut input = String::new();
		let stdin = std::io::stdin();
		loop {
			input.clear();
			print!("> ");
			if let Err(e) = std::io::stdout().flush() {
				eprintln!("Failed flush: {e}");
			}
			match stdin.read_line(&mut input) {
				Ok(0) => {
					println!("\nExited ztempl repl");
					break;
				}
				Ok(_) => {}
				Err(e) => {
					eprintln!("Failed read line: {e}");
					continue;
				}
			}
			match self.render_str(input.trim_end_matches('\n'), Context::new()) {
				Ok(output) => println!("{output}"),
				Err(e) => eprintln!("Failed render: {e}"),
			}
		}
	}
}

fn context_from_defines(defines: &[String]) -> Context {
	let mut context = Context::new();
	for define in defines {
		match define.split_once('=') {
			Some((name, value)) => {
				// Numeric values bind as numbers, everything else as text.
				let value = match value.parse::<i64>() {
					Ok(n) => Value::Int(n),
					Err(_) => match value.parse::<f64>() {
						Ok(n) => Value::Float(n),
						Err(_) => Value::from(value),
					},
				};
				context.set(name, value);
			}
			None => context.set(define.as_str(), Value::Bool(true)),
		}
	}
	context
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defines_bind_typed_values() {
		let context = context_from_defines(&[
			"n=3".to_string(),
			"pi=3.14".to_string(),
			"name=world".to_string(),
			"flag".to_string(),
		]);
		assert_eq!(context.get("n"), Some(&Value::Int(3)));
		assert_eq!(context.get("pi"), Some(&Value::Float(3.14)));
		assert_eq!(context.get("name"), Some(&Value::from("world")));
		assert_eq!(context.get("flag"), Some(&Value::Bool(true)));
	}

	#[test]
	fn render_str_end_to_end() {
		let engine = Engine::new();
		let mut context = Context::new();
		context.set("x", Value::Int(5));
		assert_eq!(engine.render_str("x is ${x}", context).unwrap(), "x is 5");
	}

	#[test]
	fn strict_parse_rejects_undeclared() {
		let engine = Engine::new().strict(true).declare("x");
		assert!(engine.parse("${x}").is_ok());
		assert!(engine.parse("${y}").is_err());
	}
}
