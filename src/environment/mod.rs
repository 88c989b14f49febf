use std::collections::HashMap;

use crate::interpreter::value::Value;

/// One scope of the evaluation context. Macro bodies and loop bodies run in
/// a child scope chained to its enclosing scope; lookups read through the
/// chain, writes stay local unless explicitly exported.
#[derive(Default, Debug)]
pub struct Context {
	variables: HashMap<String, Value>,
	pub outer: Option<Box<Context>>,
}

impl Context {
	pub fn new() -> Self { Self::default() }

	pub fn set_outer(mut self, outer: Box<Context>) -> Self {
		self.outer = Some(outer);
		self
	}

	pub fn set(&mut self, name: impl Into<String>, value: Value) {
		self.variables.insert(name.into(), value);
	}

	/// Assign into the enclosing scope, so the binding survives this scope.
	/// At the root there is no enclosing scope and the write lands here.
	pub fn set_export(&mut self, name: impl Into<String>, value: Value) {
		match self.outer.as_mut() {
			Some(outer) => outer.set(name, value),
			None => self.set(name, value),
		}
	}

	pub fn get(&self, name: &str) -> Option<&Value> {
		self.variables.get(name).or_else(|| self.outer.as_ref().and_then(|outer| outer.get(name)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn get_reads_through_the_chain() {
		let mut root = Context::new();
		root.set("x", Value::Int(1));
		let mut child = Context::new().set_outer(Box::new(root));
		child.set("y", Value::Int(2));
		assert_eq!(child.get("x"), Some(&Value::Int(1)));
		assert_eq!(child.get("y"), Some(&Value::Int(2)));
		assert_eq!(child.get("z"), None);
	}

	#[test]
	fn child_shadows_without_clobbering() {
		let mut root = Context::new();
		root.set("x", Value::Int(1));
		let mut child = Context::new().set_outer(Box::new(root));
		child.set("x", Value::Int(2));
		assert_eq!(child.get("x"), Some(&Value::Int(2)));
		let root = child.outer.take().unwrap();
		assert_eq!(root.get("x"), Some(&Value::Int(1)));
	}

	#[test]
	fn export_writes_the_enclosing_scope() {
		let root = Context::new();
		let mut child = Context::new().set_outer(Box::new(root));
		child.set_export("x", Value::Int(9));
		assert_eq!(child.get("x"), Some(&Value::Int(9)));
		let root = child.outer.take().unwrap();
		assert_eq!(root.get("x"), Some(&Value::Int(9)));
	}
}
