use std::{fmt, sync::Arc};

use crate::{interpreter::status::ForStatus, statement::MacroDef, utils::RcCell};

/// A runtime value. Values are dynamically typed; cloning is cheap for
/// scalars and shallow for statuses and macros.
#[derive(Debug, Clone)]
pub enum Value {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Char(char),
	Str(String),
	List(Vec<Value>),
	/// Insertion-ordered key/value pairs.
	Map(Vec<(Value, Value)>),
	Range(RangeValue),
	/// A loop status, shared with the enclosing `#for` bookkeeping.
	Status(RcCell<ForStatus>),
	/// A macro bound as a value; calling it renders its body.
	Macro(Arc<MacroDef>),
}

/// An inclusive range; either direction counts as finite and restartable.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeValue {
	Int(i64, i64),
	Char(char, char),
}

impl RangeValue {
	pub fn size(&self) -> usize {
		match self {
			RangeValue::Int(a, b) => a.abs_diff(*b) as usize + 1,
			RangeValue::Char(a, b) => (*a as u32).abs_diff(*b as u32) as usize + 1,
		}
	}

	pub fn iter(&self) -> ValueIter {
		match *self {
			RangeValue::Int(a, b) => ValueIter::Ints { next: a, end: b, up: a <= b, done: false },
			RangeValue::Char(a, b) => {
				ValueIter::Chars { next: a as u32, end: b as u32, up: a <= b, done: false }
			}
		}
	}

	pub fn first(&self) -> Value {
		match *self {
			RangeValue::Int(a, _) => Value::Int(a),
			RangeValue::Char(a, _) => Value::Char(a),
		}
	}

	pub fn last(&self) -> Value {
		match *self {
			RangeValue::Int(_, b) => Value::Int(b),
			RangeValue::Char(_, b) => Value::Char(b),
		}
	}
}

/// Value equality, not identity: integers compare equal to equal floats,
/// lists and maps compare element-wise. Statuses never compare equal;
/// macros compare by definition identity.
impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		use Value::*;
		match (self, other) {
			(Null, Null) => true,
			(Bool(a), Bool(b)) => a == b,
			(Int(a), Int(b)) => a == b,
			(Float(a), Float(b)) => a == b,
			(Int(a), Float(b)) | (Float(b), Int(a)) => *a as f64 == *b,
			(Char(a), Char(b)) => a == b,
			(Str(a), Str(b)) => a == b,
			(List(a), List(b)) => a == b,
			(Map(a), Map(b)) => a == b,
			(Range(a), Range(b)) => a == b,
			(Macro(a), Macro(b)) => Arc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl Value {
	/// The truthy rule: booleans as-is, numbers nonzero, strings and
	/// collections nonempty, otherwise non-null.
	pub fn truthy(&self) -> bool {
		match self {
			Value::Null => false,
			Value::Bool(b) => *b,
			Value::Int(n) => *n != 0,
			Value::Float(n) => *n != 0.0,
			Value::Char(_) => true,
			Value::Str(s) => !s.is_empty(),
			Value::List(items) => !items.is_empty(),
			Value::Map(entries) => !entries.is_empty(),
			Value::Range(_) | Value::Status(_) | Value::Macro(_) => true,
		}
	}

	pub fn type_name(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Bool(_) => "bool",
			Value::Int(_) => "int",
			Value::Float(_) => "float",
			Value::Char(_) => "char",
			Value::Str(_) => "string",
			Value::List(_) => "list",
			Value::Map(_) => "map",
			Value::Range(_) => "range",
			Value::Status(_) => "status",
			Value::Macro(_) => "macro",
		}
	}

	/// An iterator over the value, when it is iterable. Maps iterate as
	/// key/value entries, each a two-entry map with `key` and `value` keys.
	pub fn iter(&self) -> Option<ValueIter> {
		match self {
			Value::List(items) => Some(ValueIter::Values(items.clone().into_iter())),
			Value::Range(range) => Some(range.iter()),
			Value::Map(entries) => {
				let entries = entries
					.iter()
					.map(|(k, v)| {
						Value::Map(vec![
							(Value::Str("key".to_string()), k.clone()),
							(Value::Str("value".to_string()), v.clone()),
						])
					})
					.collect::<Vec<_>>();
				Some(ValueIter::Values(entries.into_iter()))
			}
			Value::Str(s) => Some(ValueIter::Values(s.chars().map(Value::Char).collect::<Vec<_>>().into_iter())),
			_ => None,
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Null => Ok(()),
			Value::Bool(b) => write!(f, "{b}"),
			Value::Int(n) => write!(f, "{n}"),
			Value::Float(n) => write!(f, "{n}"),
			Value::Char(c) => write!(f, "{c}"),
			Value::Str(s) => write!(f, "{s}"),
			Value::List(items) => {
				write!(f, "[")?;
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{item}")?;
				}
				write!(f, "]")
			}
			Value::Map(entries) => {
				write!(f, "{{")?;
				for (i, (k, v)) in entries.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{k}: {v}")?;
				}
				write!(f, "}}")
			}
			Value::Range(RangeValue::Int(a, b)) => write!(f, "{a}..{b}"),
			Value::Range(RangeValue::Char(a, b)) => write!(f, "{a}..{b}"),
			Value::Status(status) => write!(f, "{}", status.borrow().index),
			Value::Macro(def) => write!(f, "#macro({})", def.name),
		}
	}
}

impl From<bool> for Value {
	fn from(v: bool) -> Self { Value::Bool(v) }
}
impl From<i64> for Value {
	fn from(v: i64) -> Self { Value::Int(v) }
}
impl From<f64> for Value {
	fn from(v: f64) -> Self { Value::Float(v) }
}
impl From<char> for Value {
	fn from(v: char) -> Self { Value::Char(v) }
}
impl From<&str> for Value {
	fn from(v: &str) -> Self { Value::Str(v.to_string()) }
}
impl From<String> for Value {
	fn from(v: String) -> Self { Value::Str(v) }
}
impl From<Vec<Value>> for Value {
	fn from(v: Vec<Value>) -> Self { Value::List(v) }
}

/// Iterates a value's elements; see [`Value::iter`].
pub enum ValueIter {
	Values(std::vec::IntoIter<Value>),
	Ints { next: i64, end: i64, up: bool, done: bool },
	Chars { next: u32, end: u32, up: bool, done: bool },
}

impl ValueIter {
	/// The exact number of elements remaining at construction time.
	pub fn size(&self) -> usize {
		match self {
			ValueIter::Values(values) => values.len(),
			ValueIter::Ints { next, end, .. } => next.abs_diff(*end) as usize + 1,
			ValueIter::Chars { next, end, .. } => next.abs_diff(*end) as usize + 1,
		}
	}
}

impl Iterator for ValueIter {
	type Item = Value;

	fn next(&mut self) -> Option<Value> {
		match self {
			ValueIter::Values(values) => values.next(),
			ValueIter::Ints { next, end, up, done } => {
				if *done {
					return None;
				}
				let value = *next;
				if *next == *end {
					*done = true;
				} else {
					*next += if *up { 1 } else { -1 };
				}
				Some(Value::Int(value))
			}
			ValueIter::Chars { next, end, up, done } => {
				loop {
					if *done {
						return None;
					}
					let code = *next;
					if *next == *end {
						*done = true;
					} else {
						*next = if *up { *next + 1 } else { *next - 1 };
					}
					// Step over the unpaired-surrogate gap.
					if let Some(c) = char::from_u32(code) {
						return Some(Value::Char(c));
					}
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn truthy_rule() {
		assert!(!Value::Null.truthy());
		assert!(!Value::Bool(false).truthy());
		assert!(Value::Bool(true).truthy());
		assert!(!Value::Int(0).truthy());
		assert!(Value::Int(-1).truthy());
		assert!(!Value::Str(String::new()).truthy());
		assert!(Value::Str("x".to_string()).truthy());
		assert!(!Value::List(vec![]).truthy());
		assert!(Value::List(vec![Value::Null]).truthy());
	}

	#[test]
	fn cross_type_numeric_equality() {
		assert_eq!(Value::Int(2), Value::Float(2.0));
		assert_eq!(Value::Float(2.0), Value::Int(2));
		assert_ne!(Value::Int(2), Value::Float(2.5));
		assert_ne!(Value::Int(2), Value::Str("2".to_string()));
	}

	#[test]
	fn range_iteration() {
		let up: Vec<Value> = RangeValue::Int(1, 3).iter().collect();
		assert_eq!(up, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
		let down: Vec<Value> = RangeValue::Int(3, 1).iter().collect();
		assert_eq!(down, vec![Value::Int(3), Value::Int(2), Value::Int(1)]);
		let single: Vec<Value> = RangeValue::Int(5, 5).iter().collect();
		assert_eq!(single, vec![Value::Int(5)]);
		assert_eq!(RangeValue::Int(1, 3).size(), 3);
		let chars: Vec<Value> = RangeValue::Char('a', 'c').iter().collect();
		assert_eq!(chars, vec![Value::Char('a'), Value::Char('b'), Value::Char('c')]);
	}

	#[test]
	fn range_is_restartable() {
		let range = RangeValue::Int(1, 3);
		assert_eq!(range.iter().count(), 3);
		assert_eq!(range.iter().count(), 3);
	}

	#[test]
	fn map_iterates_as_entries() {
		let map = Value::Map(vec![(Value::from("a"), Value::Int(1))]);
		let entries: Vec<Value> = map.iter().unwrap().collect();
		assert_eq!(
			entries,
			vec![Value::Map(vec![
				(Value::from("key"), Value::from("a")),
				(Value::from("value"), Value::Int(1)),
			])]
		);
	}

	#[test]
	fn display_formats() {
		assert_eq!(Value::Null.to_string(), "");
		assert_eq!(Value::Int(6).to_string(), "6");
		assert_eq!(Value::Float(1.5).to_string(), "1.5");
		assert_eq!(Value::List(vec![Value::Int(1), Value::Int(2)]).to_string(), "[1, 2]");
	}
}
