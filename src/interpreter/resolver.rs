use crate::interpreter::{status::ForStatus, value::Value};

/// Member and method resolution against a left operand, supplied by the
/// embedding application. The evaluator consults this after built-in
/// operator semantics and before registered free functions. `None` means
/// the name did not resolve; the evaluator turns that into an error.
pub trait MemberResolver {
	fn resolve(&self, value: &Value, name: &str, args: &[Value]) -> Option<Value>;
}

/// The default resolver: property and method members of the built-in value
/// shapes, mirroring the zero-arg `get`/`is` property convention by
/// accepting both `first` and `isFirst` spellings where it reads naturally.
#[derive(Debug, Default)]
pub struct BuiltinResolver;

impl MemberResolver for BuiltinResolver {
	fn resolve(&self, value: &Value, name: &str, args: &[Value]) -> Option<Value> {
		match value {
			Value::Str(s) => resolve_str(s, name, args),
			Value::List(items) => resolve_list(items, name, args),
			Value::Map(entries) => resolve_map(entries, name, args),
			Value::Range(range) => match (name, args) {
				("size" | "length", []) => Some(Value::Int(range.size() as i64)),
				("first", []) => Some(range.first()),
				("last", []) => Some(range.last()),
				_ => None,
			},
			Value::Status(status) => resolve_status(&status.borrow(), name, args),
			_ => None,
		}
	}
}

fn int_arg(args: &[Value], at: usize) -> Option<i64> {
	match args.get(at)? {
		Value::Int(n) => Some(*n),
		_ => None,
	}
}

fn str_arg<'a>(args: &'a [Value], at: usize) -> Option<&'a str> {
	match args.get(at)? {
		Value::Str(s) => Some(s),
		_ => None,
	}
}

fn resolve_str(s: &str, name: &str, args: &[Value]) -> Option<Value> {
	match (name, args.len()) {
		("length" | "size", 0) => Some(Value::Int(s.chars().count() as i64)),
		("isEmpty", 0) => Some(Value::Bool(s.is_empty())),
		("trim", 0) => Some(Value::from(s.trim())),
		("toUpperCase" | "upper", 0) => Some(Value::from(s.to_uppercase())),
		("toLowerCase" | "lower", 0) => Some(Value::from(s.to_lowercase())),
		("contains", 1) => Some(Value::Bool(s.contains(str_arg(args, 0)?))),
		("startsWith", 1) => Some(Value::Bool(s.starts_with(str_arg(args, 0)?))),
		("endsWith", 1) => Some(Value::Bool(s.ends_with(str_arg(args, 0)?))),
		("indexOf", 1) => {
			let needle = str_arg(args, 0)?;
			Some(Value::Int(match s.find(needle) {
				Some(at) => s[..at].chars().count() as i64,
				None => -1,
			}))
		}
		("charAt", 1) => {
			let at = int_arg(args, 0)?;
			if at < 0 {
				return Some(Value::Null);
			}
			Some(s.chars().nth(at as usize).map(Value::Char).unwrap_or(Value::Null))
		}
		("split", 1) => {
			let sep = str_arg(args, 0)?;
			Some(Value::List(s.split(sep).map(Value::from).collect()))
		}
		("replace", 2) => Some(Value::from(s.replace(str_arg(args, 0)?, str_arg(args, 1)?))),
		("substring", 1 | 2) => {
			let chars: Vec<char> = s.chars().collect();
			let from = int_arg(args, 0)?.clamp(0, chars.len() as i64) as usize;
			let to = match args.len() {
				2 => int_arg(args, 1)?.clamp(from as i64, chars.len() as i64) as usize,
				_ => chars.len(),
			};
			Some(Value::from(chars[from..to].iter().collect::<String>()))
		}
		_ => None,
	}
}

fn resolve_list(items: &[Value], name: &str, args: &[Value]) -> Option<Value> {
	match (name, args.len()) {
		("size" | "length", 0) => Some(Value::Int(items.len() as i64)),
		("isEmpty", 0) => Some(Value::Bool(items.is_empty())),
		("first", 0) => Some(items.first().cloned().unwrap_or(Value::Null)),
		("last", 0) => Some(items.last().cloned().unwrap_or(Value::Null)),
		("contains", 1) => Some(Value::Bool(items.contains(&args[0]))),
		("join", 1) => {
			let sep = str_arg(args, 0)?;
			let joined = items.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(sep);
			Some(Value::from(joined))
		}
		_ => None,
	}
}

fn resolve_map(entries: &[(Value, Value)], name: &str, args: &[Value]) -> Option<Value> {
	match (name, args.len()) {
		("size" | "length", 0) => Some(Value::Int(entries.len() as i64)),
		("isEmpty", 0) => Some(Value::Bool(entries.is_empty())),
		("keys", 0) => Some(Value::List(entries.iter().map(|(k, _)| k.clone()).collect())),
		("values", 0) => Some(Value::List(entries.iter().map(|(_, v)| v.clone()).collect())),
		("containsKey", 1) => Some(Value::Bool(entries.iter().any(|(k, _)| *k == args[0]))),
		("get", 1) => {
			Some(entries.iter().find(|(k, _)| *k == args[0]).map(|(_, v)| v.clone()).unwrap_or(Value::Null))
		}
		_ => None,
	}
}

fn resolve_status(status: &ForStatus, name: &str, args: &[Value]) -> Option<Value> {
	if !args.is_empty() {
		return None;
	}
	match name {
		"index" => Some(Value::Int(status.index as i64)),
		"count" => Some(Value::Int(status.count() as i64)),
		"size" => Some(status.size.map(|s| Value::Int(s as i64)).unwrap_or(Value::Null)),
		"level" => Some(Value::Int(status.level as i64)),
		"first" | "isFirst" => Some(Value::Bool(status.first())),
		"last" | "isLast" => Some(Value::Bool(status.last())),
		"odd" | "isOdd" => Some(Value::Bool(status.odd())),
		"even" | "isEven" => Some(Value::Bool(status.even())),
		"parent" => {
			Some(status.parent.as_ref().map(|p| Value::Status(p.clone())).unwrap_or(Value::Null))
		}
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn resolve(value: &Value, name: &str, args: &[Value]) -> Value {
		BuiltinResolver.resolve(value, name, args).unwrap()
	}

	#[test]
	fn string_members() {
		let s = Value::from("hello");
		assert_eq!(resolve(&s, "length", &[]), Value::Int(5));
		assert_eq!(resolve(&s, "upper", &[]), Value::from("HELLO"));
		assert_eq!(resolve(&s, "contains", &[Value::from("ell")]), Value::Bool(true));
		assert_eq!(resolve(&s, "indexOf", &[Value::from("l")]), Value::Int(2));
		assert_eq!(resolve(&s, "indexOf", &[Value::from("z")]), Value::Int(-1));
		assert_eq!(resolve(&s, "substring", &[Value::Int(1), Value::Int(3)]), Value::from("el"));
		assert_eq!(resolve(&s, "charAt", &[Value::Int(99)]), Value::Null);
		assert!(BuiltinResolver.resolve(&s, "nope", &[]).is_none());
	}

	#[test]
	fn list_members() {
		let list = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
		assert_eq!(resolve(&list, "size", &[]), Value::Int(3));
		assert_eq!(resolve(&list, "first", &[]), Value::Int(1));
		assert_eq!(resolve(&list, "last", &[]), Value::Int(3));
		assert_eq!(resolve(&list, "contains", &[Value::Int(2)]), Value::Bool(true));
		assert_eq!(resolve(&list, "join", &[Value::from("-")]), Value::from("1-2-3"));
	}

	#[test]
	fn map_members() {
		let map = Value::Map(vec![(Value::from("a"), Value::Int(1)), (Value::from("b"), Value::Int(2))]);
		assert_eq!(resolve(&map, "size", &[]), Value::Int(2));
		assert_eq!(resolve(&map, "keys", &[]), Value::List(vec![Value::from("a"), Value::from("b")]));
		assert_eq!(resolve(&map, "containsKey", &[Value::from("b")]), Value::Bool(true));
		assert_eq!(resolve(&map, "get", &[Value::from("a")]), Value::Int(1));
		assert_eq!(resolve(&map, "get", &[Value::from("z")]), Value::Null);
	}

	#[test]
	fn status_members() {
		let status = Value::Status(crate::utils::RcCell::new(ForStatus::new(None, Some(3), 0)));
		assert_eq!(resolve(&status, "index", &[]), Value::Int(0));
		assert_eq!(resolve(&status, "count", &[]), Value::Int(1));
		assert_eq!(resolve(&status, "first", &[]), Value::Bool(true));
		assert_eq!(resolve(&status, "isLast", &[]), Value::Bool(false));
		assert_eq!(resolve(&status, "parent", &[]), Value::Null);
	}
}
