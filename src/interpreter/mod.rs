//! The tree-walking evaluator.
//!
//! Walks a parsed statement tree depth-first against a context scope chain,
//! writing output as it goes. Loop bodies and macro bodies run in child
//! scopes; `#break` raises a flag that unwinds to the nearest enclosing
//! loop, which clears it. Member access resolves in order: map key lookup,
//! the engine's member resolver, then registered free functions.

pub mod resolver;
pub mod status;
pub mod value;

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use status::ForStatus;
use value::{RangeValue, Value};

use crate::{
	engine::Engine,
	environment::Context,
	error::interpreter::{EvalError, EvalErrorKind},
	parser::expression::{BinaryOp, Constant, Expression, UnaryOp},
	statement::{MacroDef, Statement},
	utils::RcCell,
};

/// Macro invocation depth limit; beyond it a render fails instead of
/// overflowing the stack on self-recursive macros.
const RECURSION_LIMIT: usize = 64;

pub(crate) struct Interpreter<'e> {
	engine:     &'e Engine,
	macros:     &'e HashMap<String, Arc<MacroDef>>,
	context:    Box<Context>,
	break_flag: bool,
	depth:      usize,
}

impl<'e> Interpreter<'e> {
	pub fn new(engine: &'e Engine, macros: &'e HashMap<String, Arc<MacroDef>>, context: Context) -> Self {
		Self { engine, macros, context: Box::new(context), break_flag: false, depth: 0 }
	}

	/// Execute a statement list. `#if`/`#else` chains track their matched
	/// state per list; a raised break flag stops execution of the list.
	pub fn render(&mut self, statements: &[Statement], out: &mut String) -> Result<(), EvalError> {
		let mut if_matched = false;
		for statement in statements {
			if self.break_flag {
				break;
			}
			match statement {
				Statement::Text { content, literal: true } => out.push_str(content),
				Statement::Text { content, literal: false } => self.write_filtered(out, content),
				Statement::Comment { .. } => {}
				Statement::Value { expression, suppress_filter } => {
					let value = self.eval(expression)?;
					let text = match value {
						Value::Macro(def) => self.invoke_macro(&def, &[], expression.offset())?,
						other => other.to_string(),
					};
					if *suppress_filter {
						out.push_str(&text);
					} else {
						self.write_filtered(out, &text);
					}
				}
				Statement::Set(clauses) => {
					for clause in clauses {
						let value = match &clause.expression {
							Some(expression) => self.eval(expression)?,
							None => Value::Null,
						};
						if clause.export {
							self.context.set_export(clause.name.clone(), value);
						} else {
							self.context.set(clause.name.clone(), value);
						}
					}
				}
				Statement::Break { condition, .. } => {
					let fire = match condition {
						Some(condition) => self.eval(condition)?.truthy(),
						None => true,
					};
					if fire {
						self.break_flag = true;
					}
				}
				Statement::If { condition, children } => {
					if self.eval(condition)?.truthy() {
						if_matched = true;
						self.render(children, out)?;
					} else {
						if_matched = false;
					}
				}
				Statement::Else { condition, children } => {
					if !if_matched {
						let fire = match condition {
							Some(condition) => self.eval(condition)?.truthy(),
							None => true,
						};
						if fire {
							if_matched = true;
							self.render(children, out)?;
						}
					}
				}
				Statement::For { name, collection, children } => {
					self.render_for(name, collection, children, out)?;
				}
				Statement::Macro(def) => {
					self.context.set(def.name.clone(), Value::Macro(Arc::clone(def)));
					if def.target.is_some() || def.auto_output {
						let text = self.invoke_macro(def, &[], def.offset)?;
						if let Some((target, export, _hide)) = &def.target {
							let value = Value::Str(text.clone());
							if *export {
								self.context.set_export(target.clone(), value);
							} else {
								self.context.set(target.clone(), value);
							}
						}
						if def.auto_output {
							self.write_filtered(out, &text);
						}
					}
				}
			}
		}
		Ok(())
	}

	fn render_for(
		&mut self,
		name: &str,
		collection: &Expression,
		children: &[Statement],
		out: &mut String,
	) -> Result<(), EvalError> {
		let value = self.eval(collection)?;
		let iter = value.iter().ok_or_else(|| {
			EvalError::new(collection.offset(), EvalErrorKind::NotIterable(value.type_name().to_string()))
		})?;
		let size = Some(iter.size());
		// Chain the new status to the enclosing loop's through the previous
		// binding of the `for` variable.
		let parent = match self.context.get("for") {
			Some(Value::Status(status)) => Some(status.clone()),
			_ => None,
		};
		let level = parent.as_ref().map(|p| p.borrow().level + 1).unwrap_or(0);
		let status = RcCell::new(ForStatus::new(parent, size, level));

		self.push_scope();
		self.context.set("for", Value::Status(status.clone()));
		let mut result = Ok(());
		for (index, element) in iter.enumerate() {
			status.borrow_mut().index = index;
			self.context.set(name.to_string(), element);
			result = self.render(children, out);
			if result.is_err() {
				break;
			}
			if self.break_flag {
				self.break_flag = false;
				break;
			}
		}
		self.pop_scope();
		result
	}

	/// Render a macro body in a child scope with positional parameter
	/// bindings, returning the produced text after the macro's own filter.
	fn invoke_macro(&mut self, def: &MacroDef, args: &[Value], offset: usize) -> Result<String, EvalError> {
		if self.depth >= RECURSION_LIMIT {
			return Err(EvalError::new(offset, EvalErrorKind::RecursionTooDeep));
		}
		self.depth += 1;
		let saved_break = self.break_flag;
		self.break_flag = false;
		self.push_scope();
		for (i, param) in def.params.iter().enumerate() {
			self.context.set(param.clone(), args.get(i).cloned().unwrap_or(Value::Null));
		}
		let mut out = String::new();
		let result = self.render(&def.children, &mut out);
		self.pop_scope();
		self.break_flag = saved_break;
		self.depth -= 1;
		result?;
		match &def.filter {
			Some(filter) => self.apply_macro_filter(filter, out),
			None => Ok(out),
		}
	}

	fn apply_macro_filter(&mut self, filter: &Expression, text: String) -> Result<String, EvalError> {
		let engine = self.engine;
		if let Expression::Variable { name, offset } = filter {
			if let Some(function) = engine.functions.get(name) {
				let value = function(&[Value::Str(text)]).map_err(|message| {
					EvalError::new(*offset, EvalErrorKind::FunctionError { name: name.clone(), message })
				})?;
				return Ok(value.to_string());
			}
		}
		match self.eval(filter)? {
			Value::Macro(def) => self.invoke_macro(&def, &[Value::Str(text)], filter.offset()),
			_ => Err(EvalError::new(filter.offset(), EvalErrorKind::UnsupportedFilter)),
		}
	}

	fn write_filtered(&self, out: &mut String, text: &str) {
		match &self.engine.filter {
			Some(filter) => out.push_str(&filter.filter(text)),
			None => out.push_str(text),
		}
	}

	fn push_scope(&mut self) {
		let outer = std::mem::take(&mut self.context);
		self.context = Box::new(Context::new().set_outer(outer));
	}

	fn pop_scope(&mut self) {
		self.context = self.context.outer.take().expect("scope chain underflow");
	}

	fn lookup(&self, name: &str) -> Value {
		if let Some(value) = self.context.get(name) {
			return value.clone();
		}
		if let Some(def) = self.macros.get(name) {
			return Value::Macro(Arc::clone(def));
		}
		Value::Null
	}

	fn eval(&mut self, expression: &Expression) -> Result<Value, EvalError> {
		match expression {
			Expression::Constant { value, .. } => Ok(match value {
				Constant::Null | Constant::Empty => Value::Null,
				Constant::Bool(b) => Value::Bool(*b),
				Constant::Int(n) => Value::Int(*n),
				Constant::Float(n) => Value::Float(*n),
				Constant::Str(s) => Value::Str(s.clone()),
				Constant::Char(c) => Value::Char(*c),
			}),
			Expression::Variable { name, .. } => Ok(self.lookup(name)),
			Expression::Unary { op, operand, offset, .. } => self.eval_unary(op, operand, *offset),
			Expression::Binary { op, left, right, offset, .. } => {
				self.eval_binary(op, left.as_ref(), right.as_ref(), *offset)
			}
		}
	}

	fn eval_unary(&mut self, op: &UnaryOp, operand: &Expression, offset: usize) -> Result<Value, EvalError> {
		match op {
			UnaryOp::Pos => match self.eval(operand)? {
				v @ (Value::Int(_) | Value::Float(_)) => Ok(v),
				Value::Null => Err(EvalError::new(offset, EvalErrorKind::NullOperand("+".to_string()))),
				other => Err(type_mismatch(offset, "+", other.type_name())),
			},
			UnaryOp::Neg => match self.eval(operand)? {
				Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
				Value::Float(n) => Ok(Value::Float(-n)),
				Value::Null => Err(EvalError::new(offset, EvalErrorKind::NullOperand("-".to_string()))),
				other => Err(type_mismatch(offset, "-", other.type_name())),
			},
			UnaryOp::Not => Ok(Value::Bool(!self.eval(operand)?.truthy())),
			UnaryOp::BitNot => match self.eval(operand)? {
				Value::Int(n) => Ok(Value::Int(!n)),
				Value::Null => Err(EvalError::new(offset, EvalErrorKind::NullOperand("~".to_string()))),
				other => Err(type_mismatch(offset, "~", other.type_name())),
			},
			UnaryOp::Cast(ty) => {
				let value = self.eval(operand)?;
				cast(ty, value, offset)
			}
			UnaryOp::New(name) => {
				let engine = self.engine;
				let args = self.eval_args(operand)?;
				match engine.functions.get(name) {
					Some(function) => function(&args).map_err(|message| {
						EvalError::new(offset, EvalErrorKind::FunctionError { name: name.clone(), message })
					}),
					None => Err(EvalError::new(offset, EvalErrorKind::NoSuchFunction(name.clone()))),
				}
			}
			UnaryOp::Call(name) => {
				let engine = self.engine;
				let args = self.eval_args(operand)?;
				if let Some(function) = engine.functions.get(name) {
					return function(&args).map_err(|message| {
						EvalError::new(offset, EvalErrorKind::FunctionError { name: name.clone(), message })
					});
				}
				let bound = match self.context.get(name) {
					Some(Value::Macro(def)) => Some(Arc::clone(def)),
					_ => None,
				};
				let def = match bound.or_else(|| self.macros.get(name).map(Arc::clone)) {
					Some(def) => def,
					None => return Err(EvalError::new(offset, EvalErrorKind::NoSuchFunction(name.clone()))),
				};
				Ok(Value::Str(self.invoke_macro(&def, &args, offset)?))
			}
			UnaryOp::List => Ok(Value::List(self.eval_args(operand)?)),
			UnaryOp::Map => {
				let mut entries = Vec::new();
				if !matches!(operand, Expression::Constant { value: Constant::Empty, .. }) {
					for entry in flatten_comma(operand) {
						let Expression::Binary { op: BinaryOp::Colon, left, right, .. } = entry else {
							return Err(EvalError::new(entry.offset(), EvalErrorKind::InvalidMapEntry));
						};
						let key = match left.as_ref() {
							Expression::Variable { name, .. } => Value::Str(name.clone()),
							other => self.eval(other)?,
						};
						let value = self.eval(right.as_ref())?;
						entries.push((key, value));
					}
				}
				Ok(Value::Map(entries))
			}
		}
	}

	fn eval_binary(
		&mut self,
		op: &BinaryOp,
		left: &Expression,
		right: &Expression,
		offset: usize,
	) -> Result<Value, EvalError> {
		use BinaryOp::*;
		match op {
			And => {
				let l = self.eval(left)?;
				if l.truthy() { self.eval(right) } else { Ok(l) }
			}
			Or => {
				let l = self.eval(left)?;
				if l.truthy() { Ok(l) } else { self.eval(right) }
			}
			Question => {
				if self.eval(left)?.truthy() { self.eval(right) } else { Ok(Value::Null) }
			}
			Colon => match left {
				Expression::Binary { op: Question, left: cond, right: then, .. } => {
					if self.eval(cond.as_ref())?.truthy() {
						self.eval(then.as_ref())
					} else {
						self.eval(right)
					}
				}
				_ => Err(EvalError::new(offset, EvalErrorKind::InvalidMapEntry)),
			},
			Comma => {
				self.eval(left)?;
				self.eval(right)
			}
			Dot => {
				let l = self.eval(left)?;
				match right {
					Expression::Variable { name, .. } => self.member(l, name, &[], offset),
					Expression::Constant { value: Constant::Int(n), .. } => {
						self.index_value(l, Value::Int(*n), offset)
					}
					_ => Err(type_mismatch(offset, ".", "member name expected")),
				}
			}
			MethodCall(name) => {
				let l = self.eval(left)?;
				let args = self.eval_args(right)?;
				self.member(l, name, &args, offset)
			}
			Index => {
				let l = self.eval(left)?;
				let index = self.eval(right)?;
				self.index_value(l, index, offset)
			}
			Is => {
				let l = self.eval(left)?;
				let name = match right {
					Expression::Variable { name, .. } => name.as_str(),
					Expression::Constant { value: Constant::Str(s), .. } => s.as_str(),
					Expression::Constant { value: Constant::Null, .. } => "null",
					_ => return Err(type_mismatch(offset, "instanceof", "type name expected")),
				};
				Ok(Value::Bool(type_matches(&l, name)))
			}
			Eq => Ok(Value::Bool(self.eval(left)? == self.eval(right)?)),
			Ne => Ok(Value::Bool(self.eval(left)? != self.eval(right)?)),
			Lt | Le | Gt | Ge => {
				let l = self.eval(left)?;
				let r = self.eval(right)?;
				let ordering = compare(&l, &r).ok_or_else(|| order_error(op, &l, &r, offset))?;
				Ok(Value::Bool(match op {
					Lt => ordering == Ordering::Less,
					Le => ordering != Ordering::Greater,
					Gt => ordering == Ordering::Greater,
					_ => ordering != Ordering::Less,
				}))
			}
			Range => {
				let l = self.eval(left)?;
				let r = self.eval(right)?;
				range_value(&l, &r, offset)
			}
			Add => {
				let l = self.eval(left)?;
				let r = self.eval(right)?;
				// A boolean next to a number coerces to 0 or 1; any other
				// non-numeric pairing concatenates via Display.
				let (l, r) = match (l, r) {
					(l, Value::Bool(b)) if is_number(&l) => (l, Value::Int(b as i64)),
					(Value::Bool(b), r) if is_number(&r) => (Value::Int(b as i64), r),
					pair => pair,
				};
				if is_number(&l) && is_number(&r) {
					return numeric_op(l, r, offset, "+", |a, b| Some(a.wrapping_add(b)), |a, b| a + b);
				}
				Ok(Value::Str(format!("{l}{r}")))
			}
			Sub => {
				let (l, r) = (self.eval(left)?, self.eval(right)?);
				numeric_op(l, r, offset, "-", |a, b| Some(a.wrapping_sub(b)), |a, b| a - b)
			}
			Mul => {
				let (l, r) = (self.eval(left)?, self.eval(right)?);
				numeric_op(l, r, offset, "*", |a, b| Some(a.wrapping_mul(b)), |a, b| a * b)
			}
			Div => {
				let (l, r) = (self.eval(left)?, self.eval(right)?);
				numeric_op(l, r, offset, "/", |a, b| (b != 0).then(|| a.wrapping_div(b)), |a, b| a / b)
			}
			Rem => {
				let (l, r) = (self.eval(left)?, self.eval(right)?);
				numeric_op(l, r, offset, "%", |a, b| (b != 0).then(|| a.wrapping_rem(b)), |a, b| a % b)
			}
			Shl => {
				let (l, r) = (self.eval(left)?, self.eval(right)?);
				int_op(l, r, offset, "<<", |a, b| a.wrapping_shl(b as u32))
			}
			Shr => {
				let (l, r) = (self.eval(left)?, self.eval(right)?);
				int_op(l, r, offset, ">>", |a, b| a.wrapping_shr(b as u32))
			}
			UShr => {
				let (l, r) = (self.eval(left)?, self.eval(right)?);
				int_op(l, r, offset, ">>>", |a, b| ((a as u64).wrapping_shr(b as u32)) as i64)
			}
			BitAnd => self.bit_op(left, right, offset, "&", |a, b| a & b, |a, b| a & b),
			BitXor => self.bit_op(left, right, offset, "^", |a, b| a ^ b, |a, b| a ^ b),
			BitOr => self.bit_op(left, right, offset, "|", |a, b| a | b, |a, b| a | b),
		}
	}

	fn bit_op(
		&mut self,
		left: &Expression,
		right: &Expression,
		offset: usize,
		symbol: &str,
		ints: impl Fn(i64, i64) -> i64,
		bools: impl Fn(bool, bool) -> bool,
	) -> Result<Value, EvalError> {
		let l = self.eval(left)?;
		let r = self.eval(right)?;
		match (&l, &r) {
			(Value::Int(a), Value::Int(b)) => Ok(Value::Int(ints(*a, *b))),
			(Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(bools(*a, *b))),
			(Value::Null, _) | (_, Value::Null) => {
				Err(EvalError::new(offset, EvalErrorKind::NullOperand(symbol.to_string())))
			}
			_ => Err(type_mismatch(offset, symbol, &format!("{} and {}", l.type_name(), r.type_name()))),
		}
	}

	/// Member access and method calls. On maps, key lookup wins over member
	/// resolution; a map entry holding a macro is invocable as a method.
	fn member(&mut self, value: Value, name: &str, args: &[Value], offset: usize) -> Result<Value, EvalError> {
		let engine = self.engine;
		if let Value::Null = value {
			return Err(EvalError::new(offset, EvalErrorKind::NullOperand(name.to_string())));
		}
		if let Value::Map(entries) = &value {
			let hit =
				entries.iter().find(|(k, _)| matches!(k, Value::Str(s) if s == name)).map(|(_, v)| v.clone());
			if let Some(found) = hit {
				if args.is_empty() {
					return Ok(found);
				}
				if let Value::Macro(def) = &found {
					let def = Arc::clone(def);
					return Ok(Value::Str(self.invoke_macro(&def, args, offset)?));
				}
			}
		}
		if let Some(resolved) = engine.resolver.resolve(&value, name, args) {
			return Ok(resolved);
		}
		if let Some(function) = engine.functions.get(name) {
			let mut full = Vec::with_capacity(args.len() + 1);
			full.push(value);
			full.extend_from_slice(args);
			return function(&full).map_err(|message| {
				EvalError::new(offset, EvalErrorKind::FunctionError { name: name.to_string(), message })
			});
		}
		Err(EvalError::new(
			offset,
			EvalErrorKind::NoSuchMember { name: name.to_string(), on: value.type_name().to_string() },
		))
	}

	fn index_value(&mut self, left: Value, index: Value, offset: usize) -> Result<Value, EvalError> {
		match left {
			Value::Null => Err(EvalError::new(offset, EvalErrorKind::NullOperand("[".to_string()))),
			Value::Map(entries) => {
				Ok(entries.iter().find(|(k, _)| *k == index).map(|(_, v)| v.clone()).unwrap_or(Value::Null))
			}
			Value::List(items) => match index {
				Value::Int(n) => {
					Ok(position(n, items.len()).and_then(|i| items.get(i).cloned()).unwrap_or(Value::Null))
				}
				// An index array selects a sub-sequence; out-of-range
				// positions contribute nulls.
				Value::List(indexes) => {
					let mut selected = Vec::with_capacity(indexes.len());
					for idx in indexes {
						let Value::Int(n) = idx else {
							return Err(type_mismatch(offset, "[", idx.type_name()));
						};
						selected.push(
							position(n, items.len()).and_then(|i| items.get(i).cloned()).unwrap_or(Value::Null),
						);
					}
					Ok(Value::List(selected))
				}
				other => Err(type_mismatch(offset, "[", other.type_name())),
			},
			Value::Str(s) => {
				let chars: Vec<char> = s.chars().collect();
				match index {
					Value::Int(n) => {
						Ok(position(n, chars.len()).map(|i| Value::Char(chars[i])).unwrap_or(Value::Null))
					}
					Value::List(indexes) => {
						let mut selected = String::with_capacity(indexes.len());
						for idx in indexes {
							let Value::Int(n) = idx else {
								return Err(type_mismatch(offset, "[", idx.type_name()));
							};
							if let Some(i) = position(n, chars.len()) {
								selected.push(chars[i]);
							}
						}
						Ok(Value::Str(selected))
					}
					other => Err(type_mismatch(offset, "[", other.type_name())),
				}
			}
			other => Err(type_mismatch(offset, "[", other.type_name())),
		}
	}

	fn eval_args(&mut self, operand: &Expression) -> Result<Vec<Value>, EvalError> {
		if matches!(operand, Expression::Constant { value: Constant::Empty, .. }) {
			return Ok(Vec::new());
		}
		flatten_comma(operand).into_iter().map(|e| self.eval(e)).collect()
	}
}

fn flatten_comma(expression: &Expression) -> Vec<&Expression> {
	fn walk<'a>(e: &'a Expression, out: &mut Vec<&'a Expression>) {
		match e {
			Expression::Binary { op: BinaryOp::Comma, left, right, .. } => {
				walk(left.as_ref(), out);
				walk(right.as_ref(), out);
			}
			other => out.push(other),
		}
	}
	let mut out = Vec::new();
	walk(expression, &mut out);
	out
}

fn type_mismatch(offset: usize, operator: &str, detail: &str) -> EvalError {
	EvalError::new(
		offset,
		EvalErrorKind::TypeMismatch { operator: operator.to_string(), detail: detail.to_string() },
	)
}

fn order_error(op: &BinaryOp, l: &Value, r: &Value, offset: usize) -> EvalError {
	match (l, r) {
		(Value::Null, _) | (_, Value::Null) => {
			EvalError::new(offset, EvalErrorKind::NullOperand(op.symbol().to_string()))
		}
		_ => type_mismatch(offset, op.symbol(), &format!("{} and {}", l.type_name(), r.type_name())),
	}
}

fn is_number(value: &Value) -> bool { matches!(value, Value::Int(_) | Value::Float(_)) }

fn as_float(value: &Value) -> Option<f64> {
	match value {
		Value::Int(n) => Some(*n as f64),
		Value::Float(n) => Some(*n),
		_ => None,
	}
}

fn compare(l: &Value, r: &Value) -> Option<Ordering> {
	match (l, r) {
		(Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
		(Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
		(Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
		(l, r) => as_float(l)?.partial_cmp(&as_float(r)?),
	}
}

/// Integer arithmetic stays integral; any float operand promotes both
/// sides. The integer step returns `None` to signal division by zero.
fn numeric_op(
	l: Value,
	r: Value,
	offset: usize,
	symbol: &str,
	ints: impl Fn(i64, i64) -> Option<i64>,
	floats: impl Fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
	match (&l, &r) {
		(Value::Int(a), Value::Int(b)) => ints(*a, *b)
			.map(Value::Int)
			.ok_or_else(|| EvalError::new(offset, EvalErrorKind::DivisionByZero)),
		(Value::Null, _) | (_, Value::Null) => {
			Err(EvalError::new(offset, EvalErrorKind::NullOperand(symbol.to_string())))
		}
		_ => match (as_float(&l), as_float(&r)) {
			(Some(a), Some(b)) => Ok(Value::Float(floats(a, b))),
			_ => Err(type_mismatch(offset, symbol, &format!("{} and {}", l.type_name(), r.type_name()))),
		},
	}
}

fn int_op(
	l: Value,
	r: Value,
	offset: usize,
	symbol: &str,
	f: impl Fn(i64, i64) -> i64,
) -> Result<Value, EvalError> {
	match (&l, &r) {
		(Value::Int(a), Value::Int(b)) => Ok(Value::Int(f(*a, *b))),
		(Value::Null, _) | (_, Value::Null) => {
			Err(EvalError::new(offset, EvalErrorKind::NullOperand(symbol.to_string())))
		}
		_ => Err(type_mismatch(offset, symbol, &format!("{} and {}", l.type_name(), r.type_name()))),
	}
}

fn range_value(l: &Value, r: &Value, offset: usize) -> Result<Value, EvalError> {
	let as_char = |v: &Value| match v {
		Value::Char(c) => Some(*c),
		Value::Str(s) => {
			let mut chars = s.chars();
			match (chars.next(), chars.next()) {
				(Some(c), None) => Some(c),
				_ => None,
			}
		}
		_ => None,
	};
	match (l, r) {
		(Value::Int(a), Value::Int(b)) => Ok(Value::Range(RangeValue::Int(*a, *b))),
		(Value::Null, _) | (_, Value::Null) => {
			Err(EvalError::new(offset, EvalErrorKind::NullOperand("..".to_string())))
		}
		(l, r) => match (as_char(l), as_char(r)) {
			(Some(a), Some(b)) => Ok(Value::Range(RangeValue::Char(a, b))),
			_ => Err(type_mismatch(offset, "..", &format!("{} and {}", l.type_name(), r.type_name()))),
		},
	}
}

fn position(n: i64, len: usize) -> Option<usize> {
	if n >= 0 {
		let i = n as usize;
		(i < len).then_some(i)
	} else {
		len.checked_sub(n.unsigned_abs() as usize)
	}
}

fn cast(ty: &str, value: Value, offset: usize) -> Result<Value, EvalError> {
	if matches!(value, Value::Null) && ty != "string" && ty != "boolean" && ty != "bool" {
		return Ok(Value::Null);
	}
	match ty {
		"int" | "long" | "short" | "byte" => match value {
			Value::Int(n) => Ok(Value::Int(n)),
			Value::Float(n) => Ok(Value::Int(n as i64)),
			Value::Char(c) => Ok(Value::Int(c as i64)),
			Value::Bool(b) => Ok(Value::Int(b as i64)),
			Value::Str(s) => {
				s.trim().parse::<i64>().map(Value::Int).map_err(|_| type_mismatch(offset, ty, &s))
			}
			other => Err(type_mismatch(offset, ty, other.type_name())),
		},
		"float" | "double" => match value {
			Value::Int(n) => Ok(Value::Float(n as f64)),
			Value::Float(n) => Ok(Value::Float(n)),
			Value::Str(s) => {
				s.trim().parse::<f64>().map(Value::Float).map_err(|_| type_mismatch(offset, ty, &s))
			}
			other => Err(type_mismatch(offset, ty, other.type_name())),
		},
		"string" => Ok(Value::Str(value.to_string())),
		"boolean" | "bool" => Ok(Value::Bool(value.truthy())),
		"char" => match value {
			Value::Char(c) => Ok(Value::Char(c)),
			Value::Int(n) => u32::try_from(n)
				.ok()
				.and_then(char::from_u32)
				.map(Value::Char)
				.ok_or_else(|| type_mismatch(offset, ty, "int out of character range")),
			Value::Str(s) => {
				let mut chars = s.chars();
				match (chars.next(), chars.next()) {
					(Some(c), None) => Ok(Value::Char(c)),
					_ => Err(type_mismatch(offset, ty, &s)),
				}
			}
			other => Err(type_mismatch(offset, ty, other.type_name())),
		},
		_ => Err(EvalError::new(offset, EvalErrorKind::UnknownCast(ty.to_string()))),
	}
}

fn type_matches(value: &Value, name: &str) -> bool {
	match name {
		"null" | "void" => matches!(value, Value::Null),
		"bool" | "boolean" => matches!(value, Value::Bool(_)),
		"int" | "long" | "short" | "byte" => matches!(value, Value::Int(_)),
		"float" | "double" => matches!(value, Value::Float(_)),
		"number" => matches!(value, Value::Int(_) | Value::Float(_)),
		"char" | "character" => matches!(value, Value::Char(_)),
		"string" | "str" => matches!(value, Value::Str(_)),
		"list" | "array" | "collection" => matches!(value, Value::List(_)),
		"map" => matches!(value, Value::Map(_)),
		"range" => matches!(value, Value::Range(_)),
		"macro" | "template" => matches!(value, Value::Macro(_)),
		_ => false,
	}
}
