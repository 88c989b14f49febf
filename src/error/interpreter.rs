/// A runtime error raised while evaluating a template, with the offset of
/// the originating expression.
#[derive(thiserror::Error, Debug)]
#[error("offset {offset}: {type}")]
pub struct EvalError {
	offset: usize,
	r#type: EvalErrorKind,
}

impl EvalError {
	pub fn new(offset: usize, r#type: EvalErrorKind) -> Self { Self { offset, r#type } }

	pub fn offset(&self) -> usize { self.offset }

	pub fn kind(&self) -> &EvalErrorKind { &self.r#type }
}

/// Types of evaluation errors.
#[derive(Debug)]
pub enum EvalErrorKind {
	/// An operand that required a non-null value was null.
	NullOperand(String),
	/// Operand types an operator cannot be applied to.
	TypeMismatch { operator: String, detail: String },
	/// Integer division or remainder by zero.
	DivisionByZero,
	/// A `#for` collection that cannot be iterated.
	NotIterable(String),
	/// A member lookup that resolved to nothing.
	NoSuchMember { name: String, on: String },
	/// A function or constructor call with no registered target.
	NoSuchFunction(String),
	/// A registered function that reported a failure.
	FunctionError { name: String, message: String },
	/// A cast to a type the evaluator does not know.
	UnknownCast(String),
	/// A map literal entry that is not a `key: value` pair.
	InvalidMapEntry,
	/// A macro filter value that is neither a macro nor a function.
	UnsupportedFilter,
	/// Macro recursion beyond the evaluator's depth limit.
	RecursionTooDeep,
}

impl std::fmt::Display for EvalErrorKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use EvalErrorKind::*;
		match self {
			NullOperand(op) => write!(f, "Null operand for '{op}'"),
			TypeMismatch { operator, detail } => {
				write!(f, "Cannot apply '{operator}' to {detail}")
			}
			DivisionByZero => write!(f, "Division by zero"),
			NotIterable(kind) => write!(f, "Cannot iterate a {kind}"),
			NoSuchMember { name, on } => write!(f, "No member '{name}' on {on}"),
			NoSuchFunction(name) => write!(f, "No function or macro '{name}'"),
			FunctionError { name, message } => write!(f, "Function '{name}' failed: {message}"),
			UnknownCast(ty) => write!(f, "Unknown cast target '{ty}'"),
			InvalidMapEntry => write!(f, "Map entries must be 'key: value' pairs"),
			UnsupportedFilter => write!(f, "Macro filter is neither a macro nor a function"),
			RecursionTooDeep => write!(f, "Macro recursion too deep"),
		}
	}
}
