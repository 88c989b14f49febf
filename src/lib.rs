//! # How template text becomes output
//!
//! User's template: `#for(i : 1 .. 3)${i * i} #end`

//! ## Directive scanning
//!
//! A table-driven state machine walks the raw characters and splits them
//! into tokens: plain text runs, directive heads like `#for` with their
//! balanced `(...)` parameter text, interpolations `${...}` and `#{...}`,
//! comments `##`/`#* *#`, literal spans `#[ ]#`, and backslash escapes.
//! The machine never understands what a directive means; it only knows
//! where each token starts and ends, tracking `()` and `{}` nesting with
//! counters so a `}` inside a string of parentheses doesn't end the token
//! early. Every token keeps its absolute source offset, which is what all
//! later error coordinates are built from.

//! ## Directive parsing
//!
//! Each token is classified into a statement: `#var` assignments, `#if`/
//! `#else` chains, `#for` loops, `#break`, `#macro` definitions, or plain
//! text. Parameter text inside the parentheses is handed to the expression
//! parser. Block directives only become a tree at the end: the scanner's
//! flat list of open/else/end markers is reduced with a stack, so an
//! unmatched `#end` or a dangling `#if` is reported with the offset of the
//! directive that caused it.
//!
//! ``` markdown
//! for i (Statement::For)
//! └── .. (Expression::Binary)
//!     ├── 1 (Expression::Constant)
//!     └── 3 (Expression::Constant)
//! ```

//! ## Expression parsing
//!
//! Expressions use two stacks, one for operands and one for operators,
//! with numeric priorities deciding when to reduce. That handles infix
//! arithmetic, comparisons, the ternary operator, member access, calls,
//! indexing, and list/map literals without a grammar table. Lexing is the
//! same table-driven machine the directive scanner uses, just with a
//! different table.

//! ## Whitespace trimming
//!
//! Directive-only lines would otherwise leave blank lines in the output,
//! so the parser deletes the indentation before a structural directive and
//! the newline after it, but only when they are adjacent in the source.
//! Running the normalization twice changes nothing, which keeps rendered
//! output stable however many times a template is re-parsed.

//! ## Evaluation
//!
//! A tree-walking interpreter renders statements against a context: a
//! chain of scopes where loops and macro bodies push a child scope and
//! `#var(x := ...)` writes through to the parent. Values are dynamically
//! typed (null, bool, int, float, char, string, list, map, range, macro)
//! and member access resolves against map keys first, then built-in
//! members, then functions registered by the host application. Output can
//! pass through a host-supplied filter, with `$!{...}` and `#[ ]#` spans
//! bypassing it.

pub mod cli;
mod engine;
mod environment;
mod error;
mod interpreter;
mod parser;
mod scanner;
mod statement;
mod utils;

pub use engine::{Engine, Filter, NativeFunction};
pub use environment::Context;
pub use error::{
	EvalError, EvalErrorKind, ParseError, ParseErrorKind, ScanError, ScanErrorKind, TemplateError,
};
pub use interpreter::{
	resolver::{BuiltinResolver, MemberResolver},
	status::ForStatus,
	value::{RangeValue, Value},
};
pub use parser::{
	expression::{BinaryOp, Constant, Expression, UnaryOp},
	Syntax,
};
pub use statement::{MacroDef, SetClause, Statement, Template};
pub use utils::RcCell;
