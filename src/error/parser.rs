use crate::error::scanner::{ScanError, ScannerError};

/// Parser related errors
#[derive(thiserror::Error, Debug)]
pub enum ParserError {
	/// Internal engine error, should never happen
	#[error("{0}")]
	InternalError(#[from] anyhow::Error),
	/// Lexical errors surfaced while scanning directive or expression text
	#[error(transparent)]
	ScanError(#[from] ScanError),
	/// Errors encountered during parsing
	#[error(transparent)]
	ParseError(#[from] ParseError),
}

impl From<ScannerError> for ParserError {
	fn from(error: ScannerError) -> Self {
		match error {
			ScannerError::InternalError(e) => ParserError::InternalError(e),
			ScannerError::ScanError(e) => ParserError::ScanError(e),
		}
	}
}

/// A specific parsing error with source offset and type.
#[derive(thiserror::Error, Debug)]
#[error("offset {offset}: {type}")]
pub struct ParseError {
	offset: usize,
	r#type: ParseErrorKind,
}

impl ParseError {
	pub fn new(offset: usize, r#type: ParseErrorKind) -> Self { Self { offset, r#type } }

	pub fn offset(&self) -> usize { self.offset }

	pub fn kind(&self) -> &ParseErrorKind { &self.r#type }
}

/// Types of parsing errors, covering both block structure and expressions.
#[derive(Debug, PartialEq)]
pub enum ParseErrorKind {
	/// A block directive was never closed.
	MissingEnd,
	/// An `#end` or `#else` with no open block.
	UnmatchedEnd(String),
	/// An operator token with no entry in the operator table.
	UnknownOperator(String),
	/// An operator missing one of its operands.
	MissingOperand(String),
	/// A `)` with no `(` on the operator stack.
	MissingLeftParenthesis,
	/// A `]` or `}` with no matching opener on the operator stack.
	MissingLeftBracket(char),
	/// A `(`, `[` or `{` never closed inside an expression.
	UnclosedBracket(char),
	/// A token in a position where none was expected.
	UnexpectedToken(String),
	/// An empty parameter where an expression was required.
	ExpectedExpression,
	/// A variable used without declaration under strict checking.
	UndeclaredVariable(String),
	/// A numeric literal that does not fit its width.
	InvalidNumber(String),
	/// A back-quoted literal that is not a single character.
	InvalidCharLiteral(String),
	/// A malformed directive parameter list.
	InvalidDirective(String),
}

impl std::fmt::Display for ParseErrorKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use ParseErrorKind::*;
		match self {
			MissingEnd => write!(f, "Missing #end"),
			UnmatchedEnd(name) => write!(f, "#{name} without an open block"),
			UnknownOperator(op) => write!(f, "Unknown operator '{op}'"),
			MissingOperand(op) => write!(f, "Missing operand for '{op}'"),
			MissingLeftParenthesis => write!(f, "Missing left parenthesis"),
			MissingLeftBracket(c) => write!(f, "Missing left bracket for '{c}'"),
			UnclosedBracket(c) => write!(f, "Unclosed '{c}'"),
			UnexpectedToken(t) => write!(f, "Unexpected token '{t}'"),
			ExpectedExpression => write!(f, "Expected expression"),
			UndeclaredVariable(name) => write!(f, "Undeclared variable '{name}'"),
			InvalidNumber(text) => write!(f, "Invalid number literal '{text}'"),
			InvalidCharLiteral(text) => write!(f, "Invalid character literal {text}"),
			InvalidDirective(msg) => write!(f, "{msg}"),
		}
	}
}
