pub mod interpreter;
pub mod parser;
pub mod scanner;

pub use interpreter::{EvalError, EvalErrorKind};
pub use parser::{ParseError, ParseErrorKind, ParserError};
pub use scanner::{ScanError, ScanErrorKind, ScannerError};

/// TemplateError is the top-level error type for the template engine.
///
/// Every failure carries a human-readable message and the absolute source
/// offset it originated from; callers map the offset back to a line/column
/// against the original text.
#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
	/// Internal engine error, should never happen
	#[error("EngineInternalError: {0}")]
	InternalError(#[from] anyhow::Error),
	/// Lexical error raised by the scanner
	#[error(transparent)]
	Scan(#[from] ScanError),
	/// Structural or expression error raised by the parser
	#[error(transparent)]
	Parse(#[from] ParseError),
	/// Runtime error raised during evaluation
	#[error(transparent)]
	Eval(#[from] EvalError),
}

impl TemplateError {
	/// The absolute source offset the failure points at, when it has one.
	pub fn offset(&self) -> Option<usize> {
		match self {
			TemplateError::InternalError(_) => None,
			TemplateError::Scan(e) => Some(e.offset()),
			TemplateError::Parse(e) => Some(e.offset()),
			TemplateError::Eval(e) => Some(e.offset()),
		}
	}
}

impl From<ScannerError> for TemplateError {
	fn from(error: ScannerError) -> Self {
		match error {
			ScannerError::InternalError(e) => TemplateError::InternalError(e),
			ScannerError::ScanError(e) => TemplateError::Scan(e),
		}
	}
}

impl From<ParserError> for TemplateError {
	fn from(error: ParserError) -> Self {
		match error {
			ParserError::InternalError(e) => TemplateError::InternalError(e),
			ParserError::ScanError(e) => TemplateError::Scan(e),
			ParserError::ParseError(e) => TemplateError::Parse(e),
		}
	}
}
