/// Scanner related errors
#[derive(thiserror::Error, Debug)]
pub enum ScannerError {
	/// Internal engine error, should never happen
	#[error("{0}")]
	InternalError(#[from] anyhow::Error),
	/// Errors encountered during scanning
	#[error(transparent)]
	ScanError(#[from] ScanError),
}

/// A specific scanning error with source offset and type.
#[derive(thiserror::Error, Debug)]
#[error("offset {offset}: {type}")]
pub struct ScanError {
	/// The absolute source offset where the error occurred.
	offset: usize,
	/// The type of scanning error.
	r#type: ScanErrorKind,
}

impl ScanError {
	pub fn new(offset: usize, r#type: ScanErrorKind) -> Self { Self { offset, r#type } }

	pub fn offset(&self) -> usize { self.offset }

	pub fn kind(&self) -> &ScanErrorKind { &self.r#type }
}

/// Types of scanning errors.
#[derive(Debug, PartialEq)]
pub enum ScanErrorKind {
	/// Error for characters with no defined transition.
	UnexpectedCharacter(char),
	/// Error for constructs left open at end of input.
	UnexpectedEof,
	/// Error for a closing bracket with no matching opener.
	UnmatchedClose(char),
	/// Error for a nesting counter left non-zero at end of input.
	UnbalancedNesting(char),
}

impl std::fmt::Display for ScanErrorKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use ScanErrorKind::*;
		match self {
			UnexpectedCharacter(c) => {
				write!(f, "Unexpected character '{c}'")
			}
			UnexpectedEof => {
				write!(f, "Unexpected end of input")
			}
			UnmatchedClose(c) => {
				write!(f, "Unmatched closing '{c}'")
			}
			UnbalancedNesting(c) => {
				write!(f, "Unbalanced '{c}' nesting at end of input")
			}
		}
	}
}
