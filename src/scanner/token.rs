/// A token produced by the scanner: a lexical unit with its absolute
/// source position, used for error reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
	/// Absolute byte offset of the first character of the token.
	pub offset: usize,
	/// The exact source text of the token.
	pub text:   &'a str,
}

impl<'a> Token<'a> {
	pub fn new(offset: usize, text: &'a str) -> Self { Self { offset, text } }

	/// Absolute byte offset just past the last character of the token.
	pub fn end(&self) -> usize { self.offset + self.text.len() }
}
