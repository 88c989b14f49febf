//! A reusable table-driven finite-state scanner.
//!
//! The machine starts in state 0 and, for each character, looks up the
//! character's class and then `table[state][class]`. A non-negative result
//! is the next state; the control codes end the current token, re-scan
//! trailing characters, adjust a nesting counter, or fail. Both the
//! directive scanner and the expression tokenizer are tables driving this
//! one machine.
//!
//! Two named nesting counters exist: one for directive-parameter
//! parentheses, one for interpolation braces. Every `Push` must be matched
//! by a `Pop` before end of input, and a `Pop` on a zero counter is a
//! lexical error.

pub(crate) mod directive;
mod token;

use anyhow::anyhow;
pub use token::Token;

use crate::error::scanner::{ScanError, ScanErrorKind, ScannerError};

/// A nesting counter tracked independently of the scan state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Counter {
	/// Directive-parameter parentheses.
	Paren,
	/// Interpolation braces.
	Brace,
}

impl Counter {
	fn open_char(self) -> char {
		match self {
			Counter::Paren => '(',
			Counter::Brace => '{',
		}
	}

	fn close_char(self) -> char {
		match self {
			Counter::Paren => ')',
			Counter::Brace => '}',
		}
	}
}

/// One transition of the scan table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Step {
	/// Advance to the given state, keeping the current character in the token.
	Shift(usize),
	/// Close the token including the current character and restart at state 0.
	Emit,
	/// Close the token excluding its last `n` characters, which are re-scanned
	/// from state 0. `EmitBack(0)` in the end-of-input column accepts the
	/// remaining buffer.
	EmitBack(usize),
	/// Increment a nesting counter and advance to the given state.
	Push(Counter, usize),
	/// Decrement a nesting counter; advance to the first state while the
	/// counter is still positive, to the second once it returns to zero.
	Pop(Counter, usize, usize),
	/// No transition is defined; scanning fails at the current offset.
	Error,
}

/// A complete scan table: a transition per (state, class) pair plus the
/// character classification function. The last class column is reserved
/// for end of input, so coverage is total by construction.
pub(crate) struct ScanTable {
	steps:    Vec<Vec<Step>>,
	classify: fn(char) -> usize,
	classes:  usize,
}

impl ScanTable {
	pub fn new(states: usize, classes: usize, classify: fn(char) -> usize) -> Self {
		Self { steps: vec![vec![Step::Error; classes]; states], classify, classes }
	}

	/// Set every transition of a state at once; used before per-class overrides.
	pub fn fill(&mut self, state: usize, step: Step) {
		for s in self.steps[state].iter_mut() {
			*s = step;
		}
	}

	pub fn set(&mut self, state: usize, class: usize, step: Step) { self.steps[state][class] = step; }

	fn eof_class(&self) -> usize { self.classes - 1 }

	fn step(&self, state: usize, class: usize) -> Step { self.steps[state][class] }
}

/// Split `source` into tokens, reporting offsets relative to `base`.
///
/// The concatenation of the emitted tokens' text always reproduces
/// `source` exactly; nothing is dropped or rewritten at this level.
pub(crate) fn scan<'a>(table: &ScanTable, source: &'a str, base: usize) -> Result<Vec<Token<'a>>, ScannerError> {
	let chars: Vec<(usize, char)> = source.char_indices().collect();
	let mut tokens = Vec::new();
	let mut counters = [0usize; 2];
	let mut state = 0usize;
	let mut start = 0usize; // index into `chars` of the current token start
	let mut i = 0usize;

	let byte_at = |idx: usize| if idx < chars.len() { chars[idx].0 } else { source.len() };

	loop {
		let at_eof = i >= chars.len();
		let class = if at_eof { table.eof_class() } else { (table.classify)(chars[i].1) };
		let offset = base + byte_at(i);

		match table.step(state, class) {
			Step::Shift(next) => {
				if at_eof {
					return Err(ScanError::new(offset, ScanErrorKind::UnexpectedEof).into());
				}
				state = next;
				i += 1;
			}
			Step::Emit => {
				if at_eof {
					return Err(anyhow!("scan table emits past end of input").into());
				}
				let end = chars[i].0 + chars[i].1.len_utf8();
				tokens.push(Token::new(base + byte_at(start), &source[byte_at(start)..end]));
				i += 1;
				start = i;
				state = 0;
			}
			Step::EmitBack(n) => {
				// The current character counts toward the buffer; the last
				// `n` buffered characters are excluded and re-scanned.
				let consumed = if at_eof { i } else { i + 1 };
				if n > consumed - start {
					return Err(anyhow!("scan table re-scans past token start").into());
				}
				let cut = consumed - n;
				if cut > start {
					tokens.push(Token::new(base + byte_at(start), &source[byte_at(start)..byte_at(cut)]));
				}
				if at_eof && n > 0 {
					return Err(anyhow!("scan table re-scans at end of input").into());
				}
				if at_eof {
					break;
				}
				i = cut;
				start = i;
				state = 0;
			}
			Step::Push(counter, next) => {
				if at_eof {
					return Err(ScanError::new(offset, ScanErrorKind::UnexpectedEof).into());
				}
				counters[counter as usize] += 1;
				state = next;
				i += 1;
			}
			Step::Pop(counter, more, done) => {
				if at_eof {
					return Err(ScanError::new(offset, ScanErrorKind::UnexpectedEof).into());
				}
				let depth = &mut counters[counter as usize];
				if *depth == 0 {
					return Err(ScanError::new(offset, ScanErrorKind::UnmatchedClose(counter.close_char())).into());
				}
				*depth -= 1;
				state = if *depth > 0 { more } else { done };
				i += 1;
			}
			Step::Error => {
				let kind = if at_eof {
					ScanErrorKind::UnexpectedEof
				} else {
					ScanErrorKind::UnexpectedCharacter(chars[i].1)
				};
				return Err(ScanError::new(offset, kind).into());
			}
		}
	}

	for (counter, depth) in [(Counter::Paren, counters[0]), (Counter::Brace, counters[1])] {
		if depth != 0 {
			return Err(
				ScanError::new(base + source.len(), ScanErrorKind::UnbalancedNesting(counter.open_char())).into(),
			);
		}
	}

	Ok(tokens)
}

#[cfg(test)]
mod tests {
	use super::*;

	// A toy table: words, digit runs and single punctuation marks, with a
	// parenthesized region tracked by the paren counter.
	fn table() -> ScanTable {
		fn classify(c: char) -> usize {
			match c {
				'a'..='z' => 0,
				'0'..='9' => 1,
				'(' => 2,
				')' => 3,
				_ => 4,
			}
		}
		let mut t = ScanTable::new(5, 6, classify);
		// 0 start
		t.set(0, 0, Step::Shift(1));
		t.set(0, 1, Step::Shift(2));
		t.set(0, 2, Step::Push(Counter::Paren, 3));
		t.set(0, 3, Step::Pop(Counter::Paren, 3, 3));
		t.set(0, 4, Step::Emit);
		t.set(0, 5, Step::EmitBack(0));
		// 1 word
		t.fill(1, Step::EmitBack(1));
		t.set(1, 0, Step::Shift(1));
		t.set(1, 5, Step::EmitBack(0));
		// 2 digits
		t.fill(2, Step::EmitBack(1));
		t.set(2, 1, Step::Shift(2));
		t.set(2, 5, Step::EmitBack(0));
		// 3 inside parens, anything until balance restored
		t.fill(3, Step::Shift(3));
		t.set(3, 2, Step::Push(Counter::Paren, 3));
		t.set(3, 3, Step::Pop(Counter::Paren, 3, 4));
		t.set(3, 5, Step::Error);
		// 4 balanced group accepted, close on lookahead
		t.fill(4, Step::EmitBack(1));
		t.set(4, 5, Step::EmitBack(0));
		t
	}

	fn texts(source: &str) -> Vec<String> {
		scan(&table(), source, 0).unwrap().iter().map(|t| t.text.to_string()).collect()
	}

	#[test]
	fn scan_words_and_digits() {
		assert_eq!(texts("abc12 x"), vec!["abc", "12", " ", "x"]);
		assert_eq!(texts(""), Vec::<String>::new());
	}

	#[test]
	fn scan_round_trip() {
		for source in ["abc12 x", "a(b(c))d", "  9z"] {
			let joined: String = texts(source).concat();
			assert_eq!(joined, source);
		}
	}

	#[test]
	fn scan_token_offsets() {
		let tokens = scan(&table(), "ab 12", 10).unwrap();
		assert_eq!(tokens[0].offset, 10);
		assert_eq!(tokens[1].offset, 12);
		assert_eq!(tokens[2].offset, 13);
		assert_eq!(tokens[2].end(), 15);
	}

	#[test]
	fn scan_nested_counters() {
		assert_eq!(texts("(a(b))c"), vec!["(a(b))", "c"]);
		let err = scan(&table(), "(abc", 0).unwrap_err();
		assert!(matches!(err, ScannerError::ScanError(_)));
		let err = scan(&table(), ")", 0).unwrap_err();
		match err {
			ScannerError::ScanError(e) => {
				assert_eq!(*e.kind(), ScanErrorKind::UnmatchedClose(')'));
				assert_eq!(e.offset(), 0);
			}
			_ => panic!("expected a scan error"),
		}
	}
}
