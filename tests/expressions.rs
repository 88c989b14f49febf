#[cfg(test)]
mod tests {
	use ztempl::{Context, Engine, TemplateError};

	fn canonical(source: &str) -> String {
		Engine::new().parse(source).unwrap().to_string()
	}

	#[test]
	fn precedence_shapes() {
		assert_eq!(canonical("${1 + 2 * 3}"), "${(+ 1 (* 2 3))}");
		assert_eq!(canonical("${(1 + 2) * 3}"), "${(* (+ 1 2) 3)}");
		assert_eq!(canonical("${a || b && c}"), "${(|| a (&& b c))}");
		assert_eq!(canonical("${1 .. n}"), "${(.. 1 n)}");
	}

	#[test]
	fn postfix_shapes() {
		assert_eq!(canonical("${a.b.c}"), "${(. (. a b) c)}");
		assert_eq!(canonical("${a.m(x)}"), "${(.m a x)}");
		assert_eq!(canonical("${f(x, y)}"), "${(call f (, x y))}");
		assert_eq!(canonical("${m[k]}"), "${(index m k)}");
		assert_eq!(canonical("${(int) x}"), "${((int) x)}");
	}

	#[test]
	fn keyword_aliases() {
		assert_eq!(canonical("${a gt b}"), "${(> a b)}");
		// `lt` intentionally keeps its historical `>` mapping.
		assert_eq!(canonical("${a lt b}"), "${(> a b)}");
		assert_eq!(canonical("${a le b}"), "${(<= a b)}");
		assert_eq!(canonical("${a is int}"), "${(instanceof a int)}");
	}

	#[test]
	fn ternary_shape() {
		assert_eq!(canonical("${x ? 1 : 2}"), "${(: (? x 1) 2)}");
	}

	#[test]
	fn evaluation_matches_shape() {
		let out = Engine::new().render_str("${(1 + 2) * 3 - 4 / 2}", Context::new()).unwrap();
		assert_eq!(out, "7");
	}

	#[test]
	fn malformed_expressions_fail_with_offsets() {
		for source in ["${1 +}", "${(1 + 2}", "${a ..}", "${'unterminated}"] {
			let err = Engine::new().parse(source).unwrap_err();
			assert!(matches!(err, TemplateError::Parse(_) | TemplateError::Scan(_)), "{source}");
			assert!(err.offset().is_some(), "{source}");
		}
	}
}
