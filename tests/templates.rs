#[cfg(test)]
mod tests {
	use std::path::PathBuf;

	use ztempl::{Context, Engine, Filter, Syntax, TemplateError, Value};

	fn render(source: &str, vars: &[(&str, Value)]) -> String {
		let mut context = Context::new();
		for (name, value) in vars {
			context.set(*name, value.clone());
		}
		Engine::new().render_str(source, context).unwrap()
	}

	#[test]
	fn conditional_block() {
		let source = "#if(x > 0)\nyes\n#end";
		assert_eq!(render(source, &[("x", Value::Int(5))]), "yes\n");
		assert_eq!(render(source, &[("x", Value::Int(-1))]), "");
	}

	#[test]
	fn loop_over_range() {
		assert_eq!(render("#for(i : 1 .. 3)${i}#end", &[]), "123");
		let status = "#for(i : 1 .. 3)#if(for.isFirst)first:#end${i}#if(for.isLast):last#end#end";
		assert_eq!(render(status, &[]), "first:123:last");
	}

	#[test]
	fn arithmetic_precedence() {
		assert_eq!(render("${1 + 2 * 3}", &[]), "6");
	}

	#[test]
	fn nested_map_keys_win_over_members() {
		let inner = Value::Map(vec![(Value::from("c"), Value::from("deep"))]);
		let outer = Value::Map(vec![(Value::from("b"), inner)]);
		assert_eq!(render("${a.b.c}", &[("a", outer)]), "deep");
	}

	struct Upper;
	impl Filter for Upper {
		fn filter(&self, text: &str) -> String { text.to_uppercase() }
	}

	#[test]
	fn suppressed_interpolation_skips_the_filter_once() {
		let engine = Engine::new().with_filter(Upper);
		let output = engine.render_str("#var(x = 'hi')$!{x} ${x}", Context::new()).unwrap();
		assert_eq!(output, "hi HI");
	}

	#[test]
	fn nested_loops_expose_parent_status() {
		let source = "#for(i : 1 .. 2)#for(j : 1 .. 2)(${for.parent.count},${for.count})#end#end";
		assert_eq!(render(source, &[]), "(1,1)(1,2)(2,1)(2,2)");
	}

	#[test]
	fn macros_compose() {
		let source = "#macro(item(label))<li>${label}</li>#end<ul>#for(x : xs)${item(x)}#end</ul>";
		let xs = Value::List(vec![Value::from("a"), Value::from("b")]);
		assert_eq!(render(source, &[("xs", xs)]), "<ul><li>a</li><li>b</li></ul>");
	}

	#[test]
	fn directive_lines_trim_cleanly() {
		let source = "start\n#for(i : 1 .. 2)\nitem ${i}\n#end\ndone\n";
		assert_eq!(render(source, &[]), "start\nitem 1\nitem 2\ndone\n");
	}

	#[test]
	fn unknown_directives_pass_through() {
		assert_eq!(render("#define(x)", &[]), "#define(x)");
		assert_eq!(render(r"\#if(x)literal\#end", &[]), "#if(x)literal#end");
	}

	#[test]
	fn comments_leave_no_output() {
		assert_eq!(render("a## trailing note\nb", &[]), "ab");
		assert_eq!(render("a#* block\nnote *#b", &[]), "ab");
	}

	#[test]
	fn custom_directive_names() {
		let mut syntax = Syntax::default();
		syntax.r#for.push("each".to_string());
		let engine = Engine::new().with_syntax(syntax);
		assert_eq!(engine.render_str("#each(i : 1 .. 3)${i}#end", Context::new()).unwrap(), "123");
	}

	#[test]
	fn strict_mode_rejects_undeclared_names() {
		let engine = Engine::new().strict(true).declare("known");
		assert!(engine.parse("${known}").is_ok());
		let err = engine.parse("${unknown}").unwrap_err();
		assert!(matches!(err, TemplateError::Parse(_)));
	}

	#[test]
	fn unbalanced_blocks_are_rejected() {
		assert!(matches!(Engine::new().parse("#if(x)oops"), Err(TemplateError::Parse(_))));
		assert!(matches!(Engine::new().parse("text#end"), Err(TemplateError::Parse(_))));
		assert!(matches!(Engine::new().parse("#else(x)y#end"), Err(TemplateError::Parse(_))));
	}

	#[test]
	fn errors_carry_source_offsets() {
		let err = Engine::new().render_str("padding ${1 / 0}", Context::new()).unwrap_err();
		assert_eq!(err.offset(), Some(12));
	}

	#[test]
	fn template_file_renders() {
		let engine = Engine::new();
		let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("page.tmpl");
		let defines = ["name=World".to_string(), "count=3".to_string()];
		assert!(engine.run_file(&path, &defines).is_ok());
	}
}
