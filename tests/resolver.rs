#[cfg(test)]
mod resolver_tests {
    use rox::parser::Parser;
    use rox::resolver::Resolver;
    use rox::scanner::scan_tokens;
    use rox::Lox;

    /// Run `source` and return (stdout, diagnostics).
    fn run(source: &str) -> (String, Vec<String>) {
        let mut lox = Lox::with_output(Vec::new());
        let errors: Vec<String> = lox.run(source).iter().map(ToString::to_string).collect();
        let out = String::from_utf8(lox.into_output()).expect("utf-8 output");
        (out, errors)
    }

    fn assert_static_error(source: &str, expected: &str) {
        let (out, errors) = run(source);
        assert_eq!(errors, vec![expected.to_string()]);
        assert_eq!(out, "", "nothing runs after a static error");
    }

    #[test]
    fn test_return_at_top_level() {
        assert_static_error(
            "print 1;\nreturn 2;",
            "[line 2] Error at 'return': Can't return from top-level code.",
        );
    }

    #[test]
    fn test_return_value_from_initializer() {
        assert_static_error(
            "class A {\n  init() { return 1; }\n}",
            "[line 2] Error at 'return': Can't return a value from an initializer.",
        );
    }

    #[test]
    fn test_bare_return_in_initializer_is_allowed() {
        let (out, errors) = run("class A { init() { this.x = 1; return; } }\nprint A().x;");
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(out, "1\n");
    }

    #[test]
    fn test_read_in_own_initializer() {
        assert_static_error(
            "var a = 1;\n{\n  var a = a;\n}",
            "[line 3] Error at 'a': Can't read local variable in its own initializer.",
        );
    }

    #[test]
    fn test_global_self_reference_is_runtime_matter() {
        // Globals are not tracked statically, so this only fails when run.
        let (_, errors) = run("var a = a;");
        assert_eq!(errors, vec!["Undefined variable 'a'.\n[line 1]".to_string()]);
    }

    #[test]
    fn test_duplicate_local() {
        assert_static_error(
            "fun f() {\n  var a = 1;\n  var a = 2;\n}",
            "[line 3] Error at 'a': Already a variable with this name in this scope.",
        );
        assert_static_error(
            "fun f(a, a) {}",
            "[line 1] Error at 'a': Already a variable with this name in this scope.",
        );
    }

    #[test]
    fn test_duplicate_global_is_allowed() {
        let (out, errors) = run("var a = 1; var a = 2; print a;");
        assert!(errors.is_empty());
        assert_eq!(out, "2\n");
    }

    #[test]
    fn test_this_outside_class() {
        assert_static_error(
            "print this;",
            "[line 1] Error at 'this': Can't use 'this' outside of a class.",
        );
        assert_static_error(
            "fun f() { return this; }",
            "[line 1] Error at 'this': Can't use 'this' outside of a class.",
        );
    }

    #[test]
    fn test_super_misuse() {
        assert_static_error(
            "fun f() { super.g(); }",
            "[line 1] Error at 'super': Can't use 'super' outside of a class.",
        );
        assert_static_error(
            "class A { m() { super.m(); } }",
            "[line 1] Error at 'super': Can't use 'super' in a class with no superclass.",
        );
    }

    #[test]
    fn test_class_inherits_from_itself() {
        assert_static_error(
            "class A < A {}",
            "[line 1] Error at 'A': A class can't inherit from itself.",
        );
    }

    #[test]
    fn test_all_errors_are_reported() {
        let (_, errors) = run("return 1;\nprint this;\n{ var b = 1; var b = 2; }");
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_distances() {
        let (tokens, _) = scan_tokens("var g = 0; { var a = 1; { print a; print g; } }");
        let statements = Parser::new(tokens).parse();
        let locals = Resolver::new().resolve(&statements).expect("resolves");

        // Only the local `a` is recorded, one scope out; `g` is a global.
        assert_eq!(locals.len(), 1);
        assert_eq!(locals.values().copied().collect::<Vec<_>>(), vec![1]);
    }
}
