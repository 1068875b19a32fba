#[cfg(test)]
mod interpreter_tests {
    use std::thread;

    use rox::interpreter::MAX_CALL_DEPTH;
    use rox::value::Value;
    use rox::{Lox, STACK_SIZE};

    fn run(source: &str) -> (String, Vec<String>) {
        let mut lox = Lox::with_output(Vec::new());
        let errors: Vec<String> = lox.run(source).iter().map(ToString::to_string).collect();
        let out = String::from_utf8(lox.into_output()).expect("utf-8 output");
        (out, errors)
    }

    /// Deep recursion needs the same stack the binary gives its interpreter
    /// thread; the default test thread is far smaller.
    fn run_on_large_stack(source: &'static str) -> (String, Vec<String>) {
        thread::Builder::new()
            .stack_size(STACK_SIZE)
            .spawn(move || run(source))
            .expect("spawn interpreter thread")
            .join()
            .expect("interpreter thread finished")
    }

    fn assert_prints(source: &str, expected: &str) {
        let (out, errors) = run(source);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        assert_eq!(out, expected);
    }

    fn assert_runtime_error(source: &str, expected_out: &str, expected_error: &str) {
        let (out, errors) = run(source);
        assert_eq!(errors, vec![expected_error.to_string()]);
        assert_eq!(out, expected_out);
    }

    #[test]
    fn test_arithmetic_and_number_printing() {
        assert_prints(
            "print 1 + 2; print 7 / 2; print 2 * 3 - 1; print -0.5 + 0.25;",
            "3\n3.5\n5\n-0.25\n",
        );
    }

    #[test]
    fn test_division_by_zero_follows_ieee() {
        assert_prints(
            "print 1 / 0; print -1 / 0; print 0 / 0;",
            "Infinity\n-Infinity\nNaN\n",
        );
    }

    #[test]
    fn test_nan_is_not_equal_to_itself() {
        assert_prints("var n = 0 / 0; print n == n; print n != n;", "false\ntrue\n");
    }

    #[test]
    fn test_strings() {
        assert_prints(
            "var a = \"hello\"; print a + \" \" + \"world\"; print \"multi\nline\";",
            "hello world\nmulti\nline\n",
        );
    }

    #[test]
    fn test_equality_never_coerces() {
        assert_prints(
            "print 1 == 1; print \"1\" == 1; print nil == nil; print nil == false; print \"a\" == \"a\";",
            "true\nfalse\ntrue\nfalse\ntrue\n",
        );
    }

    #[test]
    fn test_truthiness() {
        assert_prints(
            "print !nil; print !0; print !\"\"; print !false;",
            "true\nfalse\nfalse\ntrue\n",
        );
    }

    #[test]
    fn test_logical_returns_deciding_operand() {
        assert_prints(
            "print nil or \"yes\"; print 1 and 2; print false and boom; print 0 or boom;",
            "yes\n2\nfalse\n0\n",
        );
    }

    #[test]
    fn test_ternary_evaluates_one_branch() {
        assert_prints(
            "print true ? 1 : boom; print nil ? boom : 2; print 1 < 2 ? \"lt\" : \"ge\";",
            "1\n2\nlt\n",
        );
    }

    #[test]
    fn test_compound_assignment() {
        assert_prints(
            "var x = 10; x += 5; print x; x -= 3; print x; var s = \"a\"; s += \"b\"; print s;",
            "15\n12\nab\n",
        );
    }

    #[test]
    fn test_control_flow() {
        assert_prints(
            "var i = 0; while (i < 3) { print i; i = i + 1; }\n\
             for (var j = 0; j < 2; j = j + 1) print j;\n\
             if (false) print \"no\"; else print \"else\";",
            "0\n1\n2\n0\n1\nelse\n",
        );
    }

    #[test]
    fn test_block_scoping_and_shadowing() {
        assert_prints(
            "var a = \"global\";\n{\n  var a = \"inner\";\n  print a;\n}\nprint a;",
            "inner\nglobal\n",
        );
    }

    #[test]
    fn test_closures_bind_statically() {
        assert_prints(
            "var a = \"global\";\n\
             {\n\
               fun showA() { print a; }\n\
               showA();\n\
               var a = \"block\";\n\
               showA();\n\
             }",
            "global\nglobal\n",
        );
    }

    #[test]
    fn test_closure_counter() {
        assert_prints(
            "fun makeCounter() {\n\
               var i = 0;\n\
               fun count() { i = i + 1; print i; }\n\
               return count;\n\
             }\n\
             var c = makeCounter(); c(); c();\n\
             var d = makeCounter(); d();",
            "1\n2\n1\n",
        );
    }

    #[test]
    fn test_recursion_and_return() {
        assert_prints(
            "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }\nprint fib(15);",
            "610\n",
        );
        assert_prints(
            "fun f() { while (true) { return \"out\"; } }\nprint f();",
            "out\n",
        );
        assert_prints("fun g() {}\nprint g();", "nil\n");
    }

    #[test]
    fn test_callables_print() {
        assert_prints(
            "fun f() {}\nprint f; print clock;",
            "<fn f>\n<native fn>\n",
        );
    }

    #[test]
    fn test_clock_returns_seconds() {
        assert_prints("var t = clock(); print t > 1000000000;", "true\n");
    }

    #[test]
    fn test_operand_type_errors() {
        assert_runtime_error(
            "print 1;\nprint -\"x\";",
            "1\n",
            "Operand must be a number.\n[line 2]",
        );
        assert_runtime_error(
            "print 1 < \"2\";",
            "",
            "Operands must be numbers.\n[line 1]",
        );
        assert_runtime_error(
            "print 1 + \"2\";",
            "",
            "Operands must be two numbers or two strings.\n[line 1]",
        );
    }

    #[test]
    fn test_undefined_variable() {
        assert_runtime_error("print nope;", "", "Undefined variable 'nope'.\n[line 1]");
        assert_runtime_error("nope = 1;", "", "Undefined variable 'nope'.\n[line 1]");
    }

    #[test]
    fn test_call_errors() {
        assert_runtime_error(
            "\"str\"();",
            "",
            "Can only call functions and classes, not string.\n[line 1]",
        );
        assert_runtime_error(
            "fun f(a, b) {}\nf(1);",
            "",
            "Expected 2 arguments but got 1.\n[line 2]",
        );
    }

    #[test]
    fn test_runtime_error_leaves_session_usable() {
        let mut lox = Lox::with_output(Vec::new());

        assert!(lox.run("var a = 1;").is_empty());
        assert_eq!(lox.run("{ var b = 2; print b; nope; }").len(), 1);
        // Globals survive, and the scope the error unwound through is gone.
        assert!(lox.run("print a;").is_empty());
        assert_eq!(lox.run("print b;").len(), 1);

        assert_eq!(lox.output().as_slice(), b"2\n1\n");
    }

    #[test]
    fn test_session_resolves_across_runs() {
        let mut lox = Lox::with_output(Vec::new());

        assert!(lox
            .run("fun outer() { var x = \"kept\"; fun inner() { print x; } return inner; }")
            .is_empty());
        assert!(lox.run("var f = outer();").is_empty());
        assert!(lox.run("f();").is_empty());

        let out = String::from_utf8(lox.into_output()).expect("utf-8 output");
        assert_eq!(out, "kept\n");
    }

    #[test]
    fn test_evaluate_expression() {
        let mut lox = Lox::with_output(Vec::new());

        match lox.evaluate("(1 + 2) * 4") {
            Ok(Value::Number(n)) => assert_eq!(n, 12.0),
            other => panic!("unexpected result {:?}", other),
        }

        let errors = lox.evaluate("1 +").expect_err("syntax error");
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error at end: Expect expression."
        );
    }

    #[test]
    fn test_deep_recursion() {
        let (out, errors) = run_on_large_stack(
            "fun depth(n) { if (n == 0) return 0; return depth(n - 1) + 1; }\n\
             print depth(1500);",
        );

        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        assert_eq!(out, "1500\n");
    }

    #[test]
    fn test_unbounded_recursion_is_a_runtime_error() {
        let (out, errors) = run_on_large_stack(
            "print \"before\";\n\
             fun forever(n) { return forever(n + 1); }\n\
             forever(0);\n\
             print \"after\";",
        );

        assert_eq!(errors, vec!["Stack overflow.\n[line 2]".to_string()]);
        assert_eq!(out, "before\n");
    }

    #[test]
    fn test_call_depth_resets_after_overflow() {
        let out: String = thread::Builder::new()
            .stack_size(STACK_SIZE)
            .spawn(|| {
                let mut lox = Lox::with_output(Vec::new());

                assert_eq!(lox.run("fun f(n) { return f(n + 1); } f(0);").len(), 1);
                // The unwound frames no longer count against the limit.
                let program = format!(
                    "fun g(n) {{ if (n == 0) return \"done\"; return g(n - 1); }} print g({});",
                    MAX_CALL_DEPTH - 1
                );
                assert!(lox.run(&program).is_empty());

                String::from_utf8(lox.into_output()).expect("utf-8 output")
            })
            .expect("spawn interpreter thread")
            .join()
            .expect("interpreter thread finished");

        assert_eq!(out, "done\n");
    }
}
