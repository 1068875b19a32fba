#[cfg(test)]
mod class_tests {
    use rox::Lox;

    fn run(source: &str) -> (String, Vec<String>) {
        let mut lox = Lox::with_output(Vec::new());
        let errors: Vec<String> = lox.run(source).iter().map(ToString::to_string).collect();
        let out = String::from_utf8(lox.into_output()).expect("utf-8 output");
        (out, errors)
    }

    fn assert_prints(source: &str, expected: &str) {
        let (out, errors) = run(source);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_class_and_instance_print() {
        assert_prints(
            "class Bagel {}\nprint Bagel;\nprint Bagel();",
            "Bagel\nBagel instance\n",
        );
    }

    #[test]
    fn test_fields() {
        assert_prints(
            "class Box {}\nvar b = Box();\nb.v = 1;\nb.v = b.v + 1;\nprint b.v;",
            "2\n",
        );
    }

    #[test]
    fn test_initializer_and_this() {
        assert_prints(
            "class Point {\n\
               init(x, y) { this.x = x; this.y = y; }\n\
               sum() { return this.x + this.y; }\n\
             }\n\
             print Point(3, 4).sum();",
            "7\n",
        );
    }

    #[test]
    fn test_calling_init_directly_returns_this() {
        assert_prints(
            "class A { init() { this.n = 1; } }\n\
             var a = A();\n\
             a.n = 5;\n\
             print a.init() == a;\n\
             print a.n;",
            "true\n1\n",
        );
    }

    #[test]
    fn test_bound_method_remembers_instance() {
        assert_prints(
            "class Person {\n\
               init(name) { this.name = name; }\n\
               greet() { print \"hi \" + this.name; }\n\
             }\n\
             var m = Person(\"ann\").greet;\n\
             m();\n\
             print m;",
            "hi ann\n<fn greet>\n",
        );
    }

    #[test]
    fn test_fields_shadow_methods() {
        assert_prints(
            "class A { m() { return \"method\"; } }\n\
             var a = A();\n\
             print a.m();\n\
             fun f() { return \"field\"; }\n\
             a.m = f;\n\
             print a.m();",
            "method\nfield\n",
        );
    }

    #[test]
    fn test_inheritance_and_super() {
        assert_prints(
            "class Doughnut {\n\
               cook() { print \"Fry until golden brown.\"; }\n\
             }\n\
             class BostonCream < Doughnut {\n\
               cook() {\n\
                 super.cook();\n\
                 print \"Pipe full of custard.\";\n\
               }\n\
             }\n\
             BostonCream().cook();",
            "Fry until golden brown.\nPipe full of custard.\n",
        );
    }

    #[test]
    fn test_inherited_methods_and_init() {
        assert_prints(
            "class A { init(v) { this.v = v; } get() { return this.v; } }\n\
             class B < A {}\n\
             print B(9).get();",
            "9\n",
        );
    }

    #[test]
    fn test_super_binds_to_enclosing_class() {
        assert_prints(
            "class A { method() { print \"A method\"; } }\n\
             class B < A {\n\
               method() { print \"B method\"; }\n\
               test() { super.method(); }\n\
             }\n\
             class C < B {}\n\
             C().test();",
            "A method\n",
        );
    }

    #[test]
    fn test_compound_assignment_on_fields() {
        assert_prints(
            "class Counter { init() { this.n = 0; } }\n\
             var c = Counter();\n\
             c.n += 5;\n\
             c.n -= 2;\n\
             print c.n;",
            "3\n",
        );
    }

    #[test]
    fn test_methods_close_over_scope() {
        assert_prints(
            "fun make() {\n\
               var tag = \"closed\";\n\
               class T { show() { print tag; } }\n\
               return T;\n\
             }\n\
             make()().show();",
            "closed\n",
        );
    }

    #[test]
    fn test_class_errors() {
        let (_, errors) = run("var NotAClass = 1;\nclass B < NotAClass {}");
        assert_eq!(errors, vec!["Superclass must be a class.\n[line 2]"]);

        let (_, errors) = run("class A {}\nA().missing;");
        assert_eq!(errors, vec!["Undefined property 'missing'.\n[line 2]"]);

        let (_, errors) = run("var x = 1;\nprint x.y;");
        assert_eq!(errors, vec!["Only instances have properties.\n[line 2]"]);

        let (_, errors) = run("var x = 1;\nx.y = 2;");
        assert_eq!(errors, vec!["Only instances have fields.\n[line 2]"]);

        let (_, errors) = run("class A { init(a) {} }\nA();");
        assert_eq!(errors, vec!["Expected 1 arguments but got 0.\n[line 2]"]);

        let (_, errors) = run("class A {}\nA(1);");
        assert_eq!(errors, vec!["Expected 0 arguments but got 1.\n[line 2]"]);
    }
}
