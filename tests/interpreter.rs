mod common;

#[cfg(test)]
mod interpreter_tests {
    use std::io::BufWriter;

    use lox_interpreter as lox;

    use lox::error::{ErrorKind, RunError};
    use lox::lox::Lox;
    use lox::value::Value;

    use super::common::{run, run_ok, SharedBuf};

    fn runtime_error(source: &str) -> (String, String, usize) {
        let (output, result) = run(source);

        match result {
            Err(RunError::Runtime(e)) => {
                assert_eq!(e.kind(), ErrorKind::Runtime);
                (output, e.message(), e.line())
            }
            other => panic!("expected a runtime error, got {:?}", other),
        }
    }

    // ───────────────────────────── expressions ─────────────────────────────

    #[test]
    fn test_interpreter_01_arithmetic() {
        assert_eq!(run_ok("print 1 + 2;"), "3\n");
        assert_eq!(run_ok("print 7 / 2;"), "3.5\n");
        assert_eq!(run_ok("print -(2 * 3) + 10 - 1;"), "3\n");
        assert_eq!(run_ok("print 0.1 + 0.2 > 0.3;"), "true\n");
    }

    #[test]
    fn test_interpreter_02_string_concatenation() {
        assert_eq!(run_ok("print \"ab\" + \"cd\";"), "abcd\n");
        assert_eq!(run_ok("print 1 + \"x\";"), "1x\n");
        assert_eq!(run_ok("print \"n=\" + 2.5;"), "n=2.5\n");
        assert_eq!(run_ok("print \"t\" + true;"), "ttrue\n");
    }

    #[test]
    fn test_interpreter_03_truthiness() {
        let source = r#"
            if (0) print "zero"; else print "no zero";
            if ("") print "empty"; else print "no empty";
            if (nil) print "nil"; else print "no nil";
            if (false) print "false"; else print "no false";
            print !0;
        "#;

        assert_eq!(run_ok(source), "zero\nempty\nno nil\nno false\nfalse\n");
    }

    #[test]
    fn test_interpreter_04_logical_operators_short_circuit() {
        let source = r#"
            print nil or "fallback";
            print 1 and 2;
            print false and undefined_name;
            print true or undefined_name;
        "#;

        assert_eq!(run_ok(source), "fallback\n2\nfalse\ntrue\n");
    }

    #[test]
    fn test_interpreter_05_equality() {
        let source = r#"
            print 1 == 1;
            print "a" == "a";
            print nil == nil;
            print 1 == "1";
            print nil == false;
            print 3 != 4;
        "#;

        assert_eq!(run_ok(source), "true\ntrue\ntrue\nfalse\nfalse\ntrue\n");
    }

    #[test]
    fn test_interpreter_06_operand_type_errors() {
        let (_, message, _) = runtime_error("print -\"a\";");
        assert_eq!(message, "Operand of '-' must be a number.");

        let (_, message, _) = runtime_error("print 1 < \"2\";");
        assert!(message.starts_with("Operands of '<' must be numbers"), "{}", message);

        let (_, message, _) = runtime_error("print nil + 1;");
        assert!(message.starts_with("Operands of '+'"), "{}", message);
    }

    #[test]
    fn test_interpreter_06b_division_by_zero_is_infinite() {
        assert_eq!(run_ok("print 1 / 0;"), "Infinity\n");
        assert_eq!(run_ok("print -1 / 0;"), "-Infinity\n");
        assert_eq!(run_ok("print 0 / 0;"), "NaN\n");
        assert_eq!(run_ok("print 1 / 0 > 1000000;"), "true\n");
    }

    // ───────────────────────────── statements ─────────────────────────────

    #[test]
    fn test_interpreter_07_blocks_and_scopes() {
        let source = r#"
            var a = "global a";
            var b = "global b";
            {
                var a = "outer a";
                {
                    var a = "inner a";
                    print a;
                    print b;
                }
                print a;
            }
            print a;
        "#;

        assert_eq!(run_ok(source), "inner a\nglobal b\nouter a\nglobal a\n");
    }

    #[test]
    fn test_interpreter_08_loops() {
        assert_eq!(run_ok("var i = 0; while (i < 3) { print i; i = i + 1; }"), "0\n1\n2\n");
        assert_eq!(run_ok("for (var i = 0; i < 3; i = i + 1) print i;"), "0\n1\n2\n");
        assert_eq!(
            run_ok("var a = 0; var t; for (var b = 1; a < 30; b = t + b) { print a; t = a; a = b; }"),
            "0\n1\n1\n2\n3\n5\n8\n13\n21\n"
        );
    }

    #[test]
    fn test_interpreter_09_undefined_variable() {
        let (output, message, line) = runtime_error("print 1;\n\nprint missing;\nprint 2;");

        assert_eq!(output, "1\n");
        assert_eq!(message, "Undefined variable 'missing'.");
        assert_eq!(line, 3);

        let (_, result) = run("missing = 1;");
        let error = result.expect_err("assignment to undeclared global");
        assert_eq!(error.exit_code(), 70);
        assert_eq!(error.to_string(), "Undefined variable 'missing'.\n[line 1]");
    }

    #[test]
    fn test_interpreter_10_uninitialized_var_is_nil() {
        assert_eq!(run_ok("var a; print a;"), "nil\n");
    }

    // ───────────────────────────── functions ─────────────────────────────

    #[test]
    fn test_interpreter_11_function_call() {
        assert_eq!(run_ok("fun f(a, b) { return a + b; } print f(2, 3);"), "5\n");
        assert_eq!(run_ok("fun f() {} print f();"), "nil\n");
        assert_eq!(run_ok("fun f() { return; } print f();"), "nil\n");
        assert_eq!(run_ok("fun f() {} print f;"), "<fn f>\n");
        assert_eq!(run_ok("print clock;"), "<native fn>\n");
    }

    #[test]
    fn test_interpreter_12_recursion_and_early_return() {
        let source = r#"
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(15);

            fun first_even(limit) {
                for (var i = 1; i < limit; i = i + 1) {
                    if (i / 2 == 0 or i == 4) return i;
                }
                return -1;
            }
            print first_even(10);
        "#;

        assert_eq!(run_ok(source), "610\n4\n");
    }

    #[test]
    fn test_interpreter_13_independent_closures() {
        let source = r#"
            fun makeCounter() {
                var count = 0;
                fun counter() {
                    count = count + 1;
                    return count;
                }
                return counter;
            }

            var a = makeCounter();
            var b = makeCounter();
            print a();
            print a();
            print b();
            print a();
        "#;

        assert_eq!(run_ok(source), "1\n2\n1\n3\n");
    }

    #[test]
    fn test_interpreter_14_arity_and_callee_errors() {
        let (_, message, _) = runtime_error("fun f(a) {} f(1, 2);");
        assert_eq!(message, "Expected 1 arguments but got 2.");

        let (_, message, _) = runtime_error("\"text\"();");
        assert_eq!(message, "Can only call functions and classes.");
    }

    #[test]
    fn test_interpreter_14b_deep_recursion() {
        let source = r#"
            fun depth(n) {
                if (n == 0) return 0;
                return 1 + depth(n - 1);
            }
            print depth(2000);
        "#;

        assert_eq!(run_ok(source), "2000\n");
    }

    #[test]
    fn test_interpreter_14c_unbounded_recursion_is_runtime_error() {
        let (output, message, line) =
            runtime_error("print \"before\";\nfun f(n) { return f(n + 1); }\nf(0);");

        assert_eq!(output, "before\n");
        assert_eq!(message, "Stack overflow.");
        assert_eq!(line, 2);
    }

    #[test]
    fn test_interpreter_14d_session_survives_stack_overflow() {
        let out = SharedBuf::default();
        let mut session = Lox::with_output(out.clone());

        session.run("fun loop_forever() { loop_forever(); }").expect("definition");

        match session.run("loop_forever();") {
            Err(RunError::Runtime(e)) => assert_eq!(e.message(), "Stack overflow."),
            other => panic!("expected a runtime error, got {:?}", other),
        }

        session.run("print \"still here\";").expect("session usable");
        assert_eq!(out.contents(), "still here\n");
    }

    #[test]
    fn test_interpreter_15_clock_native() {
        assert_eq!(run_ok("print clock() > 0;"), "true\n");
    }

    #[test]
    fn test_interpreter_16_custom_native() {
        fn double(args: &[Value]) -> Result<Value, String> {
            match args {
                [Value::Number(n)] => Ok(Value::Number(n * 2.0)),
                _ => Err("double expects a number.".to_string()),
            }
        }

        let out = SharedBuf::default();
        let mut session = Lox::with_output(out.clone());
        session.interpreter_mut().define_native("double", 1, double);

        session.run("print double(21);").expect("native call");
        assert_eq!(out.contents(), "42\n");

        let error = session.run("double(\"x\");").expect_err("native failure");
        assert_eq!(error.errors()[0].message(), "double expects a number.");
    }

    // ───────────────────────────── classes ─────────────────────────────

    #[test]
    fn test_interpreter_17_class_fields_and_methods() {
        let source = r#"
            class Point {
                init(x, y) {
                    this.x = x;
                    this.y = y;
                }
                sum() { return this.x + this.y; }
            }

            var p = Point(1, 2);
            print p.sum();
            p.x = 10;
            print p.sum();
            print p;
            print Point;

            var method = p.sum;
            p.y = 5;
            print method();
        "#;

        assert_eq!(run_ok(source), "3\n12\nPoint instance\nPoint\n15\n");
    }

    #[test]
    fn test_interpreter_18_initializer_behaviour() {
        let source = r#"
            class Foo {
                init() {
                    this.ready = true;
                    return;
                }
            }
            var foo = Foo();
            print foo.ready;
            print foo.init();
        "#;

        assert_eq!(run_ok(source), "true\nnil\n");

        let (_, message, _) = runtime_error("class A { init(a, b) {} } A(1);");
        assert_eq!(message, "Expected 2 arguments but got 1.");

        let (_, message, _) = runtime_error("class A {} A(1);");
        assert_eq!(message, "Expected 0 arguments but got 1.");
    }

    #[test]
    fn test_interpreter_19_super_calls() {
        let source = r#"
            class A { method() { print "A"; } }
            class B < A { method() { super.method(); print "B"; } }
            B().method();
        "#;

        assert_eq!(run_ok(source), "A\nB\n");

        let source = r#"
            class A { name() { return "A"; } }
            class B < A { name() { return super.name() + "B"; } }
            print B().name();
        "#;

        assert_eq!(run_ok(source), "AB\n");
    }

    #[test]
    fn test_interpreter_20_three_level_super_chain() {
        let source = r#"
            class A {
                say() { return "A"; }
            }
            class B < A {
                say() { return "B" + super.say(); }
            }
            class C < B {
                say() { return "C" + super.say(); }
            }
            print C().say();

            class D < C {}
            print D().say();
        "#;

        assert_eq!(run_ok(source), "CBA\nCBA\n");
    }

    #[test]
    fn test_interpreter_21_inherited_init_and_this() {
        let source = r#"
            class Base {
                init(name) { this.name = name; }
                greet() { return "hi " + this.name; }
            }
            class Derived < Base {}
            var d = Derived("lox");
            print d.greet();

            class Box {
                init() {
                    this.cb = fun_maker(this);
                }
            }
            fun fun_maker(self) {
                fun cb() { return self; }
                return cb;
            }
            var box = Box();
            print box.cb() == box;
        "#;

        assert_eq!(run_ok(source), "hi lox\ntrue\n");
    }

    #[test]
    fn test_interpreter_22_property_errors() {
        let (_, message, _) = runtime_error("class A {} print A().missing;");
        assert_eq!(message, "Undefined property 'missing'.");

        let (_, message, _) = runtime_error("var x = 1; print x.y;");
        assert_eq!(message, "Only instances have properties.");

        let (_, message, _) = runtime_error("var x = 1; x.y = 2;");
        assert_eq!(message, "Only instances have fields.");

        let (_, message, _) = runtime_error("var NotClass = 1; class B < NotClass {}");
        assert_eq!(message, "Superclass must be a class.");
    }

    #[test]
    fn test_interpreter_23_runtime_error_restores_scope() {
        let out = SharedBuf::default();
        let mut session = Lox::with_output(out.clone());

        session.run("var a = \"global\";").expect("definition");
        assert!(session.run("{ var a = \"local\"; print undefined_name; }").is_err());
        session.run("print a;").expect("global still visible");

        assert_eq!(out.contents(), "global\n");
    }

    #[test]
    fn test_interpreter_23b_output_flushed_before_runtime_error() {
        let out = SharedBuf::default();
        let mut session = Lox::with_output(BufWriter::new(out.clone()));

        let error = session
            .run("print \"partial\";\nprint missing;")
            .expect_err("undefined variable");

        assert_eq!(error.exit_code(), 70);
        assert_eq!(out.contents(), "partial\n");
    }

    #[test]
    fn test_interpreter_23c_error_report_json() {
        let (_, result) = run("print 1;\nprint -nil;");
        let error = result.expect_err("type error");
        let report = error.errors()[0].report();

        let json: serde_json::Value = serde_json::to_value(&report).expect("report serializes");
        assert_eq!(json["kind"], "runtime");
        assert_eq!(json["line"], 2);
        assert_eq!(json["message"], "Operand of '-' must be a number.");
    }

    #[test]
    fn test_interpreter_24_evaluate_expression() {
        let mut session = Lox::with_output(SharedBuf::default());

        assert_eq!(session.evaluate("1 + 2 * 3").expect("evaluates"), Value::Number(7.0));
        assert_eq!(
            session.evaluate("\"a\" + \"b\"").expect("evaluates"),
            Value::String("ab".to_string())
        );

        let error = session.evaluate("-true").expect_err("type error");
        assert_eq!(error.exit_code(), 70);
    }
}
