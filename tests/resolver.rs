mod common;

#[cfg(test)]
mod resolver_tests {
    use lox_interpreter as lox;

    use lox::error::{ErrorKind, RunError};
    use lox::interpreter::Interpreter;
    use lox::lox::parse_program;
    use lox::resolver::Resolver;

    use super::common::{error_messages, run, run_ok};

    fn resolve_errors(source: &str) -> Vec<String> {
        let statements = parse_program(source).expect("source should parse");
        let mut interpreter = Interpreter::new();

        match Resolver::new(&mut interpreter).resolve(&statements) {
            Ok(()) => Vec::new(),
            Err(errors) => {
                assert!(errors.iter().all(|e| e.kind() == ErrorKind::Resolve));
                errors.iter().map(|e| e.message()).collect()
            }
        }
    }

    #[test]
    fn test_resolver_01_duplicate_local() {
        let (output, result) = run("{ var a = 1; var a = 2; print a; }");

        // Nothing runs when resolution fails.
        assert_eq!(output, "");

        match result {
            Err(e @ RunError::Static(_)) => {
                assert_eq!(e.exit_code(), 65);
                assert_eq!(
                    e.errors()[0].to_string(),
                    "[line 1] Error at 'a': Variable 'a' already declared in this scope."
                );
            }
            other => panic!("expected a static error, got {:?}", other),
        }
    }

    #[test]
    fn test_resolver_02_global_redeclaration_allowed() {
        assert_eq!(run_ok("var a = 1; var a = 2; print a;"), "2\n");
    }

    #[test]
    fn test_resolver_03_own_initializer() {
        assert_eq!(
            resolve_errors("{ var a = a; }"),
            vec!["Can't read local variable in its own initializer."]
        );

        // Shadowing an outer binding with its own value is fine.
        assert_eq!(run_ok("var a = 1; { var a = a + 1; print a; } print a;"), "2\n1\n");
        assert_eq!(run_ok("{ var a = \"outer\"; { var a = a; print a; } }"), "outer\n");
    }

    #[test]
    fn test_resolver_04_top_level_return() {
        assert_eq!(resolve_errors("return 1;"), vec!["Can't return from top-level code."]);
    }

    #[test]
    fn test_resolver_05_this_and_super_placement() {
        assert_eq!(
            resolve_errors("print this;"),
            vec!["Can't use 'this' outside of a class."]
        );
        assert_eq!(
            resolve_errors("fun f() { super.m(); }"),
            vec!["Can't use 'super' outside of a class."]
        );
        assert_eq!(
            resolve_errors("class A { m() { super.m(); } }"),
            vec!["Can't use 'super' in a class with no superclass."]
        );
    }

    #[test]
    fn test_resolver_06_self_inheritance() {
        assert_eq!(
            resolve_errors("class A < A {}"),
            vec!["A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_resolver_07_collects_every_error() {
        let messages = error_messages("return 1;\n{ var b; var b; }\nprint this;");

        assert_eq!(messages.len(), 3);
    }

    #[test]
    fn test_resolver_08_closure_binds_lexically() {
        let source = r#"
            var a = "global";
            {
                fun show() { print a; }
                show();
                var a = "block";
                show();
            }
        "#;

        assert_eq!(run_ok(source), "global\nglobal\n");
    }

    #[test]
    fn test_resolver_09_globals_persist_between_runs() {
        let out = super::common::SharedBuf::default();
        let mut session = lox::lox::Lox::with_output(out.clone());

        session.run("var n = 1; fun bump() { n = n + 1; }").expect("first line");
        session.run("bump(); { var m = n; print m; }").expect("second line");

        assert_eq!(out.contents(), "2\n");
    }
}
