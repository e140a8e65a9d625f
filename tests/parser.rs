#[cfg(test)]
mod parser_tests {
    use lox_interpreter as lox;

    use lox::ast::{Expr, Stmt};
    use lox::ast_printer::AstPrinter;
    use lox::error::{ErrorKind, LoxError};
    use lox::lox::parse_program;
    use lox::parser::Parser;
    use lox::scanner::scan_tokens;

    fn print_expr(source: &str) -> String {
        let tokens = scan_tokens(source).expect("source should scan");
        let expr: Expr = Parser::new(tokens)
            .parse_expression()
            .expect("source should parse");

        AstPrinter.print(&expr)
    }

    fn parse_errors(source: &str) -> Vec<LoxError> {
        parse_program(source).expect_err("source should not parse")
    }

    #[test]
    fn test_parser_01_precedence() {
        assert_eq!(print_expr("1 + 5 * 2"), "(+ 1 (* 5 2))");
        assert_eq!(print_expr("-1"), "(- 1)");
        assert_eq!(print_expr("(1 + 2) * 3"), "(* (group (+ 1 2)) 3)");
        assert_eq!(print_expr("1 - 2 - 3"), "(- (- 1 2) 3)");
        assert_eq!(print_expr("!true == false"), "(== (! true) false)");
        assert_eq!(print_expr("1 < 2 == 3 >= 4"), "(== (< 1 2) (>= 3 4))");
    }

    #[test]
    fn test_parser_02_literals_and_logic() {
        assert_eq!(print_expr("nil or \"s\" and 2.5"), "(or nil (and s 2.5))");
        assert_eq!(print_expr("a = b = 3"), "(= a (= b 3))");
    }

    #[test]
    fn test_parser_03_calls_and_properties() {
        assert_eq!(print_expr("f(1, 2)(3)"), "(call (call f 1 2) 3)");
        assert_eq!(print_expr("a.b.c"), "(. (. a b) c)");
        assert_eq!(print_expr("a.b = 1"), "(= (. a b) 1)");
    }

    #[test]
    fn test_parser_04_program_statements() {
        let statements: Vec<Stmt> =
            parse_program("var a = 1;\nprint a;\nfun f(x) { return x; }\nclass C < B { m() {} }")
                .expect("program should parse");

        assert_eq!(statements.len(), 4);
        assert!(matches!(statements[0], Stmt::Var { initializer: Some(_), .. }));
        assert!(matches!(statements[1], Stmt::Print(_)));

        match &statements[2] {
            Stmt::Function(decl) => {
                assert_eq!(decl.name.lexeme, "f");
                assert_eq!(decl.params.len(), 1);
                assert_eq!(decl.body.len(), 1);
            }
            other => panic!("expected function, got {:?}", other),
        }

        match &statements[3] {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                assert_eq!(name.lexeme, "C");
                assert!(matches!(superclass, Some(Expr::Variable { .. })));
                assert_eq!(methods.len(), 1);
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_parser_05_for_desugars_to_while() {
        let statements = parse_program("for (var i = 0; i < 3; i = i + 1) print i;")
            .expect("program should parse");

        assert_eq!(statements.len(), 1);

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected block, got {:?}", statements[0]);
        };
        assert!(matches!(outer[0], Stmt::Var { .. }));

        let Stmt::While { body, .. } = &outer[1] else {
            panic!("expected while, got {:?}", outer[1]);
        };
        assert!(matches!(**body, Stmt::Block(ref inner) if inner.len() == 2));
    }

    #[test]
    fn test_parser_06_invalid_assignment_target() {
        let errors = parse_errors("1 + 2 = 3;");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Invalid assignment target.");
        assert_eq!(errors[0].to_string(), "[line 1] Error at '=': Invalid assignment target.");
    }

    #[test]
    fn test_parser_07_recovers_after_errors() {
        let errors = parse_errors("var = 1;\nprint 2;\nprint (3;\nvar ok = 4;\nfun () {}");

        let lines: Vec<usize> = errors.iter().map(|e| e.line()).collect();
        assert_eq!(lines, vec![1, 3, 5]);
        assert!(errors.iter().all(|e| e.kind() == ErrorKind::Parse));
        assert_eq!(errors[0].message(), "Expect variable name.");
        assert_eq!(errors[1].message(), "Expect ')' after expression.");
        assert_eq!(errors[2].message(), "Expect function name.");
    }

    #[test]
    fn test_parser_08_missing_semicolon_at_end() {
        let errors = parse_errors("print 1");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1] Error at end: Expect ';' after value.");
    }

    #[test]
    fn test_parser_09_too_many_arguments() {
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let errors = parse_errors(&format!("f({});", args.join(", ")));

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Can't have more than 255 arguments.");
    }

    #[test]
    fn test_parser_10_too_many_parameters() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let errors = parse_errors(&format!("fun f({}) {{}}", params.join(", ")));

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Can't have more than 255 parameters.");
    }

    #[test]
    fn test_parser_11_super_requires_method() {
        let errors = parse_errors("class A < B { m() { super; } }");

        assert_eq!(errors[0].message(), "Expect '.' after 'super'.");
    }

    #[test]
    fn test_parser_12_trailing_tokens_in_expression() {
        let tokens = scan_tokens("1 2").expect("source should scan");
        let errors = Parser::new(tokens)
            .parse_expression()
            .expect_err("should reject trailing tokens");

        assert_eq!(errors[0].message(), "Expect end of expression.");
    }

    #[test]
    fn test_parser_13_scan_and_parse_errors_reported_together() {
        let errors = parse_errors("var a = @;\nprint ;");

        assert_eq!(errors[0].kind(), ErrorKind::Scan);
        assert!(errors.iter().any(|e| e.kind() == ErrorKind::Parse && e.line() == 2));
    }
}
