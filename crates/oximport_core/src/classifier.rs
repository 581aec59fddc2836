use oxc_ast::ast::Expression;

use crate::types::Classification;

/// Classify the argument of a dynamic `import()` call.
///
/// A plain string literal is `Static` and carries the specifier verbatim.
/// Every other shape is `Dynamic`: template literals (even without
/// substitutions), concatenation, identifiers, member accesses, calls.
/// Never fails; unrecognized shapes fall through to `Dynamic`.
pub fn classify(source: &Expression) -> Classification {
    match source {
        Expression::StringLiteral(lit) => Classification::Static(lit.value.to_string()),
        _ => Classification::Dynamic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_ast::ast::{Expression, Statement};
    use oxc_parser::{Parser as OxcParser, ParserReturn};
    use oxc_span::SourceType;

    /// Parse `src` (a single `import(...)` expression statement) and classify
    /// the call's argument.
    fn classify_import_arg(src: &str) -> Classification {
        let allocator = Allocator::default();
        let st = SourceType::default();
        let ParserReturn { program, .. } = OxcParser::new(&allocator, src, st).parse();
        let Some(Statement::ExpressionStatement(es)) = program.body.first() else {
            panic!("expected a single expression statement in {src:?}");
        };
        let Expression::ImportExpression(ie) = &es.expression else {
            panic!("expected an import() expression in {src:?}");
        };
        classify(&ie.source)
    }

    #[test]
    fn test_string_literal_is_static() {
        let c = classify_import_arg(r#"import("./lazy_loaded");"#);
        assert_eq!(c, Classification::Static("./lazy_loaded".to_string()));
    }

    #[test]
    fn test_single_quoted_literal_is_static() {
        let c = classify_import_arg("import('react');");
        assert_eq!(c, Classification::Static("react".to_string()));
    }

    #[test]
    fn test_template_with_interpolation_is_dynamic() {
        let c = classify_import_arg("import(`./lazy_${1 + 1}_loaded`);");
        assert_eq!(c, Classification::Dynamic);
    }

    #[test]
    fn test_template_without_substitution_is_dynamic() {
        // Substitution-free templates are still not plain string literals
        let c = classify_import_arg("import(`./lazy_loaded`);");
        assert_eq!(c, Classification::Dynamic);
    }

    #[test]
    fn test_identifier_is_dynamic() {
        let c = classify_import_arg("import(modulePath);");
        assert_eq!(c, Classification::Dynamic);
    }

    #[test]
    fn test_concatenation_is_dynamic() {
        let c = classify_import_arg(r#"import("./pages/" + name);"#);
        assert_eq!(c, Classification::Dynamic);
    }

    #[test]
    fn test_call_result_is_dynamic() {
        let c = classify_import_arg("import(resolvePath());");
        assert_eq!(c, Classification::Dynamic);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let first = classify_import_arg(r#"import("./widget");"#);
        let second = classify_import_arg(r#"import("./widget");"#);
        assert_eq!(first, second);
    }
}
