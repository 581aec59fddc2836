use anyhow::{Context, Result};
use dashmap::DashMap;
use log::{debug, trace};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::{GetSpan, SourceType};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::classifier::classify;
use crate::types::{CallSite, Classification, FileScan, ModuleRequest, RequestOrigin};

/// Scan a file for module requests and dynamic-import call sites, caching the
/// result per path.
pub fn scan_file(file: &Path, cache: &DashMap<PathBuf, FileScan>) -> Result<FileScan> {
    let file_buf = file.to_path_buf();
    if let Some(v) = cache.get(&file_buf) {
        trace!("Cache hit for scan: {}", file.display());
        return Ok(v.clone());
    }
    trace!("Scanning file: {}", file.display());
    let src =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let scan = scan_source(&src, source_type_for(file));
    debug!(
        "Found {} module requests and {} dynamic import call sites in {}",
        scan.requests.len(),
        scan.call_sites.len(),
        file.display()
    );
    cache.insert(file_buf, scan.clone());
    Ok(scan)
}

/// Scan source text for module requests and dynamic-import call sites.
///
/// The parser is error-tolerant; malformed input yields whatever was
/// recognized rather than an error. Results are in document order.
pub fn scan_source(src: &str, st: SourceType) -> FileScan {
    let allocator = Allocator::default();
    let ParserReturn { program, .. } = OxcParser::new(&allocator, src, st).parse();

    let mut walker = Walker { src, out: FileScan::default() };
    for stmt in &program.body {
        walker.visit_statement(stmt);
    }
    walker.out
}

pub fn source_type_for(path: &Path) -> SourceType {
    let ext = path.extension().and_then(|e| e.to_str());

    let mut st = SourceType::default()
        .with_jsx(matches!(ext, Some("tsx") | Some("jsx")))
        .with_typescript(matches!(ext, Some("ts") | Some("tsx") | Some("mts") | Some("cts")));

    // ESM heuristic - .mjs, .mts are ES modules
    if matches!(ext, Some("mjs") | Some("mts")) {
        st = st.with_module(true);
    }

    st
}

/// 1-based line and column (in bytes) of a byte offset in `src`.
fn line_col(src: &str, offset: u32) -> (u32, u32) {
    let prefix = &src[..(offset as usize).min(src.len())];
    let line = prefix.matches('\n').count() as u32 + 1;
    let column = match prefix.rfind('\n') {
        Some(i) => (prefix.len() - i) as u32,
        None => prefix.len() as u32 + 1,
    };
    (line, column)
}

struct Walker<'s> {
    src: &'s str,
    out: FileScan,
}

impl Walker<'_> {
    fn push_request(&mut self, request: String, offset: u32, origin: RequestOrigin) {
        let (line, _) = line_col(self.src, offset);
        trace!("Found module request '{}' at line {} ({:?})", request, line, origin);
        self.out.requests.push(ModuleRequest { request, line, origin });
    }

    fn visit_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::ImportDeclaration(decl) => self.visit_import_declaration(decl),
            Statement::ExportNamedDeclaration(decl) => {
                if let Some(source) = &decl.source
                    && !decl.export_kind.is_type()
                {
                    self.push_request(
                        source.value.to_string(),
                        decl.span.start,
                        RequestOrigin::ExportFrom,
                    );
                }
                if let Some(d) = &decl.declaration {
                    self.visit_declaration(d);
                }
            }
            Statement::ExportAllDeclaration(decl) => {
                if !decl.export_kind.is_type() {
                    self.push_request(
                        decl.source.value.to_string(),
                        decl.span.start,
                        RequestOrigin::ExportFrom,
                    );
                }
            }
            Statement::ExportDefaultDeclaration(decl) => match &decl.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(f) => self.visit_function(f),
                ExportDefaultDeclarationKind::ClassDeclaration(c) => self.visit_class(c),
                other => {
                    if let Some(e) = other.as_expression() {
                        self.visit_expression(e);
                    }
                }
            },
            Statement::ExpressionStatement(es) => self.visit_expression(&es.expression),
            Statement::VariableDeclaration(vd) => self.visit_variable_declaration(vd),
            Statement::FunctionDeclaration(f) => self.visit_function(f),
            Statement::ClassDeclaration(c) => self.visit_class(c),
            Statement::BlockStatement(b) => {
                for s in &b.body {
                    self.visit_statement(s);
                }
            }
            Statement::IfStatement(i) => {
                self.visit_expression(&i.test);
                self.visit_statement(&i.consequent);
                if let Some(alt) = &i.alternate {
                    self.visit_statement(alt);
                }
            }
            Statement::WhileStatement(w) => {
                self.visit_expression(&w.test);
                self.visit_statement(&w.body);
            }
            Statement::DoWhileStatement(d) => {
                self.visit_statement(&d.body);
                self.visit_expression(&d.test);
            }
            Statement::ForStatement(f) => {
                if let Some(init) = &f.init {
                    match init {
                        ForStatementInit::VariableDeclaration(vd) => {
                            self.visit_variable_declaration(vd)
                        }
                        other => {
                            if let Some(e) = other.as_expression() {
                                self.visit_expression(e);
                            }
                        }
                    }
                }
                if let Some(test) = &f.test {
                    self.visit_expression(test);
                }
                if let Some(update) = &f.update {
                    self.visit_expression(update);
                }
                self.visit_statement(&f.body);
            }
            Statement::ForInStatement(f) => {
                self.visit_expression(&f.right);
                self.visit_statement(&f.body);
            }
            Statement::ForOfStatement(f) => {
                self.visit_expression(&f.right);
                self.visit_statement(&f.body);
            }
            Statement::ReturnStatement(r) => {
                if let Some(arg) = &r.argument {
                    self.visit_expression(arg);
                }
            }
            Statement::ThrowStatement(t) => self.visit_expression(&t.argument),
            Statement::SwitchStatement(s) => {
                self.visit_expression(&s.discriminant);
                for case in &s.cases {
                    if let Some(test) = &case.test {
                        self.visit_expression(test);
                    }
                    for st in &case.consequent {
                        self.visit_statement(st);
                    }
                }
            }
            Statement::TryStatement(t) => {
                for s in &t.block.body {
                    self.visit_statement(s);
                }
                if let Some(handler) = &t.handler {
                    for s in &handler.body.body {
                        self.visit_statement(s);
                    }
                }
                if let Some(fin) = &t.finalizer {
                    for s in &fin.body {
                        self.visit_statement(s);
                    }
                }
            }
            Statement::LabeledStatement(l) => self.visit_statement(&l.body),
            _ => {}
        }
    }

    fn visit_import_declaration(&mut self, decl: &ImportDeclaration) {
        // Skip type-only imports (import type { Foo } from 'bar')
        if decl.import_kind.is_type() {
            trace!("Skipping type-only import declaration");
            return;
        }

        // A mixed import (import { type Foo, bar } from 'x') still loads the
        // module at runtime as long as one specifier is a value
        let has_runtime_import = if let Some(specifiers) = &decl.specifiers {
            specifiers.iter().any(|spec| match spec {
                ImportDeclarationSpecifier::ImportSpecifier(s) => !s.import_kind.is_type(),
                ImportDeclarationSpecifier::ImportDefaultSpecifier(_) => true,
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(_) => true,
            })
        } else {
            // No specifiers means something like: import 'side-effect'
            true
        };

        if has_runtime_import {
            self.push_request(decl.source.value.to_string(), decl.span.start, RequestOrigin::Import);
        }
    }

    fn visit_declaration(&mut self, decl: &Declaration) {
        match decl {
            Declaration::VariableDeclaration(vd) => self.visit_variable_declaration(vd),
            Declaration::FunctionDeclaration(f) => self.visit_function(f),
            Declaration::ClassDeclaration(c) => self.visit_class(c),
            _ => {}
        }
    }

    fn visit_variable_declaration(&mut self, vd: &VariableDeclaration) {
        for decl in &vd.declarations {
            if let Some(init) = &decl.init {
                self.visit_expression(init);
            }
        }
    }

    fn visit_function(&mut self, f: &Function) {
        if let Some(body) = &f.body {
            for s in &body.statements {
                self.visit_statement(s);
            }
        }
    }

    fn visit_class(&mut self, c: &Class) {
        if let Some(sup) = &c.super_class {
            self.visit_expression(sup);
        }
        for element in &c.body.body {
            match element {
                ClassElement::MethodDefinition(md) => self.visit_function(&md.value),
                ClassElement::PropertyDefinition(pd) => {
                    if let Some(v) = &pd.value {
                        self.visit_expression(v);
                    }
                }
                ClassElement::AccessorProperty(ap) => {
                    if let Some(v) = &ap.value {
                        self.visit_expression(v);
                    }
                }
                ClassElement::StaticBlock(sb) => {
                    for s in &sb.body {
                        self.visit_statement(s);
                    }
                }
                _ => {}
            }
        }
    }

    fn visit_call(&mut self, ce: &CallExpression) {
        // require() with a literal argument is a statically-known request;
        // computed arguments contribute nothing
        if let Expression::Identifier(callee_ident) = &ce.callee
            && callee_ident.name.as_str() == "require"
            && !ce.arguments.is_empty()
            && let Some(Expression::StringLiteral(sl)) = ce.arguments[0].as_expression()
        {
            self.push_request(sl.value.to_string(), ce.span.start, RequestOrigin::Require);
        }
        self.visit_expression(&ce.callee);
        for arg in &ce.arguments {
            match arg {
                Argument::SpreadElement(sp) => self.visit_expression(&sp.argument),
                other => {
                    if let Some(e) = other.as_expression() {
                        self.visit_expression(e);
                    }
                }
            }
        }
    }

    fn visit_expression(&mut self, expr: &Expression) {
        match expr {
            Expression::ImportExpression(ie) => {
                let (line, column) = line_col(self.src, ie.span.start);
                let classification = classify(&ie.source);
                trace!("Found import() call site at {}:{}: {:?}", line, column, classification);
                if let Classification::Static(request) = &classification {
                    self.out.requests.push(ModuleRequest {
                        request: request.clone(),
                        line,
                        origin: RequestOrigin::DynamicImport,
                    });
                }
                let arg_span = ie.source.span();
                self.out.call_sites.push(CallSite {
                    line,
                    column,
                    source_text: self.src[arg_span.start as usize..arg_span.end as usize]
                        .to_string(),
                    classification,
                });
            }
            Expression::CallExpression(ce) => self.visit_call(ce),
            Expression::AwaitExpression(ae) => self.visit_expression(&ae.argument),
            Expression::ArrayExpression(ae) => {
                for elem in &ae.elements {
                    match elem {
                        ArrayExpressionElement::SpreadElement(sp) => {
                            self.visit_expression(&sp.argument)
                        }
                        ArrayExpressionElement::Elision(_) => {}
                        other => {
                            if let Some(e) = other.as_expression() {
                                self.visit_expression(e);
                            }
                        }
                    }
                }
            }
            Expression::ObjectExpression(oe) => {
                for prop in &oe.properties {
                    match prop {
                        ObjectPropertyKind::ObjectProperty(p) => self.visit_expression(&p.value),
                        ObjectPropertyKind::SpreadProperty(sp) => {
                            self.visit_expression(&sp.argument)
                        }
                    }
                }
            }
            Expression::ConditionalExpression(ce) => {
                self.visit_expression(&ce.test);
                self.visit_expression(&ce.consequent);
                self.visit_expression(&ce.alternate);
            }
            Expression::AssignmentExpression(ae) => self.visit_expression(&ae.right),
            Expression::ParenthesizedExpression(pe) => self.visit_expression(&pe.expression),
            Expression::SequenceExpression(se) => {
                for e in &se.expressions {
                    self.visit_expression(e);
                }
            }
            Expression::BinaryExpression(be) => {
                self.visit_expression(&be.left);
                self.visit_expression(&be.right);
            }
            Expression::LogicalExpression(le) => {
                self.visit_expression(&le.left);
                self.visit_expression(&le.right);
            }
            Expression::UnaryExpression(ue) => self.visit_expression(&ue.argument),
            Expression::TemplateLiteral(tl) => {
                for e in &tl.expressions {
                    self.visit_expression(e);
                }
            }
            Expression::TaggedTemplateExpression(tt) => {
                self.visit_expression(&tt.tag);
                for e in &tt.quasi.expressions {
                    self.visit_expression(e);
                }
            }
            Expression::ArrowFunctionExpression(af) => {
                for s in &af.body.statements {
                    self.visit_statement(s);
                }
            }
            Expression::FunctionExpression(fe) => self.visit_function(fe),
            Expression::ClassExpression(ce) => self.visit_class(ce),
            Expression::NewExpression(ne) => {
                self.visit_expression(&ne.callee);
                for arg in &ne.arguments {
                    match arg {
                        Argument::SpreadElement(sp) => self.visit_expression(&sp.argument),
                        other => {
                            if let Some(e) = other.as_expression() {
                                self.visit_expression(e);
                            }
                        }
                    }
                }
            }
            Expression::StaticMemberExpression(me) => self.visit_expression(&me.object),
            Expression::ComputedMemberExpression(me) => {
                self.visit_expression(&me.object);
                self.visit_expression(&me.expression);
            }
            Expression::PrivateFieldExpression(me) => self.visit_expression(&me.object),
            Expression::ChainExpression(ch) => match &ch.expression {
                ChainElement::CallExpression(ce) => self.visit_call(ce),
                ChainElement::TSNonNullExpression(e) => self.visit_expression(&e.expression),
                ChainElement::StaticMemberExpression(me) => self.visit_expression(&me.object),
                ChainElement::ComputedMemberExpression(me) => {
                    self.visit_expression(&me.object);
                    self.visit_expression(&me.expression);
                }
                ChainElement::PrivateFieldExpression(me) => self.visit_expression(&me.object),
            },
            Expression::TSAsExpression(e) => self.visit_expression(&e.expression),
            Expression::TSSatisfiesExpression(e) => self.visit_expression(&e.expression),
            Expression::TSNonNullExpression(e) => self.visit_expression(&e.expression),
            Expression::YieldExpression(ye) => {
                if let Some(arg) = &ye.argument {
                    self.visit_expression(arg);
                }
            }
            Expression::JSXElement(el) => self.visit_jsx_element(el),
            Expression::JSXFragment(frag) => {
                for child in &frag.children {
                    self.visit_jsx_child(child);
                }
            }
            _ => {
                // For other expression types, we don't recurse further
            }
        }
    }

    // Lazy-loading props like `element={() => import('./page')}` live inside
    // JSX attribute expression containers
    fn visit_jsx_element(&mut self, el: &JSXElement) {
        for attr in &el.opening_element.attributes {
            match attr {
                JSXAttributeItem::Attribute(a) => {
                    if let Some(JSXAttributeValue::ExpressionContainer(c)) = &a.value
                        && let Some(e) = c.expression.as_expression()
                    {
                        self.visit_expression(e);
                    }
                }
                JSXAttributeItem::SpreadAttribute(sa) => self.visit_expression(&sa.argument),
            }
        }
        for child in &el.children {
            self.visit_jsx_child(child);
        }
    }

    fn visit_jsx_child(&mut self, child: &JSXChild) {
        match child {
            JSXChild::Element(el) => self.visit_jsx_element(el),
            JSXChild::Fragment(frag) => {
                for c in &frag.children {
                    self.visit_jsx_child(c);
                }
            }
            JSXChild::ExpressionContainer(c) => {
                if let Some(e) = c.expression.as_expression() {
                    self.visit_expression(e);
                }
            }
            JSXChild::Spread(sp) => self.visit_expression(&sp.expression),
            JSXChild::Text(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Classification, RequestOrigin};
    use std::fs;
    use tempfile::TempDir;

    fn scan_js(src: &str) -> FileScan {
        scan_source(src, SourceType::default())
    }

    fn scan_ts(src: &str) -> FileScan {
        scan_source(src, SourceType::default().with_typescript(true))
    }

    #[test]
    fn test_line_col_first_line() {
        assert_eq!(line_col("import('./a');", 0), (1, 1));
        assert_eq!(line_col("await import('./a');", 6), (1, 7));
    }

    #[test]
    fn test_line_col_later_lines() {
        let src = "const x = 1;\n\n  import('./a');";
        assert_eq!(line_col(src, 16), (3, 3));
    }

    #[test]
    fn test_static_import_default() {
        let scan = scan_js("import foo from './foo';");
        assert_eq!(scan.requests.len(), 1);
        assert_eq!(scan.requests[0].request, "./foo");
        assert_eq!(scan.requests[0].origin, RequestOrigin::Import);
        assert!(scan.call_sites.is_empty());
    }

    #[test]
    fn test_static_import_named_and_namespace() {
        let scan = scan_js("import { bar, baz } from './utils';\nimport * as all from './all';");
        let requests: Vec<&str> = scan.requests.iter().map(|r| r.request.as_str()).collect();
        assert_eq!(requests, vec!["./utils", "./all"]);
        assert_eq!(scan.requests[1].line, 2);
    }

    #[test]
    fn test_side_effect_import() {
        let scan = scan_js("import './polyfills';");
        assert_eq!(scan.requests.len(), 1);
        assert_eq!(scan.requests[0].request, "./polyfills");
    }

    #[test]
    fn test_type_only_import_skipped() {
        let scan = scan_ts("import type { Foo } from './types';");
        assert!(scan.requests.is_empty());
    }

    #[test]
    fn test_mixed_type_and_runtime_import() {
        let scan = scan_ts("import { type Foo, bar } from './utils';");
        // Kept because at least one specifier (bar) is a runtime import
        assert_eq!(scan.requests.len(), 1);
        assert_eq!(scan.requests[0].request, "./utils");
    }

    #[test]
    fn test_export_from() {
        let scan = scan_js("export { a } from './a';\nexport * from './b';");
        let requests: Vec<&str> = scan.requests.iter().map(|r| r.request.as_str()).collect();
        assert_eq!(requests, vec!["./a", "./b"]);
        assert!(scan.requests.iter().all(|r| r.origin == RequestOrigin::ExportFrom));
    }

    #[test]
    fn test_type_only_export_skipped() {
        let scan = scan_ts("export type { Foo } from './types';\nexport type * from './more';");
        assert!(scan.requests.is_empty());
    }

    #[test]
    fn test_require_call() {
        let scan = scan_js("const fs = require('fs');");
        assert_eq!(scan.requests.len(), 1);
        assert_eq!(scan.requests[0].request, "fs");
        assert_eq!(scan.requests[0].origin, RequestOrigin::Require);
    }

    #[test]
    fn test_require_computed_ignored() {
        let scan = scan_js("const mod = require('./mods/' + name);");
        assert!(scan.requests.is_empty());
        assert!(scan.call_sites.is_empty());
    }

    #[test]
    fn test_dynamic_import_literal() {
        let scan = scan_js("import('./lazy');");
        assert_eq!(scan.call_sites.len(), 1);
        let site = &scan.call_sites[0];
        assert_eq!(site.classification, Classification::Static("./lazy".to_string()));
        assert_eq!((site.line, site.column), (1, 1));
        assert_eq!(site.source_text, "'./lazy'");
        // A literal import() also counts as a known module request
        assert_eq!(scan.requests.len(), 1);
        assert_eq!(scan.requests[0].origin, RequestOrigin::DynamicImport);
    }

    #[test]
    fn test_dynamic_import_computed() {
        let scan = scan_js("import(`./lazy_${1 + 1}_loaded`);");
        assert_eq!(scan.call_sites.len(), 1);
        assert_eq!(scan.call_sites[0].classification, Classification::Dynamic);
        assert_eq!(scan.call_sites[0].source_text, "`./lazy_${1 + 1}_loaded`");
        // Computed paths are not knowable, so no request is recorded
        assert!(scan.requests.is_empty());
    }

    #[test]
    fn test_fixture_scenario_in_document_order() {
        let src = r#"import React from "react";

import { bar } from "./bar";

export const routes = {
  "/some/path": {
    async loader() {
      const { lazyLoadedFn } = await import("./lazy_loaded");
      await import(`./lazy_${1 + 1}_loaded`);
    },
  },
};
"#;
        let scan = scan_ts(src);

        assert_eq!(scan.call_sites.len(), 2);
        assert_eq!(
            scan.call_sites[0].classification,
            Classification::Static("./lazy_loaded".to_string())
        );
        assert_eq!(scan.call_sites[0].line, 8);
        assert_eq!(scan.call_sites[1].classification, Classification::Dynamic);
        assert_eq!(scan.call_sites[1].line, 9);

        let requests: Vec<&str> = scan.requests.iter().map(|r| r.request.as_str()).collect();
        assert_eq!(requests, vec!["react", "./bar", "./lazy_loaded"]);
    }

    #[test]
    fn test_import_in_class_method() {
        let src = "class Loader {\n  async load() {\n    return import('./widget');\n  }\n}";
        let scan = scan_js(src);
        assert_eq!(scan.call_sites.len(), 1);
        assert_eq!(scan.call_sites[0].line, 3);
        assert!(scan.call_sites[0].classification.is_static());
    }

    #[test]
    fn test_import_in_arrow_function() {
        let scan = scan_js("const load = () => import(prefix + '/mod');");
        assert_eq!(scan.call_sites.len(), 1);
        assert_eq!(scan.call_sites[0].classification, Classification::Dynamic);
    }

    #[test]
    fn test_import_in_conditional_and_array() {
        let scan = scan_js("const mods = flag ? [import('./a')] : [import('./b')];");
        assert_eq!(scan.call_sites.len(), 2);
        assert!(scan.call_sites.iter().all(|s| s.classification.is_static()));
    }

    #[test]
    fn test_import_behind_member_call() {
        let scan = scan_js("import('./chunk').then((m) => m.init());");
        assert_eq!(scan.call_sites.len(), 1);
        assert_eq!(scan.call_sites[0].classification, Classification::Static("./chunk".into()));
    }

    #[test]
    fn test_import_in_jsx_attribute() {
        let src = "const route = <Route lazy={() => import('./page')} />;";
        let scan = scan_source(src, SourceType::default().with_jsx(true).with_typescript(true));
        assert_eq!(scan.call_sites.len(), 1);
        assert_eq!(scan.call_sites[0].classification, Classification::Static("./page".into()));
    }

    #[test]
    fn test_no_imports() {
        let scan = scan_js("const x = 42;");
        assert!(scan.requests.is_empty());
        assert!(scan.call_sites.is_empty());
    }

    #[test]
    fn test_scan_is_deterministic() {
        let src = "import('./a');\nimport(p);\n";
        let first = scan_js(src);
        let second = scan_js(src);
        assert_eq!(first.call_sites, second.call_sites);
        assert_eq!(first.requests, second.requests);
    }

    #[test]
    fn test_source_type_for_extensions() {
        assert!(source_type_for(Path::new("a.ts")).is_typescript());
        assert!(source_type_for(Path::new("a.tsx")).is_jsx());
        assert!(source_type_for(Path::new("a.jsx")).is_jsx());
        assert!(!source_type_for(Path::new("a.js")).is_typescript());
    }

    #[test]
    fn test_scan_file_cache_behavior() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DashMap::new();
        let file = temp_dir.path().join("test.js");
        fs::write(&file, "import foo from './foo';").unwrap();

        let first = scan_file(&file, &cache).unwrap();
        assert_eq!(first.requests.len(), 1);

        // Second call should use the cache, surviving file removal
        fs::remove_file(&file).unwrap();
        let second = scan_file(&file, &cache).unwrap();
        assert_eq!(second.requests.len(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_scan_file_missing() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DashMap::new();
        let result = scan_file(&temp_dir.path().join("nope.js"), &cache);
        assert!(result.is_err());
    }
}
