use serde::Serialize;

/// How a dynamic-import argument was classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "specifier", rename_all = "snake_case")]
pub enum Classification {
    /// A plain string literal, fully known without evaluation.
    Static(String),
    /// Anything else: interpolation, concatenation, variables, calls.
    Dynamic,
}

impl Classification {
    pub fn is_static(&self) -> bool {
        matches!(self, Classification::Static(_))
    }
}

/// A single `import(...)` call site discovered in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallSite {
    /// 1-based line of the `import` keyword.
    pub line: u32,
    /// 1-based column of the `import` keyword.
    pub column: u32,
    /// Raw source text of the argument expression.
    pub source_text: String,
    pub classification: Classification,
}

/// Where a statically-known module request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOrigin {
    /// Top-level `import ... from 'x'` (including side-effect imports).
    Import,
    /// `export ... from 'x'` or `export * from 'x'`.
    ExportFrom,
    /// `require('x')` with a literal argument.
    Require,
    /// `import('x')` with a literal argument.
    DynamicImport,
}

/// A module specifier that is knowable without executing the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleRequest {
    pub request: String,
    /// 1-based line of the statement or call that carries the specifier.
    pub line: u32,
    pub origin: RequestOrigin,
}

/// Everything a single scan pass learns about one file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileScan {
    /// Statically-known module requests, in document order.
    pub requests: Vec<ModuleRequest>,
    /// Dynamic `import()` call sites, in document order.
    pub call_sites: Vec<CallSite>,
}
