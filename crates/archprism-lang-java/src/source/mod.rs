//! Java source parsing

pub mod model;
pub mod parser;

pub use model::{ImportDecl, MethodSummary, SourceUnit, TypeKind, TypeSummary};
pub use parser::JavaSourceParser;

use once_cell::sync::Lazy;
use regex::Regex;

static PACKAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*package\s+([A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*)\s*;")
        .expect("package regex")
});

static TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:class|interface|enum|record)\s+([A-Za-z_$][\w$]*)").expect("type regex")
});

/// Best-effort name recovery for files the parser cannot handle at all.
/// Returns the declared package and any type names that look declared, so
/// collection can still seed partial class nodes.
pub fn recover_type_names(content: &str) -> (String, Vec<String>) {
    let package = PACKAGE_RE
        .captures(content)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let names = TYPE_RE
        .captures_iter(content)
        .filter_map(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .collect();
    (package, names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_names_from_mangled_source() {
        let (package, names) =
            recover_type_names("package a.b;\n\nclass Foo {{{{\ninterface Bar }} class {");
        assert_eq!(package, "a.b");
        assert_eq!(names, vec!["Foo", "Bar"]);
    }

    #[test]
    fn recovery_tolerates_missing_package() {
        let (package, names) = recover_type_names("enum Color { RED }");
        assert_eq!(package, "");
        assert_eq!(names, vec!["Color"]);
    }
}
