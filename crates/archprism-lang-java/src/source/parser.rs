//! Java source parsing via tree-sitter
//!
//! Binding resolution is off by design: the extractor records names as
//! written and leaves resolution to the analysis layer. Syntax errors in
//! subtrees become diagnostics on the unit instead of failures.

use crate::error::{Error, Result};
use crate::source::model::{ImportDecl, MethodSummary, SourceUnit, TypeKind, TypeSummary};
use std::path::Path;
use tree_sitter::{Node as TsNode, Parser};

/// Parser facade for `.java` files. Stateless; a fresh tree-sitter parser
/// is created per call, so concurrent parsing of distinct files is safe.
#[derive(Debug, Default)]
pub struct JavaSourceParser;

impl JavaSourceParser {
    /// Create a parser
    pub fn new() -> Self {
        Self
    }

    /// Parse one compilation unit
    pub fn parse(&self, path: &Path, content: &str) -> Result<SourceUnit> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .expect("Failed to load Java grammar");
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| Error::parse(path, "tree-sitter returned no tree"))?;

        let mut extractor = SourceExtractor {
            content,
            unit: SourceUnit::default(),
        };
        if tree.root_node().has_error() {
            tracing::debug!(file = %path.display(), "syntax errors; extraction is best-effort");
            extractor.unit.diagnostics.push(format!(
                "syntax errors in {}; extraction is best-effort",
                path.display()
            ));
        }
        extractor.visit_root(tree.root_node());
        Ok(extractor.unit)
    }
}

const TYPE_DECLARATION_KINDS: [(&str, TypeKind); 5] = [
    ("class_declaration", TypeKind::Class),
    ("interface_declaration", TypeKind::Interface),
    ("enum_declaration", TypeKind::Enum),
    ("annotation_type_declaration", TypeKind::Annotation),
    ("record_declaration", TypeKind::Record),
];

fn declaration_kind(node_kind: &str) -> Option<TypeKind> {
    TYPE_DECLARATION_KINDS
        .iter()
        .find(|(name, _)| *name == node_kind)
        .map(|(_, kind)| *kind)
}

struct SourceExtractor<'a> {
    content: &'a str,
    unit: SourceUnit,
}

impl<'a> SourceExtractor<'a> {
    fn text(&self, node: TsNode<'_>) -> String {
        node.utf8_text(self.content.as_bytes())
            .unwrap_or("")
            .to_string()
    }

    fn visit_root(&mut self, root: TsNode<'_>) {
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            match child.kind() {
                "package_declaration" => self.visit_package(child),
                "import_declaration" => self.visit_import(child),
                kind => {
                    if let Some(type_kind) = declaration_kind(kind) {
                        self.visit_type(child, type_kind, None);
                    }
                }
            }
        }
    }

    fn visit_package(&mut self, node: TsNode<'_>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if matches!(child.kind(), "scoped_identifier" | "identifier") {
                self.unit.package_name = self.text(child);
                return;
            }
        }
    }

    fn visit_import(&mut self, node: TsNode<'_>) {
        let mut is_static = false;
        let mut is_wildcard = false;
        let mut path = String::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "static" => is_static = true,
                "asterisk" => is_wildcard = true,
                "scoped_identifier" | "identifier" => path = self.text(child),
                _ => {}
            }
        }
        if path.is_empty() {
            return;
        }
        self.unit.imports.push(ImportDecl {
            path,
            is_static,
            is_wildcard,
        });
    }

    fn visit_type(&mut self, node: TsNode<'_>, kind: TypeKind, outer: Option<&str>) {
        let simple_name = match node.child_by_field_name("name") {
            Some(name) => self.text(name),
            None => return,
        };
        let binary_name = match outer {
            Some(outer) => format!("{outer}${simple_name}"),
            None => simple_name,
        };

        let superclass = node
            .child_by_field_name("superclass")
            .and_then(|sc| sc.named_child(0))
            .map(|t| strip_generics(&self.text(t)));
        let mut interfaces = self.interface_list(node.child_by_field_name("interfaces"));
        if kind == TypeKind::Interface {
            // `extends` on an interface lists super-interfaces.
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if child.kind() == "extends_interfaces" {
                    interfaces.extend(self.interface_list(Some(child)));
                }
            }
        }
        let annotations = self.annotation_names(node);

        let mut methods = Vec::new();
        // Record components compile to fields.
        let mut field_count = node
            .child_by_field_name("parameters")
            .map(|params| params.named_child_count())
            .unwrap_or(0);

        if let Some(body) = node.child_by_field_name("body") {
            self.visit_body(body, &binary_name, &mut methods, &mut field_count);
        }

        self.unit.types.push(TypeSummary {
            name: binary_name,
            kind,
            superclass,
            interfaces,
            annotations,
            methods,
            field_count,
        });
    }

    fn visit_body(
        &mut self,
        body: TsNode<'_>,
        binary_name: &str,
        methods: &mut Vec<MethodSummary>,
        field_count: &mut usize,
    ) {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            match member.kind() {
                "method_declaration" | "constructor_declaration" | "compact_constructor_declaration" => {
                    let name = member
                        .child_by_field_name("name")
                        .map(|n| self.text(n))
                        .unwrap_or_else(|| binary_name.to_string());
                    methods.push(MethodSummary {
                        name,
                        decision_points: self.count_decisions(member),
                    });
                }
                "field_declaration" => {
                    let mut declarators = 0;
                    let mut field_cursor = member.walk();
                    for part in member.named_children(&mut field_cursor) {
                        if part.kind() == "variable_declarator" {
                            declarators += 1;
                        }
                    }
                    *field_count += declarators.max(1);
                }
                "enum_body_declarations" => {
                    self.visit_body(member, binary_name, methods, field_count);
                }
                kind => {
                    if let Some(nested_kind) = declaration_kind(kind) {
                        self.visit_type(member, nested_kind, Some(binary_name));
                    }
                }
            }
        }
    }

    fn interface_list(&self, node: Option<TsNode<'_>>) -> Vec<String> {
        let node = match node {
            Some(node) => node,
            None => return Vec::new(),
        };
        let mut names = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "type_list" {
                let mut list_cursor = child.walk();
                for entry in child.named_children(&mut list_cursor) {
                    names.push(strip_generics(&self.text(entry)));
                }
            }
        }
        names
    }

    fn annotation_names(&self, node: TsNode<'_>) -> Vec<String> {
        let mut names = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "modifiers" {
                let mut modifier_cursor = child.walk();
                for modifier in child.children(&mut modifier_cursor) {
                    if matches!(modifier.kind(), "marker_annotation" | "annotation") {
                        if let Some(name) = modifier.child_by_field_name("name") {
                            names.push(self.text(name));
                        }
                    }
                }
            }
        }
        names
    }

    /// Count branching constructs below a method node: `if`, loops,
    /// `catch`, ternaries, short-circuit operators and switch cases
    /// (excluding `default`).
    fn count_decisions(&self, node: TsNode<'_>) -> u32 {
        let mut count = 0u32;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            count += match child.kind() {
                "if_statement" | "while_statement" | "do_statement" | "for_statement"
                | "enhanced_for_statement" | "catch_clause" | "ternary_expression" => 1,
                "switch_label" => {
                    if self.text(child).trim_start().starts_with("default") {
                        0
                    } else {
                        1
                    }
                }
                "binary_expression" => {
                    let operator = child
                        .child_by_field_name("operator")
                        .map(|op| self.text(op))
                        .unwrap_or_default();
                    u32::from(operator == "&&" || operator == "||")
                }
                _ => 0,
            };
            count += self.count_decisions(child);
        }
        count
    }
}

fn strip_generics(name: &str) -> String {
    match name.split_once('<') {
        Some((base, _)) => base.trim().to_string(),
        None => name.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::model::TypeKind;
    use std::path::PathBuf;

    fn parse(content: &str) -> SourceUnit {
        JavaSourceParser::new()
            .parse(&PathBuf::from("Test.java"), content)
            .unwrap()
    }

    #[test]
    fn empty_class_in_package() {
        let unit = parse("package x;\nclass Foo {}\n");
        assert_eq!(unit.package_name, "x");
        assert_eq!(unit.types.len(), 1);
        let foo = &unit.types[0];
        assert_eq!(foo.name, "Foo");
        assert_eq!(foo.kind, TypeKind::Class);
        assert!(foo.methods.is_empty());
        assert_eq!(foo.field_count, 0);
        assert_eq!(unit.fqn_of(foo), "x.Foo");
    }

    #[test]
    fn imports_with_static_and_wildcard() {
        let unit = parse(
            "package x;\nimport a.b.C;\nimport static a.b.D.VALUE;\nimport a.util.*;\nclass Foo {}\n",
        );
        assert_eq!(unit.imports.len(), 3);
        assert_eq!(unit.imports[0].target_class().as_deref(), Some("a.b.C"));
        assert!(unit.imports[1].is_static);
        assert_eq!(unit.imports[1].target_class().as_deref(), Some("a.b.D"));
        assert!(unit.imports[2].is_wildcard);
    }

    #[test]
    fn inheritance_clauses() {
        let unit = parse(
            "package x;\nclass Foo extends Base implements Runnable, java.io.Serializable {}\ninterface Rx extends AutoCloseable {}\n",
        );
        let foo = &unit.types[0];
        assert_eq!(foo.superclass.as_deref(), Some("Base"));
        assert_eq!(foo.interfaces, vec!["Runnable", "java.io.Serializable"]);
        let rx = &unit.types[1];
        assert_eq!(rx.kind, TypeKind::Interface);
        assert_eq!(rx.interfaces, vec!["AutoCloseable"]);
    }

    #[test]
    fn generics_are_stripped_from_supertypes() {
        let unit = parse("class Foo extends Base<String> implements java.util.List<Integer> {}\n");
        let foo = &unit.types[0];
        assert_eq!(foo.superclass.as_deref(), Some("Base"));
        assert_eq!(foo.interfaces, vec!["java.util.List"]);
    }

    #[test]
    fn nested_types_use_binary_names() {
        let unit = parse("package x;\nclass Outer { class Inner {} static class Deep { class Deeper {} } }\n");
        let names: Vec<&str> = unit.types.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"Outer"));
        assert!(names.contains(&"Outer$Inner"));
        assert!(names.contains(&"Outer$Deep$Deeper"));
    }

    #[test]
    fn methods_fields_and_decisions() {
        let unit = parse(
            r#"
package x;
class Calc {
    private int a, b;
    private String label;

    Calc() {}

    int pick(int v) {
        if (v > 0 && v < 100) {
            return 1;
        }
        for (int i = 0; i < v; i++) {
            v += i;
        }
        switch (v) {
            case 1: return 1;
            case 2: return 2;
            default: return v > 0 ? v : -v;
        }
    }
}
"#,
        );
        let calc = &unit.types[0];
        assert_eq!(calc.field_count, 3);
        assert_eq!(calc.methods.len(), 2);
        let pick = calc.methods.iter().find(|m| m.name == "pick").unwrap();
        // if + && + for + 2 cases + ternary
        assert_eq!(pick.decision_points, 6);
        assert_eq!(calc.decision_points(), 6);
    }

    #[test]
    fn enum_record_and_annotation_kinds() {
        let unit = parse(
            "package x;\nenum Color { RED, GREEN; int shade() { return 0; } }\nrecord Point(int x, int y) {}\n@interface Tag {}\n",
        );
        let kinds: Vec<(String, TypeKind)> = unit
            .types
            .iter()
            .map(|t| (t.name.clone(), t.kind))
            .collect();
        assert!(kinds.contains(&("Color".to_string(), TypeKind::Enum)));
        assert!(kinds.contains(&("Point".to_string(), TypeKind::Record)));
        assert!(kinds.contains(&("Tag".to_string(), TypeKind::Annotation)));

        let color = unit.types.iter().find(|t| t.name == "Color").unwrap();
        assert_eq!(color.methods.len(), 1);
        let point = unit.types.iter().find(|t| t.name == "Point").unwrap();
        assert_eq!(point.field_count, 2);
    }

    #[test]
    fn type_annotations_are_collected() {
        let unit = parse("package x;\n@Deprecated\n@SuppressWarnings(\"all\")\nclass Foo {}\n");
        assert_eq!(unit.types[0].annotations, vec!["Deprecated", "SuppressWarnings"]);
    }

    #[test]
    fn broken_source_still_extracts_what_parses() {
        let unit = parse("package x;\nclass Foo {\n  void ok() {}\n  void broken( {\n}\n");
        assert!(!unit.diagnostics.is_empty());
        assert_eq!(unit.types[0].name, "Foo");
    }
}
