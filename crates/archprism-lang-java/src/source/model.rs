//! Facts extracted from one `.java` compilation unit
//!
//! These types mirror what the analysis layer needs from a source file.
//! They are deliberately independent of the graph model so the parser can
//! be exercised and reused on its own.

/// Kind of a type declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
}

/// One `import` statement
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    /// Imported path as written, without `static` or the trailing `.*`
    pub path: String,
    /// `import static …`
    pub is_static: bool,
    /// `import x.y.*`
    pub is_wildcard: bool,
}

impl ImportDecl {
    /// The class a non-wildcard import refers to. Static member imports
    /// drop the member segment.
    pub fn target_class(&self) -> Option<String> {
        if self.is_wildcard {
            return None;
        }
        if self.is_static {
            self.path
                .rsplit_once('.')
                .map(|(class, _member)| class.to_string())
        } else {
            Some(self.path.clone())
        }
    }
}

/// One method or constructor declaration
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSummary {
    /// Declared name; constructors use the type name
    pub name: String,
    /// Branching constructs in the body
    pub decision_points: u32,
}

/// One type declaration, including nested types flattened to binary names
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSummary {
    /// Binary-style name within the file (`Outer`, `Outer$Inner`)
    pub name: String,
    /// Declaration kind
    pub kind: TypeKind,
    /// Superclass as written (`Bar`, `x.y.Bar`), generics stripped
    pub superclass: Option<String>,
    /// Implemented (or, for interfaces, extended) types as written
    pub interfaces: Vec<String>,
    /// Annotation names on the declaration, without `@`
    pub annotations: Vec<String>,
    /// Declared methods and constructors
    pub methods: Vec<MethodSummary>,
    /// Declared fields (one per declarator, plus record components)
    pub field_count: usize,
}

impl TypeSummary {
    /// Sum of decision points across the type's methods
    pub fn decision_points(&self) -> u32 {
        self.methods.iter().map(|m| m.decision_points).sum()
    }
}

/// Everything extracted from one source file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceUnit {
    /// Declared package, empty for the default package
    pub package_name: String,
    /// Imports in declaration order
    pub imports: Vec<ImportDecl>,
    /// Top-level and nested type declarations
    pub types: Vec<TypeSummary>,
    /// Non-fatal syntax findings
    pub diagnostics: Vec<String>,
}

impl SourceUnit {
    /// Fully-qualified binary name of a contained type
    pub fn fqn_of(&self, summary: &TypeSummary) -> String {
        if self.package_name.is_empty() {
            summary.name.clone()
        } else {
            format!("{}.{}", self.package_name, summary.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_targets() {
        let plain = ImportDecl {
            path: "x.y.Foo".into(),
            is_static: false,
            is_wildcard: false,
        };
        assert_eq!(plain.target_class().as_deref(), Some("x.y.Foo"));

        let statik = ImportDecl {
            path: "x.y.Foo.CONSTANT".into(),
            is_static: true,
            is_wildcard: false,
        };
        assert_eq!(statik.target_class().as_deref(), Some("x.y.Foo"));

        let wildcard = ImportDecl {
            path: "x.y".into(),
            is_static: false,
            is_wildcard: true,
        };
        assert_eq!(wildcard.target_class(), None);
    }

    #[test]
    fn fqn_respects_default_package() {
        let mut unit = SourceUnit::default();
        let summary = TypeSummary {
            name: "Foo$Bar".into(),
            kind: TypeKind::Class,
            superclass: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
            methods: Vec::new(),
            field_count: 0,
        };
        assert_eq!(unit.fqn_of(&summary), "Foo$Bar");
        unit.package_name = "a.b".into();
        assert_eq!(unit.fqn_of(&summary), "a.b.Foo$Bar");
    }
}
