//! Java language support for archprism
//!
//! Two parser adapters feed the analysis: a tree-sitter based source
//! parser that summarizes `.java` compilation units, and a hand-rolled
//! classfile parser that reads `.class` bytes down to per-method decision
//! points. Both are pure with respect to the graph; the analysis layer
//! decides what becomes nodes, tags and edges.

pub mod bytecode;
pub mod error;
pub mod source;

pub use bytecode::{access_flags, ClassFile, JavaTypeKind, MemberInfo, MethodInfo};
pub use error::{Error, Result};
pub use source::{
    recover_type_names, ImportDecl, JavaSourceParser, MethodSummary, SourceUnit, TypeKind,
    TypeSummary,
};
