//! Error types for the Java parsers

use std::path::Path;
use thiserror::Error;

/// Result type for Java parsing
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Java source and classfile parsing
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to parse a source file
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// Classfile input ended prematurely
    #[error("unexpected end of classfile")]
    UnexpectedEof,

    /// Wrong magic number
    #[error("invalid classfile magic: 0x{0:08x}")]
    InvalidMagic(u32),

    /// Constant pool index out of range or unoccupied
    #[error("invalid constant pool index: {0}")]
    InvalidConstantPoolIndex(u16),

    /// Unknown constant pool tag byte
    #[error("invalid constant pool tag: {0}")]
    InvalidConstantPoolTag(u8),

    /// Constant pool entry had an unexpected kind
    #[error("constant pool type mismatch at index {index}: expected {expected}, found {found}")]
    ConstantPoolTypeMismatch {
        index: u16,
        expected: &'static str,
        found: &'static str,
    },

    /// Malformed modified UTF-8 constant
    #[error("invalid modified UTF-8 constant")]
    InvalidModifiedUtf8,

    /// A named attribute did not match its declared layout
    #[error("malformed {0} attribute")]
    MalformedAttribute(&'static str),

    /// Unknown or unsupported bytecode
    #[error("invalid opcode 0x{opcode:02x} at pc {pc}")]
    InvalidOpcode { opcode: u8, pc: usize },

    /// Catch-all for structural problems
    #[error("{0}")]
    Malformed(&'static str),
}

impl Error {
    /// Create a source parse error
    pub fn parse(file: &Path, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.display().to_string(),
            message: message.into(),
        }
    }
}
