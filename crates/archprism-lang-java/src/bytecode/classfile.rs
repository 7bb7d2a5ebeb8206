//! Classfile parsing
//!
//! Parses one `.class` file into the facts the analysis needs: access
//! flags, names, member lists, per-method decision points and the set of
//! referenced classes. Attributes outside that set are skipped.

use crate::bytecode::code::count_decision_points;
use crate::bytecode::constant_pool::ConstantPool;
use crate::bytecode::reader::ByteReader;
use crate::error::{Error, Result};
use std::collections::BTreeSet;

/// Class access and property flags (JVMS table 4.1-B)
pub mod access_flags {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_FINAL: u16 = 0x0010;
    pub const ACC_SUPER: u16 = 0x0020;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
    pub const ACC_ANNOTATION: u16 = 0x2000;
    pub const ACC_ENUM: u16 = 0x4000;
    pub const ACC_MODULE: u16 = 0x8000;
}

/// Declaration kind recovered from a classfile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JavaTypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
}

/// A field or method entry
#[derive(Debug, Clone)]
pub struct MemberInfo {
    /// Member access flags
    pub access_flags: u16,
    /// Member name
    pub name: String,
    /// Type descriptor
    pub descriptor: String,
}

/// A method entry with its decision-point count
#[derive(Debug, Clone)]
pub struct MethodInfo {
    /// Method access flags
    pub access_flags: u16,
    /// Method name (`<init>` for constructors)
    pub name: String,
    /// Method descriptor
    pub descriptor: String,
    /// Conditional branches plus switch cases in the method body
    pub decision_points: u32,
}

/// A parsed classfile
#[derive(Debug, Clone)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    /// Internal name (`x/y/Foo$Bar`)
    pub this_class: String,
    /// Internal superclass name; absent only for `java/lang/Object`
    pub super_class: Option<String>,
    /// Internal names of implemented interfaces
    pub interfaces: Vec<String>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MethodInfo>,
    /// Dotted names of every class referenced from the constant pool,
    /// excluding this class itself
    pub referenced_classes: BTreeSet<String>,
}

impl ClassFile {
    /// Parse a classfile from raw bytes
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let magic = reader.read_u4()?;
        if magic != 0xCAFE_BABE {
            return Err(Error::InvalidMagic(magic));
        }

        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        let pool = ConstantPool::parse(&mut reader)?;

        let access_flags = reader.read_u2()?;
        let this_class = pool.get_class_name(reader.read_u2()?)?;
        let super_index = reader.read_u2()?;
        let super_class = if super_index == 0 {
            None
        } else {
            Some(pool.get_class_name(super_index)?)
        };

        let interface_count = reader.read_u2()? as usize;
        let mut interfaces = Vec::with_capacity(interface_count);
        for _ in 0..interface_count {
            interfaces.push(pool.get_class_name(reader.read_u2()?)?);
        }

        let field_count = reader.read_u2()? as usize;
        let mut fields = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            let access_flags = reader.read_u2()?;
            let name = pool.get_utf8(reader.read_u2()?)?.to_string();
            let descriptor = pool.get_utf8(reader.read_u2()?)?.to_string();
            skip_attributes(&mut reader)?;
            fields.push(MemberInfo {
                access_flags,
                name,
                descriptor,
            });
        }

        let method_count = reader.read_u2()? as usize;
        let mut methods = Vec::with_capacity(method_count);
        for _ in 0..method_count {
            let access_flags = reader.read_u2()?;
            let name = pool.get_utf8(reader.read_u2()?)?.to_string();
            let descriptor = pool.get_utf8(reader.read_u2()?)?.to_string();
            let decision_points = parse_method_attributes(&mut reader, &pool)?;
            methods.push(MethodInfo {
                access_flags,
                name,
                descriptor,
                decision_points,
            });
        }

        // Class-level attributes carry nothing the analysis needs.
        skip_attributes(&mut reader)?;

        let referenced_classes = pool
            .class_names()
            .iter()
            .filter_map(|name| internal_to_dotted(name))
            .filter(|name| *name != this_class.replace('/', "."))
            .collect();

        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            referenced_classes,
        })
    }

    /// Dotted fully-qualified name
    pub fn fqn(&self) -> String {
        self.this_class.replace('/', ".")
    }

    /// Classify the declaration. Precedence: annotation, interface, enum,
    /// record, class; records have no flag and are detected through their
    /// mandated superclass.
    pub fn kind(&self) -> JavaTypeKind {
        use access_flags::*;
        if self.access_flags & ACC_ANNOTATION != 0 {
            JavaTypeKind::Annotation
        } else if self.access_flags & ACC_INTERFACE != 0 {
            JavaTypeKind::Interface
        } else if self.access_flags & ACC_ENUM != 0 {
            JavaTypeKind::Enum
        } else if self.super_class.as_deref() == Some("java/lang/Record") {
            JavaTypeKind::Record
        } else {
            JavaTypeKind::Class
        }
    }

    /// True for `module-info` pseudo-classes
    pub fn is_module_info(&self) -> bool {
        self.access_flags & access_flags::ACC_MODULE != 0
    }

    /// Sum of decision points across all methods
    pub fn total_decision_points(&self) -> u32 {
        self.methods.iter().map(|m| m.decision_points).sum()
    }
}

/// Skip an `attributes` table entirely
fn skip_attributes(reader: &mut ByteReader<'_>) -> Result<()> {
    let count = reader.read_u2()? as usize;
    for _ in 0..count {
        let _name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        reader.skip(length)?;
    }
    Ok(())
}

/// Walk a method's attributes; the `Code` attribute yields the decision
/// count, everything else is skipped.
fn parse_method_attributes(reader: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<u32> {
    let count = reader.read_u2()? as usize;
    let mut decision_points = 0u32;
    for _ in 0..count {
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        let info = reader.read_bytes(length)?;
        if pool.get_utf8(name_index)? == "Code" {
            let mut code_reader = ByteReader::new(info);
            let _max_stack = code_reader.read_u2()?;
            let _max_locals = code_reader.read_u2()?;
            let code_length = code_reader.read_u4()? as usize;
            let code = code_reader.read_bytes(code_length)?;
            decision_points = count_decision_points(code)?;
            // Exception table and nested attributes are irrelevant here.
        }
    }
    Ok(decision_points)
}

/// Internal or array-descriptor class reference to a dotted name;
/// primitive array entries yield `None`.
fn internal_to_dotted(name: &str) -> Option<String> {
    if name.starts_with('[') {
        let element = name.trim_start_matches('[');
        let object = element.strip_prefix('L')?.strip_suffix(';')?;
        Some(object.replace('/', "."))
    } else {
        Some(name.replace('/', "."))
    }
}
