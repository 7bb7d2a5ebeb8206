//! Java classfile parsing: reader, constant pool, members and bytecode

pub mod classfile;
pub mod code;
pub mod constant_pool;
pub mod reader;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use classfile::{access_flags, ClassFile, JavaTypeKind, MemberInfo, MethodInfo};
pub use code::count_decision_points;
pub use constant_pool::{ConstantPool, CpInfo};
pub use reader::ByteReader;
