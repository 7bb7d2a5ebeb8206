//! Test-only classfile construction

use std::collections::HashMap;

use super::classfile::access_flags::{ACC_PUBLIC, ACC_SUPER};

/// Incremental constant pool writer with entry de-duplication
#[derive(Default)]
pub struct PoolBuilder {
    entries: Vec<Vec<u8>>,
    utf8_indices: HashMap<String, u16>,
    class_indices: HashMap<String, u16>,
}

impl PoolBuilder {
    pub fn utf8(&mut self, text: &str) -> u16 {
        if let Some(index) = self.utf8_indices.get(text) {
            return *index;
        }
        let mut entry = vec![1u8];
        entry.extend_from_slice(&(text.len() as u16).to_be_bytes());
        entry.extend_from_slice(text.as_bytes());
        self.entries.push(entry);
        let index = self.entries.len() as u16;
        self.utf8_indices.insert(text.to_string(), index);
        index
    }

    pub fn class(&mut self, internal_name: &str) -> u16 {
        if let Some(index) = self.class_indices.get(internal_name) {
            return *index;
        }
        let name_index = self.utf8(internal_name);
        let mut entry = vec![7u8];
        entry.extend_from_slice(&name_index.to_be_bytes());
        self.entries.push(entry);
        let index = self.entries.len() as u16;
        self.class_indices.insert(internal_name.to_string(), index);
        index
    }

    fn emit(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&((self.entries.len() + 1) as u16).to_be_bytes());
        for entry in &self.entries {
            out.extend_from_slice(entry);
        }
    }
}

/// Builds syntactically valid classfiles for parser tests
pub struct ClassFileBuilder {
    this_class: String,
    super_class: Option<String>,
    access: u16,
    interfaces: Vec<String>,
    fields: Vec<(String, String)>,
    methods: Vec<(String, String, Option<Vec<u8>>)>,
    extra_class_refs: Vec<String>,
}

impl ClassFileBuilder {
    pub fn new(internal_name: &str) -> Self {
        Self {
            this_class: internal_name.to_string(),
            super_class: Some("java/lang/Object".to_string()),
            access: ACC_PUBLIC | ACC_SUPER,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            extra_class_refs: Vec::new(),
        }
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn superclass(mut self, internal_name: &str) -> Self {
        self.super_class = Some(internal_name.to_string());
        self
    }

    pub fn interface(mut self, internal_name: &str) -> Self {
        self.interfaces.push(internal_name.to_string());
        self
    }

    pub fn field(mut self, name: &str, descriptor: &str) -> Self {
        self.fields.push((name.to_string(), descriptor.to_string()));
        self
    }

    pub fn method(mut self, name: &str, descriptor: &str, code: &[u8]) -> Self {
        self.methods
            .push((name.to_string(), descriptor.to_string(), Some(code.to_vec())));
        self
    }

    pub fn method_without_code(mut self, name: &str, descriptor: &str) -> Self {
        self.methods
            .push((name.to_string(), descriptor.to_string(), None));
        self
    }

    /// Force an extra Class constant into the pool, the way real code
    /// references show up from field types, casts and invocations.
    pub fn class_ref(mut self, internal_name: &str) -> Self {
        self.extra_class_refs.push(internal_name.to_string());
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut pool = PoolBuilder::default();
        let this_index = pool.class(&self.this_class);
        let super_index = self
            .super_class
            .as_deref()
            .map(|name| pool.class(name))
            .unwrap_or(0);
        let interface_indices: Vec<u16> =
            self.interfaces.iter().map(|name| pool.class(name)).collect();
        for name in &self.extra_class_refs {
            pool.class(name);
        }

        let field_indices: Vec<(u16, u16)> = self
            .fields
            .iter()
            .map(|(name, descriptor)| (pool.utf8(name), pool.utf8(descriptor)))
            .collect();
        let code_attr_name = if self.methods.iter().any(|(_, _, code)| code.is_some()) {
            pool.utf8("Code")
        } else {
            0
        };
        let method_indices: Vec<(u16, u16, Option<Vec<u8>>)> = self
            .methods
            .iter()
            .map(|(name, descriptor, code)| {
                (pool.utf8(name), pool.utf8(descriptor), code.clone())
            })
            .collect();

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // minor
        out.extend_from_slice(&52u16.to_be_bytes()); // major: Java 8
        pool.emit(&mut out);

        out.extend_from_slice(&self.access.to_be_bytes());
        out.extend_from_slice(&this_index.to_be_bytes());
        out.extend_from_slice(&super_index.to_be_bytes());

        out.extend_from_slice(&(interface_indices.len() as u16).to_be_bytes());
        for index in interface_indices {
            out.extend_from_slice(&index.to_be_bytes());
        }

        out.extend_from_slice(&(field_indices.len() as u16).to_be_bytes());
        for (name_index, descriptor_index) in field_indices {
            out.extend_from_slice(&0x0002u16.to_be_bytes()); // private
            out.extend_from_slice(&name_index.to_be_bytes());
            out.extend_from_slice(&descriptor_index.to_be_bytes());
            out.extend_from_slice(&0u16.to_be_bytes()); // no attributes
        }

        out.extend_from_slice(&(method_indices.len() as u16).to_be_bytes());
        for (name_index, descriptor_index, code) in method_indices {
            out.extend_from_slice(&ACC_PUBLIC.to_be_bytes());
            out.extend_from_slice(&name_index.to_be_bytes());
            out.extend_from_slice(&descriptor_index.to_be_bytes());
            match code {
                Some(code) => {
                    out.extend_from_slice(&1u16.to_be_bytes());
                    out.extend_from_slice(&code_attr_name.to_be_bytes());
                    let info_len = 2 + 2 + 4 + code.len() + 2 + 2;
                    out.extend_from_slice(&(info_len as u32).to_be_bytes());
                    out.extend_from_slice(&4u16.to_be_bytes()); // max_stack
                    out.extend_from_slice(&4u16.to_be_bytes()); // max_locals
                    out.extend_from_slice(&(code.len() as u32).to_be_bytes());
                    out.extend_from_slice(&code);
                    out.extend_from_slice(&0u16.to_be_bytes()); // exception table
                    out.extend_from_slice(&0u16.to_be_bytes()); // code attributes
                }
                None => out.extend_from_slice(&0u16.to_be_bytes()),
            }
        }

        out.extend_from_slice(&0u16.to_be_bytes()); // class attributes
        out
    }
}
