//! Minimal class-file writer for tests.
//!
//! Only depends on std so integration tests can pull it in with `#[path]`.

#![allow(dead_code)]

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub enum Op {
    New(&'static str),
    ANewArray(&'static str),
    MultiANewArray(&'static str, u8),
    CheckCast(&'static str),
    InstanceOf(&'static str),
    InvokeStatic(&'static str, &'static str, &'static str),
    InvokeSpecial(&'static str, &'static str, &'static str),
    InvokeVirtual(&'static str, &'static str, &'static str),
    GetStatic(&'static str, &'static str, &'static str),
    PutStatic(&'static str, &'static str, &'static str),
    GetField(&'static str, &'static str, &'static str),
    NewIntArray,
    Dup,
    Pop,
    AconstNull,
    Return,
}

#[derive(Debug, Clone, Default)]
pub struct MethodSpec {
    name: String,
    descriptor: String,
    code: Vec<Op>,
    locals: Vec<(String, Option<String>)>,
    annotations: Vec<String>,
    parameter_annotations: Vec<Vec<String>>,
    local_annotations: Vec<String>,
}

impl MethodSpec {
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            ..Self::default()
        }
    }

    pub fn op(mut self, op: Op) -> Self {
        self.code.push(op);
        self
    }

    pub fn local(mut self, descriptor: &str, signature: Option<&str>) -> Self {
        self.locals
            .push((descriptor.to_string(), signature.map(str::to_string)));
        self
    }

    pub fn annotated(mut self, descriptor: &str) -> Self {
        self.annotations.push(descriptor.to_string());
        self
    }

    pub fn parameter_annotated(mut self, param: usize, descriptor: &str) -> Self {
        if self.parameter_annotations.len() <= param {
            self.parameter_annotations.resize(param + 1, Vec::new());
        }
        self.parameter_annotations[param].push(descriptor.to_string());
        self
    }

    pub fn local_annotated(mut self, descriptor: &str) -> Self {
        self.local_annotations.push(descriptor.to_string());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldSpec {
    name: String,
    descriptor: String,
    signature: Option<String>,
    annotations: Vec<String>,
}

impl FieldSpec {
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            ..Self::default()
        }
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn annotated(mut self, descriptor: &str) -> Self {
        self.annotations.push(descriptor.to_string());
        self
    }
}

pub struct ClassFileBuilder {
    pool: Vec<Vec<u8>>,
    pool_index: HashMap<Vec<u8>, u16>,
    next_index: u16,
    this_class: u16,
    super_class: u16,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
    class_annotations: Vec<(String, bool)>,
    type_parameter_annotations: Vec<String>,
}

impl ClassFileBuilder {
    pub fn new(internal_name: &str) -> Self {
        let mut builder = Self {
            pool: Vec::new(),
            pool_index: HashMap::new(),
            next_index: 1,
            this_class: 0,
            super_class: 0,
            fields: Vec::new(),
            methods: Vec::new(),
            class_annotations: Vec::new(),
            type_parameter_annotations: Vec::new(),
        };
        builder.this_class = builder.class(internal_name);
        builder.super_class = builder.class("java/lang/Object");
        builder
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn method(mut self, spec: MethodSpec) -> Self {
        self.methods.push(spec);
        self
    }

    pub fn annotated(mut self, descriptor: &str) -> Self {
        self.class_annotations.push((descriptor.to_string(), false));
        self
    }

    /// Class annotation carrying one element of every element-value kind.
    pub fn annotated_with_values(mut self, descriptor: &str) -> Self {
        self.class_annotations.push((descriptor.to_string(), true));
        self
    }

    pub fn type_parameter_annotated(mut self, descriptor: &str) -> Self {
        self.type_parameter_annotations.push(descriptor.to_string());
        self
    }

    fn entry(&mut self, bytes: Vec<u8>, slots: u16) -> u16 {
        if let Some(&idx) = self.pool_index.get(&bytes) {
            return idx;
        }
        let idx = self.next_index;
        self.next_index += slots;
        self.pool_index.insert(bytes.clone(), idx);
        self.pool.push(bytes);
        idx
    }

    pub fn utf8(&mut self, value: &str) -> u16 {
        let mut bytes = vec![1];
        bytes.extend_from_slice(&(value.len() as u16).to_be_bytes());
        bytes.extend_from_slice(value.as_bytes());
        self.entry(bytes, 1)
    }

    /// A `CONSTANT_Utf8` entry with bytes written as given.
    pub fn raw_utf8(&mut self, encoded: &[u8]) -> u16 {
        let mut bytes = vec![1];
        bytes.extend_from_slice(&(encoded.len() as u16).to_be_bytes());
        bytes.extend_from_slice(encoded);
        self.entry(bytes, 1)
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        let mut bytes = vec![3];
        bytes.extend_from_slice(&value.to_be_bytes());
        self.entry(bytes, 1)
    }

    pub fn long(&mut self, value: i64) -> u16 {
        let mut bytes = vec![5];
        bytes.extend_from_slice(&value.to_be_bytes());
        self.entry(bytes, 2)
    }

    pub fn class(&mut self, internal_name: &str) -> u16 {
        let name = self.utf8(internal_name);
        let mut bytes = vec![7];
        bytes.extend_from_slice(&name.to_be_bytes());
        self.entry(bytes, 1)
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        let mut bytes = vec![12];
        bytes.extend_from_slice(&name.to_be_bytes());
        bytes.extend_from_slice(&descriptor.to_be_bytes());
        self.entry(bytes, 1)
    }

    fn member_ref(&mut self, tag: u8, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(owner);
        let nat = self.name_and_type(name, descriptor);
        let mut bytes = vec![tag];
        bytes.extend_from_slice(&class.to_be_bytes());
        bytes.extend_from_slice(&nat.to_be_bytes());
        self.entry(bytes, 1)
    }

    pub fn fieldref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(9, owner, name, descriptor)
    }

    pub fn methodref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(10, owner, name, descriptor)
    }

    pub fn constant_pool_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.next_index.to_be_bytes());
        for entry in &self.pool {
            out.extend_from_slice(entry);
        }
        out
    }

    pub fn build(mut self) -> Vec<u8> {
        // Everything that touches the pool has to be encoded before the pool is written.
        let fields = std::mem::take(&mut self.fields);
        let methods = std::mem::take(&mut self.methods);
        let field_bytes: Vec<Vec<u8>> = fields.iter().map(|f| self.encode_field(f)).collect();
        let method_bytes: Vec<Vec<u8>> = methods.iter().map(|m| self.encode_method(m)).collect();
        let class_attrs = self.encode_class_attributes();

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFEBABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&52u16.to_be_bytes());
        out.extend_from_slice(&self.constant_pool_bytes());
        out.extend_from_slice(&0x0021u16.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());

        out.extend_from_slice(&(field_bytes.len() as u16).to_be_bytes());
        for f in field_bytes {
            out.extend_from_slice(&f);
        }
        out.extend_from_slice(&(method_bytes.len() as u16).to_be_bytes());
        for m in method_bytes {
            out.extend_from_slice(&m);
        }
        out.extend_from_slice(&class_attrs);
        out
    }

    fn attribute(&mut self, name: &str, body: &[u8]) -> Vec<u8> {
        let name = self.utf8(name);
        let mut out = Vec::new();
        out.extend_from_slice(&name.to_be_bytes());
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    fn annotation(&mut self, descriptor: &str, with_values: bool) -> Vec<u8> {
        let type_index = self.utf8(descriptor);
        let mut out = Vec::new();
        out.extend_from_slice(&type_index.to_be_bytes());
        if !with_values {
            out.extend_from_slice(&0u16.to_be_bytes());
            return out;
        }

        let int_const = self.integer(7);
        let long_const = self.long(1 << 40);
        let string_const = self.utf8("text");
        let enum_type = self.utf8("Lpkg/Mode;");
        let enum_name = self.utf8("FAST");
        let class_info = self.utf8("Lpkg/Literal;");
        let nested = self.annotation("Lpkg/Nested;", false);

        let mut elements: Vec<(&str, Vec<u8>)> = Vec::new();
        elements.push(("i", tagged(b'I', &int_const.to_be_bytes())));
        elements.push(("j", tagged(b'J', &long_const.to_be_bytes())));
        elements.push(("s", tagged(b's', &string_const.to_be_bytes())));
        let mut enum_value = enum_type.to_be_bytes().to_vec();
        enum_value.extend_from_slice(&enum_name.to_be_bytes());
        elements.push(("e", tagged(b'e', &enum_value)));
        elements.push(("c", tagged(b'c', &class_info.to_be_bytes())));
        elements.push(("n", tagged(b'@', &nested)));
        let mut array = 2u16.to_be_bytes().to_vec();
        array.extend(tagged(b'I', &int_const.to_be_bytes()));
        array.extend(tagged(b'c', &class_info.to_be_bytes()));
        elements.push(("a", tagged(b'[', &array)));

        out.extend_from_slice(&(elements.len() as u16).to_be_bytes());
        for (name, value) in elements {
            let name_index = self.utf8(name);
            out.extend_from_slice(&name_index.to_be_bytes());
            out.extend_from_slice(&value);
        }
        out
    }

    fn annotations_attribute(&mut self, descriptors: &[String]) -> Vec<u8> {
        let mut body = (descriptors.len() as u16).to_be_bytes().to_vec();
        for d in descriptors {
            body.extend(self.annotation(d, false));
        }
        self.attribute("RuntimeVisibleAnnotations", &body)
    }

    fn encode_field(&mut self, field: &FieldSpec) -> Vec<u8> {
        let name = self.utf8(&field.name);
        let descriptor = self.utf8(&field.descriptor);
        let mut attrs = Vec::new();
        if let Some(sig) = &field.signature {
            let sig = self.utf8(sig);
            attrs.push(self.attribute("Signature", &sig.to_be_bytes()));
        }
        if !field.annotations.is_empty() {
            attrs.push(self.annotations_attribute(&field.annotations));
        }

        let mut out = Vec::new();
        out.extend_from_slice(&0x0001u16.to_be_bytes());
        out.extend_from_slice(&name.to_be_bytes());
        out.extend_from_slice(&descriptor.to_be_bytes());
        push_attributes(&mut out, attrs);
        out
    }

    fn encode_method(&mut self, method: &MethodSpec) -> Vec<u8> {
        let name = self.utf8(&method.name);
        let descriptor = self.utf8(&method.descriptor);
        let mut attrs = Vec::new();

        if !method.code.is_empty() {
            let code = self.encode_code(method);
            attrs.push(code);
        }
        if !method.annotations.is_empty() {
            attrs.push(self.annotations_attribute(&method.annotations));
        }
        if !method.parameter_annotations.is_empty() {
            let mut body = vec![method.parameter_annotations.len() as u8];
            for param in &method.parameter_annotations {
                body.extend_from_slice(&(param.len() as u16).to_be_bytes());
                for d in param {
                    body.extend(self.annotation(d, false));
                }
            }
            attrs.push(self.attribute("RuntimeInvisibleParameterAnnotations", &body));
        }

        let mut out = Vec::new();
        out.extend_from_slice(&0x0001u16.to_be_bytes());
        out.extend_from_slice(&name.to_be_bytes());
        out.extend_from_slice(&descriptor.to_be_bytes());
        push_attributes(&mut out, attrs);
        out
    }

    fn encode_code(&mut self, method: &MethodSpec) -> Vec<u8> {
        let mut code = Vec::new();
        for op in &method.code {
            self.encode_op(op, &mut code);
        }
        let code_len = code.len() as u16;

        let mut attrs = Vec::new();
        if !method.locals.is_empty() {
            let mut lvt = (method.locals.len() as u16).to_be_bytes().to_vec();
            let mut lvtt_entries = Vec::new();
            for (slot, (desc, sig)) in method.locals.iter().enumerate() {
                let name = self.utf8(&format!("v{slot}"));
                let desc = self.utf8(desc);
                lvt.extend(local_entry(code_len, name, desc, slot as u16));
                if let Some(sig) = sig {
                    let sig = self.utf8(sig);
                    lvtt_entries.push(local_entry(code_len, name, sig, slot as u16));
                }
            }
            attrs.push(self.attribute("LocalVariableTable", &lvt));
            if !lvtt_entries.is_empty() {
                let mut lvtt = (lvtt_entries.len() as u16).to_be_bytes().to_vec();
                for e in lvtt_entries {
                    lvtt.extend(e);
                }
                attrs.push(self.attribute("LocalVariableTypeTable", &lvtt));
            }
        }
        if !method.local_annotations.is_empty() {
            let mut body = (method.local_annotations.len() as u16).to_be_bytes().to_vec();
            for d in &method.local_annotations {
                body.push(0x40);
                body.extend_from_slice(&1u16.to_be_bytes());
                body.extend_from_slice(&0u16.to_be_bytes());
                body.extend_from_slice(&code_len.to_be_bytes());
                body.extend_from_slice(&0u16.to_be_bytes());
                body.push(0);
                body.extend(self.annotation(d, false));
            }
            attrs.push(self.attribute("RuntimeVisibleTypeAnnotations", &body));
        }

        let mut body = Vec::new();
        body.extend_from_slice(&8u16.to_be_bytes());
        body.extend_from_slice(&((method.locals.len() as u16) + 4).to_be_bytes());
        body.extend_from_slice(&(code.len() as u32).to_be_bytes());
        body.extend_from_slice(&code);
        body.extend_from_slice(&0u16.to_be_bytes());
        push_attributes(&mut body, attrs);
        self.attribute("Code", &body)
    }

    fn encode_op(&mut self, op: &Op, code: &mut Vec<u8>) {
        match op {
            Op::New(c) => self.class_op(0xbb, c, code),
            Op::ANewArray(c) => self.class_op(0xbd, c, code),
            Op::CheckCast(c) => self.class_op(0xc0, c, code),
            Op::InstanceOf(c) => self.class_op(0xc1, c, code),
            Op::MultiANewArray(c, dims) => {
                self.class_op(0xc5, c, code);
                code.push(*dims);
            }
            Op::InvokeStatic(o, n, d) => member_op(code, 0xb8, self.methodref(o, n, d)),
            Op::InvokeSpecial(o, n, d) => member_op(code, 0xb7, self.methodref(o, n, d)),
            Op::InvokeVirtual(o, n, d) => member_op(code, 0xb6, self.methodref(o, n, d)),
            Op::GetStatic(o, n, d) => member_op(code, 0xb2, self.fieldref(o, n, d)),
            Op::PutStatic(o, n, d) => member_op(code, 0xb3, self.fieldref(o, n, d)),
            Op::GetField(o, n, d) => member_op(code, 0xb4, self.fieldref(o, n, d)),
            Op::NewIntArray => code.extend_from_slice(&[0xbc, 10]),
            Op::Dup => code.push(0x59),
            Op::Pop => code.push(0x57),
            Op::AconstNull => code.push(0x01),
            Op::Return => code.push(0xb1),
        }
    }

    fn class_op(&mut self, opcode: u8, class: &str, code: &mut Vec<u8>) {
        let idx = self.class(class);
        member_op(code, opcode, idx);
    }

    fn encode_class_attributes(&mut self) -> Vec<u8> {
        let mut attrs = Vec::new();
        if !self.class_annotations.is_empty() {
            let anns = std::mem::take(&mut self.class_annotations);
            let mut body = (anns.len() as u16).to_be_bytes().to_vec();
            for (d, with_values) in &anns {
                body.extend(self.annotation(d, *with_values));
            }
            attrs.push(self.attribute("RuntimeVisibleAnnotations", &body));
        }
        if !self.type_parameter_annotations.is_empty() {
            let anns = std::mem::take(&mut self.type_parameter_annotations);
            let mut body = (anns.len() as u16).to_be_bytes().to_vec();
            for d in &anns {
                body.push(0x00);
                body.push(0);
                body.push(0);
                body.extend(self.annotation(d, false));
            }
            attrs.push(self.attribute("RuntimeInvisibleTypeAnnotations", &body));
        }
        let source = self.utf8("Fixture.java");
        attrs.push(self.attribute("SourceFile", &source.to_be_bytes()));

        let mut out = Vec::new();
        push_attributes(&mut out, attrs);
        out
    }
}

fn tagged(tag: u8, body: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend_from_slice(body);
    out
}

fn member_op(code: &mut Vec<u8>, opcode: u8, index: u16) {
    code.push(opcode);
    code.extend_from_slice(&index.to_be_bytes());
}

fn local_entry(code_len: u16, name: u16, descriptor: u16, slot: u16) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&code_len.to_be_bytes());
    out.extend_from_slice(&name.to_be_bytes());
    out.extend_from_slice(&descriptor.to_be_bytes());
    out.extend_from_slice(&slot.to_be_bytes());
    out
}

fn push_attributes(out: &mut Vec<u8>, attrs: Vec<Vec<u8>>) {
    out.extend_from_slice(&(attrs.len() as u16).to_be_bytes());
    for a in attrs {
        out.extend_from_slice(&a);
    }
}
