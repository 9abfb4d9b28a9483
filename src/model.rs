//! Structured, immutable view of one decoded class.
//!
//! Names and descriptors are kept exactly as the class file stores them
//! (slash-separated internal form). Conversion to [`ClassName`](crate::name::ClassName)
//! happens during reference extraction.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassModel {
    pub methods: Vec<Method>,
    pub fields: Vec<Field>,
    pub annotations: Vec<AnnotationRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub descriptor: String,
    pub instructions: Vec<Instruction>,
    pub local_variables: Vec<LocalVariable>,
    pub annotations: Vec<AnnotationRef>,
    /// One list per formal parameter that carries annotations.
    pub parameter_annotations: Vec<Vec<AnnotationRef>>,
    pub local_variable_annotations: Vec<AnnotationRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    pub descriptor: String,
    pub signature: Option<String>,
    pub annotations: Vec<AnnotationRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable {
    pub descriptor: String,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRef {
    pub type_descriptor: String,
}

impl AnnotationRef {
    pub fn new(type_descriptor: impl Into<String>) -> Self {
        Self {
            type_descriptor: type_descriptor.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOp {
    New,
    ANewArray,
    MultiANewArray,
    CheckCast,
    InstanceOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeOp {
    Static,
    Special,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    GetStatic,
    PutStatic,
}

/// A decoded bytecode instruction.
///
/// Only the operand kinds that can name a class dependency are modelled;
/// every other opcode collapses into [`Instruction::Plain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Type { op: TypeOp, operand: String },
    MethodOwner { op: InvokeOp, owner: String },
    FieldOwner { op: FieldOp, owner: String },
    Plain { opcode: u8 },
}

impl Instruction {
    pub fn opcode(&self) -> u8 {
        match self {
            Instruction::Type { op, .. } => match op {
                TypeOp::New => 0xbb,
                TypeOp::ANewArray => 0xbd,
                TypeOp::CheckCast => 0xc0,
                TypeOp::InstanceOf => 0xc1,
                TypeOp::MultiANewArray => 0xc5,
            },
            Instruction::MethodOwner { op, .. } => match op {
                InvokeOp::Special => 0xb7,
                InvokeOp::Static => 0xb8,
            },
            Instruction::FieldOwner { op, .. } => match op {
                FieldOp::GetStatic => 0xb2,
                FieldOp::PutStatic => 0xb3,
            },
            Instruction::Plain { opcode } => *opcode,
        }
    }
}
