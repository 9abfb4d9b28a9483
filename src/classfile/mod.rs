//! Decoder from raw class-file bytes to [`ClassModel`].
//!
//! Only the structures that reference extraction reads are materialized:
//! field and method descriptors, generic signatures, bytecode, local-variable
//! tables and annotations. Every other attribute is skipped.

mod annotation;
mod code;
mod constant_pool;
mod error;
#[cfg(test)]
pub(crate) mod fixture;
mod reader;

pub use crate::classfile::error::{Error, Result};

use crate::classfile::annotation::{
    parse_annotations, parse_parameter_annotations, parse_type_annotations, TypeAnnotation,
};
use crate::classfile::code::decode_instructions;
use crate::classfile::constant_pool::ConstantPool;
use crate::classfile::reader::Reader;
use crate::model::{AnnotationRef, ClassModel, Field, LocalVariable, Method};

const MAGIC: u32 = 0xCAFEBABE;

/// A decoded class together with the name it declares for itself.
#[derive(Debug, Clone)]
pub struct DecodedClass {
    /// Internal (slash-separated) name from `this_class`.
    pub this_class: String,
    pub major_version: u16,
    pub model: ClassModel,
}

pub fn parse_class(bytes: &[u8]) -> Result<DecodedClass> {
    let mut reader = Reader::new(bytes);
    let magic = reader.read_u4()?;
    if magic != MAGIC {
        return Err(Error::InvalidMagic(magic));
    }

    let _minor_version = reader.read_u2()?;
    let major_version = reader.read_u2()?;
    let cp = ConstantPool::parse(&mut reader)?;

    let _access_flags = reader.read_u2()?;
    let this_class = cp.get_class_name(reader.read_u2()?)?.to_string();
    let _super_class = reader.read_u2()?;
    let interfaces = reader.read_u2()? as usize;
    reader.skip(interfaces * 2)?;

    let fields_count = reader.read_u2()? as usize;
    let mut fields = Vec::with_capacity(fields_count);
    for _ in 0..fields_count {
        fields.push(parse_field(&mut reader, &cp)?);
    }

    let methods_count = reader.read_u2()? as usize;
    let mut methods = Vec::with_capacity(methods_count);
    for _ in 0..methods_count {
        methods.push(parse_method(&mut reader, &cp)?);
    }

    let class_attrs = parse_attributes(&mut reader, &cp)?;
    reader.ensure_empty()?;

    let mut annotations = class_attrs.annotations;
    annotations.extend(class_attrs.type_annotations.into_iter().map(|t| t.annotation));

    Ok(DecodedClass {
        this_class,
        major_version,
        model: ClassModel {
            methods,
            fields,
            annotations,
        },
    })
}

#[derive(Default)]
struct ParsedAttributes {
    signature: Option<String>,
    annotations: Vec<AnnotationRef>,
    parameter_annotations: Vec<Vec<AnnotationRef>>,
    type_annotations: Vec<TypeAnnotation>,
    code: Option<ParsedCode>,
}

#[derive(Default)]
struct ParsedCode {
    instructions: Vec<crate::model::Instruction>,
    local_variables: Vec<LocalVariable>,
    local_variable_annotations: Vec<AnnotationRef>,
}

fn parse_field(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Field> {
    let _access_flags = reader.read_u2()?;
    let _name = cp.get_utf8(reader.read_u2()?)?;
    let descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();
    let attrs = parse_attributes(reader, cp)?;

    let mut annotations = attrs.annotations;
    annotations.extend(attrs.type_annotations.into_iter().map(|t| t.annotation));

    Ok(Field {
        descriptor,
        signature: attrs.signature,
        annotations,
    })
}

fn parse_method(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Method> {
    let _access_flags = reader.read_u2()?;
    let name = cp.get_utf8(reader.read_u2()?)?.to_string();
    let descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();
    let attrs = parse_attributes(reader, cp)?;

    let mut annotations = attrs.annotations;
    annotations.extend(attrs.type_annotations.into_iter().map(|t| t.annotation));
    let code = attrs.code.unwrap_or_default();

    Ok(Method {
        name,
        descriptor,
        instructions: code.instructions,
        local_variables: code.local_variables,
        annotations,
        parameter_annotations: attrs.parameter_annotations,
        local_variable_annotations: code.local_variable_annotations,
    })
}

fn parse_attributes(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<ParsedAttributes> {
    let attributes_count = reader.read_u2()? as usize;
    let mut parsed = ParsedAttributes::default();
    for _ in 0..attributes_count {
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        let info = reader.read_bytes(length)?;
        let name = cp.get_utf8(name_index)?;

        let mut sub = Reader::new(info);
        match name {
            "Signature" => {
                parsed.signature = Some(cp.get_utf8(sub.read_u2()?)?.to_string());
            }
            "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
                parsed.annotations.extend(parse_annotations(&mut sub, cp)?);
            }
            "RuntimeVisibleParameterAnnotations" | "RuntimeInvisibleParameterAnnotations" => {
                let params = parse_parameter_annotations(&mut sub, cp)?;
                merge_parameter_annotations(&mut parsed.parameter_annotations, params);
            }
            "RuntimeVisibleTypeAnnotations" | "RuntimeInvisibleTypeAnnotations" => {
                parsed.type_annotations.extend(parse_type_annotations(&mut sub, cp)?);
            }
            "Code" => {
                parsed.code = Some(parse_code(&mut sub, cp)?);
            }
            _ => continue,
        }
        sub.ensure_empty()
            .map_err(|_| Error::MalformedAttribute(attribute_label(name)))?;
    }

    Ok(parsed)
}

fn merge_parameter_annotations(into: &mut Vec<Vec<AnnotationRef>>, from: Vec<Vec<AnnotationRef>>) {
    if into.len() < from.len() {
        into.resize(from.len(), Vec::new());
    }
    for (slot, anns) in into.iter_mut().zip(from) {
        slot.extend(anns);
    }
}

fn attribute_label(name: &str) -> &'static str {
    match name {
        "Signature" => "Signature",
        "Code" => "Code",
        "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => "annotations",
        "RuntimeVisibleParameterAnnotations" | "RuntimeInvisibleParameterAnnotations" => {
            "parameter annotations"
        }
        _ => "type annotations",
    }
}

fn parse_code(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<ParsedCode> {
    let _max_stack = reader.read_u2()?;
    let _max_locals = reader.read_u2()?;
    let code_length = reader.read_u4()? as usize;
    let code = reader.read_bytes(code_length)?;
    let instructions = decode_instructions(code, cp)?;

    let exception_table_length = reader.read_u2()? as usize;
    reader.skip(exception_table_length * 8)?;

    let mut locals: Vec<LocalEntry> = Vec::new();
    let mut typed: Vec<LocalEntry> = Vec::new();
    let mut local_variable_annotations = Vec::new();

    let attributes_count = reader.read_u2()? as usize;
    for _ in 0..attributes_count {
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        let info = reader.read_bytes(length)?;
        let name = cp.get_utf8(name_index)?;

        let mut sub = Reader::new(info);
        match name {
            "LocalVariableTable" => locals.extend(parse_local_table(&mut sub, cp)?),
            "LocalVariableTypeTable" => typed.extend(parse_local_table(&mut sub, cp)?),
            "RuntimeVisibleTypeAnnotations" | "RuntimeInvisibleTypeAnnotations" => {
                local_variable_annotations.extend(
                    parse_type_annotations(&mut sub, cp)?
                        .into_iter()
                        .filter(TypeAnnotation::targets_local_variable)
                        .map(|t| t.annotation),
                );
            }
            _ => continue,
        }
        sub.ensure_empty()
            .map_err(|_| Error::MalformedAttribute("Code"))?;
    }

    Ok(ParsedCode {
        instructions,
        local_variables: merge_local_tables(locals, typed),
        local_variable_annotations,
    })
}

struct LocalEntry {
    start_pc: u16,
    length: u16,
    index: u16,
    text: String,
}

fn parse_local_table(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Vec<LocalEntry>> {
    let count = reader.read_u2()? as usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let start_pc = reader.read_u2()?;
        let length = reader.read_u2()?;
        let _name = cp.get_utf8(reader.read_u2()?)?;
        let text = cp.get_utf8(reader.read_u2()?)?.to_string();
        let index = reader.read_u2()?;
        out.push(LocalEntry {
            start_pc,
            length,
            index,
            text,
        });
    }
    Ok(out)
}

/// Attaches `LocalVariableTypeTable` signatures to their `LocalVariableTable` entries.
///
/// Signatures without a matching descriptor entry still become locals so
/// that their type arguments are not lost.
fn merge_local_tables(locals: Vec<LocalEntry>, typed: Vec<LocalEntry>) -> Vec<LocalVariable> {
    let mut typed: Vec<Option<LocalEntry>> = typed.into_iter().map(Some).collect();
    let mut out = Vec::with_capacity(locals.len());

    for local in locals {
        let signature = typed
            .iter_mut()
            .find(|t| {
                t.as_ref().is_some_and(|t| {
                    t.index == local.index && t.start_pc == local.start_pc && t.length == local.length
                })
            })
            .and_then(Option::take)
            .map(|t| t.text);
        out.push(LocalVariable {
            descriptor: local.text,
            signature,
        });
    }

    for orphan in typed.into_iter().flatten() {
        out.push(LocalVariable {
            descriptor: String::new(),
            signature: Some(orphan.text),
        });
    }
    out
}
