use crate::classfile::constant_pool::ConstantPool;
use crate::classfile::error::{Error, Result};
use crate::classfile::reader::Reader;
use crate::model::AnnotationRef;

/// Reads one `annotation` structure, keeping only its type.
///
/// Element values are walked so the reader ends up past the annotation, but
/// nested annotation types and class literals inside them are not reported.
pub(crate) fn parse_annotation(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<AnnotationRef> {
    let type_index = reader.read_u2()?;
    let type_descriptor = cp.get_utf8(type_index)?.to_string();

    let pairs = reader.read_u2()? as usize;
    for _ in 0..pairs {
        let _element_name_index = reader.read_u2()?;
        skip_element_value(reader, cp)?;
    }

    Ok(AnnotationRef { type_descriptor })
}

fn skip_element_value(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<()> {
    let tag = reader.read_u1()? as char;
    match tag {
        'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' | 's' | 'c' => {
            reader.read_u2()?;
        }
        'e' => {
            reader.read_u2()?;
            reader.read_u2()?;
        }
        '@' => {
            parse_annotation(reader, cp)?;
        }
        '[' => {
            let values = reader.read_u2()? as usize;
            for _ in 0..values {
                skip_element_value(reader, cp)?;
            }
        }
        _ => return Err(Error::MalformedAttribute("annotation element_value")),
    }
    Ok(())
}

/// Body of `RuntimeVisibleAnnotations` / `RuntimeInvisibleAnnotations`.
pub(crate) fn parse_annotations(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Vec<AnnotationRef>> {
    let count = reader.read_u2()? as usize;
    let mut anns = Vec::with_capacity(count);
    for _ in 0..count {
        anns.push(parse_annotation(reader, cp)?);
    }
    Ok(anns)
}

/// Body of `RuntimeVisibleParameterAnnotations` / `RuntimeInvisibleParameterAnnotations`.
pub(crate) fn parse_parameter_annotations(
    reader: &mut Reader<'_>,
    cp: &ConstantPool,
) -> Result<Vec<Vec<AnnotationRef>>> {
    let params = reader.read_u1()? as usize;
    let mut out = Vec::with_capacity(params);
    for _ in 0..params {
        out.push(parse_annotations(reader, cp)?);
    }
    Ok(out)
}

pub(crate) const TARGET_LOCAL_VARIABLE: u8 = 0x40;
pub(crate) const TARGET_RESOURCE_VARIABLE: u8 = 0x41;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TypeAnnotation {
    pub(crate) target_type: u8,
    pub(crate) annotation: AnnotationRef,
}

impl TypeAnnotation {
    pub(crate) fn targets_local_variable(&self) -> bool {
        matches!(
            self.target_type,
            TARGET_LOCAL_VARIABLE | TARGET_RESOURCE_VARIABLE
        )
    }
}

/// Body of `RuntimeVisibleTypeAnnotations` / `RuntimeInvisibleTypeAnnotations`.
pub(crate) fn parse_type_annotations(
    reader: &mut Reader<'_>,
    cp: &ConstantPool,
) -> Result<Vec<TypeAnnotation>> {
    let count = reader.read_u2()? as usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let target_type = reader.read_u1()?;
        skip_target_info(reader, target_type)?;

        let path_length = reader.read_u1()? as usize;
        reader.skip(path_length * 2)?;

        let annotation = parse_annotation(reader, cp)?;
        out.push(TypeAnnotation {
            target_type,
            annotation,
        });
    }
    Ok(out)
}

fn skip_target_info(reader: &mut Reader<'_>, target_type: u8) -> Result<()> {
    match target_type {
        // type_parameter_target
        0x00 | 0x01 => reader.skip(1),
        // supertype_target
        0x10 => reader.skip(2),
        // type_parameter_bound_target
        0x11 | 0x12 => reader.skip(2),
        // empty_target
        0x13..=0x15 => Ok(()),
        // formal_parameter_target
        0x16 => reader.skip(1),
        // throws_target
        0x17 => reader.skip(2),
        // localvar_target
        TARGET_LOCAL_VARIABLE | TARGET_RESOURCE_VARIABLE => {
            let table_length = reader.read_u2()? as usize;
            reader.skip(table_length * 6)
        }
        // catch_target
        0x42 => reader.skip(2),
        // offset_target
        0x43..=0x46 => reader.skip(2),
        // type_argument_target
        0x47..=0x4B => reader.skip(3),
        _ => Err(Error::MalformedAttribute("type annotation target")),
    }
}
