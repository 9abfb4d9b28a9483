//! Best-effort class-name scanning over descriptors and generic signatures.
//!
//! Nothing here validates descriptor grammar. Input that does not look like
//! an object type simply yields no names.

use crate::name::ClassName;

const PRIMITIVE_CODES: [&str; 9] = ["V", "Z", "B", "C", "S", "I", "J", "F", "D"];

pub fn is_primitive(token: &str) -> bool {
    PRIMITIVE_CODES.contains(&token)
}

/// Strips `L` and `;` from an object-type descriptor, leaving other input as is.
pub fn unwrap_object_type(token: &str) -> &str {
    token
        .strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
        .unwrap_or(token)
}

/// Every class name textually embedded in a descriptor or generic signature.
///
/// Array markers and wildcard bounds are dropped, the remainder is split on
/// `;`, `<` and `>`, and only `L`-prefixed tokens are kept.
pub fn signature_class_names(signature: &str) -> Vec<ClassName> {
    let stripped = signature.replace('[', "");

    stripped
        .split([';', '<', '>'])
        // Wildcard bounds (`+Lpkg/Upper`) count too, unlike a strict
        // "token starts with L" split which would drop them.
        .map(|token| token.trim_start_matches(['+', '-']))
        .filter_map(|token| token.strip_prefix('L'))
        .filter(|name| !name.is_empty())
        .map(ClassName::from_internal)
        .collect()
}

/// The return-type segment of a method descriptor, i.e. everything after `)`.
pub fn return_type(method_descriptor: &str) -> Option<&str> {
    let (_, ret) = method_descriptor.rsplit_once(')')?;
    if ret.is_empty() { None } else { Some(ret) }
}

/// Normalizes the class operand of a type instruction.
///
/// Operands are either plain internal names (`a/b/C`) or array descriptors
/// (`[La/b/C;`, `[[I`). Primitive element types yield `None`.
pub fn type_operand_class(operand: &str) -> Option<ClassName> {
    let dotted = operand.replace('/', ".");
    let element = dotted.trim_start_matches('[');
    let element = unwrap_object_type(element);
    if element.is_empty() || is_primitive(element) {
        return None;
    }
    Some(ClassName::new(element))
}
