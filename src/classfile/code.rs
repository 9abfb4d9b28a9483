use crate::classfile::constant_pool::ConstantPool;
use crate::classfile::error::{Error, Result};
use crate::classfile::reader::Reader;
use crate::model::{FieldOp, Instruction, InvokeOp, TypeOp};

const GETSTATIC: u8 = 0xb2;
const PUTSTATIC: u8 = 0xb3;
const INVOKESPECIAL: u8 = 0xb7;
const INVOKESTATIC: u8 = 0xb8;
const NEW: u8 = 0xbb;
const ANEWARRAY: u8 = 0xbd;
const CHECKCAST: u8 = 0xc0;
const INSTANCEOF: u8 = 0xc1;
const MULTIANEWARRAY: u8 = 0xc5;

const TABLESWITCH: u8 = 0xaa;
const LOOKUPSWITCH: u8 = 0xab;
const WIDE: u8 = 0xc4;
const IINC: u8 = 0x84;

/// Walks a method's `code` array and decodes every instruction.
pub(crate) fn decode_instructions(code: &[u8], cp: &ConstantPool) -> Result<Vec<Instruction>> {
    let mut reader = Reader::new(code);
    let mut out = Vec::new();

    while reader.remaining() > 0 {
        let offset = reader.position();
        let opcode = reader.read_u1()?;

        let insn = match opcode {
            NEW | ANEWARRAY | CHECKCAST | INSTANCEOF => {
                let operand = cp.get_class_name(reader.read_u2()?)?.to_string();
                let op = match opcode {
                    NEW => TypeOp::New,
                    ANEWARRAY => TypeOp::ANewArray,
                    CHECKCAST => TypeOp::CheckCast,
                    _ => TypeOp::InstanceOf,
                };
                Instruction::Type { op, operand }
            }
            MULTIANEWARRAY => {
                let operand = cp.get_class_name(reader.read_u2()?)?.to_string();
                let _dimensions = reader.read_u1()?;
                Instruction::Type {
                    op: TypeOp::MultiANewArray,
                    operand,
                }
            }
            INVOKESPECIAL | INVOKESTATIC => {
                let owner = cp.get_member_owner(reader.read_u2()?)?.to_string();
                let op = if opcode == INVOKESTATIC {
                    InvokeOp::Static
                } else {
                    InvokeOp::Special
                };
                Instruction::MethodOwner { op, owner }
            }
            GETSTATIC | PUTSTATIC => {
                let owner = cp.get_member_owner(reader.read_u2()?)?.to_string();
                let op = if opcode == GETSTATIC {
                    FieldOp::GetStatic
                } else {
                    FieldOp::PutStatic
                };
                Instruction::FieldOwner { op, owner }
            }
            TABLESWITCH => {
                skip_padding(&mut reader, offset)?;
                let _default = reader.read_i4()?;
                let low = reader.read_i4()?;
                let high = reader.read_i4()?;
                if high < low {
                    return Err(Error::MalformedAttribute("Code"));
                }
                let entries = (high as i64 - low as i64 + 1) as usize;
                reader.skip(entries.checked_mul(4).ok_or(Error::UnexpectedEof)?)?;
                Instruction::Plain { opcode }
            }
            LOOKUPSWITCH => {
                skip_padding(&mut reader, offset)?;
                let _default = reader.read_i4()?;
                let pairs = reader.read_i4()?;
                if pairs < 0 {
                    return Err(Error::MalformedAttribute("Code"));
                }
                reader.skip((pairs as usize).checked_mul(8).ok_or(Error::UnexpectedEof)?)?;
                Instruction::Plain { opcode }
            }
            WIDE => {
                let widened = reader.read_u1()?;
                reader.skip(if widened == IINC { 4 } else { 2 })?;
                Instruction::Plain { opcode }
            }
            _ => {
                let operands = operand_len(opcode).ok_or(Error::InvalidOpcode { opcode, offset })?;
                reader.skip(operands)?;
                Instruction::Plain { opcode }
            }
        };
        out.push(insn);
    }

    Ok(out)
}

/// Switch operands start on the next 4-byte boundary relative to the code start.
fn skip_padding(reader: &mut Reader<'_>, opcode_offset: usize) -> Result<()> {
    let pad = (4 - (opcode_offset + 1) % 4) % 4;
    reader.skip(pad)
}

/// Operand byte count for fixed-length opcodes.
fn operand_len(opcode: u8) -> Option<usize> {
    let len = match opcode {
        0x00..=0x0f => 0,
        0x10 => 1,
        0x11 => 2,
        0x12 => 1,
        0x13 | 0x14 => 2,
        0x15..=0x19 => 1,
        0x1a..=0x35 => 0,
        0x36..=0x3a => 1,
        0x3b..=0x83 => 0,
        IINC => 2,
        0x85..=0x98 => 0,
        0x99..=0xa8 => 2,
        0xa9 => 1,
        0xac..=0xb1 => 0,
        0xb2..=0xb8 => 2,
        0xb9 | 0xba => 4,
        0xbb => 2,
        0xbc => 1,
        0xbd => 2,
        0xbe | 0xbf => 0,
        0xc0 | 0xc1 => 2,
        0xc2 | 0xc3 => 0,
        0xc5 => 3,
        0xc6 | 0xc7 => 2,
        0xc8 | 0xc9 => 4,
        0xca | 0xfe | 0xff => 0,
        _ => return None,
    };
    Some(len)
}
