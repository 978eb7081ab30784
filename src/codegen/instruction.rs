//! Instruction-level view of a method body
//!
//! Only what is needed to inspect generated code: splitting a `Code` array into
//! instructions and rendering them with their constant pool operands resolved.

use super::class::ClassFile;
use super::constpool::{Constant, ConstantPool};
use super::opcodes::*;
use super::reader::parse_code_attribute;
use crate::common::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub offset: usize,
    pub opcode: u8,
    pub operands: Vec<u8>,
}

impl Instruction {
    fn operand_u16(&self, at: usize) -> Option<u16> {
        Some(u16::from_be_bytes([*self.operands.get(at)?, *self.operands.get(at + 1)?]))
    }

    /// Constant pool operand of instructions that carry one
    pub fn pool_index(&self) -> Option<u16> {
        match self.opcode {
            LDC => self.operands.first().map(|index| *index as u16),
            LDC_W | LDC2_W | GETSTATIC..=INVOKEDYNAMIC | NEW | ANEWARRAY | CHECKCAST | INSTANCEOF | MULTIANEWARRAY => {
                self.operand_u16(0)
            }
            _ => None,
        }
    }

    /// Absolute target of a 16-bit branch
    pub fn branch_target(&self) -> Option<usize> {
        match self.opcode {
            IFEQ..=JSR | IFNULL | IFNONNULL => {
                let delta = self.operand_u16(0)? as i16;
                Some((self.offset as i64 + delta as i64) as usize)
            }
            _ => None,
        }
    }

    /// Render with resolved operands, e.g. `invokevirtual android/view/View.setOnClickListener(...)V`
    pub fn describe(&self, constant_pool: &ConstantPool) -> String {
        let mnemonic = mnemonic(self.opcode);
        if let Some(target) = self.branch_target() {
            return format!("{} @{}", mnemonic, target);
        }
        match self.opcode {
            BIPUSH => return format!("{} {}", mnemonic, self.operands[0] as i8),
            SIPUSH => return format!("{} {}", mnemonic, self.operand_u16(0).unwrap_or_default() as i16),
            ILOAD..=ALOAD | ISTORE..=ASTORE => return format!("{} {}", mnemonic, self.operands[0]),
            _ => {}
        }

        let Some(index) = self.pool_index() else {
            return mnemonic.to_string();
        };
        let operand = match self.opcode {
            GETSTATIC..=PUTFIELD => constant_pool
                .member_ref(index)
                .map(|(owner, name, descriptor)| format!("{}.{}:{}", owner, name, descriptor)),
            INVOKEVIRTUAL..=INVOKEINTERFACE => constant_pool
                .member_ref(index)
                .map(|(owner, name, descriptor)| format!("{}.{}{}", owner, name, descriptor)),
            LDC | LDC_W | LDC2_W => match constant_pool.get(index) {
                Ok(Constant::Integer(value)) => Ok(value.to_string()),
                Ok(Constant::Float(value)) => Ok(format!("{}f", value)),
                Ok(Constant::Long(value)) => Ok(format!("{}L", value)),
                Ok(Constant::Double(value)) => Ok(value.to_string()),
                Ok(Constant::String(utf8)) => constant_pool.utf8(*utf8).map(|value| format!("{:?}", value)),
                Ok(Constant::Class(_)) => constant_pool.class_name(index).map(|name| format!("class {}", name)),
                _ => Ok(format!("#{}", index)),
            },
            _ => constant_pool.class_name(index).map(str::to_string),
        };
        format!("{} {}", mnemonic, operand.unwrap_or_else(|_| format!("#{}", index)))
    }
}

/// Split a code array into instructions
pub fn decode(code: &[u8]) -> Result<Vec<Instruction>> {
    let mut instructions = Vec::new();
    let mut offset = 0;
    while offset < code.len() {
        let length = instruction_length(code, offset).ok_or_else(|| {
            Error::class_format_error(format!("invalid instruction 0x{:02x} at offset {}", code[offset], offset))
        })?;
        instructions.push(Instruction {
            offset,
            opcode: code[offset],
            operands: code[offset + 1..offset + length].to_vec(),
        });
        offset += length;
    }
    Ok(instructions)
}

/// Rendered instructions of one method, empty when the method has no body
pub fn disassemble(class_file: &ClassFile, name: &str, descriptor: &str) -> Result<Vec<String>> {
    let method = class_file
        .find_method(name, descriptor)
        .ok_or_else(|| Error::no_such_element(format!("method {}{}", name, descriptor)))?;
    let Some(info) = method.code(&class_file.constant_pool) else {
        return Ok(Vec::new());
    };
    let code = parse_code_attribute(info)?;
    Ok(decode(&code.code)?
        .iter()
        .map(|instruction| instruction.describe(&class_file.constant_pool))
        .collect())
}

pub fn mnemonic(opcode: u8) -> &'static str {
    const LOADS: [&str; 20] = [
        "iload_0", "iload_1", "iload_2", "iload_3", "lload_0", "lload_1", "lload_2", "lload_3", "fload_0",
        "fload_1", "fload_2", "fload_3", "dload_0", "dload_1", "dload_2", "dload_3", "aload_0", "aload_1",
        "aload_2", "aload_3",
    ];
    const STORES: [&str; 20] = [
        "istore_0", "istore_1", "istore_2", "istore_3", "lstore_0", "lstore_1", "lstore_2", "lstore_3",
        "fstore_0", "fstore_1", "fstore_2", "fstore_3", "dstore_0", "dstore_1", "dstore_2", "dstore_3",
        "astore_0", "astore_1", "astore_2", "astore_3",
    ];
    const CONSTS: [&str; 16] = [
        "nop", "aconst_null", "iconst_m1", "iconst_0", "iconst_1", "iconst_2", "iconst_3", "iconst_4",
        "iconst_5", "lconst_0", "lconst_1", "fconst_0", "fconst_1", "fconst_2", "dconst_0", "dconst_1",
    ];

    match opcode {
        NOP..=DCONST_1 => CONSTS[opcode as usize],
        BIPUSH => "bipush",
        SIPUSH => "sipush",
        LDC => "ldc",
        LDC_W => "ldc_w",
        LDC2_W => "ldc2_w",
        ILOAD => "iload",
        LLOAD => "lload",
        FLOAD => "fload",
        DLOAD => "dload",
        ALOAD => "aload",
        ILOAD_0..=0x2d => LOADS[(opcode - ILOAD_0) as usize],
        ISTORE => "istore",
        LSTORE => "lstore",
        FSTORE => "fstore",
        DSTORE => "dstore",
        ASTORE => "astore",
        ISTORE_0..=0x4e => STORES[(opcode - ISTORE_0) as usize],
        POP => "pop",
        POP2 => "pop2",
        DUP => "dup",
        IINC => "iinc",
        IFEQ => "ifeq",
        IFNE => "ifne",
        GOTO => "goto",
        IRETURN => "ireturn",
        LRETURN => "lreturn",
        FRETURN => "freturn",
        DRETURN => "dreturn",
        ARETURN => "areturn",
        RETURN => "return",
        GETSTATIC => "getstatic",
        PUTSTATIC => "putstatic",
        GETFIELD => "getfield",
        PUTFIELD => "putfield",
        INVOKEVIRTUAL => "invokevirtual",
        INVOKESPECIAL => "invokespecial",
        INVOKESTATIC => "invokestatic",
        INVOKEINTERFACE => "invokeinterface",
        INVOKEDYNAMIC => "invokedynamic",
        NEW => "new",
        NEWARRAY => "newarray",
        ANEWARRAY => "anewarray",
        ATHROW => "athrow",
        CHECKCAST => "checkcast",
        INSTANCEOF => "instanceof",
        IFNULL => "ifnull",
        IFNONNULL => "ifnonnull",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_and_describe() {
        let mut pool = ConstantPool::new();
        let field = pool.try_add_field_ref("com/example/Target", "title", "Landroid/widget/TextView;").unwrap();
        let class = pool.try_add_class("android/widget/TextView").unwrap();
        let [fh, fl] = field.to_be_bytes();
        let [ch, cl] = class.to_be_bytes();
        let code = vec![ALOAD_1, CHECKCAST, ch, cl, ALOAD_0, 0x5f, PUTFIELD, fh, fl, IFNULL, 0xff, 0xfd, RETURN];

        let instructions = decode(&code).unwrap();
        let rendered: Vec<String> = instructions.iter().map(|instruction| instruction.describe(&pool)).collect();
        assert_eq!(
            rendered,
            vec![
                "aload_1",
                "checkcast android/widget/TextView",
                "aload_0",
                "unknown",
                "putfield com/example/Target.title:Landroid/widget/TextView;",
                "ifnull @6",
                "return",
            ]
        );
    }

    #[test]
    fn test_truncated_code_is_rejected() {
        assert!(decode(&[INVOKEVIRTUAL, 0]).is_err());
    }
}
