//! StackMapTable frames and their compact encoding

use super::attribute::AttributeInfo;
use super::constpool::ConstantPool;
use super::defs::attribute_names;
use super::error::ConstPoolResult;

/// VerificationTypeInfo as defined in JVMS 4.7.4
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationType {
    Top,
    Integer,
    Float,
    Double,
    Long,
    Null,
    UninitializedThis,
    Object(u16),        // cpool index to CONSTANT_Class
    Uninitialized(u16), // offset
}

impl VerificationType {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        match self {
            VerificationType::Top => bytes.push(0),
            VerificationType::Integer => bytes.push(1),
            VerificationType::Float => bytes.push(2),
            VerificationType::Double => bytes.push(3),
            VerificationType::Long => bytes.push(4),
            VerificationType::Null => bytes.push(5),
            VerificationType::UninitializedThis => bytes.push(6),
            VerificationType::Object(cp_index) => {
                bytes.push(7);
                bytes.extend_from_slice(&cp_index.to_be_bytes());
            }
            VerificationType::Uninitialized(offset) => {
                bytes.push(8);
                bytes.extend_from_slice(&offset.to_be_bytes());
            }
        }
        bytes
    }
}

/// StackMapFrame variants as defined in JVMS 4.7.4
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackMapFrame {
    Same { offset_delta: u16 },
    SameLocals1StackItem { offset_delta: u16, stack: VerificationType },
    Chop { k: u8, offset_delta: u16 },          // k in {1,2,3}
    Append { offset_delta: u16, locals: Vec<VerificationType> }, // 1..=3 locals
    Full { offset_delta: u16, locals: Vec<VerificationType>, stack: Vec<VerificationType> },
}

impl StackMapFrame {
    pub fn offset_delta(&self) -> u16 {
        match self {
            StackMapFrame::Same { offset_delta }
            | StackMapFrame::SameLocals1StackItem { offset_delta, .. }
            | StackMapFrame::Chop { offset_delta, .. }
            | StackMapFrame::Append { offset_delta, .. }
            | StackMapFrame::Full { offset_delta, .. } => *offset_delta,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        match self {
            StackMapFrame::Same { offset_delta } => {
                if *offset_delta <= 63 {
                    bytes.push(*offset_delta as u8);
                } else {
                    bytes.push(251); // same_frame_extended
                    bytes.extend_from_slice(&offset_delta.to_be_bytes());
                }
            }
            StackMapFrame::SameLocals1StackItem { offset_delta, stack } => {
                if *offset_delta <= 63 {
                    bytes.push(64 + *offset_delta as u8);
                } else {
                    bytes.push(247); // same_locals_1_stack_item_frame_extended
                    bytes.extend_from_slice(&offset_delta.to_be_bytes());
                }
                bytes.extend_from_slice(&stack.to_bytes());
            }
            StackMapFrame::Chop { k, offset_delta } => {
                bytes.push(251 - *k);
                bytes.extend_from_slice(&offset_delta.to_be_bytes());
            }
            StackMapFrame::Append { offset_delta, locals } => {
                bytes.push(251 + locals.len() as u8);
                bytes.extend_from_slice(&offset_delta.to_be_bytes());
                for l in locals {
                    bytes.extend_from_slice(&l.to_bytes());
                }
            }
            StackMapFrame::Full { offset_delta, locals, stack } => {
                bytes.push(255);
                bytes.extend_from_slice(&offset_delta.to_be_bytes());
                bytes.extend_from_slice(&(locals.len() as u16).to_be_bytes());
                for l in locals {
                    bytes.extend_from_slice(&l.to_bytes());
                }
                bytes.extend_from_slice(&(stack.len() as u16).to_be_bytes());
                for s in stack {
                    bytes.extend_from_slice(&s.to_bytes());
                }
            }
        }
        bytes
    }
}

/// Locals and stack at one branch target; `Long`/`Double` are single entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameState {
    pub offset: u16,
    pub locals: Vec<VerificationType>,
    pub stack: Vec<VerificationType>,
}

#[derive(Debug, Default, Clone)]
pub struct StackMapTable {
    pub frames: Vec<StackMapFrame>,
}

impl StackMapTable {
    pub fn new() -> Self { Self { frames: Vec::new() } }

    /// Encode frame states (sorted by offset) relative to the method's initial locals
    pub fn compress(initial_locals: &[VerificationType], states: &[FrameState]) -> Self {
        let mut frames = Vec::with_capacity(states.len());
        let mut previous_locals = initial_locals.to_vec();
        let mut previous_offset: Option<u16> = None;

        for state in states {
            let offset_delta = match previous_offset {
                None => state.offset,
                Some(previous) => state.offset - previous - 1,
            };
            frames.push(compress_frame(offset_delta, &previous_locals, state));
            previous_locals = state.locals.clone();
            previous_offset = Some(state.offset);
        }

        Self { frames }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(self.frames.len() as u16).to_be_bytes());
        for f in &self.frames {
            bytes.extend_from_slice(&f.to_bytes());
        }
        bytes
    }
}

fn compress_frame(offset_delta: u16, previous: &[VerificationType], state: &FrameState) -> StackMapFrame {
    let locals = &state.locals;
    let stack = &state.stack;

    if locals.as_slice() == previous {
        match stack.len() {
            0 => return StackMapFrame::Same { offset_delta },
            1 => return StackMapFrame::SameLocals1StackItem { offset_delta, stack: stack[0].clone() },
            _ => {}
        }
    }

    if stack.is_empty() {
        if locals.len() > previous.len() && locals.len() - previous.len() <= 3 && locals.starts_with(previous) {
            return StackMapFrame::Append {
                offset_delta,
                locals: locals[previous.len()..].to_vec(),
            };
        }
        if previous.len() > locals.len() && previous.len() - locals.len() <= 3 && previous.starts_with(locals) {
            return StackMapFrame::Chop {
                k: (previous.len() - locals.len()) as u8,
                offset_delta,
            };
        }
    }

    StackMapFrame::Full { offset_delta, locals: locals.clone(), stack: stack.clone() }
}

/// Produce human-readable descriptions of frames with absolute bytecode offsets
pub fn describe_stack_map_frames(table: &StackMapTable) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut pc: Option<u32> = None;
    for frame in &table.frames {
        let delta = frame.offset_delta() as u32;
        let current = match pc {
            None => delta,
            Some(previous) => previous + delta + 1,
        };
        pc = Some(current);
        let line = match frame {
            StackMapFrame::Same { .. } => format!("@{:>4} SAME", current),
            StackMapFrame::SameLocals1StackItem { stack, .. } => format!("@{:>4} SAME_LOCALS_1 (stack={:?})", current, stack),
            StackMapFrame::Chop { k, .. } => format!("@{:>4} CHOP{}", current, k),
            StackMapFrame::Append { locals, .. } => format!("@{:>4} APPEND{} (locals={:?})", current, locals.len(), locals),
            StackMapFrame::Full { locals, stack, .. } => format!("@{:>4} FULL (locals={:?}, stack={:?})", current, locals, stack),
        };
        lines.push(line);
    }
    lines
}

/// Helper to build an AttributeInfo for StackMapTable
pub fn make_stack_map_attribute(constant_pool: &mut ConstantPool, table: &StackMapTable) -> ConstPoolResult<AttributeInfo> {
    AttributeInfo::named(constant_pool, attribute_names::STACK_MAP_TABLE, table.to_bytes())
}
