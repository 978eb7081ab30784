//! Structured method body emission
//!
//! [`MethodBuilder`] tracks the operand stack and the local variable table as
//! verification types while instructions are appended. That gives `max_stack`,
//! `max_locals` and the `StackMapTable` for free when the method is finished:
//! a label remembers the state at the first branch that targets it, and every
//! targeted label becomes one frame.

use super::attribute::CodeAttribute;
use super::class_writer::ClassBuilder;
use super::constpool::ConstantPool;
use super::defs::CONSTRUCTOR_METHOD_NAME;
use super::descriptor::{MethodType, Type};
use super::error::BytecodeError;
use super::flag::Access;
use super::frame::{make_stack_map_attribute, FrameState, StackMapTable, VerificationType};
use super::method::MethodInfo;
use super::opcodes::*;
use crate::common::error::Result;

/// A branch target inside one method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(usize);

impl Label {
    pub fn id(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    locals: Vec<VerificationType>,
    stack: Vec<VerificationType>,
}

#[derive(Debug, Default)]
struct LabelState {
    offset: Option<u16>,
    frame: Option<Snapshot>,
    targeted: bool,
}

#[derive(Debug)]
struct Fixup {
    instruction: usize,
    label: Label,
}

pub struct MethodBuilder<'a> {
    class: &'a mut ClassBuilder,
    access: u16,
    name: String,
    method_type: MethodType,
    code: Vec<u8>,
    /// One entry per slot; the upper half of a long/double is `Top`
    locals: Vec<VerificationType>,
    initial_locals: Vec<VerificationType>,
    stack: Vec<VerificationType>,
    stack_size: u16,
    max_stack: u16,
    next_local: u16,
    max_locals: u16,
    labels: Vec<LabelState>,
    fixups: Vec<Fixup>,
    reachable: bool,
}

fn is_wide(value: &VerificationType) -> bool {
    matches!(value, VerificationType::Long | VerificationType::Double)
}

fn slot_width(value: &VerificationType) -> u16 {
    if is_wide(value) { 2 } else { 1 }
}

fn verification_type(constant_pool: &mut ConstantPool, ty: &Type) -> Result<VerificationType> {
    Ok(match ty {
        Type::Boolean | Type::Byte | Type::Char | Type::Short | Type::Int => VerificationType::Integer,
        Type::Float => VerificationType::Float,
        Type::Long => VerificationType::Long,
        Type::Double => VerificationType::Double,
        Type::Object(_) | Type::Array(_) => VerificationType::Object(constant_pool.try_add_class(&ty.internal_name())?),
        Type::Void => VerificationType::Top,
    })
}

/// Collapse per-slot locals into frame form and drop trailing `Top`s
fn frame_locals(locals: &[VerificationType]) -> Vec<VerificationType> {
    let mut result = Vec::with_capacity(locals.len());
    let mut slot = 0;
    while slot < locals.len() {
        let value = locals[slot].clone();
        slot += slot_width(&value) as usize;
        result.push(value);
    }
    while result.last() == Some(&VerificationType::Top) {
        result.pop();
    }
    result
}

impl<'a> MethodBuilder<'a> {
    pub(crate) fn new(class: &'a mut ClassBuilder, access: u16, name: &str, descriptor: &str) -> Result<Self> {
        let method_type = MethodType::parse(descriptor)?;
        let mut locals = Vec::new();

        if !access.is_static() {
            let this = if name == CONSTRUCTOR_METHOD_NAME {
                VerificationType::UninitializedThis
            } else {
                let this_name = class.name().to_string();
                VerificationType::Object(class.constant_pool_mut().try_add_class(&this_name)?)
            };
            locals.push(this);
        }

        for argument in &method_type.arguments {
            let value = verification_type(class.constant_pool_mut(), argument)?;
            let wide = is_wide(&value);
            locals.push(value);
            if wide {
                locals.push(VerificationType::Top);
            }
        }

        let next_local = locals.len() as u16;
        Ok(Self {
            class,
            access,
            name: name.to_string(),
            method_type,
            code: Vec::new(),
            initial_locals: locals.clone(),
            locals,
            stack: Vec::new(),
            stack_size: 0,
            max_stack: 0,
            next_local,
            max_locals: next_local,
            labels: Vec::new(),
            fixups: Vec::new(),
            reachable: true,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method_type(&self) -> &MethodType {
        &self.method_type
    }

    /// Current bytecode offset
    pub fn offset(&self) -> usize {
        self.code.len()
    }

    /// Internal name of the class being built
    pub fn owner(&self) -> &str {
        self.class.name()
    }

    fn pool(&mut self) -> &mut ConstantPool {
        self.class.constant_pool_mut()
    }

    fn emit(&mut self, bytes: &[u8]) {
        self.code.extend_from_slice(bytes);
    }

    fn emit_u16(&mut self, opcode: u8, operand: u16) {
        let [high, low] = operand.to_be_bytes();
        self.emit(&[opcode, high, low]);
    }

    fn push(&mut self, value: VerificationType) {
        self.stack_size += slot_width(&value);
        self.max_stack = self.max_stack.max(self.stack_size);
        self.stack.push(value);
    }

    fn pop_value(&mut self) -> Result<VerificationType> {
        let value = self
            .stack
            .pop()
            .ok_or(BytecodeError::StackUnderflow { offset: self.code.len() })?;
        self.stack_size -= slot_width(&value);
        Ok(value)
    }

    fn pop_values(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            self.pop_value()?;
        }
        Ok(())
    }

    fn set_local(&mut self, slot: u16, value: VerificationType) {
        let width = slot_width(&value);
        let end = (slot + width) as usize;
        if self.locals.len() < end {
            self.locals.resize(end, VerificationType::Top);
        }
        self.locals[slot as usize] = value;
        if width == 2 {
            self.locals[slot as usize + 1] = VerificationType::Top;
        }
        self.max_locals = self.max_locals.max(slot + width);
        self.next_local = self.next_local.max(slot + width);
    }

    fn emit_local(&mut self, opcode: u8, short_base: u8, slot: u16) {
        if slot <= 3 {
            self.emit(&[short_base + slot as u8]);
        } else if slot <= u8::MAX as u16 {
            self.emit(&[opcode, slot as u8]);
        } else {
            let [high, low] = slot.to_be_bytes();
            self.emit(&[WIDE, opcode, high, low]);
        }
    }

    fn emit_ldc(&mut self, index: u16) {
        if index <= u8::MAX as u16 {
            self.emit(&[LDC, index as u8]);
        } else {
            self.emit_u16(LDC_W, index);
        }
    }

    // --- locals -------------------------------------------------------------

    pub fn load_this(&mut self) -> Result<()> {
        if self.access.is_static() {
            return Err(BytecodeError::LocalIndexOutOfBounds { index: 0 }.into());
        }
        self.emit(&[ALOAD_0]);
        let this = self.locals[0].clone();
        self.push(this);
        Ok(())
    }

    /// Slot holding argument `index` (0-based, not counting `this`)
    pub fn arg_slot(&self, index: usize) -> Result<u16> {
        if index >= self.method_type.arguments.len() {
            return Err(BytecodeError::LocalIndexOutOfBounds { index: index as u32 }.into());
        }
        let base = if self.access.is_static() { 0 } else { 1 };
        Ok(base + self.method_type.arguments[..index].iter().map(Type::size).sum::<u16>())
    }

    pub fn load_arg(&mut self, index: usize) -> Result<()> {
        let slot = self.arg_slot(index)?;
        let ty = self.method_type.arguments[index].clone();
        self.load_local(slot, &ty)
    }

    pub fn load_local(&mut self, slot: u16, ty: &Type) -> Result<()> {
        let (opcode, short_base) = match ty {
            Type::Boolean | Type::Byte | Type::Char | Type::Short | Type::Int => (ILOAD, ILOAD_0),
            Type::Long => (LLOAD, LLOAD_0),
            Type::Float => (FLOAD, FLOAD_0),
            Type::Double => (DLOAD, DLOAD_0),
            Type::Object(_) | Type::Array(_) => (ALOAD, ALOAD_0),
            Type::Void => return Err(BytecodeError::LocalIndexOutOfBounds { index: slot as u32 }.into()),
        };
        if slot + ty.size() > self.next_local {
            return Err(BytecodeError::LocalIndexOutOfBounds { index: slot as u32 }.into());
        }

        self.emit_local(opcode, short_base, slot);
        let tracked = self
            .locals
            .get(slot as usize)
            .filter(|value| {
                matches!(value, VerificationType::Object(_) | VerificationType::UninitializedThis | VerificationType::Null)
            })
            .cloned();
        let value = match tracked {
            Some(value) if ty.is_reference() => value,
            _ => verification_type(self.pool(), ty)?,
        };
        self.push(value);
        Ok(())
    }

    pub fn store_local(&mut self, slot: u16, ty: &Type) -> Result<()> {
        let (opcode, short_base) = match ty {
            Type::Boolean | Type::Byte | Type::Char | Type::Short | Type::Int => (ISTORE, ISTORE_0),
            Type::Long => (LSTORE, LSTORE_0),
            Type::Float => (FSTORE, FSTORE_0),
            Type::Double => (DSTORE, DSTORE_0),
            Type::Object(_) | Type::Array(_) => (ASTORE, ASTORE_0),
            Type::Void => return Err(BytecodeError::LocalIndexOutOfBounds { index: slot as u32 }.into()),
        };
        let value = self.pop_value()?;
        self.emit_local(opcode, short_base, slot);
        let value = if ty.is_reference() { value } else { verification_type(self.pool(), ty)? };
        self.set_local(slot, value);
        Ok(())
    }

    /// Reserve a fresh local slot (two for long/double)
    pub fn new_local(&mut self, ty: &Type) -> u16 {
        let slot = self.next_local;
        self.next_local += ty.size().max(1);
        self.max_locals = self.max_locals.max(self.next_local);
        slot
    }

    // --- constants ----------------------------------------------------------

    pub fn push_int(&mut self, value: i32) -> Result<()> {
        match value {
            -1..=5 => self.emit(&[(ICONST_0 as i32 + value) as u8]),
            -128..=127 => self.emit(&[BIPUSH, value as i8 as u8]),
            -32768..=32767 => {
                let [high, low] = (value as i16).to_be_bytes();
                self.emit(&[SIPUSH, high, low]);
            }
            _ => {
                let index = self.pool().try_add_integer(value)?;
                self.emit_ldc(index);
            }
        }
        self.push(VerificationType::Integer);
        Ok(())
    }

    pub fn push_bool(&mut self, value: bool) -> Result<()> {
        self.push_int(value as i32)
    }

    pub fn push_null(&mut self) {
        self.emit(&[ACONST_NULL]);
        self.push(VerificationType::Null);
    }

    /// Zero, false or null, whichever `ty` defaults to. Void pushes nothing.
    pub fn push_default(&mut self, ty: &Type) -> Result<()> {
        match ty {
            Type::Void => {}
            Type::Boolean | Type::Byte | Type::Char | Type::Short | Type::Int => self.push_int(0)?,
            Type::Long => {
                self.emit(&[LCONST_0]);
                self.push(VerificationType::Long);
            }
            Type::Float => {
                self.emit(&[FCONST_0]);
                self.push(VerificationType::Float);
            }
            Type::Double => {
                self.emit(&[DCONST_0]);
                self.push(VerificationType::Double);
            }
            Type::Object(_) | Type::Array(_) => self.push_null(),
        }
        Ok(())
    }

    pub fn push_string(&mut self, value: &str) -> Result<()> {
        let index = self.pool().try_add_string(value)?;
        self.emit_ldc(index);
        let string = verification_type(self.pool(), &crate::consts::STRING)?;
        self.push(string);
        Ok(())
    }

    /// Class literal of a reference type
    pub fn push_type(&mut self, ty: &Type) -> Result<()> {
        if !ty.is_reference() {
            return Err(crate::codegen::error::DescriptorError::InvalidTypeDescriptor { descriptor: ty.descriptor() }.into());
        }
        let index = self.pool().try_add_class(&ty.internal_name())?;
        self.emit_ldc(index);
        let class = verification_type(self.pool(), &crate::consts::CLASS)?;
        self.push(class);
        Ok(())
    }

    // --- fields -------------------------------------------------------------

    pub fn get_field(&mut self, owner: &str, name: &str, ty: &Type) -> Result<()> {
        let index = self.pool().try_add_field_ref(owner, name, &ty.descriptor())?;
        self.pop_value()?;
        self.emit_u16(GETFIELD, index);
        let value = verification_type(self.pool(), ty)?;
        self.push(value);
        Ok(())
    }

    pub fn put_field(&mut self, owner: &str, name: &str, ty: &Type) -> Result<()> {
        let index = self.pool().try_add_field_ref(owner, name, &ty.descriptor())?;
        self.pop_values(2)?;
        self.emit_u16(PUTFIELD, index);
        Ok(())
    }

    pub fn get_static(&mut self, owner: &str, name: &str, ty: &Type) -> Result<()> {
        let index = self.pool().try_add_field_ref(owner, name, &ty.descriptor())?;
        self.emit_u16(GETSTATIC, index);
        let value = verification_type(self.pool(), ty)?;
        self.push(value);
        Ok(())
    }

    pub fn put_static(&mut self, owner: &str, name: &str, ty: &Type) -> Result<()> {
        let index = self.pool().try_add_field_ref(owner, name, &ty.descriptor())?;
        self.pop_value()?;
        self.emit_u16(PUTSTATIC, index);
        Ok(())
    }

    // --- invocation ---------------------------------------------------------

    pub fn invoke_virtual(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<()> {
        self.invoke(INVOKEVIRTUAL, owner, name, descriptor)
    }

    pub fn invoke_static(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<()> {
        self.invoke(INVOKESTATIC, owner, name, descriptor)
    }

    pub fn invoke_interface(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<()> {
        self.invoke(INVOKEINTERFACE, owner, name, descriptor)
    }

    pub fn invoke_special(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<()> {
        self.invoke(INVOKESPECIAL, owner, name, descriptor)
    }

    pub fn invoke_constructor(&mut self, owner: &str, descriptor: &str) -> Result<()> {
        self.invoke(INVOKESPECIAL, owner, CONSTRUCTOR_METHOD_NAME, descriptor)
    }

    fn invoke(&mut self, opcode: u8, owner: &str, name: &str, descriptor: &str) -> Result<()> {
        let method_type = MethodType::parse(descriptor)?;
        let index = if opcode == INVOKEINTERFACE {
            self.pool().try_add_interface_method_ref(owner, name, descriptor)?
        } else {
            self.pool().try_add_method_ref(owner, name, descriptor)?
        };

        self.pop_values(method_type.arguments.len())?;
        if opcode != INVOKESTATIC {
            let receiver = self.pop_value()?;
            if name == CONSTRUCTOR_METHOD_NAME {
                self.initialize(receiver, owner)?;
            }
        }

        if opcode == INVOKEINTERFACE {
            let [high, low] = index.to_be_bytes();
            self.emit(&[opcode, high, low, (method_type.argument_slots() + 1) as u8, 0]);
        } else {
            self.emit_u16(opcode, index);
        }

        if method_type.returns != Type::Void {
            let value = verification_type(self.pool(), &method_type.returns)?;
            self.push(value);
        }
        Ok(())
    }

    /// Replace every copy of an uninitialized reference once its constructor ran
    fn initialize(&mut self, receiver: VerificationType, owner: &str) -> Result<()> {
        let initialized = match receiver {
            VerificationType::UninitializedThis => {
                let this_name = self.class.name().to_string();
                VerificationType::Object(self.pool().try_add_class(&this_name)?)
            }
            VerificationType::Uninitialized(_) => VerificationType::Object(self.pool().try_add_class(owner)?),
            _ => return Ok(()),
        };
        for value in self.stack.iter_mut().chain(self.locals.iter_mut()) {
            if *value == receiver {
                *value = initialized.clone();
            }
        }
        Ok(())
    }

    // --- objects ------------------------------------------------------------

    pub fn new_instance(&mut self, class: &str) -> Result<()> {
        let index = self.pool().try_add_class(class)?;
        let offset = self.code.len() as u16;
        self.emit_u16(NEW, index);
        self.push(VerificationType::Uninitialized(offset));
        Ok(())
    }

    pub fn dup(&mut self) -> Result<()> {
        let top = self
            .stack
            .last()
            .cloned()
            .ok_or(BytecodeError::StackUnderflow { offset: self.code.len() })?;
        self.emit(&[DUP]);
        self.push(top);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<()> {
        let value = self.pop_value()?;
        self.emit(&[if is_wide(&value) { POP2 } else { POP }]);
        Ok(())
    }

    pub fn check_cast(&mut self, ty: &Type) -> Result<()> {
        let index = self.pool().try_add_class(&ty.internal_name())?;
        self.pop_value()?;
        self.emit_u16(CHECKCAST, index);
        let value = verification_type(self.pool(), ty)?;
        self.push(value);
        Ok(())
    }

    // --- control flow -------------------------------------------------------

    pub fn new_label(&mut self) -> Label {
        self.labels.push(LabelState::default());
        Label(self.labels.len() - 1)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot { locals: self.locals.clone(), stack: self.stack.clone() }
    }

    /// Merge the current state into the state recorded for a label
    fn merge_into(&mut self, label: Label) -> Result<()> {
        let current = self.snapshot();
        let offset = self.code.len();
        let state = &mut self.labels[label.0];
        match &mut state.frame {
            None => state.frame = Some(current),
            Some(recorded) => {
                if recorded.stack.len() != current.stack.len() {
                    return Err(BytecodeError::InconsistentStack {
                        offset,
                        expected: recorded.stack.len(),
                        found: current.stack.len(),
                    }
                    .into());
                }
                let common = recorded.locals.len().min(current.locals.len());
                recorded.locals.truncate(common);
                for (slot, value) in recorded.locals.iter_mut().enumerate() {
                    if *value != current.locals[slot] {
                        *value = VerificationType::Top;
                    }
                }
            }
        }
        Ok(())
    }

    pub fn mark(&mut self, label: Label) -> Result<()> {
        if self.labels[label.0].offset.is_some() {
            return Err(BytecodeError::LabelAlreadyMarked { label: label.0 }.into());
        }
        if self.reachable {
            self.merge_into(label)?;
        }

        let state = &mut self.labels[label.0];
        state.offset = Some(self.code.len() as u16);
        if let Some(frame) = &state.frame {
            self.locals = frame.locals.clone();
            self.stack = frame.stack.clone();
            self.stack_size = self.stack.iter().map(slot_width).sum();
        }
        self.reachable = true;
        Ok(())
    }

    fn branch(&mut self, opcode: u8, label: Label) -> Result<()> {
        let instruction = self.code.len();
        self.emit(&[opcode, 0, 0]);
        self.fixups.push(Fixup { instruction, label });

        let marked = self.labels[label.0].offset.is_some();
        if !marked {
            self.merge_into(label)?;
        }
        self.labels[label.0].targeted = true;
        Ok(())
    }

    pub fn if_null(&mut self, label: Label) -> Result<()> {
        self.pop_value()?;
        self.branch(IFNULL, label)
    }

    pub fn if_non_null(&mut self, label: Label) -> Result<()> {
        self.pop_value()?;
        self.branch(IFNONNULL, label)
    }

    pub fn goto(&mut self, label: Label) -> Result<()> {
        self.branch(GOTO, label)?;
        self.reachable = false;
        Ok(())
    }

    /// Return whatever the descriptor says the method returns
    pub fn return_value(&mut self) -> Result<()> {
        let opcode = match &self.method_type.returns {
            Type::Void => RETURN,
            Type::Boolean | Type::Byte | Type::Char | Type::Short | Type::Int => IRETURN,
            Type::Long => LRETURN,
            Type::Float => FRETURN,
            Type::Double => DRETURN,
            Type::Object(_) | Type::Array(_) => ARETURN,
        };
        if opcode != RETURN {
            self.pop_value()?;
        }
        self.emit(&[opcode]);
        self.reachable = false;
        Ok(())
    }

    /// Patch branches, compute sizes and frames, and append the method to its class.
    /// Returns the index of the new method.
    pub fn end_method(mut self) -> Result<usize> {
        for fixup in &self.fixups {
            let target = self.labels[fixup.label.0]
                .offset
                .ok_or(BytecodeError::UnmarkedLabel { label: fixup.label.0 })?;
            let delta = target as i32 - fixup.instruction as i32;
            let delta = i16::try_from(delta).map_err(|_| BytecodeError::BranchTooFar { offset: delta })?;
            let [high, low] = delta.to_be_bytes();
            self.code[fixup.instruction + 1] = high;
            self.code[fixup.instruction + 2] = low;
        }

        if self.code.len() > u16::MAX as usize {
            return Err(BytecodeError::CodeTooLarge { size: self.code.len() }.into());
        }

        let mut states: Vec<FrameState> = self
            .labels
            .iter()
            .filter(|state| state.targeted)
            .filter_map(|state| {
                let offset = state.offset?;
                let frame = state.frame.as_ref()?;
                Some(FrameState { offset, locals: frame_locals(&frame.locals), stack: frame.stack.clone() })
            })
            .collect();
        states.sort_by_key(|state| state.offset);
        states.dedup_by_key(|state| state.offset);

        let mut code = CodeAttribute::new(self.max_stack, self.max_locals, std::mem::take(&mut self.code));
        if self.class.emits_frames() && !states.is_empty() {
            let table = StackMapTable::compress(&frame_locals(&self.initial_locals), &states);
            code.attributes.push(make_stack_map_attribute(self.pool(), &table)?);
        }

        let descriptor = self.method_type.descriptor();
        let method_name = self.name.clone();
        let name_index = self.pool().try_add_utf8(&method_name)?;
        let descriptor_index = self.pool().try_add_utf8(&descriptor)?;
        let code_attribute = code.into_attribute(self.pool())?;

        let mut method = MethodInfo::new(self.access, name_index, descriptor_index);
        method.attributes.push(code_attribute);
        log::debug!("emitted {}.{}{}", self.class.name(), self.name, descriptor);
        Ok(self.class.push_method(method))
    }
}
