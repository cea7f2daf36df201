use sloader::class_file::MethodInfo;
use sloader::constants::ConstantPool;

use crate::data_types::{ClassRef, Value};
use crate::errors::{RuntimeError, RuntimeErrorKind};

/// Activation record for one method invocation.
///
/// The frame holds handles into the loaded class (never borrows), its local
/// variable vector, its operand stack, and the program counter to restore in
/// the caller once this invocation returns.
#[derive(Debug)]
pub struct Frame {
    pub class: ClassRef,
    pub method_index: usize,
    pub locals: Vec<Value>,
    pub operands: Vec<Value>,
    pub return_pc: usize,
}

impl Frame {
    pub fn method(&self) -> &MethodInfo {
        &self.class.methods[self.method_index]
    }
}

/// The per-thread stack of activation frames.
#[derive(Debug, Default)]
pub struct FrameStack {
    frames: Vec<Frame>,
}

impl FrameStack {
    pub fn new() -> FrameStack {
        FrameStack::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn push_frame(
        &mut self,
        class: ClassRef,
        method_index: usize,
        locals: Vec<Value>,
        return_pc: usize,
        max_stack: usize,
    ) {
        self.frames.push(Frame {
            class,
            method_index,
            locals,
            operands: Vec::with_capacity(max_stack),
            return_pc,
        });
    }

    pub fn pop_frame(&mut self) -> Result<Frame, RuntimeError> {
        self.frames
            .pop()
            .ok_or_else(|| RuntimeError::new(RuntimeErrorKind::StackUnderflow))
    }

    fn active(&self) -> Result<&Frame, RuntimeError> {
        self.frames
            .last()
            .ok_or_else(|| RuntimeError::new(RuntimeErrorKind::StackUnderflow))
    }

    fn active_mut(&mut self) -> Result<&mut Frame, RuntimeError> {
        self.frames
            .last_mut()
            .ok_or_else(|| RuntimeError::new(RuntimeErrorKind::StackUnderflow))
    }

    pub fn push_operand(&mut self, operand: Value) -> Result<(), RuntimeError> {
        self.active_mut()?.operands.push(operand);
        Ok(())
    }

    /// Pops `count` operands off the active frame.
    ///
    /// The returned list is ordered oldest-first: the bottom of the popped
    /// region is index 0, so index 0 lines up with `this` or the first
    /// parameter of an invocation.
    pub fn pop_operands(&mut self, count: usize) -> Result<Vec<Value>, RuntimeError> {
        let frame = self.active_mut()?;
        if frame.operands.len() < count {
            return Err(RuntimeError::new(RuntimeErrorKind::StackUnderflow));
        }
        let split = frame.operands.len() - count;
        Ok(frame.operands.split_off(split))
    }

    pub fn pop_operand(&mut self) -> Result<Value, RuntimeError> {
        self.active_mut()?
            .operands
            .pop()
            .ok_or_else(|| RuntimeError::new(RuntimeErrorKind::StackUnderflow))
    }

    pub fn peek_operand(&self) -> Result<&Value, RuntimeError> {
        self.active()?
            .operands
            .last()
            .ok_or_else(|| RuntimeError::new(RuntimeErrorKind::StackUnderflow))
    }

    pub fn get_local(&self, index: usize) -> Result<Value, RuntimeError> {
        let frame = self.active()?;
        frame.locals.get(index).cloned().ok_or_else(|| {
            RuntimeError::new(RuntimeErrorKind::OutOfBounds {
                what: "local variable",
                index,
                len: frame.locals.len(),
            })
        })
    }

    /// Stores into local `index`, growing the vector if it is shorter.
    pub fn set_local(&mut self, index: usize, value: Value) -> Result<(), RuntimeError> {
        let frame = self.active_mut()?;
        if index >= frame.locals.len() {
            frame.locals.resize(index + 1, Value::Reference(None));
        }
        frame.locals[index] = value;
        Ok(())
    }

    /// Pushes onto the operand stack of the frame below the top; used by the
    /// return instructions to hand a value back to the invoker.
    pub fn push_operand_into_caller(&mut self, operand: Value) -> Result<(), RuntimeError> {
        let depth = self.frames.len();
        if depth < 2 {
            return Err(RuntimeError::new(RuntimeErrorKind::StackUnderflow));
        }
        self.frames[depth - 2].operands.push(operand);
        Ok(())
    }

    pub fn current_class(&self) -> Result<&ClassRef, RuntimeError> {
        Ok(&self.active()?.class)
    }

    pub fn current_method(&self) -> Result<&MethodInfo, RuntimeError> {
        Ok(self.active()?.method())
    }

    pub fn current_cp(&self) -> Result<&ConstantPool, RuntimeError> {
        Ok(&self.active()?.class.constant_pool)
    }
}
