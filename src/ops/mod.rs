pub mod mnemonics;

use sloader::class_file::{ClassFile, MethodInfo};
use sloader::constants::CpInfo;
use sloader::descriptors::{
    parse_field_descriptor, parse_method_descriptor, BaseType, FieldDescriptor, MethodDescriptor,
    ReturnDescriptor,
};

use crate::data_types::{ClassRef, Value};
use crate::errors::{RuntimeError, RuntimeErrorKind};
use crate::natives;
use crate::vm::Runner;

/// What the dispatch loop does after a handler ran: keep fetching, or pop
/// the current frame in favor of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Return,
}

fn immediate_u8(code: &[u8], index: usize) -> Result<u8, RuntimeError> {
    code.get(index).copied().ok_or_else(|| {
        RuntimeError::new(RuntimeErrorKind::OutOfBounds {
            what: "pc",
            index,
            len: code.len(),
        })
    })
}

fn immediate_u16(code: &[u8], index: usize) -> Result<u16, RuntimeError> {
    let high = immediate_u8(code, index)?;
    let low = immediate_u8(code, index + 1)?;
    Ok(u16::from_be_bytes([high, low]))
}

/// Signed 16-bit branch offset following the opcode at `pc`.
fn branch_offset(code: &[u8], pc: usize) -> Result<i16, RuntimeError> {
    Ok(immediate_u16(code, pc + 1)? as i16)
}

/// Branches relative to the opcode's own address.
fn jump(runner: &mut Runner, code: &[u8]) -> Result<(), RuntimeError> {
    let offset = branch_offset(code, runner.pc)?;
    let target = runner.pc as i64 + i64::from(offset);
    if target < 0 || target as usize > code.len() {
        return Err(RuntimeError::new(RuntimeErrorKind::OutOfBounds {
            what: "pc",
            index: target.unsigned_abs() as usize,
            len: code.len(),
        }));
    }
    runner.pc = target as usize;
    Ok(())
}

/// Pops a value of the int family and widens it.
fn int_operand(runner: &mut Runner) -> Result<i32, RuntimeError> {
    let value = runner.stack.pop_operand()?;
    value
        .as_int()
        .ok_or_else(|| RuntimeError::new(RuntimeErrorKind::TypeMismatch {
            expected: "int",
            found: value.kind().to_string(),
        }))
}

pub fn nop(runner: &mut Runner) -> Result<Flow, RuntimeError> {
    runner.pc += 1;
    Ok(Flow::Continue)
}

pub fn iconst(runner: &mut Runner, value: i32) -> Result<Flow, RuntimeError> {
    runner.pc += 1;
    runner.stack.push_operand(Value::Int(value))?;
    Ok(Flow::Continue)
}

pub fn aconst_null(runner: &mut Runner) -> Result<Flow, RuntimeError> {
    runner.pc += 1;
    runner.stack.push_operand(Value::Reference(None))?;
    Ok(Flow::Continue)
}

pub fn bipush(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    let byte = immediate_u8(code, runner.pc + 1)?;
    runner.pc += 2;
    runner.stack.push_operand(Value::Int(i32::from(byte as i8)))?;
    Ok(Flow::Continue)
}

pub fn sipush(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    let short = immediate_u16(code, runner.pc + 1)? as i16;
    runner.pc += 3;
    runner.stack.push_operand(Value::Int(i32::from(short)))?;
    Ok(Flow::Continue)
}

pub fn ldc(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    let index = immediate_u8(code, runner.pc + 1)?;
    runner.pc += 2;
    load_constant(runner, u16::from(index))
}

pub fn ldc_w(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    let index = immediate_u16(code, runner.pc + 1)?;
    runner.pc += 3;
    load_constant(runner, index)
}

/// Pushes a loadable constant pool entry.
///
/// Class entries always allocate the companion `java/lang/Class` instance;
/// String entries allocate a `java/lang/String` whose `value` field holds
/// the UTF-8 bytes and whose `coder` field is 1.
fn load_constant(runner: &mut Runner, index: u16) -> Result<Flow, RuntimeError> {
    let class = runner.stack.current_class()?.clone();
    let entry = class.constant_pool.get(index)?;
    if !entry.is_loadable() {
        return Err(RuntimeError::new(RuntimeErrorKind::SymbolNotResolved(
            format!("constant pool entry {index} ({}) is not loadable", entry.kind()),
        )));
    }
    match entry {
        CpInfo::Integer(value) => runner.stack.push_operand(Value::Int(*value))?,
        CpInfo::Float(value) => runner.stack.push_operand(Value::Float(*value))?,
        CpInfo::Class { name_index } => {
            let target_name = class.constant_pool.utf8(*name_index)?;
            let target = runner.loader.load(target_name)?;
            let class_class = runner.loader.load("java/lang/Class")?;
            let id = runner.heap.alloc_object(&class_class)?;
            runner.stack.push_operand(Value::ClassReference(id, target))?;
        }
        CpInfo::String { string_index } => {
            let text = class.constant_pool.utf8(*string_index)?.to_string();
            let string_class = runner.loader.load("java/lang/String")?;
            let id = runner.heap.alloc_object(&string_class)?;
            let bytes = text.bytes().map(|byte| Value::Byte(byte as i8)).collect();
            let value_array = runner.heap.alloc_array(bytes);
            runner
                .heap
                .set_field(id, "value", Value::Reference(Some(value_array)))?;
            runner.heap.set_field(id, "coder", Value::Byte(1))?;
            runner.stack.push_operand(Value::Reference(Some(id)))?;
        }
        other => {
            return Err(RuntimeError::new(RuntimeErrorKind::Unsupported(format!(
                "ldc of a {} constant",
                other.kind()
            ))))
        }
    }
    Ok(Flow::Continue)
}

pub fn iload(runner: &mut Runner, slot: usize) -> Result<Flow, RuntimeError> {
    runner.pc += 1;
    let local = runner.stack.get_local(slot)?;
    match local {
        Value::Int(_) => runner.stack.push_operand(local)?,
        other => {
            return Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch {
                expected: "int local",
                found: other.kind().to_string(),
            }))
        }
    }
    Ok(Flow::Continue)
}

pub fn aload(runner: &mut Runner, slot: usize) -> Result<Flow, RuntimeError> {
    runner.pc += 1;
    let local = runner.stack.get_local(slot)?;
    if !local.is_reference() {
        return Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch {
            expected: "reference local",
            found: local.kind().to_string(),
        }));
    }
    runner.stack.push_operand(local)?;
    Ok(Flow::Continue)
}

pub fn istore(runner: &mut Runner, slot: usize) -> Result<Flow, RuntimeError> {
    runner.pc += 1;
    let value = runner.stack.pop_operand()?;
    match value {
        Value::Int(_) => runner.stack.set_local(slot, value)?,
        other => {
            return Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch {
                expected: "int",
                found: other.kind().to_string(),
            }))
        }
    }
    Ok(Flow::Continue)
}

/// Pops exactly one reference and stores it; the encoded slot is only the
/// local index, never a pop count.
pub fn astore(runner: &mut Runner, slot: usize) -> Result<Flow, RuntimeError> {
    runner.pc += 1;
    let value = runner.stack.pop_operand()?;
    if !value.is_reference() {
        return Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch {
            expected: "reference",
            found: value.kind().to_string(),
        }));
    }
    runner.stack.set_local(slot, value)?;
    Ok(Flow::Continue)
}

pub fn dup(runner: &mut Runner) -> Result<Flow, RuntimeError> {
    runner.pc += 1;
    let top = runner.stack.peek_operand()?.clone();
    runner.stack.push_operand(top)?;
    Ok(Flow::Continue)
}

pub fn pop(runner: &mut Runner) -> Result<Flow, RuntimeError> {
    runner.pc += 1;
    runner.stack.pop_operand()?;
    Ok(Flow::Continue)
}

pub fn iadd(runner: &mut Runner) -> Result<Flow, RuntimeError> {
    runner.pc += 1;
    let b = int_operand(runner)?;
    let a = int_operand(runner)?;
    runner.stack.push_operand(Value::Int(a.wrapping_add(b)))?;
    Ok(Flow::Continue)
}

pub fn isub(runner: &mut Runner) -> Result<Flow, RuntimeError> {
    runner.pc += 1;
    let b = int_operand(runner)?;
    let a = int_operand(runner)?;
    runner.stack.push_operand(Value::Int(a.wrapping_sub(b)))?;
    Ok(Flow::Continue)
}

/// Arithmetic shift right; only the low five bits of the shift count matter.
pub fn ishr(runner: &mut Runner) -> Result<Flow, RuntimeError> {
    runner.pc += 1;
    let shift = int_operand(runner)?;
    let value = int_operand(runner)?;
    runner.stack.push_operand(Value::Int(value >> (shift & 31)))?;
    Ok(Flow::Continue)
}

pub fn newarray(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    let atype = immediate_u8(code, runner.pc + 1)?;
    runner.pc += 2;
    let default_value = match atype {
        4 => Value::Boolean(false),
        5 => Value::Char(0),
        6 => Value::Float(0.0),
        7 => Value::Double(0.0),
        8 => Value::Byte(0),
        9 => Value::Short(0),
        10 => Value::Int(0),
        11 => Value::Long(0),
        other => {
            return Err(RuntimeError::new(RuntimeErrorKind::Unsupported(format!(
                "newarray atype {other}"
            ))))
        }
    };
    let count = array_count(runner)?;
    let id = runner.heap.alloc_default_array(count, default_value);
    runner.stack.push_operand(Value::Reference(Some(id)))?;
    Ok(Flow::Continue)
}

pub fn anewarray(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    let index = immediate_u16(code, runner.pc + 1)?;
    runner.pc += 3;
    let count = array_count(runner)?;
    let class = runner.stack.current_class()?.clone();
    let element_class_name = class.constant_pool.class_name(index)?;
    runner.loader.load(element_class_name)?;
    let id = runner.heap.alloc_default_array(count, Value::Reference(None));
    runner.stack.push_operand(Value::Reference(Some(id)))?;
    Ok(Flow::Continue)
}

fn array_count(runner: &mut Runner) -> Result<usize, RuntimeError> {
    let count = int_operand(runner)?;
    usize::try_from(count).map_err(|_| {
        RuntimeError::new(RuntimeErrorKind::TypeMismatch {
            expected: "non-negative array count",
            found: count.to_string(),
        })
    })
}

pub fn arraylength(runner: &mut Runner) -> Result<Flow, RuntimeError> {
    runner.pc += 1;
    match runner.stack.pop_operand()? {
        Value::Reference(Some(id)) => {
            let length = runner.heap.array_len(id)?;
            runner.stack.push_operand(Value::Int(length as i32))?;
        }
        other => {
            return Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch {
                expected: "array reference",
                found: other.kind().to_string(),
            }))
        }
    }
    Ok(Flow::Continue)
}

pub fn new(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    let index = immediate_u16(code, runner.pc + 1)?;
    runner.pc += 3;
    let class = runner.stack.current_class()?.clone();
    let class_name = class.constant_pool.class_name(index)?.to_string();
    runner.initialize_class(&class_name)?;
    let target = runner.loader.load(&class_name)?;
    let id = runner.heap.alloc_object(&target)?;
    runner.stack.push_operand(Value::Reference(Some(id)))?;
    Ok(Flow::Continue)
}

/// A resolved field reference: owning class plus member name/descriptor.
struct ResolvedField {
    class_name: String,
    field_name: String,
    descriptor: String,
}

/// Resolves a field ref and checks the member actually exists on the owner,
/// matching both name and descriptor.
fn resolve_field(runner: &mut Runner, index: u16) -> Result<ResolvedField, RuntimeError> {
    let class = runner.stack.current_class()?.clone();
    let pool = &class.constant_pool;
    let ref_info = pool.ref_entry(index)?;
    let class_name = pool.class_name(ref_info.class_index)?.to_string();
    let owner = runner.loader.load(&class_name)?;
    let name_and_type = pool.name_and_type(ref_info.name_and_type_index)?;
    let field_name = pool.utf8(name_and_type.name_index)?.to_string();
    let descriptor = pool.utf8(name_and_type.descriptor_index)?.to_string();
    if owner.field(&field_name, &descriptor)?.is_none() {
        return Err(RuntimeError::new(RuntimeErrorKind::SymbolNotResolved(
            format!("field {class_name}.{field_name}:{descriptor}"),
        )));
    }
    Ok(ResolvedField {
        class_name,
        field_name,
        descriptor,
    })
}

pub fn getfield(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    let index = immediate_u16(code, runner.pc + 1)?;
    runner.pc += 3;
    let field = resolve_field(runner, index)?;
    let object_id = match runner.stack.pop_operand()? {
        Value::Reference(Some(id)) => id,
        Value::ClassReference(id, _) => id,
        other => {
            return Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch {
                expected: "non-null object reference",
                found: other.kind().to_string(),
            }))
        }
    };
    let value = runner.heap.field(object_id, &field.field_name)?;
    runner.stack.push_operand(value)?;
    Ok(Flow::Continue)
}

pub fn putfield(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    let index = immediate_u16(code, runner.pc + 1)?;
    runner.pc += 3;
    let field = resolve_field(runner, index)?;
    let field_type = parse_field_descriptor(&field.descriptor)?;
    let value = runner.stack.pop_operand()?;
    let object_ref = runner.stack.pop_operand()?;
    if !is_compatible(&field_type, &value) {
        return Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch {
            expected: "value compatible with the field descriptor",
            found: format!("{} for {}", value.kind(), field.descriptor),
        }));
    }
    match object_ref {
        Value::Reference(Some(id)) => {
            runner.heap.set_field(id, &field.field_name, value)?;
            Ok(Flow::Continue)
        }
        other => Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch {
            expected: "non-null object reference",
            found: other.kind().to_string(),
        })),
    }
}

/// Whether a value may be stored under a field descriptor. Sub-int fields
/// accept the whole widened int family.
fn is_compatible(field_type: &FieldDescriptor, value: &Value) -> bool {
    match field_type {
        FieldDescriptor::Object(_) | FieldDescriptor::Array(_) => value.is_reference(),
        FieldDescriptor::Base(BaseType::Boolean)
        | FieldDescriptor::Base(BaseType::Byte)
        | FieldDescriptor::Base(BaseType::Char)
        | FieldDescriptor::Base(BaseType::Short)
        | FieldDescriptor::Base(BaseType::Int) => value.as_int().is_some(),
        FieldDescriptor::Base(BaseType::Long) => matches!(value, Value::Long(_)),
        FieldDescriptor::Base(BaseType::Float) => matches!(value, Value::Float(_)),
        FieldDescriptor::Base(BaseType::Double) => matches!(value, Value::Double(_)),
    }
}

pub fn getstatic(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    let index = immediate_u16(code, runner.pc + 1)?;
    runner.pc += 3;
    let field = resolve_field(runner, index)?;
    runner.initialize_class(&field.class_name)?;
    let value = runner.loader.static_get(&field.class_name, &field.field_name)?;
    runner.stack.push_operand(value)?;
    Ok(Flow::Continue)
}

pub fn putstatic(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    let index = immediate_u16(code, runner.pc + 1)?;
    runner.pc += 3;
    let field = resolve_field(runner, index)?;
    runner.initialize_class(&field.class_name)?;
    let value = runner.stack.pop_operand()?;
    runner
        .loader
        .static_put(&field.class_name, &field.field_name, value)?;
    Ok(Flow::Continue)
}

pub fn ifeq(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    let value = int_operand(runner)?;
    if value == 0 {
        jump(runner, code)?;
    } else {
        runner.pc += 3;
    }
    Ok(Flow::Continue)
}

pub fn ifne(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    let value = int_operand(runner)?;
    if value != 0 {
        jump(runner, code)?;
    } else {
        runner.pc += 3;
    }
    Ok(Flow::Continue)
}

pub fn iflt(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    let value = int_operand(runner)?;
    if value < 0 {
        jump(runner, code)?;
    } else {
        runner.pc += 3;
    }
    Ok(Flow::Continue)
}

/// Branches when the earlier-pushed int is less than the later-pushed one.
pub fn if_icmplt(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    let later = int_operand(runner)?;
    let earlier = int_operand(runner)?;
    if earlier < later {
        jump(runner, code)?;
    } else {
        runner.pc += 3;
    }
    Ok(Flow::Continue)
}

pub fn goto(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    jump(runner, code)?;
    Ok(Flow::Continue)
}

pub fn ifnonnull(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    let value = runner.stack.pop_operand()?;
    match value {
        Value::Reference(None) => {
            runner.pc += 3;
            Ok(Flow::Continue)
        }
        Value::Reference(Some(_)) | Value::ClassReference(..) => {
            jump(runner, code)?;
            Ok(Flow::Continue)
        }
        other => Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch {
            expected: "reference",
            found: other.kind().to_string(),
        })),
    }
}

/// A resolved method reference, looked up by the (name, descriptor) pair.
struct ResolvedMethod {
    class: ClassRef,
    method_index: usize,
    name: String,
    descriptor_raw: String,
    descriptor: MethodDescriptor,
}

fn resolve_method(
    runner: &mut Runner,
    index: u16,
    initialize_owner: bool,
) -> Result<ResolvedMethod, RuntimeError> {
    let class = runner.stack.current_class()?.clone();
    let pool = &class.constant_pool;
    let ref_info = pool.ref_entry(index)?;
    let class_name = pool.class_name(ref_info.class_index)?.to_string();
    if initialize_owner {
        runner.initialize_class(&class_name)?;
    }
    let owner = runner.loader.load(&class_name)?;
    let name_and_type = pool.name_and_type(ref_info.name_and_type_index)?;
    let name = pool.utf8(name_and_type.name_index)?.to_string();
    let descriptor_raw = pool.utf8(name_and_type.descriptor_index)?.to_string();
    let Some(method_index) = owner.method_index(&name, &descriptor_raw)? else {
        return Err(RuntimeError::new(RuntimeErrorKind::SymbolNotResolved(
            format!("method {class_name}.{name}{descriptor_raw}"),
        )));
    };
    let descriptor = parse_method_descriptor(&descriptor_raw)?;
    Ok(ResolvedMethod {
        class: owner,
        method_index,
        name,
        descriptor_raw,
        descriptor,
    })
}

/// Runs a resolved method: native methods go through the intrinsic table
/// without a frame, everything else enters its `Code`.
fn invoke(
    runner: &mut Runner,
    resolved: &ResolvedMethod,
    arguments: Vec<Value>,
) -> Result<(), RuntimeError> {
    let method = &resolved.class.methods[resolved.method_index];
    if method.is_native() {
        let returned = natives::dispatch(
            runner,
            &resolved.class,
            &resolved.name,
            &resolved.descriptor_raw,
            arguments,
        )?;
        if let Some(value) = returned {
            runner.stack.push_operand(value.widen_int())?;
        }
        Ok(())
    } else {
        runner.run_method(resolved.class.clone(), resolved.method_index, arguments)
    }
}

pub fn invokestatic(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    let index = immediate_u16(code, runner.pc + 1)?;
    runner.pc += 3;
    let resolved = resolve_method(runner, index, true)?;
    let arguments = runner.stack.pop_operands(resolved.descriptor.parameters.len())?;
    invoke(runner, &resolved, arguments)?;
    Ok(Flow::Continue)
}

/// Like invokestatic, but the receiver travels as slot 0 of the callee.
pub fn invokespecial(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    let index = immediate_u16(code, runner.pc + 1)?;
    runner.pc += 3;
    let resolved = resolve_method(runner, index, true)?;
    let arguments = runner
        .stack
        .pop_operands(resolved.descriptor.parameters.len() + 1)?;
    if !arguments[0].is_reference() {
        return Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch {
            expected: "object reference receiver",
            found: arguments[0].kind().to_string(),
        }));
    }
    invoke(runner, &resolved, arguments)?;
    Ok(Flow::Continue)
}

pub fn invokevirtual(runner: &mut Runner, code: &[u8]) -> Result<Flow, RuntimeError> {
    let index = immediate_u16(code, runner.pc + 1)?;
    runner.pc += 3;
    let resolved = resolve_method(runner, index, false)?;
    let method = &resolved.class.methods[resolved.method_index];
    if is_signature_polymorphic(&resolved.class, method, &resolved.descriptor) {
        return Err(RuntimeError::new(RuntimeErrorKind::Unsupported(format!(
            "signature polymorphic method {}.{}",
            resolved.class.name, resolved.name
        ))));
    }
    // +1 for the objectref in slot 0
    let arguments = runner
        .stack
        .pop_operands(resolved.descriptor.parameters.len() + 1)?;
    if !arguments[0].is_reference() {
        return Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch {
            expected: "object reference receiver",
            found: arguments[0].kind().to_string(),
        }));
    }
    invoke(runner, &resolved, arguments)?;
    Ok(Flow::Continue)
}

/// The MethodHandle/VarHandle invokers whose descriptor the caller ignores.
fn is_signature_polymorphic(
    class: &ClassFile,
    method: &MethodInfo,
    descriptor: &MethodDescriptor,
) -> bool {
    let handle_class = class.name == "java/lang/invoke/MethodHandle"
        || class.name == "java/lang/invoke/VarHandle";
    handle_class
        && has_single_object_array_parameter(descriptor)
        && method.is_varargs()
        && method.is_native()
}

fn has_single_object_array_parameter(descriptor: &MethodDescriptor) -> bool {
    match descriptor.parameters.as_slice() {
        [FieldDescriptor::Array(element)] => {
            matches!(element.as_ref(), FieldDescriptor::Object(name) if name == "java/lang/Object")
        }
        _ => false,
    }
}

/// `return`: the current method must be void.
pub fn return_void(runner: &mut Runner) -> Result<Flow, RuntimeError> {
    let class = runner.stack.current_class()?.clone();
    let method = runner.stack.current_method()?;
    let descriptor_raw = class.constant_pool.utf8(method.descriptor_index)?;
    let descriptor = parse_method_descriptor(descriptor_raw)?;
    if descriptor.return_descriptor != ReturnDescriptor::Void {
        return Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch {
            expected: "void return descriptor",
            found: descriptor_raw.to_string(),
        }));
    }
    Ok(Flow::Return)
}

/// `ireturn`: hands an int-widened value to the invoker.
pub fn ireturn(runner: &mut Runner) -> Result<Flow, RuntimeError> {
    let value = int_operand(runner)?;
    runner.stack.push_operand_into_caller(Value::Int(value))?;
    Ok(Flow::Return)
}

/// `areturn`: hands a reference to the invoker.
pub fn areturn(runner: &mut Runner) -> Result<Flow, RuntimeError> {
    let value = runner.stack.pop_operand()?;
    if !value.is_reference() {
        return Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch {
            expected: "reference",
            found: value.kind().to_string(),
        }));
    }
    runner.stack.push_operand_into_caller(value)?;
    Ok(Flow::Return)
}
