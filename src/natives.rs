use log::debug;

use crate::data_types::{ClassRef, Value};
use crate::errors::{RuntimeError, RuntimeErrorKind};
use crate::vm::Runner;

/// Executes a native method through the intrinsic table, keyed by owning
/// class, method name and descriptor. Intrinsics run without pushing a
/// frame; a returned value is handed back to the invoker's operand stack.
pub fn dispatch(
    runner: &mut Runner,
    class: &ClassRef,
    method_name: &str,
    descriptor: &str,
    operands: Vec<Value>,
) -> Result<Option<Value>, RuntimeError> {
    debug!(
        "native {}.{}{} with {} operands",
        class.name,
        method_name,
        descriptor,
        operands.len()
    );
    match (class.name.as_str(), method_name, descriptor) {
        ("java/lang/System", "registerNatives", "()V") => {
            // the reference runtime boots by chaining into initPhase1
            let Some(method_index) = class.method_index("initPhase1", "()V")? else {
                return Err(RuntimeError::new(RuntimeErrorKind::SymbolNotResolved(
                    "method java/lang/System.initPhase1()V".to_string(),
                )));
            };
            runner.run_method(class.clone(), method_index, Vec::new())?;
            Ok(None)
        }
        ("java/lang/Class", "registerNatives", "()V") => Ok(None),
        ("java/lang/Class", "desiredAssertionStatus0", "(Ljava/lang/Class;)Z") => {
            Ok(Some(Value::Boolean(true)))
        }
        ("java/lang/StringUTF16", "isBigEndian", "()Z") => Ok(Some(Value::Boolean(true))),
        _ => Err(RuntimeError::new(RuntimeErrorKind::UnsupportedNative {
            class: class.name.clone(),
            name: method_name.to_string(),
        })),
    }
}
