use log::{debug, info};

use crate::classpath::ClassProvider;
use crate::data_types::{ClassRef, Value};
use crate::errors::{RuntimeError, RuntimeErrorKind};
use crate::heap::Heap;
use crate::loader::{InitState, Loader};
use crate::ops::mnemonics::Mnemonic;
use crate::ops::{self, Flow};
use crate::stack_frame::FrameStack;

/// One interpreter session: the loader's class table, the static storage,
/// the heap and the frame stack all live here and are mutated only by this
/// single sequential fetch/decode/execute loop.
pub struct Runner {
    pub loader: Loader,
    pub heap: Heap,
    pub stack: FrameStack,
    /// Program counter into the code of the active frame's method.
    pub pc: usize,
}

impl Runner {
    pub fn new(provider: Box<dyn ClassProvider>) -> Runner {
        Runner {
            loader: Loader::new(provider),
            heap: Heap::new(),
            stack: FrameStack::new(),
            pc: 0,
        }
    }

    /// The entry driver: initializes the main class, locates
    /// `main ([Ljava/lang/String;)V` and seeds the root frame.
    pub fn run_main(&mut self, class_name: &str) -> Result<(), RuntimeError> {
        self.initialize_class(class_name)?;
        let class = self.loader.load(class_name)?;
        let Some(method_index) = class.main_method_index()? else {
            return Err(RuntimeError::new(RuntimeErrorKind::SymbolNotResolved(
                format!("no main method found on {class_name}"),
            )));
        };
        // slot 0 carries the (null) argument array
        self.run_method(class, method_index, vec![Value::Reference(None)])
    }

    /// Drives the initialization state machine for one class.
    ///
    /// Uninitialized classes move to initializing before their `<clinit>`
    /// runs, so any re-entry on the current invocation chain is a no-op and
    /// mutual `<clinit>` recursion still terminates, once per class. A
    /// failed `<clinit>` puts the class back to uninitialized.
    pub fn initialize_class(&mut self, class_name: &str) -> Result<(), RuntimeError> {
        match self.loader.initialization_state(class_name) {
            Some(InitState::Initialized) => return Ok(()),
            Some(InitState::Initializing) => {
                let signal =
                    RuntimeErrorKind::InitializationInProgress(class_name.to_string());
                debug!("{signal}, skipping");
                return Ok(());
            }
            None => {}
        }
        let class = self.loader.load(class_name)?;
        let previous = self.loader.begin_initialization(class_name);
        let result = match class.method_index("<clinit>", "()V") {
            Ok(Some(method_index)) => {
                info!("initializing class {class_name}");
                self.run_method(class.clone(), method_index, Vec::new())
            }
            Ok(None) => Ok(()),
            Err(error) => Err(RuntimeError::from(error)),
        };
        self.loader
            .finish_initialization(class_name, previous, result.is_ok());
        result
    }

    /// Pushes a frame for the method, interprets its code, and pops the
    /// frame again on every exit path. Failures pick up this frame's
    /// descriptor while unwinding.
    pub fn run_method(
        &mut self,
        class: ClassRef,
        method_index: usize,
        mut locals: Vec<Value>,
    ) -> Result<(), RuntimeError> {
        let method = &class.methods[method_index];
        let method_name = class.constant_pool.utf8(method.name_index)?.to_string();
        let Some(code_attribute) = method.code_attribute() else {
            return Err(RuntimeError::new(RuntimeErrorKind::Unsupported(format!(
                "method {}.{} has no code",
                class.name, method_name
            ))));
        };
        debug!(
            "running method '{}.{}' with {} parameters",
            class.name,
            method_name,
            locals.len()
        );
        let max_locals = code_attribute.max_locals as usize;
        if locals.len() < max_locals {
            locals.resize(max_locals, Value::Reference(None));
        }
        self.stack.push_frame(
            class.clone(),
            method_index,
            locals,
            self.pc,
            code_attribute.max_stack as usize,
        );
        self.pc = 0;
        let result = self.run(&code_attribute.code);
        let frame = self.stack.pop_frame()?;
        self.pc = frame.return_pc;
        result.map_err(|error| error.with_frame(&class.name, &method_name))
    }

    /// The dispatch loop. Fetches the opcode at the current pc, executes its
    /// handler, and stops when a return empties this frame or the pc walks
    /// off the end of the code array.
    fn run(&mut self, code: &[u8]) -> Result<(), RuntimeError> {
        loop {
            if self.pc >= code.len() {
                return Ok(());
            }
            let opcode = code[self.pc];
            let mnemonic = Mnemonic::from(opcode);
            debug!("executing {mnemonic:?} at {}", self.pc);
            let flow = match mnemonic {
                Mnemonic::Nop => ops::nop(self)?,
                Mnemonic::AconstNull => ops::aconst_null(self)?,
                Mnemonic::IconstM1 => ops::iconst(self, -1)?,
                Mnemonic::Iconst0 => ops::iconst(self, 0)?,
                Mnemonic::Iconst1 => ops::iconst(self, 1)?,
                Mnemonic::Iconst2 => ops::iconst(self, 2)?,
                Mnemonic::Iconst3 => ops::iconst(self, 3)?,
                Mnemonic::Iconst4 => ops::iconst(self, 4)?,
                Mnemonic::Iconst5 => ops::iconst(self, 5)?,
                Mnemonic::Bipush => ops::bipush(self, code)?,
                Mnemonic::Sipush => ops::sipush(self, code)?,
                Mnemonic::Ldc => ops::ldc(self, code)?,
                Mnemonic::LdcW => ops::ldc_w(self, code)?,
                Mnemonic::Iload0 => ops::iload(self, 0)?,
                Mnemonic::Iload1 => ops::iload(self, 1)?,
                Mnemonic::Iload2 => ops::iload(self, 2)?,
                Mnemonic::Iload3 => ops::iload(self, 3)?,
                Mnemonic::Aload0 => ops::aload(self, 0)?,
                Mnemonic::Aload1 => ops::aload(self, 1)?,
                Mnemonic::Aload2 => ops::aload(self, 2)?,
                Mnemonic::Aload3 => ops::aload(self, 3)?,
                Mnemonic::Istore0 => ops::istore(self, 0)?,
                Mnemonic::Istore1 => ops::istore(self, 1)?,
                Mnemonic::Istore2 => ops::istore(self, 2)?,
                Mnemonic::Istore3 => ops::istore(self, 3)?,
                Mnemonic::Astore0 => ops::astore(self, 0)?,
                Mnemonic::Astore1 => ops::astore(self, 1)?,
                Mnemonic::Astore2 => ops::astore(self, 2)?,
                Mnemonic::Astore3 => ops::astore(self, 3)?,
                Mnemonic::Dup => ops::dup(self)?,
                Mnemonic::Pop => ops::pop(self)?,
                Mnemonic::Iadd => ops::iadd(self)?,
                Mnemonic::Isub => ops::isub(self)?,
                Mnemonic::Ishr => ops::ishr(self)?,
                Mnemonic::Newarray => ops::newarray(self, code)?,
                Mnemonic::Anewarray => ops::anewarray(self, code)?,
                Mnemonic::Arraylength => ops::arraylength(self)?,
                Mnemonic::New => ops::new(self, code)?,
                Mnemonic::Getfield => ops::getfield(self, code)?,
                Mnemonic::Putfield => ops::putfield(self, code)?,
                Mnemonic::Getstatic => ops::getstatic(self, code)?,
                Mnemonic::Putstatic => ops::putstatic(self, code)?,
                Mnemonic::Ifeq => ops::ifeq(self, code)?,
                Mnemonic::Ifne => ops::ifne(self, code)?,
                Mnemonic::Iflt => ops::iflt(self, code)?,
                Mnemonic::IfIcmplt => ops::if_icmplt(self, code)?,
                Mnemonic::Goto => ops::goto(self, code)?,
                Mnemonic::Ifnonnull => ops::ifnonnull(self, code)?,
                Mnemonic::Invokestatic => ops::invokestatic(self, code)?,
                Mnemonic::Invokespecial => ops::invokespecial(self, code)?,
                Mnemonic::Invokevirtual => ops::invokevirtual(self, code)?,
                Mnemonic::Return => ops::return_void(self)?,
                Mnemonic::Ireturn => ops::ireturn(self)?,
                Mnemonic::Areturn => ops::areturn(self)?,
                Mnemonic::Athrow => {
                    return Err(RuntimeError::new(RuntimeErrorKind::Unsupported(
                        "exception delivery".to_string(),
                    )))
                }
                _ => {
                    return Err(RuntimeError::new(RuntimeErrorKind::UnknownInstruction(
                        opcode,
                    )))
                }
            };
            if flow == Flow::Return {
                return Ok(());
            }
        }
    }
}
