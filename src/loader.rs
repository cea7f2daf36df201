use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};
use sloader::access_flags::ClassAccessFlags;
use sloader::class_file::ClassFile;
use sloader::constants::CpInfo;
use sloader::descriptors::{parse_field_descriptor, BaseType, FieldDescriptor};

use crate::classpath::ClassProvider;
use crate::data_types::{ClassRef, Value};
use crate::errors::{RuntimeError, RuntimeErrorKind};

/// Initialization progress of a loaded class. Absence from the state table
/// means uninitialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    /// `<clinit>` is on the current invocation chain right now.
    Initializing,
    Initialized,
}

/// Maps binary names to loaded classes, owns the per-class static field
/// storage, and tracks initialization.
///
/// A class shows up in the cache only after its parse completed without
/// error, and it is cached before `<clinit>` runs.
pub struct Loader {
    provider: Box<dyn ClassProvider>,
    classes: HashMap<String, ClassRef>,
    statics: HashMap<String, HashMap<String, Value>>,
    init_states: HashMap<String, InitState>,
    /// Innermost class whose `<clinit>` is running, for logs and inspection.
    being_initialized: Option<String>,
}

impl Loader {
    pub fn new(provider: Box<dyn ClassProvider>) -> Loader {
        Loader {
            provider,
            classes: HashMap::new(),
            statics: HashMap::new(),
            init_states: HashMap::new(),
            being_initialized: None,
        }
    }

    /// Returns the cached class or fetches, parses and caches it.
    pub fn load(&mut self, binary_name: &str) -> Result<ClassRef, RuntimeError> {
        if let Some(class) = self.classes.get(binary_name) {
            return Ok(class.clone());
        }
        info!("loading class {binary_name}");
        let bytes = self.provider.class_bytes(binary_name)?;
        let class = Rc::new(ClassFile::from_bytes(&bytes, binary_name)?);
        debug!(
            "class {binary_name} access flags: {:?}",
            ClassAccessFlags::from_u16(class.access_flags)
        );
        self.seed_statics(&class)?;
        self.classes.insert(binary_name.to_string(), class.clone());
        Ok(class)
    }

    /// Gives every static field its descriptor default, then applies any
    /// numeric `ConstantValue` the field carries.
    fn seed_statics(&mut self, class: &ClassFile) -> Result<(), RuntimeError> {
        let mut values = HashMap::new();
        for field in class.fields.iter().filter(|field| field.is_static()) {
            let name = class.constant_pool.utf8(field.name_index)?;
            let descriptor = class.constant_pool.utf8(field.descriptor_index)?;
            let field_type = parse_field_descriptor(descriptor)?;
            let mut value = Value::default_for(&field_type);
            if let Some(index) = field.constant_value_index() {
                match constant_value(class.constant_pool.get(index)?, &field_type) {
                    Some(constant) => value = constant,
                    None => debug!(
                        "ignoring constant value of {}.{name}, entry {index} is not numeric",
                        class.name
                    ),
                }
            }
            values.insert(name.to_string(), value);
        }
        self.statics.insert(class.name.clone(), values);
        Ok(())
    }

    pub fn static_get(&self, class_name: &str, field_name: &str) -> Result<Value, RuntimeError> {
        self.statics
            .get(class_name)
            .and_then(|fields| fields.get(field_name))
            .cloned()
            .ok_or_else(|| {
                RuntimeError::new(RuntimeErrorKind::SymbolNotResolved(format!(
                    "static field {class_name}.{field_name}"
                )))
            })
    }

    pub fn static_put(
        &mut self,
        class_name: &str,
        field_name: &str,
        value: Value,
    ) -> Result<(), RuntimeError> {
        match self.statics.get_mut(class_name) {
            Some(fields) => {
                fields.insert(field_name.to_string(), value);
                Ok(())
            }
            None => Err(RuntimeError::new(RuntimeErrorKind::SymbolNotResolved(
                format!("static storage of unloaded class {class_name}"),
            ))),
        }
    }

    pub fn initialization_state(&self, binary_name: &str) -> Option<InitState> {
        self.init_states.get(binary_name).copied()
    }

    /// Marks the class as initializing and makes it the innermost one.
    /// Returns the previously innermost name so completion can restore it.
    pub fn begin_initialization(&mut self, binary_name: &str) -> Option<String> {
        self.init_states
            .insert(binary_name.to_string(), InitState::Initializing);
        self.being_initialized
            .replace(binary_name.to_string())
    }

    /// On success the class becomes initialized; on failure it falls back to
    /// uninitialized. Either way the innermost marker is restored.
    pub fn finish_initialization(
        &mut self,
        binary_name: &str,
        previous: Option<String>,
        success: bool,
    ) {
        if success {
            self.init_states
                .insert(binary_name.to_string(), InitState::Initialized);
        } else {
            self.init_states.remove(binary_name);
        }
        self.being_initialized = previous;
    }

    pub fn class_being_initialized(&self) -> Option<&str> {
        self.being_initialized.as_deref()
    }

    /// Names of all fully initialized classes, for diagnostics and tests.
    pub fn initialized_classes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .init_states
            .iter()
            .filter(|(_, state)| **state == InitState::Initialized)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

/// Converts a `ConstantValue` pool entry to the value of a static field of
/// the given type. String constants need a heap and are left to `<clinit>`.
fn constant_value(entry: &CpInfo, field_type: &FieldDescriptor) -> Option<Value> {
    match (entry, field_type) {
        (CpInfo::Integer(v), FieldDescriptor::Base(BaseType::Boolean)) => {
            Some(Value::Boolean(*v != 0))
        }
        (CpInfo::Integer(v), FieldDescriptor::Base(BaseType::Byte)) => Some(Value::Byte(*v as i8)),
        (CpInfo::Integer(v), FieldDescriptor::Base(BaseType::Char)) => Some(Value::Char(*v as u16)),
        (CpInfo::Integer(v), FieldDescriptor::Base(BaseType::Short)) => {
            Some(Value::Short(*v as i16))
        }
        (CpInfo::Integer(v), FieldDescriptor::Base(BaseType::Int)) => Some(Value::Int(*v)),
        (CpInfo::Long(v), FieldDescriptor::Base(BaseType::Long)) => Some(Value::Long(*v)),
        (CpInfo::Float(v), FieldDescriptor::Base(BaseType::Float)) => Some(Value::Float(*v)),
        (CpInfo::Double(v), FieldDescriptor::Base(BaseType::Double)) => Some(Value::Double(*v)),
        _ => None,
    }
}
