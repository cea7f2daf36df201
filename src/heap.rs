use std::collections::HashMap;
use std::fmt;

use log::debug;
use sloader::class_file::ClassFile;
use sloader::descriptors::parse_field_descriptor;

use crate::data_types::Value;
use crate::errors::{RuntimeError, RuntimeErrorKind};

/// Opaque identifier of a heap object. Ids are handed out monotonically and
/// never reused within a session; equality is identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeapId(u64);

impl fmt::Display for HeapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An allocated object: a class instance with named fields, or an array.
#[derive(Debug, Clone, PartialEq)]
pub enum HeapObject {
    Instance {
        class_name: String,
        fields: HashMap<String, Value>,
    },
    Array {
        items: Vec<Value>,
    },
}

/// Identifier-keyed store of every object and array of the session. Nothing
/// is ever reclaimed; objects live until interpreter shutdown.
#[derive(Debug, Default)]
pub struct Heap {
    objects: HashMap<HeapId, HeapObject>,
    next_id: u64,
}

impl Heap {
    pub fn new() -> Heap {
        Heap::default()
    }

    fn next_id(&mut self) -> HeapId {
        let id = HeapId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Allocates an instance of `class` with every declared field set to its
    /// descriptor's default.
    pub fn alloc_object(&mut self, class: &ClassFile) -> Result<HeapId, RuntimeError> {
        debug!("allocating {} object", class.name);
        let mut fields = HashMap::new();
        for field in &class.fields {
            let name = class.constant_pool.utf8(field.name_index)?;
            let descriptor = class.constant_pool.utf8(field.descriptor_index)?;
            let field_type = parse_field_descriptor(descriptor)?;
            fields.insert(name.to_string(), Value::default_for(&field_type));
        }
        let id = self.next_id();
        self.objects.insert(
            id,
            HeapObject::Instance {
                class_name: class.name.clone(),
                fields,
            },
        );
        Ok(id)
    }

    /// Allocates an array of `length` copies of `default_value`.
    pub fn alloc_default_array(&mut self, length: usize, default_value: Value) -> HeapId {
        self.alloc_array(vec![default_value; length])
    }

    pub fn alloc_array(&mut self, items: Vec<Value>) -> HeapId {
        let id = self.next_id();
        self.objects.insert(id, HeapObject::Array { items });
        id
    }

    pub fn get(&self, id: HeapId) -> Result<&HeapObject, RuntimeError> {
        self.objects.get(&id).ok_or_else(|| {
            RuntimeError::new(RuntimeErrorKind::OutOfBounds {
                what: "heap id",
                index: id.0 as usize,
                len: self.next_id as usize,
            })
        })
    }

    /// Reads the named field of an instance.
    pub fn field(&self, id: HeapId, name: &str) -> Result<Value, RuntimeError> {
        match self.get(id)? {
            HeapObject::Instance { class_name, fields } => {
                fields.get(name).cloned().ok_or_else(|| {
                    RuntimeError::new(RuntimeErrorKind::SymbolNotResolved(format!(
                        "field {name} not found on {class_name}"
                    )))
                })
            }
            HeapObject::Array { .. } => Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch {
                expected: "instance",
                found: "array".to_string(),
            })),
        }
    }

    pub fn set_field(&mut self, id: HeapId, name: &str, value: Value) -> Result<(), RuntimeError> {
        let len = self.next_id as usize;
        match self.objects.get_mut(&id) {
            Some(HeapObject::Instance { class_name, fields }) => match fields.get_mut(name) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(RuntimeError::new(RuntimeErrorKind::SymbolNotResolved(
                    format!("field {name} not found on {class_name}"),
                ))),
            },
            Some(HeapObject::Array { .. }) => {
                Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch {
                    expected: "instance",
                    found: "array".to_string(),
                }))
            }
            None => Err(RuntimeError::new(RuntimeErrorKind::OutOfBounds {
                what: "heap id",
                index: id.0 as usize,
                len,
            })),
        }
    }

    pub fn array_len(&self, id: HeapId) -> Result<usize, RuntimeError> {
        match self.get(id)? {
            HeapObject::Array { items } => Ok(items.len()),
            HeapObject::Instance { .. } => {
                Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch {
                    expected: "array",
                    found: "instance".to_string(),
                }))
            }
        }
    }

    pub fn array_get(&self, id: HeapId, index: usize) -> Result<Value, RuntimeError> {
        match self.get(id)? {
            HeapObject::Array { items } => items.get(index).cloned().ok_or_else(|| {
                RuntimeError::new(RuntimeErrorKind::OutOfBounds {
                    what: "array",
                    index,
                    len: items.len(),
                })
            }),
            HeapObject::Instance { .. } => {
                Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch {
                    expected: "array",
                    found: "instance".to_string(),
                }))
            }
        }
    }

    pub fn array_set(&mut self, id: HeapId, index: usize, value: Value) -> Result<(), RuntimeError> {
        let len = self.next_id as usize;
        match self.objects.get_mut(&id) {
            Some(HeapObject::Array { items }) => {
                let item_count = items.len();
                match items.get_mut(index) {
                    Some(slot) => {
                        *slot = value;
                        Ok(())
                    }
                    None => Err(RuntimeError::new(RuntimeErrorKind::OutOfBounds {
                        what: "array",
                        index,
                        len: item_count,
                    })),
                }
            }
            Some(HeapObject::Instance { .. }) => {
                Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch {
                    expected: "array",
                    found: "instance".to_string(),
                }))
            }
            None => Err(RuntimeError::new(RuntimeErrorKind::OutOfBounds {
                what: "heap id",
                index: id.0 as usize,
                len,
            })),
        }
    }
}
