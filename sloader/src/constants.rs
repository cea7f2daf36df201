use crate::errors::ClassError;
use crate::reader::Reader;

/// Constant pool entry tags.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tags {
    Utf8 = 1,
    Integer = 3,
    Float = 4,
    Long = 5,
    Double = 6,
    Class = 7,
    String = 8,
    Fieldref = 9,
    Methodref = 10,
    InterfaceMethodref = 11,
    NameAndType = 12,
    MethodHandle = 15,
    MethodType = 16,
    Dynamic = 17,
    InvokeDynamic = 18,
    Module = 19,
    Package = 20,
    Unknown = 128,
}

impl From<u8> for Tags {
    fn from(value: u8) -> Self {
        match value {
            1 => Tags::Utf8,
            3 => Tags::Integer,
            4 => Tags::Float,
            5 => Tags::Long,
            6 => Tags::Double,
            7 => Tags::Class,
            8 => Tags::String,
            9 => Tags::Fieldref,
            10 => Tags::Methodref,
            11 => Tags::InterfaceMethodref,
            12 => Tags::NameAndType,
            15 => Tags::MethodHandle,
            16 => Tags::MethodType,
            17 => Tags::Dynamic,
            18 => Tags::InvokeDynamic,
            19 => Tags::Module,
            20 => Tags::Package,
            _ => Tags::Unknown,
        }
    }
}

/// A `Fieldref`, `Methodref` or `InterfaceMethodref` entry: the owning class
/// plus the member's name-and-type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefInfo {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

/// A `NameAndType` entry: indices of the member name and descriptor strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameAndTypeInfo {
    pub name_index: u16,
    pub descriptor_index: u16,
}

/// One constant pool entry.
///
/// `Long` and `Double` take up two logical slots; the slot after them holds
/// [`CpInfo::Reserved`], as does index 0.
#[derive(Debug, Clone, PartialEq)]
pub enum CpInfo {
    /// Index 0 and the slot following a `Long` or `Double` entry.
    Reserved,
    /// The decoded text of a `CONSTANT_Utf8_info` structure.
    Utf8(String),
    /// A `CONSTANT_Integer_info`; the bytes are stored big-endian.
    Integer(i32),
    Float(f32),
    /**
     * **high_bytes, low_bytes**\
     *  The unsigned high_bytes and low_bytes items of the
     *  CONSTANT_Long_info structure together represent the value of the
     *  long constant ((long) high_bytes << 32) + low_bytes, where the bytes
     *  of each item are stored in big-endian (high byte first) order.
     */
    Long(i64),
    Double(f64),
    /// `CONSTANT_Class_info`: `name_index` points at the Utf8 binary name.
    Class { name_index: u16 },
    /// `CONSTANT_String_info`: `string_index` points at the Utf8 text.
    String { string_index: u16 },
    Fieldref(RefInfo),
    Methodref(RefInfo),
    InterfaceMethodref(RefInfo),
    NameAndType(NameAndTypeInfo),
    /// `CONSTANT_MethodHandle_info`: the kind of the handle and the entry
    /// it references.
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
}

impl CpInfo {
    /// Short kind name used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            CpInfo::Reserved => "Reserved",
            CpInfo::Utf8(_) => "Utf8",
            CpInfo::Integer(_) => "Integer",
            CpInfo::Float(_) => "Float",
            CpInfo::Long(_) => "Long",
            CpInfo::Double(_) => "Double",
            CpInfo::Class { .. } => "Class",
            CpInfo::String { .. } => "String",
            CpInfo::Fieldref(_) => "Fieldref",
            CpInfo::Methodref(_) => "Methodref",
            CpInfo::InterfaceMethodref(_) => "InterfaceMethodref",
            CpInfo::NameAndType(_) => "NameAndType",
            CpInfo::MethodHandle { .. } => "MethodHandle",
            CpInfo::MethodType { .. } => "MethodType",
            CpInfo::Dynamic { .. } => "Dynamic",
            CpInfo::InvokeDynamic { .. } => "InvokeDynamic",
            CpInfo::Module { .. } => "Module",
            CpInfo::Package { .. } => "Package",
        }
    }

    /// Whether `ldc`/`ldc_w` may push this entry.
    pub fn is_loadable(&self) -> bool {
        matches!(
            self,
            CpInfo::Integer(_)
                | CpInfo::Float(_)
                | CpInfo::String { .. }
                | CpInfo::Class { .. }
                | CpInfo::MethodHandle { .. }
                | CpInfo::MethodType { .. }
        )
    }

    fn read(reader: &mut Reader) -> Result<CpInfo, ClassError> {
        let offset = reader.position();
        let tag = reader.read_u1()?;
        let info = match Tags::from(tag) {
            Tags::Utf8 => {
                let length = reader.read_u2()?;
                let bytes = reader.read_bytes(length as usize)?;
                CpInfo::Utf8(String::from_utf8_lossy(&bytes).into_owned())
            }
            Tags::Integer => CpInfo::Integer(reader.read_u4()? as i32),
            Tags::Float => CpInfo::Float(f32::from_bits(reader.read_u4()?)),
            Tags::Long => CpInfo::Long(reader.read_u8()? as i64),
            Tags::Double => CpInfo::Double(f64::from_bits(reader.read_u8()?)),
            Tags::Class => CpInfo::Class {
                name_index: reader.read_u2()?,
            },
            Tags::String => CpInfo::String {
                string_index: reader.read_u2()?,
            },
            Tags::Fieldref => CpInfo::Fieldref(RefInfo {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            }),
            Tags::Methodref => CpInfo::Methodref(RefInfo {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            }),
            Tags::InterfaceMethodref => CpInfo::InterfaceMethodref(RefInfo {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            }),
            Tags::NameAndType => CpInfo::NameAndType(NameAndTypeInfo {
                name_index: reader.read_u2()?,
                descriptor_index: reader.read_u2()?,
            }),
            Tags::MethodHandle => CpInfo::MethodHandle {
                reference_kind: reader.read_u1()?,
                reference_index: reader.read_u2()?,
            },
            Tags::MethodType => CpInfo::MethodType {
                descriptor_index: reader.read_u2()?,
            },
            Tags::Dynamic => CpInfo::Dynamic {
                bootstrap_method_attr_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            Tags::InvokeDynamic => CpInfo::InvokeDynamic {
                bootstrap_method_attr_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            Tags::Module => CpInfo::Module {
                name_index: reader.read_u2()?,
            },
            Tags::Package => CpInfo::Package {
                name_index: reader.read_u2()?,
            },
            Tags::Unknown => return Err(ClassError::UnknownTag { tag, offset }),
        };
        Ok(info)
    }
}

/// The constant pool of one class.
///
/// The table is indexed from 1 to `constant_pool_count - 1`; index 0 is
/// reserved, and the slot following a `Long` or `Double` entry is reserved as
/// well.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstantPool {
    infos: Vec<CpInfo>,
}

impl ConstantPool {
    /// Reads `constant_pool_count` and then the entries it announces.
    pub fn read(reader: &mut Reader) -> Result<ConstantPool, ClassError> {
        let count = reader.read_u2()?;
        let mut infos = vec![CpInfo::Reserved];
        while (infos.len() as u16) < count {
            let info = CpInfo::read(reader)?;
            let two_slots = matches!(info, CpInfo::Long(_) | CpInfo::Double(_));
            infos.push(info);
            if two_slots {
                infos.push(CpInfo::Reserved);
            }
        }
        Ok(ConstantPool { infos })
    }

    /// Builds a pool from already decoded entries; slot 0 and the reserved
    /// slots after `Long`/`Double` must be present in `infos`.
    pub fn from_entries(infos: Vec<CpInfo>) -> ConstantPool {
        ConstantPool { infos }
    }

    /// Number of slots including the reserved ones.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.len() <= 1
    }

    pub fn get(&self, index: u16) -> Result<&CpInfo, ClassError> {
        self.infos
            .get(index as usize)
            .ok_or(ClassError::NotFound(index))
    }

    pub fn utf8(&self, index: u16) -> Result<&str, ClassError> {
        match self.get(index)? {
            CpInfo::Utf8(text) => Ok(text),
            other => Err(ClassError::WrongKind {
                index,
                expected: "Utf8",
                found: other.kind(),
            }),
        }
    }

    /// Any of the three `Ref` kinds.
    pub fn ref_entry(&self, index: u16) -> Result<RefInfo, ClassError> {
        match self.get(index)? {
            CpInfo::Fieldref(info) | CpInfo::Methodref(info) | CpInfo::InterfaceMethodref(info) => {
                Ok(*info)
            }
            other => Err(ClassError::WrongKind {
                index,
                expected: "Fieldref/Methodref/InterfaceMethodref",
                found: other.kind(),
            }),
        }
    }

    /// Returns the `name_index` of a `Class` entry.
    pub fn class(&self, index: u16) -> Result<u16, ClassError> {
        match self.get(index)? {
            CpInfo::Class { name_index } => Ok(*name_index),
            other => Err(ClassError::WrongKind {
                index,
                expected: "Class",
                found: other.kind(),
            }),
        }
    }

    /// Resolves a `Class` entry straight to the binary name it points at.
    pub fn class_name(&self, index: u16) -> Result<&str, ClassError> {
        let name_index = self.class(index)?;
        self.utf8(name_index)
    }

    pub fn name_and_type(&self, index: u16) -> Result<NameAndTypeInfo, ClassError> {
        match self.get(index)? {
            CpInfo::NameAndType(info) => Ok(*info),
            other => Err(ClassError::WrongKind {
                index,
                expected: "NameAndType",
                found: other.kind(),
            }),
        }
    }
}
