use crate::access_flags::{FieldAccessFlags, MethodAccessFlags};
use crate::attributes::{self, Attribute, Code};
use crate::constants::ConstantPool;
use crate::errors::ClassError;
use crate::reader::Reader;

/// The magic item identifying the class file format.
pub const MAGIC: u32 = 0xCAFEBABE;

/// [Fields](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#%5B%7B%22num%22%3A721%2C%22gen%22%3A0%7D%2C%7B%22name%22%3A%22XYZ%22%7D%2C72%2C564%2Cnull%5D)
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<Attribute>,
}

impl FieldInfo {
    fn read(reader: &mut Reader, pool: &ConstantPool) -> Result<FieldInfo, ClassError> {
        let access_flags = reader.read_u2()?;
        let name_index = reader.read_u2()?;
        let descriptor_index = reader.read_u2()?;
        let attributes_count = reader.read_u2()?;
        let attributes = attributes::read_attributes(reader, pool, attributes_count)?;
        Ok(FieldInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    pub fn is_static(&self) -> bool {
        FieldAccessFlags::AccStatic.is_set(self.access_flags)
    }

    /// Pool index of this field's `ConstantValue`, if it carries one.
    pub fn constant_value_index(&self) -> Option<u16> {
        self.attributes.iter().find_map(|attribute| match attribute {
            Attribute::ConstantValue {
                constantvalue_index,
            } => Some(*constantvalue_index),
            _ => None,
        })
    }
}

/// [Methods](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#%5B%7B%22num%22%3A777%2C%22gen%22%3A0%7D%2C%7B%22name%22%3A%22XYZ%22%7D%2C72%2C282%2Cnull%5D)
#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<Attribute>,
}

impl MethodInfo {
    fn read(reader: &mut Reader, pool: &ConstantPool) -> Result<MethodInfo, ClassError> {
        let access_flags = reader.read_u2()?;
        let name_index = reader.read_u2()?;
        let descriptor_index = reader.read_u2()?;
        let attributes_count = reader.read_u2()?;
        let attributes = attributes::read_attributes(reader, pool, attributes_count)?;
        Ok(MethodInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    pub fn is_static(&self) -> bool {
        MethodAccessFlags::AccStatic.is_set(self.access_flags)
    }

    pub fn is_native(&self) -> bool {
        MethodAccessFlags::AccNative.is_set(self.access_flags)
    }

    pub fn is_varargs(&self) -> bool {
        MethodAccessFlags::AccVarargs.is_set(self.access_flags)
    }

    /// The executable body, absent for `native` and `abstract` methods.
    pub fn code_attribute(&self) -> Option<&Code> {
        self.attributes.iter().find_map(|attribute| match attribute {
            Attribute::Code(code) => Some(code),
            _ => None,
        })
    }
}

/// A parsed class file, addressed by the binary name it was requested under.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    /// Binary name with `/` as the package separator.
    pub name: String,
    /**
     * **constant_pool**\
     *  The constant_pool is a table of structures representing various string
     *  constants, class and interface names, field names, and other constants
     *  that are referred to within the ClassFile structure and its
     *  substructures. The constant_pool table is indexed from 1 to
     *  constant_pool_count - 1.
     */
    pub constant_pool: ConstantPool,
    /**
     * **access_flags**\
     *  The value of the access_flags item is a mask of flags used to denote
     *  access permissions to and properties of this class or interface.
     */
    pub access_flags: u16,
    /**
     * **this_class**\
     *  The value of the this_class item must be a valid index into the
     *  constant_pool table. The constant_pool entry at that index must be a
     *  CONSTANT_Class_info structure representing the class or interface
     *  defined by this class file.
     */
    pub this_class: u16,
    /**
     * **super_class**\
     *  For a class, the value of the super_class item either must be zero or
     *  must be a valid index into the constant_pool table. If it is zero,
     *  this class file must represent the class Object.
     */
    pub super_class: u16,
    /**
     * **interfaces**\
     *  Each value in the interfaces array must be a valid index into the
     *  constant_pool table pointing at a CONSTANT_Class_info structure
     *  representing a direct superinterface, in the left-to-right order given
     *  in the source for the type.
     */
    pub interfaces: Vec<u16>,
    /**
     * **fields**\
     *  The field_info structures represent all fields, both class variables
     *  and instance variables, declared by this class or interface type. The
     *  fields table does not include items representing fields inherited
     *  from superclasses or superinterfaces.
     */
    pub fields: Vec<FieldInfo>,
    /**
     * **methods**\
     *  The method_info structures represent all methods declared by this
     *  class or interface type, including instance methods, class methods,
     *  instance initialization methods, and any class or interface
     *  initialization method.
     */
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// Decodes a class file.
    ///
    /// The minor/major version pair is not interpreted, only skipped. On any
    /// failure nothing is produced; a caller never sees a partial class.
    pub fn from_bytes(bytes: &[u8], name: &str) -> Result<ClassFile, ClassError> {
        let mut reader = Reader::new(bytes);
        let magic = reader.read_u4()?;
        if magic != MAGIC {
            return Err(ClassError::MalformedMagic(magic));
        }
        // minor_version, major_version
        reader.skip(4)?;
        let constant_pool = ConstantPool::read(&mut reader)?;
        let access_flags = reader.read_u2()?;
        let this_class = reader.read_u2()?;
        let super_class = reader.read_u2()?;
        let interfaces_count = reader.read_u2()?;
        let mut interfaces = Vec::with_capacity(interfaces_count as usize);
        for _ in 0..interfaces_count {
            interfaces.push(reader.read_u2()?);
        }
        let fields_count = reader.read_u2()?;
        let mut fields = Vec::with_capacity(fields_count as usize);
        for _ in 0..fields_count {
            fields.push(FieldInfo::read(&mut reader, &constant_pool)?);
        }
        let methods_count = reader.read_u2()?;
        let mut methods = Vec::with_capacity(methods_count as usize);
        for _ in 0..methods_count {
            methods.push(MethodInfo::read(&mut reader, &constant_pool)?);
        }
        let attributes_count = reader.read_u2()?;
        let attributes =
            attributes::read_attributes(&mut reader, &constant_pool, attributes_count)?;
        Ok(ClassFile {
            name: name.to_string(),
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    /// Finds a method by name and descriptor; the pair is the lookup key,
    /// name alone is never enough.
    pub fn method_index(&self, name: &str, descriptor: &str) -> Result<Option<usize>, ClassError> {
        for (index, method) in self.methods.iter().enumerate() {
            if self.constant_pool.utf8(method.name_index)? == name
                && self.constant_pool.utf8(method.descriptor_index)? == descriptor
            {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Result<Option<&MethodInfo>, ClassError> {
        Ok(self.method_index(name, descriptor)?.map(|i| &self.methods[i]))
    }

    /// The entry point: `public static void main(String[])`.
    pub fn main_method_index(&self) -> Result<Option<usize>, ClassError> {
        match self.method_index("main", "([Ljava/lang/String;)V")? {
            Some(index) if self.methods[index].is_static() => Ok(Some(index)),
            _ => Ok(None),
        }
    }

    /// Finds a field by name and descriptor.
    pub fn field(&self, name: &str, descriptor: &str) -> Result<Option<&FieldInfo>, ClassError> {
        for field in &self.fields {
            if self.constant_pool.utf8(field.name_index)? == name
                && self.constant_pool.utf8(field.descriptor_index)? == descriptor
            {
                return Ok(Some(field));
            }
        }
        Ok(None)
    }

    pub fn method_name(&self, method: &MethodInfo) -> Result<&str, ClassError> {
        self.constant_pool.utf8(method.name_index)
    }

    pub fn method_descriptor(&self, method: &MethodInfo) -> Result<&str, ClassError> {
        self.constant_pool.utf8(method.descriptor_index)
    }
}
