use crate::constants::ConstantPool;
use crate::errors::ClassError;
use crate::reader::Reader;

/// One entry of a `Code` attribute's exception table.
///
/// The table is parsed and retained, but the runtime never delivers
/// exceptions; reaching a handler is reported as unsupported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

/// [Code attribute](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#%5B%7B%22num%22%3A793%2C%22gen%22%3A0%7D%2C%7B%22name%22%3A%22XYZ%22%7D%2C72%2C275%2Cnull%5D)
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    /**
     * **max_stack**\
     *  The value of the max_stack item gives the maximum depth of the
     *  operand stack of this method at any point during execution of the
     *  method.
     */
    pub max_stack: u16,
    /**
     * **max_locals**\
     *  The value of the max_locals item gives the number of local variables
     *  in the local variable array allocated upon invocation of this method,
     *  including the local variables used to pass parameters to the method
     *  on its invocation.
     */
    pub max_locals: u16,
    /**
     * **code**\
     *  The code array gives the actual bytes of code that implement the
     *  method.
     */
    pub code: Vec<u8>,
    /**
     * **exception_table**\
     *  Each entry in the exception_table array describes one exception
     *  handler in the code array. The order of the handlers is significant.
     */
    pub exception_table: Vec<ExceptionTableEntry>,
    /// A Code attribute can have any number of optional attributes
    /// associated with it.
    pub attributes: Vec<Attribute>,
}

impl Code {
    fn read(reader: &mut Reader, pool: &ConstantPool) -> Result<Code, ClassError> {
        let max_stack = reader.read_u2()?;
        let max_locals = reader.read_u2()?;
        let code_length = reader.read_u4()?;
        let code = reader.read_bytes(code_length as usize)?;
        let exception_table_length = reader.read_u2()?;
        let mut exception_table = Vec::with_capacity(exception_table_length as usize);
        for _ in 0..exception_table_length {
            exception_table.push(ExceptionTableEntry {
                start_pc: reader.read_u2()?,
                end_pc: reader.read_u2()?,
                handler_pc: reader.read_u2()?,
                catch_type: reader.read_u2()?,
            });
        }
        let attributes_count = reader.read_u2()?;
        let attributes = read_attributes(reader, pool, attributes_count)?;
        Ok(Code {
            max_stack,
            max_locals,
            code,
            exception_table,
            attributes,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumberEntry {
    pub start_pc: u16,
    pub line_number: u16,
}

/// Attributes the runtime recognizes; anything else is consumed by its
/// declared length and kept only by name.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Code(Code),
    LineNumberTable(Vec<LineNumberEntry>),
    SourceFile { sourcefile_index: u16 },
    ConstantValue { constantvalue_index: u16 },
    Unknown(String),
}

/// Reads `count` attributes, dispatching on the Utf8 name of each.
pub fn read_attributes(
    reader: &mut Reader,
    pool: &ConstantPool,
    count: u16,
) -> Result<Vec<Attribute>, ClassError> {
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        attributes.push(read_attribute(reader, pool)?);
    }
    Ok(attributes)
}

fn read_attribute(reader: &mut Reader, pool: &ConstantPool) -> Result<Attribute, ClassError> {
    let name_index = reader.read_u2()?;
    let length = reader.read_u4()?;
    let name = pool.utf8(name_index)?;
    let attribute = match name {
        "Code" => Attribute::Code(Code::read(reader, pool)?),
        "LineNumberTable" => {
            let entry_count = reader.read_u2()?;
            let mut entries = Vec::with_capacity(entry_count as usize);
            for _ in 0..entry_count {
                entries.push(LineNumberEntry {
                    start_pc: reader.read_u2()?,
                    line_number: reader.read_u2()?,
                });
            }
            Attribute::LineNumberTable(entries)
        }
        "SourceFile" => Attribute::SourceFile {
            sourcefile_index: reader.read_u2()?,
        },
        "ConstantValue" => Attribute::ConstantValue {
            constantvalue_index: reader.read_u2()?,
        },
        _ => {
            reader.skip(length as usize)?;
            Attribute::Unknown(name.to_string())
        }
    };
    Ok(attribute)
}
