use std::fmt;

use crate::errors::ClassError;

/// [BaseType characters](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#%5B%7B%22num%22%3A677%2C%22gen%22%3A0%7D%2C%7B%22name%22%3A%22XYZ%22%7D%2C72%2C167%2Cnull%5D)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    /// `B`, 8-bit signed
    Byte,
    /// `C`, 16-bit unsigned
    Char,
    /// `D`, 64-bit float
    Double,
    /// `F`, 32-bit float
    Float,
    /// `I`, 32-bit signed
    Int,
    /// `J`, 64-bit signed
    Long,
    /// `S`, 16-bit signed
    Short,
    /// `Z`
    Boolean,
}

impl BaseType {
    fn from_byte(byte: u8) -> Option<BaseType> {
        match byte {
            b'B' => Some(BaseType::Byte),
            b'C' => Some(BaseType::Char),
            b'D' => Some(BaseType::Double),
            b'F' => Some(BaseType::Float),
            b'I' => Some(BaseType::Int),
            b'J' => Some(BaseType::Long),
            b'S' => Some(BaseType::Short),
            b'Z' => Some(BaseType::Boolean),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        }
    }
}

/// A parsed field descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDescriptor {
    Base(BaseType),
    /// Binary class name taken from between `L` and `;`.
    Object(String),
    /// Element descriptor of the array.
    Array(Box<FieldDescriptor>),
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDescriptor::Base(base) => write!(f, "{}", base.as_char()),
            FieldDescriptor::Object(name) => write!(f, "L{name};"),
            FieldDescriptor::Array(element) => write!(f, "[{element}"),
        }
    }
}

/// Return part of a method descriptor: a field descriptor or `V`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnDescriptor {
    Field(FieldDescriptor),
    Void,
}

impl fmt::Display for ReturnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnDescriptor::Field(field) => write!(f, "{field}"),
            ReturnDescriptor::Void => write!(f, "V"),
        }
    }
}

/// A parsed method descriptor: ordered parameters plus the return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub parameters: Vec<FieldDescriptor>,
    pub return_descriptor: ReturnDescriptor,
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for parameter in &self.parameters {
            write!(f, "{parameter}")?;
        }
        write!(f, "){}", self.return_descriptor)
    }
}

struct DescriptorReader<'a> {
    raw: &'a str,
    pos: usize,
}

impl<'a> DescriptorReader<'a> {
    fn new(raw: &'a str) -> DescriptorReader<'a> {
        DescriptorReader { raw, pos: 0 }
    }

    fn bad(&self) -> ClassError {
        ClassError::BadDescriptor(self.raw.to_string())
    }

    fn peek(&self) -> Option<u8> {
        self.raw.as_bytes().get(self.pos).copied()
    }

    fn next(&mut self) -> Result<u8, ClassError> {
        let byte = self.peek().ok_or_else(|| self.bad())?;
        self.pos += 1;
        Ok(byte)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.raw.len()
    }

    fn field(&mut self) -> Result<FieldDescriptor, ClassError> {
        let byte = self.next()?;
        if let Some(base) = BaseType::from_byte(byte) {
            return Ok(FieldDescriptor::Base(base));
        }
        match byte {
            b'L' => {
                let start = self.pos;
                loop {
                    match self.next()? {
                        b';' => break,
                        _ => continue,
                    }
                }
                let name = &self.raw[start..self.pos - 1];
                if name.is_empty() {
                    return Err(self.bad());
                }
                Ok(FieldDescriptor::Object(name.to_string()))
            }
            b'[' => Ok(FieldDescriptor::Array(Box::new(self.field()?))),
            _ => Err(self.bad()),
        }
    }
}

/// Parses a full field descriptor string, rejecting trailing characters.
pub fn parse_field_descriptor(raw: &str) -> Result<FieldDescriptor, ClassError> {
    let mut reader = DescriptorReader::new(raw);
    let descriptor = reader.field()?;
    if !reader.at_end() {
        return Err(reader.bad());
    }
    Ok(descriptor)
}

/// Parses a full method descriptor string, e.g. `(I[BLjava/lang/String;)V`.
pub fn parse_method_descriptor(raw: &str) -> Result<MethodDescriptor, ClassError> {
    let mut reader = DescriptorReader::new(raw);
    if reader.next()? != b'(' {
        return Err(reader.bad());
    }
    let mut parameters = Vec::new();
    loop {
        match reader.peek() {
            Some(b')') => {
                reader.next()?;
                break;
            }
            Some(_) => parameters.push(reader.field()?),
            None => return Err(reader.bad()),
        }
    }
    let return_descriptor = match reader.peek() {
        Some(b'V') => {
            reader.next()?;
            ReturnDescriptor::Void
        }
        Some(_) => ReturnDescriptor::Field(reader.field()?),
        None => return Err(reader.bad()),
    };
    if !reader.at_end() {
        return Err(reader.bad());
    }
    Ok(MethodDescriptor {
        parameters,
        return_descriptor,
    })
}
