#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// [Class Access Flags](https://docs.oracle.com/javase/specs/jvms/se17/jvms17.pdf#page=85)
pub enum ClassAccessFlags {
    /// Declared public; may be accessed from outside its package.
    AccPublic = 0x0001,
    /// Declared final; no subclasses allowed.
    AccFinal = 0x0010,
    /// Treat superclass methods specially when invoked by\
    /// the invokespecial instruction.
    AccSuper = 0x0020,
    /// Is an interface, not a class.
    AccInterface = 0x0200,
    /// Declared abstract; must not be instantiated.
    AccAbstract = 0x0400,
    /// Declared synthetic; not present in the source code.
    AccSynthetic = 0x1000,
    /// Declared as an annotation interface.
    AccAnnotation = 0x2000,
    /// Declared as an enum class.
    AccEnum = 0x4000,
    /// Is a module, not a class or interface.
    AccModule = 0x8000,
}

impl ClassAccessFlags {
    pub fn is_set(self, flags: u16) -> bool {
        flags & self as u16 != 0
    }

    /// Decodes a mask into the flags it has set; the loader logs the result
    /// when a class comes in.
    pub fn from_u16(value: u16) -> Vec<Self> {
        [
            ClassAccessFlags::AccPublic,
            ClassAccessFlags::AccFinal,
            ClassAccessFlags::AccSuper,
            ClassAccessFlags::AccInterface,
            ClassAccessFlags::AccAbstract,
            ClassAccessFlags::AccSynthetic,
            ClassAccessFlags::AccAnnotation,
            ClassAccessFlags::AccEnum,
            ClassAccessFlags::AccModule,
        ]
        .into_iter()
        .filter(|flag| flag.is_set(value))
        .collect()
    }
}

/// The field flag bits the runtime consults. The rest of the mask is kept
/// raw on [`FieldInfo`](crate::class_file::FieldInfo).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAccessFlags {
    /// Declared static; owned by the class, stored by the loader.
    AccStatic = 0x0008,
}

impl FieldAccessFlags {
    pub fn is_set(self, flags: u16) -> bool {
        flags & self as u16 != 0
    }
}

/// The method flag bits the runtime consults. The rest of the mask is kept
/// raw on [`MethodInfo`](crate::class_file::MethodInfo).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodAccessFlags {
    AccStatic = 0x0008,
    /// Declared with a variable number of arguments.
    AccVarargs = 0x0080,
    /// No bytecode body; dispatched to an intrinsic.
    AccNative = 0x0100,
}

impl MethodAccessFlags {
    pub fn is_set(self, flags: u16) -> bool {
        flags & self as u16 != 0
    }
}
