//! Access flags and helpers for querying them

pub mod access_flags {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    pub const ACC_SUPER: u16 = 0x0020;
    pub const ACC_SYNCHRONIZED: u16 = 0x0020;
    pub const ACC_VOLATILE: u16 = 0x0040;
    pub const ACC_BRIDGE: u16 = 0x0040;
    pub const ACC_TRANSIENT: u16 = 0x0080;
    pub const ACC_VARARGS: u16 = 0x0080;
    pub const ACC_NATIVE: u16 = 0x0100;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
    pub const ACC_STRICT: u16 = 0x0800;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
    pub const ACC_ANNOTATION: u16 = 0x2000;
    pub const ACC_ENUM: u16 = 0x4000;
}

use access_flags::*;

/// Queries over a raw `access_flags` value
pub trait Access: Copy {
    fn bits(self) -> u16;

    fn is_public(self) -> bool { self.bits() & ACC_PUBLIC != 0 }
    fn is_private(self) -> bool { self.bits() & ACC_PRIVATE != 0 }
    fn is_protected(self) -> bool { self.bits() & ACC_PROTECTED != 0 }
    fn is_static(self) -> bool { self.bits() & ACC_STATIC != 0 }
    fn is_final(self) -> bool { self.bits() & ACC_FINAL != 0 }
    fn is_interface(self) -> bool { self.bits() & ACC_INTERFACE != 0 }
    fn is_abstract(self) -> bool { self.bits() & ACC_ABSTRACT != 0 }
    fn is_synthetic(self) -> bool { self.bits() & ACC_SYNTHETIC != 0 }
    fn is_annotation(self) -> bool { self.bits() & ACC_ANNOTATION != 0 }
}

impl Access for u16 {
    fn bits(self) -> u16 { self }
}

/// Clear private/protected and set public
pub fn make_public(access: u16) -> u16 {
    (access & !(ACC_PRIVATE | ACC_PROTECTED)) | ACC_PUBLIC
}
