//! Host-side type descriptions.
//!
//! A [`TypeRef`] is the host (Rust) type written in a declaration, with
//! references stripped off into a [`PassModifier`] or [`ReturnModifier`].
//! The set is closed on purpose: anything that is not a primitive, `bool`
//! or text is carried verbatim as [`TypeRef::Named`] and crosses the
//! boundary unchanged unless a marshaller is registered for it.

use std::fmt::{self, Display, Formatter};

/// Fixed-width primitive types that are native-compatible as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
}

impl PrimitiveKind {
    /// Look up a primitive by its Rust keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "i8" => PrimitiveKind::I8,
            "i16" => PrimitiveKind::I16,
            "i32" => PrimitiveKind::I32,
            "i64" => PrimitiveKind::I64,
            "isize" => PrimitiveKind::Isize,
            "u8" => PrimitiveKind::U8,
            "u16" => PrimitiveKind::U16,
            "u32" => PrimitiveKind::U32,
            "u64" => PrimitiveKind::U64,
            "usize" => PrimitiveKind::Usize,
            "f32" => PrimitiveKind::F32,
            "f64" => PrimitiveKind::F64,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::Isize => "isize",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::Usize => "usize",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
        }
    }
}

/// A host type as written in a declaration, without reference modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// `()`, only meaningful as a return type.
    Unit,
    /// The host boolean.
    Bool,
    /// Host text: `&str` when passed in, `String` when produced.
    Text,
    /// A fixed-width primitive.
    Primitive(PrimitiveKind),
    /// Any other type, kept as its Rust path text (e.g. `crate::Vector3`).
    Named(String),
}

impl TypeRef {
    /// Classify a type path as written in source.
    ///
    /// `bool`, `str`/`String`, primitive keywords and `()` map onto their
    /// dedicated variants; everything else is [`TypeRef::Named`].
    pub fn from_path(path: &str) -> Self {
        let trimmed: String = path.split_whitespace().collect();
        match trimmed.as_str() {
            "" | "()" => TypeRef::Unit,
            "bool" => TypeRef::Bool,
            "str" | "String" | "std::string::String" | "::std::string::String" => TypeRef::Text,
            other => PrimitiveKind::from_keyword(other)
                .map(TypeRef::Primitive)
                .unwrap_or_else(|| TypeRef::Named(path.trim().to_string())),
        }
    }

    pub fn named(path: impl Into<String>) -> Self {
        TypeRef::Named(path.into())
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, TypeRef::Unit)
    }

    /// Simple (last path segment) name of a named type, if any.
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named(path) => {
                let base = path.split('<').next().unwrap_or(path);
                base.rsplit("::").next().map(str::trim)
            }
            _ => None,
        }
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Unit => write!(f, "()"),
            TypeRef::Bool => write!(f, "bool"),
            TypeRef::Text => write!(f, "text"),
            TypeRef::Primitive(kind) => write!(f, "{}", kind.keyword()),
            TypeRef::Named(path) => write!(f, "{}", path),
        }
    }
}

/// How a parameter is passed.
///
/// ```text
/// fn f(&self, a: i32)              // ByValue
/// fn f(&self, a: &Vector3)         // In  (read-only reference)
/// fn f(&self, a: &mut Vector3)     // Ref (read-write reference)
/// fn f(&self, #[sash(out)] a: &mut bool)   // Out (write-only)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PassModifier {
    #[default]
    ByValue,
    In,
    Ref,
    Out,
}

impl PassModifier {
    /// True when the native side receives the host value.
    pub fn flows_in(self) -> bool {
        !matches!(self, PassModifier::Out)
    }

    /// True when the native side writes a value back.
    pub fn flows_out(self) -> bool {
        matches!(self, PassModifier::Ref | PassModifier::Out)
    }

    pub fn is_reference(self) -> bool {
        !matches!(self, PassModifier::ByValue)
    }
}

impl Display for PassModifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PassModifier::ByValue => Ok(()),
            PassModifier::In => write!(f, "&"),
            PassModifier::Ref => write!(f, "&mut "),
            PassModifier::Out => write!(f, "out &mut "),
        }
    }
}

/// How a value is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReturnModifier {
    #[default]
    Value,
    /// `&mut T`
    ByRef,
    /// `&T`
    ByRefReadonly,
}

impl ReturnModifier {
    pub fn is_by_ref(self) -> bool {
        !matches!(self, ReturnModifier::Value)
    }
}
