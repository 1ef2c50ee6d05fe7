use std::fmt;

/// Wire kind of a record field.
///
/// Unsuffixed integer kinds are big-endian, which is the network order used
/// by the telemetry protocols this crate targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Unsigned 8-bit integer.
    Byte,
    /// Unsigned 16-bit integer, big-endian.
    Word,
    /// Unsigned 32-bit integer, big-endian.
    Dword,
    /// Unsigned 64-bit integer, big-endian.
    Qword,
    /// Unsigned 16-bit integer, little-endian.
    WordLe,
    /// Unsigned 32-bit integer, little-endian.
    DwordLe,
    /// Unsigned 64-bit integer, little-endian.
    QwordLe,
    /// Raw byte array.
    Bytes,
    /// Packed BCD digits, two per byte.
    Bcd8421,
    /// Text, NUL-padded when fixed-width.
    String,
    /// Single nested record.
    Obj,
    /// Repeated nested record.
    List,
}

impl DataType {
    /// Byte length used when a field does not declare one.
    ///
    /// `None` means the kind is variable-width: scalars consume the rest of
    /// the buffer, composites consume whatever the nested schema reads.
    pub fn canonical_len(self) -> Option<usize> {
        match self {
            DataType::Byte => Some(1),
            DataType::Word | DataType::WordLe => Some(2),
            DataType::Dword | DataType::DwordLe => Some(4),
            DataType::Qword | DataType::QwordLe => Some(8),
            DataType::Bytes
            | DataType::Bcd8421
            | DataType::String
            | DataType::Obj
            | DataType::List => None,
        }
    }

    pub fn is_composite(self) -> bool {
        matches!(self, DataType::Obj | DataType::List)
    }

    pub fn is_integer(self) -> bool {
        self.canonical_len().is_some()
    }

    pub fn type_name(self) -> &'static str {
        match self {
            DataType::Byte => "byte",
            DataType::Word => "word",
            DataType::Dword => "dword",
            DataType::Qword => "qword",
            DataType::WordLe => "word_le",
            DataType::DwordLe => "dword_le",
            DataType::QwordLe => "qword_le",
            DataType::Bytes => "bytes",
            DataType::Bcd8421 => "bcd8421",
            DataType::String => "string",
            DataType::Obj => "obj",
            DataType::List => "list",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
