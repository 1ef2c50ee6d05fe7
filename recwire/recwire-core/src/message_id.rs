use std::{borrow::Cow, convert::Infallible, fmt, str::FromStr};

/// Protocol-level identifier that selects which record type decodes a body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageId {
    /// Numeric message code, e.g. `0x0200`.
    Code(u32),
    /// Symbolic message name.
    Name(Cow<'static, str>),
}

impl MessageId {
    pub const fn code(code: u32) -> Self {
        Self::Code(code)
    }

    pub const fn name(name: &'static str) -> Self {
        Self::Name(Cow::Borrowed(name))
    }
}

impl From<u32> for MessageId {
    fn from(code: u32) -> Self {
        Self::Code(code)
    }
}

impl From<&'static str> for MessageId {
    fn from(name: &'static str) -> Self {
        Self::name(name)
    }
}

impl From<String> for MessageId {
    fn from(name: String) -> Self {
        Self::Name(Cow::Owned(name))
    }
}

/// Parses `0x`-prefixed hex and plain decimal as [`MessageId::Code`];
/// anything else becomes a [`MessageId::Name`].
impl FromStr for MessageId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let code = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => s.parse::<u32>().ok(),
        };
        Ok(code.map_or_else(|| Self::from(s.to_string()), Self::Code))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "0x{code:04X}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}
