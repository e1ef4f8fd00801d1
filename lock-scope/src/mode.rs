use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::error::LockError;

/// The two ways a scope can hold the lock.
///
/// There is no default and no "undefined" variant. Foreign representations
/// (integers, strings) go through the `TryFrom`/`FromStr` impls below, which
/// reject anything outside the set with [`LockError::InvalidMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// Shared hold. Any number of `Read` scopes may be live at once.
    Read,
    /// Exclusive hold. Excludes every other scope of either mode.
    Write,
}

impl LockMode {
    /// Integer code for `Read`. `0` is reserved and never valid.
    pub const READ_CODE: i32 = 1;
    /// Integer code for `Write`.
    pub const WRITE_CODE: i32 = 2;

    #[inline]
    pub fn is_read(self) -> bool {
        matches!(self, LockMode::Read)
    }

    #[inline]
    pub fn is_write(self) -> bool {
        matches!(self, LockMode::Write)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LockMode::Read => "read",
            LockMode::Write => "write",
        }
    }

    pub fn code(self) -> i32 {
        match self {
            LockMode::Read => Self::READ_CODE,
            LockMode::Write => Self::WRITE_CODE,
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Validating boundaries ---

impl TryFrom<i32> for LockMode {
    type Error = LockError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            Self::READ_CODE => Ok(LockMode::Read),
            Self::WRITE_CODE => Ok(LockMode::Write),
            other => Err(LockError::InvalidMode {
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<u8> for LockMode {
    type Error = LockError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        LockMode::try_from(i32::from(code))
    }
}

impl FromStr for LockMode {
    type Err = LockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if ["read", "reader", "shared"]
            .iter()
            .any(|name| trimmed.eq_ignore_ascii_case(name))
        {
            Ok(LockMode::Read)
        } else if ["write", "writer", "exclusive"]
            .iter()
            .any(|name| trimmed.eq_ignore_ascii_case(name))
        {
            Ok(LockMode::Write)
        } else {
            Err(LockError::InvalidMode {
                value: s.to_owned(),
            })
        }
    }
}

impl TryFrom<&str> for LockMode {
    type Error = LockError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// `LockMode: TryInto<LockMode>` goes through the blanket impl with
// `Error = Infallible`; this lets callers pass a plain `LockMode` wherever a
// validated conversion is accepted.
impl From<Infallible> for LockError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
