use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

pub const MAX_PAGE_SIZE: u32 = 1000;
pub const MAX_CONTEXT_LINES: u32 = 50;
pub const MAX_IMPACTS_PER_FILE: u32 = 2000;
pub const MAX_GIT_OP_TIMEOUT_SECONDS: u32 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSize(NonZeroU32);

impl PageSize {
    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for PageSize {
    type Error = BoundsError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err(BoundsError::TooSmall);
        }
        if value > MAX_PAGE_SIZE {
            return Err(BoundsError::TooLarge);
        }
        Ok(PageSize(NonZeroU32::new(value).unwrap()))
    }
}

/// Number of lines of surrounding context shown on either side of a cited
/// line. Bounded so a pathological config
/// can't blow up a prompt with an entire file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContextLines(u32);

impl ContextLines {
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for ContextLines {
    fn default() -> Self {
        ContextLines(2)
    }
}

impl TryFrom<u32> for ContextLines {
    type Error = BoundsError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value > MAX_CONTEXT_LINES {
            return Err(BoundsError::TooLarge);
        }
        Ok(ContextLines(value))
    }
}

/// Cap on impacts attached to a single file's prompt section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MaxImpacts(NonZeroU32);

impl MaxImpacts {
    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for MaxImpacts {
    type Error = BoundsError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err(BoundsError::TooSmall);
        }
        if value > MAX_IMPACTS_PER_FILE {
            return Err(BoundsError::TooLarge);
        }
        Ok(MaxImpacts(NonZeroU32::new(value).unwrap()))
    }
}

/// Per-git-invocation wall clock budget, in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GitOpTimeoutSeconds(NonZeroU32);

impl GitOpTimeoutSeconds {
    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for GitOpTimeoutSeconds {
    type Error = BoundsError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err(BoundsError::TooSmall);
        }
        if value > MAX_GIT_OP_TIMEOUT_SECONDS {
            return Err(BoundsError::TooLarge);
        }
        Ok(GitOpTimeoutSeconds(NonZeroU32::new(value).unwrap()))
    }
}

#[derive(Debug, Clone)]
pub enum BoundsError {
    TooSmall,
    TooLarge,
}

impl std::fmt::Display for BoundsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundsError::TooSmall => write!(f, "value too small"),
            BoundsError::TooLarge => write!(f, "value too large"),
        }
    }
}

impl std::error::Error for BoundsError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cursor(String);

impl Cursor {
    pub fn initial() -> Self {
        Cursor(String::new())
    }

    pub fn get(&self) -> &str {
        &self.0
    }
}

impl From<String> for Cursor {
    fn from(data: String) -> Self {
        Cursor(data)
    }
}

impl AsRef<str> for Cursor {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
