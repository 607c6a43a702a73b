#![forbid(unsafe_code)]

pub const DEFAULT_NAMESPACE: &str = "jardin-os-v8";
pub const DEFAULT_BRANCH: &str = "centro";

/// Root namespace every collection lives under.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, NamespaceError> {
        let value = value.into();
        validate_namespace(&value)?;
        Ok(Self(value))
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self(DEFAULT_NAMESPACE.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NamespaceError {
    Empty,
    TooLong,
    InvalidFirstChar,
    InvalidChar { ch: char, index: usize },
}

impl std::fmt::Display for NamespaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "namespace must not be empty"),
            Self::TooLong => write!(f, "namespace is too long"),
            Self::InvalidFirstChar => write!(f, "namespace must start with an ascii letter or digit"),
            Self::InvalidChar { ch, index } => {
                write!(f, "namespace contains invalid char {ch:?} at {index}")
            }
        }
    }
}

impl std::error::Error for NamespaceError {}

fn validate_namespace(value: &str) -> Result<(), NamespaceError> {
    if value.is_empty() {
        return Err(NamespaceError::Empty);
    }
    if value.len() > 128 {
        return Err(NamespaceError::TooLong);
    }
    let Some(first) = value.chars().next() else {
        return Err(NamespaceError::Empty);
    };
    if !first.is_ascii_alphanumeric() {
        return Err(NamespaceError::InvalidFirstChar);
    }
    for (index, ch) in value.chars().enumerate().skip(1) {
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            continue;
        }
        return Err(NamespaceError::InvalidChar { ch, index });
    }
    Ok(())
}

/// A physical business location. Branch-scoped documents carry it in their
/// `branch` field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BranchTag(String);

impl BranchTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, BranchTagError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(BranchTagError::Empty);
        }
        if trimmed.len() > 64 {
            return Err(BranchTagError::TooLong);
        }
        if trimmed.chars().any(|c| c.is_control()) {
            return Err(BranchTagError::ContainsControl);
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl Default for BranchTag {
    fn default() -> Self {
        Self(DEFAULT_BRANCH.to_string())
    }
}

impl std::fmt::Display for BranchTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BranchTagError {
    Empty,
    TooLong,
    ContainsControl,
}

impl std::fmt::Display for BranchTagError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "branch must not be empty"),
            Self::TooLong => write!(f, "branch is too long"),
            Self::ContainsControl => write!(f, "branch contains control characters"),
        }
    }
}

impl std::error::Error for BranchTagError {}
