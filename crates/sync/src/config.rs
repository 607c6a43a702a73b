#![forbid(unsafe_code)]

//! Startup configuration: environment first, command-line flags override.

use jd_core::ids::{BranchTagError, NamespaceError};
use jd_core::model::BranchScope;
use jd_core::{BranchTag, EntityKind, Namespace};
use std::path::PathBuf;
use time::UtcOffset;

pub const DEFAULT_STORAGE_DIR: &str = ".jardin";
pub const DEFAULT_BATCH_SIZE: usize = 400;
pub const MAX_BATCH_SIZE: usize = 500;

#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub storage_dir: PathBuf,
    pub namespace: Namespace,
    /// Overrides the persisted branch preference when set.
    pub branch: Option<BranchTag>,
    pub utc_offset: UtcOffset,
    pub batch_size: usize,
    /// Collections exported by backups in addition to the tracked kinds.
    pub extra_collections: Vec<String>,
    pub filter_shared: bool,
    pub token: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            namespace: Namespace::default(),
            branch: None,
            utc_offset: UtcOffset::UTC,
            batch_size: DEFAULT_BATCH_SIZE,
            extra_collections: Vec::new(),
            filter_shared: false,
            token: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingValue(&'static str),
    InvalidNumber { name: &'static str, value: String },
    UtcOffsetOutOfRange(i32),
    BatchSizeOutOfRange(usize),
    InvalidNamespace(NamespaceError),
    InvalidBranch(BranchTagError),
    UnknownFlag(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingValue(flag) => write!(f, "{flag} requires a value"),
            Self::InvalidNumber { name, value } => write!(f, "{name} must be an integer (got {value:?})"),
            Self::UtcOffsetOutOfRange(minutes) => write!(f, "utc offset out of range: {minutes} minutes"),
            Self::BatchSizeOutOfRange(size) => {
                write!(f, "batch size must be between 1 and {MAX_BATCH_SIZE} (got {size})")
            }
            Self::InvalidNamespace(err) => write!(f, "invalid namespace: {err}"),
            Self::InvalidBranch(err) => write!(f, "invalid branch: {err}"),
            Self::UnknownFlag(flag) => write!(f, "unknown flag: {flag}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidNamespace(err) => Some(err),
            Self::InvalidBranch(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NamespaceError> for ConfigError {
    fn from(value: NamespaceError) -> Self {
        Self::InvalidNamespace(value)
    }
}

impl From<BranchTagError> for ConfigError {
    fn from(value: BranchTagError) -> Self {
        Self::InvalidBranch(value)
    }
}

pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl SyncConfig {
    /// Resolves from the process environment and `args` (without the program
    /// name). Returns the config and the remaining positional arguments.
    pub fn from_env_and_args(args: &[String]) -> Result<(Self, Vec<String>), ConfigError> {
        Self::resolve(args, env_var)
    }

    pub fn resolve(
        args: &[String],
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<(Self, Vec<String>), ConfigError> {
        let mut storage_dir = env("JD_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR));
        let mut namespace = env("JD_NAMESPACE");
        let mut branch = env("JD_BRANCH");
        let mut offset_min = match env("JD_UTC_OFFSET_MIN") {
            Some(v) => parse_number::<i32>("JD_UTC_OFFSET_MIN", &v)?,
            None => 0,
        };
        let mut batch_size = match env("JD_BATCH_SIZE") {
            Some(v) => parse_number::<usize>("JD_BATCH_SIZE", &v)?,
            None => DEFAULT_BATCH_SIZE,
        };
        let extra_collections = env("JD_EXTRA_COLLECTIONS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        let mut filter_shared = env("JD_FILTER_SHARED").is_some_and(|v| is_truthy(&v));
        let mut token = env("JD_TOKEN");
        let mut rest = Vec::new();

        let mut i = 0usize;
        while i < args.len() {
            let a = args[i].as_str();
            match a {
                "--storage-dir" => {
                    i += 1;
                    let v = args.get(i).ok_or(ConfigError::MissingValue("--storage-dir"))?;
                    storage_dir = PathBuf::from(v);
                }
                "--namespace" => {
                    i += 1;
                    let v = args.get(i).ok_or(ConfigError::MissingValue("--namespace"))?;
                    namespace = Some(v.to_string());
                }
                "--branch" => {
                    i += 1;
                    let v = args.get(i).ok_or(ConfigError::MissingValue("--branch"))?;
                    branch = Some(v.to_string());
                }
                "--utc-offset-min" => {
                    i += 1;
                    let v = args.get(i).ok_or(ConfigError::MissingValue("--utc-offset-min"))?;
                    offset_min = parse_number::<i32>("--utc-offset-min", v)?;
                }
                "--batch-size" => {
                    i += 1;
                    let v = args.get(i).ok_or(ConfigError::MissingValue("--batch-size"))?;
                    batch_size = parse_number::<usize>("--batch-size", v)?;
                }
                "--token" => {
                    i += 1;
                    let v = args.get(i).ok_or(ConfigError::MissingValue("--token"))?;
                    token = Some(v.to_string());
                }
                "--filter-shared" => filter_shared = true,
                flag if flag.starts_with("--") => return Err(ConfigError::UnknownFlag(flag.to_string())),
                positional => rest.push(positional.to_string()),
            }
            i += 1;
        }

        if batch_size == 0 || batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::BatchSizeOutOfRange(batch_size));
        }
        let utc_offset = jd_core::day::offset_from_minutes(offset_min)
            .ok_or(ConfigError::UtcOffsetOutOfRange(offset_min))?;
        let namespace = match namespace {
            Some(raw) => Namespace::try_new(raw)?,
            None => Namespace::default(),
        };
        let branch = branch.map(BranchTag::try_new).transpose()?;

        Ok((
            Self {
                storage_dir,
                namespace,
                branch,
                utc_offset,
                batch_size,
                extra_collections,
                filter_shared,
                token,
            },
            rest,
        ))
    }

    /// Effective branch scope of `kind` under this config.
    pub fn scope_of(&self, kind: EntityKind) -> BranchScope {
        effective_scope(kind, self.filter_shared)
    }
}

pub(crate) fn effective_scope(kind: EntityKind, filter_shared: bool) -> BranchScope {
    match kind.branch_scope() {
        BranchScope::Shared if filter_shared => BranchScope::Filtered,
        scope => scope,
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidNumber {
        name,
        value: value.to_string(),
    })
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
