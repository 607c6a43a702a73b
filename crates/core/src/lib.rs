#![forbid(unsafe_code)]

pub mod day;
pub mod document;
pub mod drafts;
pub mod entities;
pub mod ids;
pub mod model;
pub mod ordering;

pub use document::{Document, Fields};
pub use drafts::{Draft, DraftWarning, ValidationError};
pub use ids::{BranchTag, Namespace};
pub use model::{BranchScope, EntityKind};
