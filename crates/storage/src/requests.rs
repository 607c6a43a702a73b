#![forbid(unsafe_code)]

use jd_core::Fields;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum QueryOrder {
    /// Subscription order: `createdAt` descending, later inserts first on ties.
    #[default]
    CreatedDesc,
    /// Ascending by a string field; documents without it sort first.
    FieldAsc(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    pub collection: String,
    pub order: QueryOrder,
    pub limit: Option<usize>,
}

impl Query {
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            order: QueryOrder::CreatedDesc,
            limit: None,
        }
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order = QueryOrder::FieldAsc(field.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BatchOp {
    Insert { collection: String, fields: Fields },
    Delete { collection: String, id: String },
}

impl BatchOp {
    pub fn collection(&self) -> &str {
        match self {
            Self::Insert { collection, .. } | Self::Delete { collection, .. } => collection,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub chunks_committed: usize,
    pub ops_committed: usize,
    /// Ids of inserted documents, in op order.
    pub inserted_ids: Vec<String>,
}
