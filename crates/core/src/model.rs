#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Task,
    Note,
    Order,
    Delivery,
    Procedure,
    Script,
    Stock,
}

/// How a kind relates to the active branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchScope {
    /// Only documents tagged with the active branch are delivered.
    Filtered,
    /// Tagged with the branch that created them, visible from every branch.
    Shared,
    /// Never tagged.
    Global,
}

impl EntityKind {
    /// Kinds the dashboard keeps a live subscription for, in render order.
    pub const TRACKED: [EntityKind; 6] = [
        EntityKind::Task,
        EntityKind::Note,
        EntityKind::Order,
        EntityKind::Delivery,
        EntityKind::Procedure,
        EntityKind::Script,
    ];

    pub fn collection(self) -> &'static str {
        match self {
            Self::Task => "tasks",
            Self::Note => "notes",
            Self::Order => "orders",
            Self::Delivery => "deliveries",
            Self::Procedure => "procedures",
            Self::Script => "scripts",
            Self::Stock => "stock",
        }
    }

    pub fn from_collection(value: &str) -> Option<Self> {
        match value.trim() {
            "tasks" => Some(Self::Task),
            "notes" => Some(Self::Note),
            "orders" => Some(Self::Order),
            "deliveries" | "delivery" => Some(Self::Delivery),
            "procedures" => Some(Self::Procedure),
            "scripts" => Some(Self::Script),
            "stock" => Some(Self::Stock),
            _ => None,
        }
    }

    pub fn branch_scope(self) -> BranchScope {
        match self {
            Self::Task | Self::Note | Self::Delivery => BranchScope::Filtered,
            Self::Order => BranchScope::Shared,
            Self::Procedure | Self::Script | Self::Stock => BranchScope::Global,
        }
    }

    pub fn carries_branch(self) -> bool {
        !matches!(self.branch_scope(), BranchScope::Global)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Rank given to missing or unrecognised priorities; sorts after `Low`.
    pub const UNKNOWN_RANK: u8 = 4;

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    pub fn rank_of(value: Option<&str>) -> u8 {
        value
            .and_then(Self::parse)
            .map(Self::rank)
            .unwrap_or(Self::UNKNOWN_RANK)
    }
}

/// Recurrence class. The value space is open: anything but `none` is recurring.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Cycle {
    None,
    Recurring(String),
}

impl Cycle {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some("none") => Self::None,
            Some(other) => Self::Recurring(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Recurring(value) => value,
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, Self::Recurring(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Partial,
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Done => "done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "pending" => Some(Self::Pending),
            "partial" => Some(Self::Partial),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Done,
    Incomplete,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Incomplete => "incomplete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "pending" => Some(Self::Pending),
            "done" => Some(Self::Done),
            "incomplete" => Some(Self::Incomplete),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[default]
    InternalCenterToBranch,
    InternalBranchToCenter,
    Distributor,
}

impl OrderType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InternalCenterToBranch => "internal_center_to_branch",
            Self::InternalBranchToCenter => "internal_branch_to_center",
            Self::Distributor => "distributor",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "internal_center_to_branch" => Some(Self::InternalCenterToBranch),
            "internal_branch_to_center" => Some(Self::InternalBranchToCenter),
            "distributor" => Some(Self::Distributor),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    #[default]
    Plain,
    Cart,
}

impl NoteType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Cart => "cart",
        }
    }

    /// `billing` is the older name of the cart variant.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "plain" | "note" => Some(Self::Plain),
            "cart" | "billing" => Some(Self::Cart),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureColor {
    #[default]
    Blue,
    Green,
    Red,
    Purple,
    Pink,
    Teal,
    Slate,
}

impl ProcedureColor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Red => "red",
            Self::Purple => "purple",
            Self::Pink => "pink",
            Self::Teal => "teal",
            Self::Slate => "slate",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "blue" => Some(Self::Blue),
            "green" => Some(Self::Green),
            "red" => Some(Self::Red),
            "purple" => Some(Self::Purple),
            "pink" => Some(Self::Pink),
            "teal" => Some(Self::Teal),
            "slate" => Some(Self::Slate),
            _ => None,
        }
    }
}

/// One row of an order or delivery. `amount` is free text ("2", "1 caja").
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    #[serde(default)]
    pub amount: String,
}

impl LineItem {
    pub fn new(name: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount: amount.into(),
        }
    }
}
