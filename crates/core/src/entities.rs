#![forbid(unsafe_code)]

//! Read models decoded from stored documents. Decoding is lenient: the store
//! holds whatever older app revisions wrote, so unknown enum values and
//! missing fields degrade to defaults instead of failing.

use crate::day::same_calendar_day;
use crate::document::Document;
use crate::model::{
    Cycle, DeliveryStatus, LineItem, NoteType, OrderType, Priority, ProcedureColor, TaskStatus,
};
use serde_json::Value;
use time::UtcOffset;

pub const DEFAULT_ASSIGNEE: &str = "Equipo";

#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub id: String,
    pub text: String,
    pub assignee: String,
    pub priority: Option<Priority>,
    pub cycle: Cycle,
    pub branch: Option<String>,
    pub status: Option<TaskStatus>,
    pub last_done_ms: Option<i64>,
    pub created_by: Option<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: Option<i64>,
}

impl Task {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            text: string_field(doc, "text"),
            assignee: doc
                .str_field("assignee")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(DEFAULT_ASSIGNEE)
                .to_string(),
            priority: doc.str_field("priority").and_then(Priority::parse),
            cycle: Cycle::parse(doc.str_field("cycle")),
            branch: doc.branch().map(str::to_string),
            status: doc.str_field("status").and_then(TaskStatus::parse),
            last_done_ms: doc.i64_field("lastDone"),
            created_by: doc.str_field("createdBy").map(str::to_string),
            created_at_ms: doc.created_at_ms(),
            updated_at_ms: doc.updated_at_ms(),
        }
    }

    pub fn rank(&self) -> u8 {
        self.priority.map(Priority::rank).unwrap_or(Priority::UNKNOWN_RANK)
    }

    /// One-shot tasks are done when `status == done`. Recurring tasks are done
    /// when `lastDone` falls on the same calendar day as `now_ms`; their
    /// `status` is ignored here even if it was reset to pending today.
    pub fn is_done_at(&self, now_ms: i64, offset: UtcOffset) -> bool {
        if self.cycle.is_recurring() {
            return self
                .last_done_ms
                .is_some_and(|last_done| same_calendar_day(last_done, now_ms, offset));
        }
        self.status == Some(TaskStatus::Done)
    }

    /// The partial marker stays status-driven for every cycle.
    pub fn is_partial(&self) -> bool {
        self.status == Some(TaskStatus::Partial)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    pub id: String,
    pub requester: String,
    pub notes: String,
    pub items: Vec<LineItem>,
    pub order_type: OrderType,
    pub distributor: Option<String>,
    pub ticket: Option<String>,
    pub status: String,
    pub branch: Option<String>,
    pub created_at_ms: i64,
}

impl Order {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            requester: string_field(doc, "requester"),
            notes: string_field(doc, "notes"),
            items: items_field(doc),
            order_type: doc
                .str_field("orderType")
                .and_then(OrderType::parse)
                .unwrap_or_default(),
            distributor: non_empty_field(doc, "distributor"),
            ticket: non_empty_field(doc, "ticket"),
            status: doc.str_field("status").unwrap_or("pending").to_string(),
            branch: doc.branch().map(str::to_string),
            created_at_ms: doc.created_at_ms(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Delivery {
    pub id: String,
    pub client: String,
    pub phone: String,
    pub when: String,
    pub place: String,
    pub notes: String,
    pub items: Vec<LineItem>,
    pub salesperson: Option<String>,
    pub branch: Option<String>,
    pub status: DeliveryStatus,
    pub created_at_ms: i64,
}

impl Delivery {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            client: string_field(doc, "client"),
            phone: string_field(doc, "phone"),
            when: string_field(doc, "when"),
            place: string_field(doc, "where"),
            notes: string_field(doc, "notes"),
            items: items_field(doc),
            salesperson: non_empty_field(doc, "salesperson"),
            branch: doc.branch().map(str::to_string),
            status: doc
                .str_field("status")
                .and_then(DeliveryStatus::parse)
                .unwrap_or(DeliveryStatus::Pending),
            created_at_ms: doc.created_at_ms(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub id: String,
    pub note_type: NoteType,
    pub content: String,
    pub branch: Option<String>,
    pub created_at_ms: i64,
}

impl Note {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            note_type: doc
                .str_field("type")
                .and_then(NoteType::parse)
                .unwrap_or_default(),
            content: string_field(doc, "content"),
            branch: doc.branch().map(str::to_string),
            created_at_ms: doc.created_at_ms(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Procedure {
    pub id: String,
    pub title: String,
    pub steps: String,
    pub color: ProcedureColor,
}

impl Procedure {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            title: string_field(doc, "title"),
            steps: string_field(doc, "steps"),
            color: doc
                .str_field("color")
                .and_then(ProcedureColor::parse)
                .unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Script {
    pub id: String,
    pub title: String,
    pub content: String,
}

impl Script {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            title: string_field(doc, "title"),
            content: string_field(doc, "content"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StockItem {
    pub id: String,
    pub name: String,
}

impl StockItem {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            name: string_field(doc, "name"),
        }
    }
}

fn string_field(doc: &Document, key: &str) -> String {
    doc.str_field(key).unwrap_or_default().to_string()
}

fn non_empty_field(doc: &Document, key: &str) -> Option<String> {
    doc.str_field(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn items_field(doc: &Document) -> Vec<LineItem> {
    let Some(Value::Array(raw)) = doc.fields.get("items") else {
        return Vec::new();
    };
    raw.iter()
        .filter_map(|item| {
            let name = item.get("name")?.as_str()?;
            let amount = match item.get("amount") {
                Some(Value::String(amount)) => amount.clone(),
                Some(Value::Number(amount)) => amount.to_string(),
                _ => String::new(),
            };
            Some(LineItem::new(name, amount))
        })
        .collect()
}
