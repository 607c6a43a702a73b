#![forbid(unsafe_code)]

//! Form input for each entity kind, validated before anything reaches the
//! store. Every draft trims its text fields; `to_fields` yields exactly the
//! user-editable fields (status, branch and audit fields are added by the
//! lifecycle controller).

use crate::document::Fields;
use crate::entities::DEFAULT_ASSIGNEE;
use crate::model::{
    Cycle, EntityKind, LineItem, NoteType, OrderType, Priority, ProcedureColor,
};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub problem: &'static str,
}

impl ValidationError {
    pub fn missing(field: &'static str) -> Self {
        Self {
            field,
            problem: "is required",
        }
    }

    pub fn invalid(field: &'static str, problem: &'static str) -> Self {
        Self { field, problem }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.problem)
    }
}

impl std::error::Error for ValidationError {}

/// Accepted but worth surfacing to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftWarning {
    DistributorMissing,
}

impl DraftWarning {
    pub fn message(self) -> &'static str {
        match self {
            Self::DistributorMissing => "distributor order without a distributor name",
        }
    }
}

pub trait Draft {
    const KIND: EntityKind;

    /// Validates and returns the normalized field map. The first failing
    /// field wins.
    fn to_fields(&self) -> Result<Fields, ValidationError>;

    fn warnings(&self) -> Vec<DraftWarning> {
        Vec::new()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub text: String,
    pub assignee: String,
    pub priority: String,
    pub cycle: String,
}

impl Draft for TaskDraft {
    const KIND: EntityKind = EntityKind::Task;

    fn to_fields(&self) -> Result<Fields, ValidationError> {
        let text = required(&self.text, "text")?;
        let priority = match self.priority.trim() {
            "" => Priority::Medium,
            raw => Priority::parse(raw)
                .ok_or(ValidationError::invalid("priority", "must be critical, high, medium or low"))?,
        };
        let assignee = match self.assignee.trim() {
            "" => DEFAULT_ASSIGNEE,
            assignee => assignee,
        };
        let cycle = Cycle::parse(Some(self.cycle.as_str()));

        let mut fields = Fields::new();
        put_str(&mut fields, "text", text);
        put_str(&mut fields, "assignee", assignee);
        put_str(&mut fields, "priority", priority.as_str());
        put_str(&mut fields, "cycle", cycle.as_str());
        Ok(fields)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderDraft {
    pub requester: String,
    pub notes: String,
    pub items: Vec<LineItem>,
    pub order_type: String,
    pub distributor: String,
    pub ticket: String,
}

impl OrderDraft {
    fn parsed_type(&self) -> Result<OrderType, ValidationError> {
        match self.order_type.trim() {
            "" => Ok(OrderType::default()),
            raw => OrderType::parse(raw).ok_or(ValidationError::invalid(
                "orderType",
                "must be internal_center_to_branch, internal_branch_to_center or distributor",
            )),
        }
    }
}

impl Draft for OrderDraft {
    const KIND: EntityKind = EntityKind::Order;

    fn to_fields(&self) -> Result<Fields, ValidationError> {
        let items = kept_items(&self.items);
        if items.is_empty() {
            return Err(ValidationError::invalid("items", "needs at least one product"));
        }
        let requester = required(&self.requester, "requester")?;
        let order_type = self.parsed_type()?;

        let mut fields = Fields::new();
        put_str(&mut fields, "requester", requester);
        put_str(&mut fields, "notes", self.notes.trim());
        fields.insert("items".to_string(), items_value(&items));
        put_str(&mut fields, "orderType", order_type.as_str());
        put_str(&mut fields, "distributor", self.distributor.trim());
        put_str(&mut fields, "ticket", self.ticket.trim());
        Ok(fields)
    }

    fn warnings(&self) -> Vec<DraftWarning> {
        let mut out = Vec::new();
        if matches!(self.parsed_type(), Ok(OrderType::Distributor))
            && self.distributor.trim().is_empty()
        {
            out.push(DraftWarning::DistributorMissing);
        }
        out
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeliveryDraft {
    pub client: String,
    pub phone: String,
    pub when: String,
    pub place: String,
    pub notes: String,
    pub items: Vec<LineItem>,
    pub salesperson: String,
}

impl Draft for DeliveryDraft {
    const KIND: EntityKind = EntityKind::Delivery;

    fn to_fields(&self) -> Result<Fields, ValidationError> {
        let client = required(&self.client, "client")?;
        let place = required(&self.place, "where")?;

        let mut fields = Fields::new();
        put_str(&mut fields, "client", client);
        put_str(&mut fields, "phone", self.phone.trim());
        put_str(&mut fields, "when", self.when.trim());
        put_str(&mut fields, "where", place);
        put_str(&mut fields, "notes", self.notes.trim());
        fields.insert("items".to_string(), items_value(&kept_items(&self.items)));
        put_str(&mut fields, "salesperson", self.salesperson.trim());
        Ok(fields)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub note_type: String,
    pub content: String,
}

impl Draft for NoteDraft {
    const KIND: EntityKind = EntityKind::Note;

    fn to_fields(&self) -> Result<Fields, ValidationError> {
        let content = required(&self.content, "content")?;
        let note_type = match self.note_type.trim() {
            "" => NoteType::default(),
            raw => NoteType::parse(raw).ok_or(ValidationError::invalid("type", "must be plain or cart"))?,
        };

        let mut fields = Fields::new();
        put_str(&mut fields, "type", note_type.as_str());
        put_str(&mut fields, "content", content);
        Ok(fields)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcedureDraft {
    pub title: String,
    pub steps: String,
    pub color: String,
}

impl Draft for ProcedureDraft {
    const KIND: EntityKind = EntityKind::Procedure;

    fn to_fields(&self) -> Result<Fields, ValidationError> {
        let title = required(&self.title, "title")?;
        let color = match self.color.trim() {
            "" => ProcedureColor::default(),
            raw => ProcedureColor::parse(raw)
                .ok_or(ValidationError::invalid("color", "is not a known color"))?,
        };

        let mut fields = Fields::new();
        put_str(&mut fields, "title", title);
        put_str(&mut fields, "steps", self.steps.trim());
        put_str(&mut fields, "color", color.as_str());
        Ok(fields)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptDraft {
    pub title: String,
    pub content: String,
}

impl Draft for ScriptDraft {
    const KIND: EntityKind = EntityKind::Script;

    fn to_fields(&self) -> Result<Fields, ValidationError> {
        let title = required(&self.title, "title")?;

        let mut fields = Fields::new();
        put_str(&mut fields, "title", title);
        put_str(&mut fields, "content", self.content.trim());
        Ok(fields)
    }
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::missing(field));
    }
    Ok(trimmed)
}

fn put_str(fields: &mut Fields, key: &str, value: &str) {
    fields.insert(key.to_string(), Value::String(value.to_string()));
}

/// Rows with a blank name are dropped, as the item editor leaves an empty row
/// at the bottom.
fn kept_items(items: &[LineItem]) -> Vec<LineItem> {
    items
        .iter()
        .filter(|item| !item.name.trim().is_empty())
        .map(|item| LineItem::new(item.name.trim(), item.amount.trim()))
        .collect()
}

fn items_value(items: &[LineItem]) -> Value {
    Value::Array(
        items
            .iter()
            .map(|item| {
                let mut row = Fields::new();
                put_str(&mut row, "name", &item.name);
                put_str(&mut row, "amount", &item.amount);
                Value::Object(row)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_draft_requires_text_and_fills_defaults() {
        let err = TaskDraft::default().to_fields().unwrap_err();
        assert_eq!(err, ValidationError::missing("text"));

        let fields = TaskDraft {
            text: "  Regar plantas ".to_string(),
            ..TaskDraft::default()
        }
        .to_fields()
        .unwrap();
        assert_eq!(fields["text"], "Regar plantas");
        assert_eq!(fields["assignee"], DEFAULT_ASSIGNEE);
        assert_eq!(fields["priority"], "medium");
        assert_eq!(fields["cycle"], "none");
        assert!(!fields.contains_key("status"));
    }

    #[test]
    fn task_draft_rejects_unknown_priority() {
        let err = TaskDraft {
            text: "x".to_string(),
            priority: "urgent".to_string(),
            ..TaskDraft::default()
        }
        .to_fields()
        .unwrap_err();
        assert_eq!(err.field, "priority");
    }

    #[test]
    fn order_checks_items_before_requester() {
        let err = OrderDraft {
            items: vec![LineItem::new("  ", "3")],
            ..OrderDraft::default()
        }
        .to_fields()
        .unwrap_err();
        assert_eq!(err.field, "items");

        let err = OrderDraft {
            items: vec![LineItem::new("Tierra", "3")],
            ..OrderDraft::default()
        }
        .to_fields()
        .unwrap_err();
        assert_eq!(err, ValidationError::missing("requester"));
    }

    #[test]
    fn distributor_order_without_name_passes_with_warning() {
        let draft = OrderDraft {
            requester: "Luz".to_string(),
            items: vec![LineItem::new("Tierra", "3"), LineItem::new("Abono", "1")],
            order_type: "distributor".to_string(),
            ..OrderDraft::default()
        };
        let fields = draft.to_fields().unwrap();
        assert_eq!(fields["orderType"], "distributor");
        assert_eq!(fields["items"].as_array().map(Vec::len), Some(2));
        assert_eq!(draft.warnings(), vec![DraftWarning::DistributorMissing]);
    }

    #[test]
    fn delivery_requires_client_then_where() {
        let err = DeliveryDraft::default().to_fields().unwrap_err();
        assert_eq!(err.field, "client");
        let err = DeliveryDraft {
            client: "Ana".to_string(),
            ..DeliveryDraft::default()
        }
        .to_fields()
        .unwrap_err();
        assert_eq!(err.field, "where");
    }

    #[test]
    fn procedure_color_defaults_to_blue() {
        let fields = ProcedureDraft {
            title: "Apertura".to_string(),
            ..ProcedureDraft::default()
        }
        .to_fields()
        .unwrap();
        assert_eq!(fields["color"], "blue");
    }
}
