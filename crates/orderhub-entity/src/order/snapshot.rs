//! Point-in-time copy of an order, flattened into template placeholders.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product name.
    pub name: String,
    /// Quantity ordered.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Unit price.
    #[serde(default)]
    pub price: f64,
}

fn default_quantity() -> u32 {
    1
}

/// Order fields captured when the event was produced.
///
/// Every field is optional: producers send what they have, and the renderer
/// drops template lines whose placeholder resolves to nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// Order primary key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Human-facing order number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    /// Current status code (`new`, `preparing`, `delivering`, `completed`, `cancelled`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// City the order belongs to; keys the per-city thread map and room.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    /// `delivery` or `pickup`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus_used: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Producer-specific fields, exposed as placeholders by key.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl OrderSnapshot {
    /// Flatten into `placeholder -> value`. Missing fields map to `""`.
    pub fn placeholders(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();

        for (key, value) in &self.extra {
            if let Some(text) = scalar_text(value) {
                out.insert(key.clone(), text);
            }
        }

        let mut put = |key: &str, value: Option<String>| {
            out.insert(key.to_string(), value.unwrap_or_default());
        };
        put("order_id", self.id.map(|v| v.to_string()));
        put("order_number", self.order_number.clone());
        put("status", self.status.clone());
        put("status_label", self.status.as_deref().map(status_label));
        put("city", self.city_name.clone());
        put("branch", self.branch_name.clone());
        put("customer_name", self.customer_name.clone());
        put("customer_phone", self.customer_phone.clone());
        put("delivery_type", self.delivery_type.as_deref().map(delivery_label));
        put("delivery_address", self.delivery_address.clone());
        put("comment", self.comment.clone());
        put("payment_method", self.payment_method.clone());
        put("total", self.total.map(format_amount));
        put(
            "bonus_used",
            self.bonus_used.filter(|v| *v > 0.0).map(format_amount),
        );
        put("items", (!self.items.is_empty()).then(|| self.items_text()));
        put("created_at", self.created_at.clone());

        out
    }

    /// One line per item: `• Name × 2 = 500`.
    pub fn items_text(&self) -> String {
        self.items
            .iter()
            .map(|item| {
                format!(
                    "• {} × {} = {}",
                    item.name,
                    item.quantity,
                    format_amount(item.price * f64::from(item.quantity))
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Human label for a status code; unknown codes pass through.
pub fn status_label(status: &str) -> String {
    match status {
        "new" => "New",
        "accepted" => "Accepted",
        "preparing" => "Preparing",
        "ready" => "Ready",
        "delivering" => "On the way",
        "completed" => "Completed",
        "cancelled" => "Cancelled",
        other => return other.to_string(),
    }
    .to_string()
}

fn delivery_label(kind: &str) -> String {
    match kind {
        "delivery" => "Delivery".to_string(),
        "pickup" => "Pickup".to_string(),
        other => other.to_string(),
    }
}

/// Whole amounts print without decimals, others with two.
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value:.2}")
    }
}

fn scalar_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => Some(String::new()),
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
