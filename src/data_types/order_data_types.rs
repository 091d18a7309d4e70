use std::{fmt, str::FromStr};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::errors::ParseValueError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Completed,
    Cancelled,
    /// Status string this client does not know; shown verbatim.
    Other(String),
}

impl OrderStatus {
    pub const SELECTABLE: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            OrderStatus::Pending => "Pendiente",
            OrderStatus::Preparing => "En preparación",
            OrderStatus::Completed => "Completado",
            OrderStatus::Cancelled => "Cancelado",
            OrderStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => OrderStatus::Pending,
            "preparing" => OrderStatus::Preparing,
            "completed" => OrderStatus::Completed,
            "cancelled" => OrderStatus::Cancelled,
            _ => OrderStatus::Other(raw),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// operators may only pick one of the four known statuses
impl FromStr for OrderStatus {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match OrderStatus::from(s.trim().to_string()) {
            OrderStatus::Other(raw) => Err(ParseValueError {
                kind: "order status",
                value: raw,
            }),
            known => Ok(known),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
struct NamedRef {
    name: String,
}

#[derive(Deserialize, Debug, Clone)]
struct UserRef {
    username: String,
}

#[derive(Deserialize, Debug, Clone)]
struct IngredientRef {
    name: String,
    unit: String,
}

#[derive(Deserialize, Debug, Clone)]
struct OrderIngredientRecord {
    amount: f64,
    ingredient: IngredientRef,
}

#[derive(Deserialize, Debug, Clone)]
struct OrderItemRecord {
    drink: NamedRef,
    #[serde(default)]
    ingredients: Vec<OrderIngredientRecord>,
}

/// Order as served by `GET /api/orders/admin`, with nested user/drink/ingredient records.
#[derive(Deserialize, Debug, Clone)]
pub struct OrderRecord {
    id: i64,
    user: UserRef,
    status: OrderStatus,
    created_at: String,
    #[serde(default)]
    items: Vec<OrderItemRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemIngredient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub drink: String,
    pub ingredients: Vec<OrderItemIngredient>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i64,
    pub user: String,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub created_at: String,
}

impl From<OrderRecord> for Order {
    fn from(record: OrderRecord) -> Self {
        Order {
            id: record.id,
            user: record.user.username,
            items: record
                .items
                .into_iter()
                .map(|item| OrderItem {
                    drink: item.drink.name,
                    ingredients: item
                        .ingredients
                        .into_iter()
                        .map(|ing| OrderItemIngredient {
                            name: ing.ingredient.name,
                            amount: ing.amount,
                            unit: ing.ingredient.unit,
                        })
                        .collect(),
                })
                .collect(),
            status: record.status,
            created_at: record.created_at,
        }
    }
}

impl Order {
    pub fn drink_names(&self) -> String {
        self.items
            .iter()
            .map(|item| item.drink.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn first_drink(&self) -> &str {
        self.items.first().map(|item| item.drink.as_str()).unwrap_or("-")
    }

    pub fn created_at_local(&self) -> String {
        format_timestamp(&self.created_at)
    }
}

/// Renders an RFC 3339 timestamp in local time; unparsable input is returned as is.
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts
            .with_timezone(&Local)
            .format("%d/%m/%Y, %H:%M:%S")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StatusPayload {
    pub status: OrderStatus,
}
