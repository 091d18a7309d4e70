use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::ParseValueError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Ml,
    G,
    Oz,
    Unidad,
}

impl Unit {
    pub const ALL: [Unit; 4] = [Unit::Ml, Unit::G, Unit::Oz, Unit::Unidad];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Ml => "ml",
            Unit::G => "g",
            Unit::Oz => "oz",
            Unit::Unidad => "unidad",
        }
    }

    /// Label of the unit select.
    pub fn label(&self) -> &'static str {
        match self {
            Unit::Ml => "Mililitros (ml)",
            Unit::G => "Gramos (g)",
            Unit::Oz => "Onzas (oz)",
            Unit::Unidad => "Unidades",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::ALL
            .into_iter()
            .find(|unit| unit.as_str() == s.trim())
            .ok_or_else(|| ParseValueError {
                kind: "unit",
                value: s.to_string(),
            })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub current_stock: f64,
    pub min_stock_level: f64,
    pub unit: Unit,
    pub pump_id: Option<i64>,
}

impl Ingredient {
    pub fn stock_status(&self) -> StockStatus {
        StockStatus::classify(self.current_stock, self.min_stock_level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    OutOfStock,
    Low,
    Normal,
}

impl StockStatus {
    pub fn classify(current_stock: f64, min_stock_level: f64) -> Self {
        if current_stock <= 0.0 {
            StockStatus::OutOfStock
        } else if current_stock < min_stock_level {
            StockStatus::Low
        } else {
            StockStatus::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "Sin stock",
            StockStatus::Low => "Bajo",
            StockStatus::Normal => "Normal",
        }
    }
}

/// Body of `POST /api/ingredients` and `PUT /api/ingredients/:id`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct IngredientPayload {
    pub name: String,
    pub current_stock: f64,
    pub min_stock_level: f64,
    pub unit: Unit,
    pub pump_id: Option<i64>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RestockPayload {
    pub amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 10.0, StockStatus::OutOfStock)]
    #[case(-2.0, 10.0, StockStatus::OutOfStock)]
    #[case(0.5, 10.0, StockStatus::Low)]
    #[case(9.99, 10.0, StockStatus::Low)]
    #[case(10.0, 10.0, StockStatus::Normal)]
    #[case(250.0, 10.0, StockStatus::Normal)]
    #[case(3.0, 0.0, StockStatus::Normal)]
    fn classifies_stock(#[case] stock: f64, #[case] min: f64, #[case] expected: StockStatus) {
        assert_eq!(StockStatus::classify(stock, min), expected);
    }

    #[test]
    fn ingredient_decodes_from_backend_json() {
        let ingredient: Ingredient = serde_json::from_str(
            r#"{"id":3,"name":"Ron","current_stock":0,"min_stock_level":200,"unit":"ml","pump_id":null}"#,
        )
        .unwrap();
        assert_eq!(ingredient.unit, Unit::Ml);
        assert_eq!(ingredient.pump_id, None);
        assert_eq!(ingredient.stock_status().label(), "Sin stock");
    }

    #[test]
    fn unit_parses_wire_names_only() {
        assert_eq!("unidad".parse::<Unit>().unwrap(), Unit::Unidad);
        assert!("litros".parse::<Unit>().is_err());
    }
}
