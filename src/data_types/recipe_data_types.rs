use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::ParseValueError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DrinkType {
    #[default]
    Standard,
    Custom,
}

impl DrinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrinkType::Standard => "standard",
            DrinkType::Custom => "custom",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DrinkType::Standard => "Estándar",
            DrinkType::Custom => "Personalizable",
        }
    }
}

impl fmt::Display for DrinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrinkType {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "standard" => Ok(DrinkType::Standard),
            "custom" => Ok(DrinkType::Custom),
            other => Err(ParseValueError {
                kind: "drink type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecipeIngredient {
    pub ingredient_id: i64,
    pub amount: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Drink {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(rename = "type", default)]
    pub drink_type: DrinkType,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
}

/// Body of `POST /api/drinks` and `PUT /api/drinks/:id`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DrinkPayload {
    pub name: String,
    pub description: String,
    pub image_url: String,
    #[serde(rename = "type")]
    pub drink_type: DrinkType,
    pub ingredients: Vec<RecipeIngredient>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drink_tolerates_missing_optional_fields() {
        let drink: Drink = serde_json::from_str(r#"{"id":7,"name":"Mojito","type":"custom"}"#).unwrap();
        assert_eq!(drink.drink_type, DrinkType::Custom);
        assert!(drink.ingredients.is_empty());
        assert_eq!(drink.image_url, None);
    }

    #[test]
    fn payload_serializes_type_key() {
        let payload = DrinkPayload {
            name: "Cuba libre".to_string(),
            description: String::new(),
            image_url: String::new(),
            drink_type: DrinkType::Standard,
            ingredients: vec![RecipeIngredient {
                ingredient_id: 1,
                amount: 50.0,
            }],
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "standard");
        assert_eq!(json["ingredients"][0]["ingredient_id"], 1);
    }
}
