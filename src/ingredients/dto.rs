use serde::{Deserialize, Serialize};

use crate::ingredients::repo::Ingredient;

#[derive(Debug, Serialize)]
pub struct IngredientDto {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

impl From<Ingredient> for IngredientDto {
    fn from(i: Ingredient) -> Self {
        Self {
            id: i.id,
            name: i.name,
            measurement_unit: i.measurement_unit,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct IngredientFilter {
    pub name: Option<String>,
}
