use serde::{Deserialize, Serialize};

use crate::recipes::repo::{Recipe, RecipeFilter, RecipeIngredientRow};
use crate::tags::dto::TagDto;
use crate::users::dto::UserDto;

/// Full recipe representation.
#[derive(Debug, Serialize)]
pub struct RecipeDto {
    pub id: i64,
    pub tags: Vec<TagDto>,
    pub author: Option<UserDto>,
    pub ingredients: Vec<RecipeIngredientDto>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(Debug, Serialize)]
pub struct RecipeIngredientDto {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<RecipeIngredientRow> for RecipeIngredientDto {
    fn from(r: RecipeIngredientRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            measurement_unit: r.measurement_unit,
            amount: r.amount,
        }
    }
}

/// Short representation used by favourites, carts and subscription previews.
#[derive(Debug, Serialize)]
pub struct RecipeMinified {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<Recipe> for RecipeMinified {
    fn from(r: Recipe) -> Self {
        Self {
            id: r.id,
            name: r.name,
            image: media_url(&r.image),
            cooking_time: r.cooking_time,
        }
    }
}

pub fn media_url(key: &str) -> String {
    format!("/media/{key}")
}

/// Ingredient line in a create/update request.
#[derive(Debug, Deserialize)]
pub struct IngredientAmount {
    pub id: i64,
    pub amount: i32,
}

/// Body of POST and PATCH `/recipes`. The image is required on create and
/// optional on update (the stored one is kept when absent).
#[derive(Debug, Deserialize)]
pub struct RecipePayload {
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<i64>,
    #[serde(default)]
    pub image: Option<String>,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Recipe listing filters arrive as raw query pairs because `tags` repeats
/// (`?tags=lunch&tags=dinner`).
#[derive(Debug, Default)]
pub struct RecipeListQuery {
    pub page: i64,
    pub limit: Option<i64>,
    pub author: Option<i64>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeListQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut q = RecipeListQuery {
            page: 1,
            ..Default::default()
        };
        for (key, value) in pairs {
            match key.as_str() {
                "page" => {
                    if let Ok(page) = value.parse::<i64>() {
                        q.page = page;
                    }
                }
                "limit" => q.limit = value.parse::<i64>().ok(),
                "author" => q.author = value.parse::<i64>().ok(),
                "tags" => q.tags.push(value.clone()),
                "is_favorited" => q.is_favorited = flag(value),
                "is_in_shopping_cart" => q.is_in_shopping_cart = flag(value),
                _ => {}
            }
        }
        q
    }

    /// The favourite/cart filters only apply for an authenticated viewer;
    /// anonymous callers get the unfiltered listing.
    pub fn filter_for(&self, viewer: Option<i64>) -> RecipeFilter {
        RecipeFilter {
            author: self.author,
            tags: self.tags.clone(),
            favorited_by: viewer.filter(|_| self.is_favorited),
            in_cart_of: viewer.filter(|_| self.is_in_shopping_cart),
        }
    }
}

fn flag(value: &str) -> bool {
    matches!(value, "1" | "true" | "True")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn collects_repeated_tags() {
        let q = RecipeListQuery::from_pairs(&pairs(&[
            ("tags", "lunch"),
            ("tags", "dinner"),
            ("page", "2"),
        ]));
        assert_eq!(q.tags, vec!["lunch", "dinner"]);
        assert_eq!(q.page, 2);
        assert!(q.limit.is_none());
    }

    #[test]
    fn parses_flags_and_author() {
        let q = RecipeListQuery::from_pairs(&pairs(&[
            ("author", "7"),
            ("is_favorited", "1"),
            ("is_in_shopping_cart", "true"),
        ]));
        assert_eq!(q.author, Some(7));
        assert!(q.is_favorited);
        assert!(q.is_in_shopping_cart);
    }

    #[test]
    fn ignores_malformed_values_and_unknown_keys() {
        let q = RecipeListQuery::from_pairs(&pairs(&[
            ("page", "abc"),
            ("author", "abc"),
            ("is_favorited", "0"),
            ("search", "borscht"),
        ]));
        assert_eq!(q.page, 1);
        assert!(q.author.is_none());
        assert!(!q.is_favorited);
    }

    #[test]
    fn viewer_gates_the_relation_filters() {
        let q = RecipeListQuery::from_pairs(&pairs(&[("is_favorited", "1")]));
        assert_eq!(q.filter_for(Some(3)).favorited_by, Some(3));
        assert_eq!(q.filter_for(None).favorited_by, None);
    }

    #[test]
    fn minified_dto_prefixes_the_media_path() {
        use time::OffsetDateTime;
        let recipe = Recipe {
            id: 1,
            author_id: Some(2),
            name: "Borscht".into(),
            image: "recipes/abc.jpg".into(),
            text: "Simmer.".into(),
            cooking_time: 90,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let dto = RecipeMinified::from(recipe);
        assert_eq!(dto.image, "/media/recipes/abc.jpg");
    }
}
