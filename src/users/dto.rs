use serde::{Deserialize, Serialize};

use crate::recipes::dto::RecipeMinified;
use crate::users::repo::User;

/// Public profile representation.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserDto {
    pub fn from_user(user: &User, is_subscribed: bool) -> Self {
        Self {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
        }
    }
}

/// Profile plus recipe previews, returned by the subscription endpoints.
#[derive(Debug, Serialize)]
pub struct SubscriptionDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub recipes: Vec<RecipeMinified>,
    pub recipes_count: i64,
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Request body for password change.
#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub new_password: String,
    pub current_password: String,
}

/// Extra query parameter accepted by the subscription endpoints: truncates
/// each author's recipe preview list.
#[derive(Debug, Default, Deserialize)]
pub struct RecipesLimitQuery {
    pub recipes_limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn sample_user() -> User {
        User {
            id: 5,
            email: "cook@example.com".into(),
            username: "cook".into(),
            first_name: "Julia".into(),
            last_name: "Child".into(),
            password_hash: "secret-hash".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn user_dto_never_exposes_password_hash() {
        let dto = UserDto::from_user(&sample_user(), true);
        let json = serde_json::to_string(&dto).unwrap();
        assert!(json.contains("cook@example.com"));
        assert!(json.contains("\"is_subscribed\":true"));
        assert!(!json.contains("secret-hash"));
    }

    #[test]
    fn subscription_dto_flattens_the_profile() {
        let dto = SubscriptionDto {
            user: UserDto::from_user(&sample_user(), true),
            recipes: vec![],
            recipes_count: 0,
        };
        let value: serde_json::Value = serde_json::to_value(&dto).unwrap();
        assert_eq!(value["username"], "cook");
        assert_eq!(value["recipes_count"], 0);
        assert!(value["recipes"].as_array().unwrap().is_empty());
    }
}
