use serde::{Deserialize, Serialize};

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after login or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

/// Public part of the account returned alongside tokens.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_response_serializes_public_fields() {
        let response = AuthResponse {
            access_token: "a".into(),
            refresh_token: "r".into(),
            user: PublicUser {
                id: 1,
                email: "cook@example.com".into(),
                username: "cook".into(),
            },
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("cook@example.com"));
        assert!(json.contains("access_token"));
        assert!(json.contains("refresh_token"));
    }
}
