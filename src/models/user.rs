//! Authenticated operator identity

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JWT claims issued by the authentication provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Identity stamped on captures and status changes
    pub fn operator(&self) -> String {
        self.email.clone().unwrap_or_else(|| self.sub.clone())
    }
}

/// Current user as returned by `/api/fetchUser`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CurrentUser {
    pub email: String,
}
