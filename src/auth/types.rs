use serde::{Deserialize, Serialize};

/// JWT claims identifying the caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthClaims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

/// Authenticated caller, inserted into request extensions by `require_auth`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
}

impl From<AuthClaims> for Caller {
    fn from(claims: AuthClaims) -> Self {
        Self {
            user_id: claims.user_id,
        }
    }
}
