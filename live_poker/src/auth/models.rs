//! Authentication data models.

use serde::{Deserialize, Serialize};

use crate::game::entities::PlayerId;
use crate::net::messages::WireId;

/// JWT claims for access token
///
/// Tokens come from an external issuer. Only `userId` is required; it may
/// be a string or a number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenClaims {
    #[serde(alias = "sub")]
    pub user_id: WireId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>, // Expiration timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>, // Issued at timestamp
}

/// Who a connection belongs to, once its token checks out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub player_id: PlayerId,
    pub username: Option<String>,
}

impl Identity {
    /// Name to seat the player under when the client doesn't send one
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .unwrap_or_else(|| self.player_id.as_str())
    }
}

impl From<AccessTokenClaims> for Identity {
    fn from(claims: AccessTokenClaims) -> Self {
        Self {
            player_id: claims.user_id.into(),
            username: claims.username,
        }
    }
}
