//! Signed one-click completion links.
//!
//! A token is the lowercase hex HMAC-SHA256 of `"{assignment_id}:{user_id}"`
//! under the confirmation secret. Tokens carry no expiry; the assignment's
//! own lifecycle bounds how long a link is useful.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;
use uuid::Uuid;

use crate::domain::error::DomainError;

type HmacSha256 = Hmac<Sha256>;

pub const ASSIGNMENT_ID_PARAM: &str = "assignmentId";
pub const USER_ID_PARAM: &str = "userId";
pub const TOKEN_PARAM: &str = "token";

pub struct TokenSigner {
    secret: Option<Vec<u8>>,
    base_url: Url,
    completion_path: String,
}

impl TokenSigner {
    /// An empty or missing secret leaves the signer unable to sign and
    /// makes every verification fail.
    pub fn new(secret: Option<&str>, base_url: Url, completion_path: impl Into<String>) -> Self {
        let secret = secret
            .filter(|s| !s.is_empty())
            .map(|s| s.as_bytes().to_vec());
        Self {
            secret,
            base_url,
            completion_path: completion_path.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    fn mac(&self, assignment_id: &str, user_id: &str) -> Option<HmacSha256> {
        let secret = self.secret.as_deref()?;
        let mut mac = HmacSha256::new_from_slice(secret).ok()?;
        mac.update(assignment_id.as_bytes());
        mac.update(b":");
        mac.update(user_id.as_bytes());
        Some(mac)
    }

    pub fn sign(&self, assignment_id: &str, user_id: &str) -> Result<String, DomainError> {
        let mac = self
            .mac(assignment_id, user_id)
            .ok_or_else(|| DomainError::configuration("confirmation secret is not configured"))?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Constant-time check of `token` against the expected signature.
    /// Malformed hex, wrong length and a missing secret all yield `false`.
    pub fn verify(&self, assignment_id: &str, user_id: &str, token: &str) -> bool {
        let Ok(provided) = hex::decode(token) else {
            return false;
        };
        match self.mac(assignment_id, user_id) {
            Some(mac) => mac.verify_slice(&provided).is_ok(),
            None => false,
        }
    }

    /// `{base}{completion_path}?assignmentId=..&userId=..&token=..`
    pub fn build_confirm_url(&self, assignment_id: Uuid, user_id: Uuid) -> Result<Url, DomainError> {
        let assignment = assignment_id.to_string();
        let user = user_id.to_string();
        let token = self.sign(&assignment, &user)?;

        let mut url = self
            .base_url
            .join(&self.completion_path)
            .map_err(|e| DomainError::configuration(format!("invalid completion path: {e}")))?;
        url.query_pairs_mut()
            .append_pair(ASSIGNMENT_ID_PARAM, &assignment)
            .append_pair(USER_ID_PARAM, &user)
            .append_pair(TOKEN_PARAM, &token);
        Ok(url)
    }
}
