use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who may see a paste without further checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Unlisted,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "unlisted" => Ok(Visibility::Unlisted),
            "private" => Ok(Visibility::Private),
            other => Err(format!("unknown visibility: {other}")),
        }
    }
}

/// Ciphertext and IV of a zero-knowledge paste, both base64.
///
/// Opaque to the server: only the key carried in the locator fragment can
/// open it, and that key never reaches any server-side structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    pub ciphertext: String,
    pub iv: String,
}

/// A paste record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paste {
    pub id: Uuid,
    /// Set when an authenticated caller created the paste; private pastes
    /// are readable by their owner only.
    pub owner_id: Option<Uuid>,
    pub visibility: Visibility,
    /// Immutable after creation.
    pub zero_knowledge: bool,
    /// Present iff `!zero_knowledge`; never populated server-side for
    /// zero-knowledge pastes, on any code path.
    pub content: Option<String>,
    /// Present iff `zero_knowledge`.
    pub encrypted: Option<EncryptedEnvelope>,
    /// Argon2id PHC string when the paste is password-gated.
    pub password_hash: Option<String>,
    pub burn_after_read: bool,
    /// Flipped atomically on first disclosure; for burn-after-read pastes
    /// the flip is the disclosure claim.
    pub has_been_viewed: bool,
    /// Once past, the paste renders as not-found.
    pub expires_at: Option<DateTime<Utc>>,
    /// Distinct-viewer count, monotonically non-decreasing.
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Paste {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at < now).unwrap_or(false)
    }
}

/// Input for a paste creation, after validation and password hashing.
#[derive(Debug, Clone)]
pub struct NewPaste {
    pub owner_id: Option<Uuid>,
    pub visibility: Visibility,
    pub zero_knowledge: bool,
    pub content: Option<String>,
    pub encrypted: Option<EncryptedEnvelope>,
    pub password_hash: Option<String>,
    pub burn_after_read: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewPaste {
    pub fn into_paste(self, now: DateTime<Utc>) -> Paste {
        Paste {
            id: Uuid::new_v4(),
            owner_id: self.owner_id,
            visibility: self.visibility,
            zero_knowledge: self.zero_knowledge,
            content: self.content,
            encrypted: self.encrypted,
            password_hash: self.password_hash,
            burn_after_read: self.burn_after_read,
            has_been_viewed: false,
            expires_at: self.expires_at,
            view_count: 0,
            created_at: now,
        }
    }
}

/// Caller identity resolved by the external auth collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_round_trips_through_text() {
        for v in [Visibility::Public, Visibility::Unlisted, Visibility::Private] {
            assert_eq!(v.as_str().parse::<Visibility>().unwrap(), v);
        }
        assert!("hidden".parse::<Visibility>().is_err());
    }

    #[test]
    fn expiry_is_strictly_past() {
        let now = Utc::now();
        let paste = NewPaste {
            owner_id: None,
            visibility: Visibility::Public,
            zero_knowledge: false,
            content: Some("hello".to_string()),
            encrypted: None,
            password_hash: None,
            burn_after_read: false,
            expires_at: Some(now + chrono::Duration::minutes(5)),
        }
        .into_paste(now);

        assert!(!paste.is_expired(now));
        assert!(paste.is_expired(now + chrono::Duration::minutes(6)));
    }
}
