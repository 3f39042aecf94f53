//! Tokenized payment instruments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::owner::OwnerId;

/// Unique identifier for a stored card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(Uuid);

impl CardId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for CardId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the owner uses the card for. One owner may hold several cards
/// distinguished by purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardPurpose {
    /// Charged when the owner pays.
    Paying,
    /// Payout destination when the owner is paid.
    Receiving,
}

impl std::fmt::Display for CardPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardPurpose::Paying => write!(f, "PAYING"),
            CardPurpose::Receiving => write!(f, "RECEIVING"),
        }
    }
}

/// Card details returned by a provider when a one-time token is exchanged
/// for a durable instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizedCard {
    /// Durable provider token usable for later charges
    pub provider_token: String,
    /// Provider customer the instrument is attached to; the charge path
    /// needs both this and the token
    pub customer_ref: String,
    pub last4: String,
    pub brand: String,
    pub exp_month: i32,
    pub exp_year: i32,
}

/// A durable tokenized card record.
///
/// Created once and immutable except for soft deactivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCard {
    pub id: CardId,
    pub owner_id: OwnerId,
    pub last4: String,
    pub exp_month: i32,
    pub exp_year: i32,
    pub brand: String,
    pub purpose: CardPurpose,
    pub provider_token: String,
    /// Provider customer the token is attached to
    pub customer_ref: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl UserCard {
    /// Creates a card record from an exchanged provider token.
    pub fn from_tokenized(owner_id: OwnerId, card: TokenizedCard, purpose: CardPurpose) -> Self {
        Self {
            id: CardId::new(),
            owner_id,
            last4: card.last4,
            exp_month: card.exp_month,
            exp_year: card.exp_year,
            brand: card.brand,
            purpose,
            provider_token: card.provider_token,
            customer_ref: card.customer_ref,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Reconstructs a card from database fields.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: CardId,
        owner_id: OwnerId,
        last4: String,
        exp_month: i32,
        exp_year: i32,
        brand: String,
        purpose: CardPurpose,
        provider_token: String,
        customer_ref: String,
        is_active: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            last4,
            exp_month,
            exp_year,
            brand,
            purpose,
            provider_token,
            customer_ref,
            is_active,
            created_at,
        }
    }
}
