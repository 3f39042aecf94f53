//! Card store port.

use crate::domain::{CardId, OwnerId, UserCard};
use crate::error::StoreError;

/// Persistence port for tokenized payment instruments.
#[async_trait::async_trait]
pub trait CardStore: Send + Sync + 'static {
    /// Persists a new card record.
    async fn insert_card(&self, card: UserCard) -> Result<UserCard, StoreError>;

    /// All cards for the owner in insertion order. An owner with no cards
    /// yields an empty vec, never an error.
    async fn cards_for_owner(&self, owner: OwnerId) -> Result<Vec<UserCard>, StoreError>;

    /// Soft-deactivates a card. Returns false when the card does not exist
    /// or belongs to a different owner.
    async fn deactivate_card(&self, owner: OwnerId, id: CardId) -> Result<bool, StoreError>;
}
