//! Card vault service.
//!
//! Exchanges one-time provider tokens for durable instruments and manages
//! the stored-card records. Raw card numbers never reach this system; only
//! the provider token and display fields are kept.

use std::sync::Arc;

use tracing::{info, instrument};

use ledger_types::{
    CardId, CardStore, CardTokenizer, OwnerId, SaveCardRequest, ServiceError, UserCard,
};

/// Stores and manages tokenized cards for marketplace users.
pub struct CardVault<C: CardStore> {
    cards: Arc<C>,
    tokenizer: Arc<dyn CardTokenizer>,
}

impl<C: CardStore> CardVault<C> {
    pub fn new(cards: Arc<C>, tokenizer: Arc<dyn CardTokenizer>) -> Self {
        Self { cards, tokenizer }
    }

    /// Exchanges the one-time token and persists the resulting card. A
    /// token the provider rejects surfaces as `InvalidToken` and nothing is
    /// stored.
    #[instrument(skip(self, req))]
    pub async fn save_card(
        &self,
        owner: OwnerId,
        req: SaveCardRequest,
    ) -> Result<UserCard, ServiceError> {
        let tokenized = self
            .tokenizer
            .exchange_token(owner, &req.one_time_token)
            .await?;
        let card = UserCard::from_tokenized(owner, tokenized, req.purpose);
        let card = self.cards.insert_card(card).await?;
        info!(card_id = %card.id, last4 = %card.last4, "card stored");
        Ok(card)
    }

    /// All cards for the owner, oldest first. Owners with no cards get an
    /// empty list.
    pub async fn user_cards(&self, owner: OwnerId) -> Result<Vec<UserCard>, ServiceError> {
        Ok(self.cards.cards_for_owner(owner).await?)
    }

    /// Soft-deactivates a card. Deactivating a card that does not exist or
    /// belongs to someone else is NotFound; the record itself is never
    /// deleted.
    #[instrument(skip(self))]
    pub async fn deactivate_card(&self, owner: OwnerId, id: CardId) -> Result<(), ServiceError> {
        if self.cards.deactivate_card(owner, id).await? {
            info!(card_id = %id, "card deactivated");
            Ok(())
        } else {
            Err(ServiceError::NotFound(format!("Card {id}")))
        }
    }
}
