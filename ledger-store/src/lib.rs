//! Persistence adapters for the ledger engine.
//!
//! Implements the `LedgerStore` and `CardStore` ports on SQLite and
//! PostgreSQL, plus the notification outbox relay. Backends are selected at
//! compile time via the `sqlite`/`postgres` features and at runtime by the
//! database URL scheme.

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("enable at least one store backend feature: `sqlite` or `postgres`");

pub mod notifications;
pub mod signing;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub(crate) mod types;

#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;


use async_trait::async_trait;

use ledger_types::{
    CardId, CardStore, LedgerStore, NotificationEvent, NotificationStatus, OwnerId, StoreError,
    Subscription, SubscriptionRecord, Transaction, TransactionId, TransferRecord, UserCard,
    Wallet,
};

/// A store backed by whichever database the URL points at.
pub enum Store {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteStore),
    #[cfg(feature = "postgres")]
    Postgres(PostgresStore),
}

/// Connects to the database named by `database_url`, running migrations.
///
/// `sqlite://` URLs select the SQLite backend, `postgres://` URLs the
/// PostgreSQL one; either requires the matching feature.
pub async fn build_store(database_url: &str) -> anyhow::Result<Store> {
    if database_url.starts_with("sqlite:") {
        #[cfg(feature = "sqlite")]
        return Ok(Store::Sqlite(SqliteStore::new(database_url).await?));
        #[cfg(not(feature = "sqlite"))]
        anyhow::bail!("sqlite support not compiled in");
    }
    if database_url.starts_with("postgres:") || database_url.starts_with("postgresql:") {
        #[cfg(feature = "postgres")]
        return Ok(Store::Postgres(PostgresStore::new(database_url).await?));
        #[cfg(not(feature = "postgres"))]
        anyhow::bail!("postgres support not compiled in");
    }
    anyhow::bail!("unsupported database url: {database_url}")
}

macro_rules! delegate {
    ($self:ident, $inner:ident => $body:expr) => {
        match $self {
            #[cfg(feature = "sqlite")]
            Store::Sqlite($inner) => $body,
            #[cfg(feature = "postgres")]
            Store::Postgres($inner) => $body,
        }
    };
}

#[async_trait]
impl LedgerStore for Store {
    async fn record_transfer(&self, rec: TransferRecord) -> Result<Transaction, StoreError> {
        delegate!(self, s => s.record_transfer(rec).await)
    }

    async fn find_by_request_key(&self, key: &str) -> Result<Option<Transaction>, StoreError> {
        delegate!(self, s => s.find_by_request_key(key).await)
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        delegate!(self, s => s.get_transaction(id).await)
    }

    async fn get_wallet(&self, owner: OwnerId) -> Result<Option<Wallet>, StoreError> {
        delegate!(self, s => s.get_wallet(owner).await)
    }

    async fn transactions_for_owner(
        &self,
        owner: OwnerId,
    ) -> Result<Vec<Transaction>, StoreError> {
        delegate!(self, s => s.transactions_for_owner(owner).await)
    }

    async fn create_subscription(
        &self,
        rec: SubscriptionRecord,
    ) -> Result<(Subscription, Transaction), StoreError> {
        delegate!(self, s => s.create_subscription(rec).await)
    }
}

#[async_trait]
impl CardStore for Store {
    async fn insert_card(&self, card: UserCard) -> Result<UserCard, StoreError> {
        delegate!(self, s => s.insert_card(card).await)
    }

    async fn cards_for_owner(&self, owner: OwnerId) -> Result<Vec<UserCard>, StoreError> {
        delegate!(self, s => s.cards_for_owner(owner).await)
    }

    async fn deactivate_card(&self, owner: OwnerId, id: CardId) -> Result<bool, StoreError> {
        delegate!(self, s => s.deactivate_card(owner, id).await)
    }
}

impl Store {
    pub async fn get_pending_notifications(
        &self,
        limit: i64,
    ) -> Result<Vec<NotificationEvent>, StoreError> {
        delegate!(self, s => s.get_pending_notifications(limit).await)
    }

    pub async fn update_notification_status(
        &self,
        id: uuid::Uuid,
        status: NotificationStatus,
        last_error: Option<String>,
    ) -> Result<(), StoreError> {
        delegate!(self, s => s.update_notification_status(id, status, last_error).await)
    }
}
