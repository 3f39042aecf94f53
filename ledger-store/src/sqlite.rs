//! SQLite store adapter.

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tracing::debug;

use ledger_types::{
    CardId, CardStore, LedgerStore, Money, NotificationEvent, NotificationStatus, OwnerId,
    StoreError, Subscription, SubscriptionRecord, Transaction, TransactionId, TransferKind,
    TransferRecord, UserCard, Wallet,
};

use crate::types::{
    DbNotificationEvent, DbSubscription, DbTransaction, DbUserCard, DbWallet, DbWalletBalance,
    map_db_err, parse_currency,
};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Store
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite store implementation.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Creates a new SQLite store with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // An in-memory database exists per connection; keep the pool at one
        // connection so every handle sees the same data.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect_with(options)
                .await?
        } else {
            SqlitePool::connect_with(options).await?
        };

        let ddl = include_str!("../migrations/0001_create_tables.sql");
        sqlx::raw_sql(ddl).execute(&pool).await?;

        let ddl_notifications = include_str!("../migrations/0002_create_notification_events.sql");
        sqlx::raw_sql(ddl_notifications).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ledger implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn record_transfer(&self, rec: TransferRecord) -> Result<Transaction, StoreError> {
        let tx = Transaction::completed(
            rec.sender_id,
            rec.recipient_id,
            rec.amount,
            rec.platform_fee,
            rec.kind,
            rec.provider_ref,
            rec.request_key,
            rec.reference,
        )
        .map_err(StoreError::Domain)?;
        let net = tx.net_amount();
        let now = tx.created_at.to_rfc3339();
        let currency_str = tx.amount.currency().to_string();

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        // Conditional insert first: a duplicate request key must leave the
        // wallets untouched and hand back the original row.
        let inserted = sqlx::query(
            r#"INSERT OR IGNORE INTO transactions
               (id, sender_id, recipient_id, amount, platform_fee, currency, status, kind, provider_ref, request_key, reference, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(tx.id.to_string())
        .bind(tx.sender_id.to_string())
        .bind(tx.recipient_id.to_string())
        .bind(tx.amount.amount())
        .bind(tx.platform_fee.amount())
        .bind(&currency_str)
        .bind(tx.status.to_string())
        .bind(tx.kind.to_string())
        .bind(&tx.provider_ref)
        .bind(&tx.request_key)
        .bind(&tx.reference)
        .bind(&now)
        .execute(&mut *db_tx)
        .await
        .map_err(map_db_err)?;

        if inserted.rows_affected() == 0 {
            db_tx
                .rollback()
                .await
                .map_err(|e| StoreError::Transaction(e.to_string()))?;
            debug!(request_key = ?tx.request_key, "duplicate transfer collapsed");
            let key = tx
                .request_key
                .as_deref()
                .ok_or_else(|| StoreError::Conflict("transaction id collision".into()))?;
            return self
                .find_by_request_key(key)
                .await?
                .ok_or(StoreError::NotFound);
        }

        // Wallets are created lazily on first money movement.
        sqlx::query(
            r#"INSERT OR IGNORE INTO wallets (owner_id, balance, currency, created_at) VALUES (?, 0, ?, ?)"#,
        )
        .bind(tx.recipient_id.to_string())
        .bind(&currency_str)
        .bind(&now)
        .execute(&mut *db_tx)
        .await
        .map_err(map_db_err)?;

        if tx.kind == TransferKind::WalletTransfer {
            sqlx::query(
                r#"INSERT OR IGNORE INTO wallets (owner_id, balance, currency, created_at) VALUES (?, 0, ?, ?)"#,
            )
            .bind(tx.sender_id.to_string())
            .bind(&currency_str)
            .bind(&now)
            .execute(&mut *db_tx)
            .await
            .map_err(map_db_err)?;

            let sender: DbWalletBalance =
                sqlx::query_as(r#"SELECT balance, currency FROM wallets WHERE owner_id = ?"#)
                    .bind(tx.sender_id.to_string())
                    .fetch_one(&mut *db_tx)
                    .await
                    .map_err(map_db_err)?;

            let sender_currency = parse_currency(&sender.currency)?;
            if sender_currency != tx.amount.currency() {
                return Err(StoreError::Domain(
                    ledger_types::DomainError::CurrencyMismatch {
                        expected: sender_currency,
                        got: tx.amount.currency(),
                    },
                ));
            }
            if sender.balance < tx.amount.amount() {
                return Err(StoreError::Domain(
                    ledger_types::DomainError::InsufficientFunds {
                        available: sender.balance,
                        requested: tx.amount.amount(),
                    },
                ));
            }

            sqlx::query(r#"UPDATE wallets SET balance = balance - ? WHERE owner_id = ?"#)
                .bind(tx.amount.amount())
                .bind(tx.sender_id.to_string())
                .execute(&mut *db_tx)
                .await
                .map_err(map_db_err)?;
        }

        let recipient: DbWalletBalance =
            sqlx::query_as(r#"SELECT balance, currency FROM wallets WHERE owner_id = ?"#)
                .bind(tx.recipient_id.to_string())
                .fetch_one(&mut *db_tx)
                .await
                .map_err(map_db_err)?;

        let recipient_currency = parse_currency(&recipient.currency)?;
        if recipient_currency != tx.amount.currency() {
            return Err(StoreError::Domain(
                ledger_types::DomainError::CurrencyMismatch {
                    expected: recipient_currency,
                    got: tx.amount.currency(),
                },
            ));
        }

        sqlx::query(r#"UPDATE wallets SET balance = balance + ? WHERE owner_id = ?"#)
            .bind(net.amount())
            .bind(tx.recipient_id.to_string())
            .execute(&mut *db_tx)
            .await
            .map_err(map_db_err)?;

        // Outbox enqueue rides the same transaction; delivery is the relay
        // worker's problem and can never roll the payment back.
        let event = NotificationEvent::payment_completed(&tx);
        sqlx::query(
            r#"INSERT INTO notification_events (id, event_type, payload, status, created_at) VALUES (?, ?, ?, 'PENDING', ?)"#,
        )
        .bind(event.id.to_string())
        .bind(&event.event_type)
        .bind(event.payload.to_string())
        .bind(&now)
        .execute(&mut *db_tx)
        .await
        .map_err(map_db_err)?;

        db_tx
            .commit()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(tx)
    }

    async fn find_by_request_key(&self, key: &str) -> Result<Option<Transaction>, StoreError> {
        let row: Option<DbTransaction> = sqlx::query_as(
            r#"SELECT id, sender_id, recipient_id, amount, platform_fee, currency, status, kind, provider_ref, request_key, reference, created_at
               FROM transactions WHERE request_key = ?"#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;

        row.map(DbTransaction::into_domain).transpose()
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        let row: Option<DbTransaction> = sqlx::query_as(
            r#"SELECT id, sender_id, recipient_id, amount, platform_fee, currency, status, kind, provider_ref, request_key, reference, created_at
               FROM transactions WHERE id = ?"#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;

        row.map(DbTransaction::into_domain).transpose()
    }

    async fn get_wallet(&self, owner: OwnerId) -> Result<Option<Wallet>, StoreError> {
        let row: Option<DbWallet> = sqlx::query_as(
            r#"SELECT owner_id, balance, currency, created_at FROM wallets WHERE owner_id = ?"#,
        )
        .bind(owner.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;

        row.map(DbWallet::into_domain).transpose()
    }

    async fn transactions_for_owner(
        &self,
        owner: OwnerId,
    ) -> Result<Vec<Transaction>, StoreError> {
        let owner_str = owner.to_string();

        let rows: Vec<DbTransaction> = sqlx::query_as(
            r#"SELECT id, sender_id, recipient_id, amount, platform_fee, currency, status, kind, provider_ref, request_key, reference, created_at
               FROM transactions WHERE sender_id = ? OR recipient_id = ?
               ORDER BY created_at DESC"#,
        )
        .bind(&owner_str)
        .bind(&owner_str)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        rows.into_iter().map(DbTransaction::into_domain).collect()
    }

    async fn create_subscription(
        &self,
        rec: SubscriptionRecord,
    ) -> Result<(Subscription, Transaction), StoreError> {
        let fee = Money::zero(rec.amount.currency());
        let tx = Transaction::completed(
            rec.owner_id,
            rec.recipient_id,
            rec.amount,
            fee,
            TransferKind::Charge,
            rec.provider_ref,
            rec.request_key,
            None,
        )
        .map_err(StoreError::Domain)?;
        let sub = Subscription::new(
            rec.owner_id,
            rec.amount,
            rec.payment_method,
            rec.billing_frequency,
            tx.id,
        );
        let now = tx.created_at.to_rfc3339();
        let currency_str = tx.amount.currency().to_string();

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        let inserted = sqlx::query(
            r#"INSERT OR IGNORE INTO transactions
               (id, sender_id, recipient_id, amount, platform_fee, currency, status, kind, provider_ref, request_key, reference, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(tx.id.to_string())
        .bind(tx.sender_id.to_string())
        .bind(tx.recipient_id.to_string())
        .bind(tx.amount.amount())
        .bind(tx.platform_fee.amount())
        .bind(&currency_str)
        .bind(tx.status.to_string())
        .bind(tx.kind.to_string())
        .bind(&tx.provider_ref)
        .bind(&tx.request_key)
        .bind(&tx.reference)
        .bind(&now)
        .execute(&mut *db_tx)
        .await
        .map_err(map_db_err)?;

        if inserted.rows_affected() == 0 {
            db_tx
                .rollback()
                .await
                .map_err(|e| StoreError::Transaction(e.to_string()))?;
            let key = tx
                .request_key
                .as_deref()
                .ok_or_else(|| StoreError::Conflict("transaction id collision".into()))?;
            let existing_tx = self
                .find_by_request_key(key)
                .await?
                .ok_or(StoreError::NotFound)?;
            let existing_sub = self
                .subscription_for_transaction(existing_tx.id)
                .await?
                .ok_or(StoreError::NotFound)?;
            return Ok((existing_sub, existing_tx));
        }

        sqlx::query(
            r#"INSERT INTO subscriptions (id, owner_id, amount, currency, payment_method, billing_frequency, transaction_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(sub.id.to_string())
        .bind(sub.owner_id.to_string())
        .bind(sub.amount.amount())
        .bind(&currency_str)
        .bind(&sub.payment_method)
        .bind(sub.billing_frequency.to_string())
        .bind(tx.id.to_string())
        .bind(&now)
        .execute(&mut *db_tx)
        .await
        .map_err(map_db_err)?;

        sqlx::query(
            r#"INSERT OR IGNORE INTO wallets (owner_id, balance, currency, created_at) VALUES (?, 0, ?, ?)"#,
        )
        .bind(tx.recipient_id.to_string())
        .bind(&currency_str)
        .bind(&now)
        .execute(&mut *db_tx)
        .await
        .map_err(map_db_err)?;

        sqlx::query(r#"UPDATE wallets SET balance = balance + ? WHERE owner_id = ?"#)
            .bind(tx.net_amount().amount())
            .bind(tx.recipient_id.to_string())
            .execute(&mut *db_tx)
            .await
            .map_err(map_db_err)?;

        let event = NotificationEvent::new(
            "subscription.created",
            serde_json::json!({
                "subscription_id": sub.id,
                "transaction_id": tx.id,
                "owner_id": sub.owner_id,
                "amount": sub.amount.amount(),
                "currency": sub.amount.currency(),
            }),
        );
        sqlx::query(
            r#"INSERT INTO notification_events (id, event_type, payload, status, created_at) VALUES (?, ?, ?, 'PENDING', ?)"#,
        )
        .bind(event.id.to_string())
        .bind(&event.event_type)
        .bind(event.payload.to_string())
        .bind(&now)
        .execute(&mut *db_tx)
        .await
        .map_err(map_db_err)?;

        db_tx
            .commit()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok((sub, tx))
    }
}

impl SqliteStore {
    /// Looks up the subscription created alongside a transaction.
    pub async fn subscription_for_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<Subscription>, StoreError> {
        let row: Option<DbSubscription> = sqlx::query_as(
            r#"SELECT id, owner_id, amount, currency, payment_method, billing_frequency, transaction_id, created_at
               FROM subscriptions WHERE transaction_id = ?"#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;

        row.map(DbSubscription::into_domain).transpose()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Card store implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl CardStore for SqliteStore {
    async fn insert_card(&self, card: UserCard) -> Result<UserCard, StoreError> {
        sqlx::query(
            r#"INSERT INTO user_cards (id, owner_id, last4, exp_month, exp_year, brand, purpose, provider_token, customer_ref, is_active, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(card.id.to_string())
        .bind(card.owner_id.to_string())
        .bind(&card.last4)
        .bind(card.exp_month)
        .bind(card.exp_year)
        .bind(&card.brand)
        .bind(card.purpose.to_string())
        .bind(&card.provider_token)
        .bind(&card.customer_ref)
        .bind(card.is_active as i64)
        .bind(card.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(card)
    }

    async fn cards_for_owner(&self, owner: OwnerId) -> Result<Vec<UserCard>, StoreError> {
        let rows: Vec<DbUserCard> = sqlx::query_as(
            r#"SELECT id, owner_id, last4, exp_month, exp_year, brand, purpose, provider_token, customer_ref, is_active, created_at
               FROM user_cards WHERE owner_id = ?
               ORDER BY created_at ASC"#,
        )
        .bind(owner.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        rows.into_iter().map(DbUserCard::into_domain).collect()
    }

    async fn deactivate_card(&self, owner: OwnerId, id: CardId) -> Result<bool, StoreError> {
        let result =
            sqlx::query(r#"UPDATE user_cards SET is_active = 0 WHERE id = ? AND owner_id = ?"#)
                .bind(id.to_string())
                .bind(owner.to_string())
                .execute(&self.pool)
                .await
                .map_err(map_db_err)?;

        Ok(result.rows_affected() > 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Notification outbox (internal)
// ─────────────────────────────────────────────────────────────────────────────

impl SqliteStore {
    pub async fn get_pending_notifications(
        &self,
        limit: i64,
    ) -> Result<Vec<NotificationEvent>, StoreError> {
        let rows: Vec<DbNotificationEvent> = sqlx::query_as(
            r#"
            SELECT id, event_type, payload, status, created_at, processed_at, attempts, last_error
            FROM notification_events
            WHERE status = 'PENDING'
            ORDER BY created_at ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        rows.into_iter().map(|row| row.into_domain()).collect()
    }

    pub async fn update_notification_status(
        &self,
        id: uuid::Uuid,
        status: NotificationStatus,
        last_error: Option<String>,
    ) -> Result<(), StoreError> {
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            UPDATE notification_events
            SET status = ?, processed_at = ?, last_error = ?, attempts = attempts + 1
            WHERE id = ?
            "#,
        )
        .bind(status.to_string())
        .bind(now)
        .bind(last_error)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(())
    }
}
