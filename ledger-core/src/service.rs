//! Payment service: the core orchestration layer.
//!
//! Wires gateway adapters to the ledger store. The service owns idempotency
//! (gateways never deduplicate) and the retry policy for contended ledger
//! writes. Provider declines are outcomes, not errors; only faults surface
//! as `ServiceError`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;
use tracing::{info, instrument, warn};

use ledger_gateways::GatewayFactory;
use ledger_types::{
    ChargeRequest, CreateSubscriptionRequest, DomainError, LedgerStore, Money, OwnerId,
    PaymentHistory, PaymentRequest, PaymentResult, ServiceError, StoreError, SubscriptionReceipt,
    SubscriptionRecord, Transaction, TransferKind, TransferRecord, WalletPaymentRequest,
};

use crate::fingerprint::derive_request_key;

/// Bounded retries for ledger writes that lose a wallet-row race.
const MAX_CONFLICT_RETRIES: u32 = 3;

/// Outcome of a capture attempt: the provider verdict, plus the ledger row
/// when the charge settled. A declined charge carries no transaction.
#[derive(Debug, Clone)]
pub struct ChargeReceipt {
    pub payment: PaymentResult,
    pub transaction: Option<Transaction>,
}

/// Serializes in-flight submissions that share a request key. The unique
/// index collapses duplicate ledger rows, but two concurrent submissions
/// could otherwise both pass the replay check and charge the provider
/// twice; holding the key's lock across the capture closes that window.
struct RequestKeyLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl RequestKeyLocks {
    fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap();
            // Drop entries nobody is holding or waiting on.
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            locks.entry(key.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Orchestrates payments, wallets and subscriptions over a ledger store
/// and a set of registered gateways.
pub struct PaymentService<L: LedgerStore> {
    ledger: Arc<L>,
    gateways: Arc<GatewayFactory>,
    key_locks: RequestKeyLocks,
}

impl<L: LedgerStore> PaymentService<L> {
    pub fn new(ledger: Arc<L>, gateways: Arc<GatewayFactory>) -> Self {
        Self {
            ledger,
            gateways,
            key_locks: RequestKeyLocks::new(),
        }
    }

    /// Initiates a payment with the named provider. Pure pass-through: no
    /// ledger row is written until the payment is captured.
    #[instrument(skip(self, req), fields(gateway = %req.gateway))]
    pub async fn create_payment(&self, req: PaymentRequest) -> Result<PaymentResult, ServiceError> {
        let amount = positive_money(req.amount, req.currency)?;
        let gateway = self.gateways.get(&req.gateway)?;
        let result = gateway
            .create_payment(amount, &req.return_url, &req.cancel_url)
            .await?;
        info!(status = %result.status, "payment initiated");
        Ok(result)
    }

    /// Captures a charge against a stored instrument and records it on the
    /// ledger. Idempotent under `request_key` (or the key derived from the
    /// reference): a duplicate submission neither re-charges the provider
    /// nor writes a second row.
    #[instrument(skip(self, req), fields(gateway = %req.gateway))]
    pub async fn charge_card(&self, req: ChargeRequest) -> Result<ChargeReceipt, ServiceError> {
        let amount = positive_money(req.amount, req.currency)?;
        let platform_fee = Money::new(req.platform_fee, req.currency)?;
        let request_key = effective_key(
            req.request_key.clone(),
            req.sender_id,
            req.recipient_id,
            req.reference.as_deref(),
        );

        // Replay check before touching the provider. The key's lock is held
        // across the capture so a concurrent duplicate waits here and then
        // sees the committed row.
        let _guard = match &request_key {
            Some(key) => Some(self.key_locks.acquire(key).await),
            None => None,
        };
        if let Some(key) = &request_key {
            if let Some(existing) = self.ledger.find_by_request_key(key).await? {
                info!(transaction_id = %existing.id, "duplicate charge replayed");
                return Ok(ChargeReceipt {
                    payment: replayed_payment(&existing),
                    transaction: Some(existing),
                });
            }
        }

        let gateway = self.gateways.get(&req.gateway)?;
        let description = req.description.as_deref().unwrap_or("Payment");
        let payment = gateway
            .capture_payment(&req.payment_method, &req.customer_ref, amount, description)
            .await?;

        if !payment.is_completed() {
            warn!(status = %payment.status, "provider declined charge");
            return Ok(ChargeReceipt {
                payment,
                transaction: None,
            });
        }

        let transaction = self
            .record_with_retry(TransferRecord {
                sender_id: req.sender_id,
                recipient_id: req.recipient_id,
                amount,
                platform_fee,
                kind: TransferKind::Charge,
                provider_ref: payment.payment_id.clone(),
                request_key,
                reference: req.reference,
            })
            .await?;

        info!(transaction_id = %transaction.id, "charge recorded");
        Ok(ChargeReceipt {
            payment,
            transaction: Some(transaction),
        })
    }

    /// Transfers funds from the sender's wallet to the recipient's. No
    /// provider is involved; the store enforces sufficient funds atomically.
    #[instrument(skip(self, req))]
    pub async fn pay_from_wallet(
        &self,
        req: WalletPaymentRequest,
    ) -> Result<Transaction, ServiceError> {
        let amount = positive_money(req.amount, req.currency)?;
        let platform_fee = Money::new(req.platform_fee, req.currency)?;
        let request_key = effective_key(
            req.request_key.clone(),
            req.sender_id,
            req.recipient_id,
            req.reference.as_deref(),
        );

        if let Some(key) = &request_key {
            if let Some(existing) = self.ledger.find_by_request_key(key).await? {
                info!(transaction_id = %existing.id, "duplicate wallet payment replayed");
                return Ok(existing);
            }
        }

        let transaction = self
            .record_with_retry(TransferRecord {
                sender_id: req.sender_id,
                recipient_id: req.recipient_id,
                amount,
                platform_fee,
                kind: TransferKind::WalletTransfer,
                provider_ref: None,
                request_key,
                reference: req.reference,
            })
            .await?;

        info!(transaction_id = %transaction.id, "wallet payment recorded");
        Ok(transaction)
    }

    /// Ledger projection for one owner: wallet balance plus every
    /// transaction the owner is a party to, newest first. An owner with no
    /// wallet sees a zero balance, not an error.
    pub async fn payment_history(&self, owner: OwnerId) -> Result<PaymentHistory, ServiceError> {
        let wallet_balance = self
            .ledger
            .get_wallet(owner)
            .await?
            .map(|w| w.balance.amount())
            .unwrap_or(0);
        let transactions = self.ledger.transactions_for_owner(owner).await?;

        Ok(PaymentHistory {
            wallet_balance,
            transactions,
        })
    }

    /// Charges the first period of a subscription and records the
    /// subscription with its originating transaction atomically. A declined
    /// first charge creates nothing.
    #[instrument(skip(self, req), fields(gateway = %req.gateway))]
    pub async fn create_subscription(
        &self,
        req: CreateSubscriptionRequest,
    ) -> Result<SubscriptionReceipt, ServiceError> {
        let amount = positive_money(req.amount, req.currency)?;

        let _guard = match &req.request_key {
            Some(key) => Some(self.key_locks.acquire(key).await),
            None => None,
        };
        // Replay returns the originally created pair without a new charge.
        if let Some(key) = &req.request_key {
            if let Some(existing) = self.ledger.find_by_request_key(key).await? {
                let (sub, tx) = self
                    .ledger
                    .create_subscription(SubscriptionRecord {
                        owner_id: req.owner_id,
                        recipient_id: req.recipient_id,
                        amount,
                        payment_method: req.payment_method.clone(),
                        billing_frequency: req.billing_frequency,
                        provider_ref: existing.provider_ref.clone(),
                        request_key: req.request_key.clone(),
                    })
                    .await?;
                info!(subscription_id = %sub.id, "duplicate subscription replayed");
                return Ok(SubscriptionReceipt {
                    subscription_id: sub.id,
                    transaction_id: tx.id,
                    payment: replayed_payment(&tx),
                });
            }
        }

        let gateway = self.gateways.get(&req.gateway)?;
        let payment = gateway
            .capture_payment(
                &req.payment_method,
                &req.customer_ref,
                amount,
                "Subscription",
            )
            .await?;

        if !payment.is_completed() {
            warn!(status = %payment.status, "provider declined subscription charge");
            return Err(ServiceError::BadRequest(
                "subscription payment was declined".into(),
            ));
        }

        let (sub, tx) = self
            .ledger
            .create_subscription(SubscriptionRecord {
                owner_id: req.owner_id,
                recipient_id: req.recipient_id,
                amount,
                payment_method: req.payment_method,
                billing_frequency: req.billing_frequency,
                provider_ref: payment.payment_id.clone(),
                request_key: req.request_key,
            })
            .await?;

        info!(subscription_id = %sub.id, transaction_id = %tx.id, "subscription created");
        Ok(SubscriptionReceipt {
            subscription_id: sub.id,
            transaction_id: tx.id,
            payment,
        })
    }

    /// Runs the atomic ledger unit, retrying a bounded number of times when
    /// it loses a wallet-row race. Safe because a conflicted unit commits
    /// nothing.
    async fn record_with_retry(&self, rec: TransferRecord) -> Result<Transaction, ServiceError> {
        let mut attempt = 0;
        loop {
            match self.ledger.record_transfer(rec.clone()).await {
                Err(StoreError::Conflict(msg)) if attempt < MAX_CONFLICT_RETRIES => {
                    attempt += 1;
                    warn!(attempt, reason = %msg, "ledger write conflict, retrying");
                }
                other => return other.map_err(ServiceError::from),
            }
        }
    }
}

/// The provider verdict reconstructed for a replayed submission.
fn replayed_payment(tx: &Transaction) -> PaymentResult {
    match &tx.provider_ref {
        Some(provider_ref) => PaymentResult::completed(provider_ref.clone()),
        None => PaymentResult::completed(tx.id.to_string()),
    }
}

fn positive_money(
    amount: i64,
    currency: ledger_types::Currency,
) -> Result<Money, ServiceError> {
    if amount <= 0 {
        return Err(DomainError::ValidationError("amount must be positive".into()).into());
    }
    Ok(Money::new(amount, currency)?)
}

fn effective_key(
    explicit: Option<String>,
    sender: OwnerId,
    recipient: OwnerId,
    reference: Option<&str>,
) -> Option<String> {
    explicit.or_else(|| reference.map(|r| derive_request_key(sender, recipient, r)))
}
