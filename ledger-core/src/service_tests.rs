//! Service-layer tests over in-memory store mocks.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use ledger_gateways::{GatewayFactory, MockBehavior, MockGateway};
use ledger_types::{
    BillingFrequency, CardId, CardPurpose, CardStore, ChargeRequest, CreateSubscriptionRequest,
    Currency, GatewayError, LedgerStore, Money, OwnerId, PaymentGateway, PaymentRequest,
    PaymentResult, SaveCardRequest, ServiceError, StoreError, Subscription, SubscriptionRecord,
    Transaction, TransactionId, TransferKind, TransferRecord, UserCard, WalletPaymentRequest,
};

use crate::service::PaymentService;
use crate::vault::CardVault;

// ─────────────────────────────────────────────────────────────────────────────
// In-memory mocks
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct MockLedger {
    transactions: Mutex<Vec<Transaction>>,
    wallets: Mutex<HashMap<OwnerId, Money>>,
    subscriptions: Mutex<Vec<Subscription>>,
    /// Scripted number of record calls that fail with a write conflict
    /// before one succeeds.
    conflicts: AtomicUsize,
}

impl MockLedger {
    fn with_conflicts(n: usize) -> Self {
        let ledger = Self::default();
        ledger.conflicts.store(n, Ordering::SeqCst);
        ledger
    }

    fn wallet_balance(&self, owner: OwnerId) -> i64 {
        self.wallets
            .lock()
            .unwrap()
            .get(&owner)
            .map(|m| m.amount())
            .unwrap_or(0)
    }

    fn transaction_count(&self) -> usize {
        self.transactions.lock().unwrap().len()
    }
}

#[async_trait]
impl LedgerStore for MockLedger {
    async fn record_transfer(&self, rec: TransferRecord) -> Result<Transaction, StoreError> {
        if self
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StoreError::Conflict("scripted wallet race".into()));
        }

        let tx = Transaction::completed(
            rec.sender_id,
            rec.recipient_id,
            rec.amount,
            rec.platform_fee,
            rec.kind,
            rec.provider_ref,
            rec.request_key,
            rec.reference,
        )?;

        let mut transactions = self.transactions.lock().unwrap();
        let mut wallets = self.wallets.lock().unwrap();

        if let Some(key) = &tx.request_key {
            if let Some(existing) = transactions
                .iter()
                .find(|t| t.request_key.as_deref() == Some(key))
            {
                return Ok(existing.clone());
            }
        }

        if tx.kind == TransferKind::WalletTransfer {
            let balance = wallets
                .entry(tx.sender_id)
                .or_insert_with(|| Money::zero(tx.amount.currency()));
            *balance = balance.checked_sub(tx.amount)?;
        }
        let balance = wallets
            .entry(tx.recipient_id)
            .or_insert_with(|| Money::zero(tx.amount.currency()));
        *balance = balance.checked_add(tx.net_amount())?;

        transactions.push(tx.clone());
        Ok(tx)
    }

    async fn find_by_request_key(&self, key: &str) -> Result<Option<Transaction>, StoreError> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.request_key.as_deref() == Some(key))
            .cloned())
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn get_wallet(&self, owner: OwnerId) -> Result<Option<ledger_types::Wallet>, StoreError> {
        Ok(self
            .wallets
            .lock()
            .unwrap()
            .get(&owner)
            .map(|balance| {
                ledger_types::Wallet::from_parts(owner, *balance, chrono_now())
            }))
    }

    async fn transactions_for_owner(
        &self,
        owner: OwnerId,
    ) -> Result<Vec<Transaction>, StoreError> {
        let mut matching: Vec<Transaction> = self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.involves(owner))
            .cloned()
            .collect();
        matching.reverse();
        Ok(matching)
    }

    async fn create_subscription(
        &self,
        rec: SubscriptionRecord,
    ) -> Result<(Subscription, Transaction), StoreError> {
        if let Some(key) = &rec.request_key {
            let transactions = self.transactions.lock().unwrap();
            if let Some(existing_tx) = transactions
                .iter()
                .find(|t| t.request_key.as_deref() == Some(key))
            {
                let sub = self
                    .subscriptions
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|s| s.transaction_id == existing_tx.id)
                    .cloned()
                    .ok_or(StoreError::NotFound)?;
                return Ok((sub, existing_tx.clone()));
            }
        }

        let tx = Transaction::completed(
            rec.owner_id,
            rec.recipient_id,
            rec.amount,
            Money::zero(rec.amount.currency()),
            TransferKind::Charge,
            rec.provider_ref,
            rec.request_key,
            None,
        )?;
        let sub = Subscription::new(
            rec.owner_id,
            rec.amount,
            rec.payment_method,
            rec.billing_frequency,
            tx.id,
        );

        let mut wallets = self.wallets.lock().unwrap();
        let balance = wallets
            .entry(tx.recipient_id)
            .or_insert_with(|| Money::zero(tx.amount.currency()));
        *balance = balance.checked_add(tx.net_amount())?;

        self.transactions.lock().unwrap().push(tx.clone());
        self.subscriptions.lock().unwrap().push(sub.clone());
        Ok((sub, tx))
    }
}

#[derive(Default)]
struct MockCards {
    cards: Mutex<Vec<UserCard>>,
}

#[async_trait]
impl CardStore for MockCards {
    async fn insert_card(&self, card: UserCard) -> Result<UserCard, StoreError> {
        self.cards.lock().unwrap().push(card.clone());
        Ok(card)
    }

    async fn cards_for_owner(&self, owner: OwnerId) -> Result<Vec<UserCard>, StoreError> {
        Ok(self
            .cards
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn deactivate_card(&self, owner: OwnerId, id: CardId) -> Result<bool, StoreError> {
        let mut cards = self.cards.lock().unwrap();
        match cards.iter_mut().find(|c| c.id == id && c.owner_id == owner) {
            Some(card) => {
                card.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn chrono_now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────────────

fn service_with(
    behavior: MockBehavior,
) -> (Arc<MockLedger>, Arc<MockGateway>, PaymentService<MockLedger>) {
    let ledger = Arc::new(MockLedger::default());
    let gateway = Arc::new(MockGateway::new(behavior));
    let mut factory = GatewayFactory::new();
    factory.register("Stripe", gateway.clone());
    let service = PaymentService::new(ledger.clone(), Arc::new(factory));
    (ledger, gateway, service)
}

fn charge_req(sender: OwnerId, recipient: OwnerId, amount: i64, fee: i64) -> ChargeRequest {
    ChargeRequest {
        sender_id: sender,
        recipient_id: recipient,
        amount,
        currency: Currency::USD,
        platform_fee: fee,
        gateway: "Stripe".into(),
        payment_method: "card_tok_test".into(),
        customer_ref: "cus_test".into(),
        description: None,
        request_key: None,
        reference: None,
    }
}

/// Gateway that records the arguments of every capture and yields before
/// answering, so interleavings between concurrent callers actually happen.
#[derive(Default)]
struct RecordingGateway {
    captures: Mutex<Vec<(String, String)>>,
}

impl RecordingGateway {
    fn captured(&self) -> Vec<(String, String)> {
        self.captures.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn create_payment(
        &self,
        _amount: Money,
        _return_url: &str,
        _cancel_url: &str,
    ) -> Result<PaymentResult, GatewayError> {
        Ok(PaymentResult::pending("rec_pay".to_string(), None))
    }

    async fn capture_payment(
        &self,
        payment_id: &str,
        customer_ref: &str,
        _amount: Money,
        _description: &str,
    ) -> Result<PaymentResult, GatewayError> {
        let call = {
            let mut captures = self.captures.lock().unwrap();
            captures.push((payment_id.to_string(), customer_ref.to_string()));
            captures.len()
        };
        tokio::task::yield_now().await;
        Ok(PaymentResult::completed(format!("rec_charge_{call}")))
    }
}

fn service_with_recording() -> (
    Arc<MockLedger>,
    Arc<RecordingGateway>,
    PaymentService<MockLedger>,
) {
    let ledger = Arc::new(MockLedger::default());
    let gateway = Arc::new(RecordingGateway::default());
    let mut factory = GatewayFactory::new();
    factory.register("Stripe", gateway.clone());
    let service = PaymentService::new(ledger.clone(), Arc::new(factory));
    (ledger, gateway, service)
}

// ─────────────────────────────────────────────────────────────────────────────
// Charges
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_charge_credits_net_amount() {
    let (ledger, _, service) = service_with(MockBehavior::Succeed);
    let buyer = OwnerId::new();
    let seller = OwnerId::new();

    let receipt = service
        .charge_card(charge_req(buyer, seller, 10000, 1000))
        .await
        .unwrap();

    assert!(receipt.payment.is_completed());
    let tx = receipt.transaction.unwrap();
    assert_eq!(tx.net_amount().amount(), 9000);

    // Fee is retained by the platform: credited to neither wallet.
    assert_eq!(ledger.wallet_balance(seller), 9000);
    assert_eq!(ledger.wallet_balance(buyer), 0);
}

#[tokio::test]
async fn test_declined_charge_writes_no_ledger_row() {
    let (ledger, gateway, service) = service_with(MockBehavior::Decline);
    let buyer = OwnerId::new();
    let seller = OwnerId::new();

    let receipt = service
        .charge_card(charge_req(buyer, seller, 10000, 1000))
        .await
        .unwrap();

    assert!(!receipt.payment.is_completed());
    assert!(receipt.payment.payment_id.is_none());
    assert!(receipt.transaction.is_none());
    assert_eq!(gateway.capture_calls(), 1);
    assert_eq!(ledger.transaction_count(), 0);
    assert_eq!(ledger.wallet_balance(seller), 0);
}

#[tokio::test]
async fn test_transport_fault_surfaces_as_unavailable() {
    let (ledger, _, service) = service_with(MockBehavior::Timeout);

    let err = service
        .charge_card(charge_req(OwnerId::new(), OwnerId::new(), 1000, 0))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Unavailable(_)));
    assert_eq!(ledger.transaction_count(), 0);
}

#[tokio::test]
async fn test_unknown_gateway_rejected_before_provider_call() {
    let (ledger, gateway, service) = service_with(MockBehavior::Succeed);

    let mut req = charge_req(OwnerId::new(), OwnerId::new(), 1000, 0);
    req.gateway = "DoesNotExist".into();
    let err = service.charge_card(req).await.unwrap_err();

    assert!(matches!(err, ServiceError::UnknownGateway(key) if key == "DoesNotExist"));
    assert_eq!(gateway.capture_calls(), 0);
    assert_eq!(ledger.transaction_count(), 0);
}

#[tokio::test]
async fn test_non_positive_amount_rejected() {
    let (_, gateway, service) = service_with(MockBehavior::Succeed);

    let err = service
        .charge_card(charge_req(OwnerId::new(), OwnerId::new(), 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::BadRequest(_)));
    assert_eq!(gateway.capture_calls(), 0);
}

#[tokio::test]
async fn test_charge_sends_instrument_and_customer_as_distinct_args() {
    let (_, gateway, service) = service_with_recording();

    let mut req = charge_req(OwnerId::new(), OwnerId::new(), 1000, 0);
    req.payment_method = "card_tok_9".into();
    req.customer_ref = "cus_12345".into();
    service.charge_card(req).await.unwrap();

    // The stored card token is the charge source; the customer it is
    // attached to rides alongside, never in its place.
    assert_eq!(
        gateway.captured(),
        vec![("card_tok_9".to_string(), "cus_12345".to_string())]
    );
}

#[tokio::test]
async fn test_duplicate_request_key_charges_provider_once() {
    let (ledger, gateway, service) = service_with(MockBehavior::Succeed);
    let buyer = OwnerId::new();
    let seller = OwnerId::new();

    let mut req = charge_req(buyer, seller, 5000, 500);
    req.request_key = Some("order-77".into());

    let first = service.charge_card(req.clone()).await.unwrap();
    let second = service.charge_card(req).await.unwrap();

    assert_eq!(
        first.transaction.as_ref().unwrap().id,
        second.transaction.as_ref().unwrap().id
    );
    assert_eq!(gateway.capture_calls(), 1);
    assert_eq!(ledger.wallet_balance(seller), 4500);
    assert_eq!(ledger.transaction_count(), 1);
}

#[tokio::test]
async fn test_reference_derives_idempotency_key() {
    let (ledger, _, service) = service_with(MockBehavior::Succeed);
    let buyer = OwnerId::new();
    let seller = OwnerId::new();

    let mut req = charge_req(buyer, seller, 5000, 0);
    req.reference = Some("listing-42".into());

    service.charge_card(req.clone()).await.unwrap();
    service.charge_card(req).await.unwrap();

    assert_eq!(ledger.transaction_count(), 1);
    assert_eq!(ledger.wallet_balance(seller), 5000);
}

#[tokio::test]
async fn test_concurrent_duplicates_credit_once() {
    let (ledger, _, service) = service_with(MockBehavior::Succeed);
    let buyer = OwnerId::new();
    let seller = OwnerId::new();

    let mut req = charge_req(buyer, seller, 3000, 300);
    req.request_key = Some("order-race".into());

    let (a, b) = tokio::join!(service.charge_card(req.clone()), service.charge_card(req));
    let a = a.unwrap().transaction.unwrap();
    let b = b.unwrap().transaction.unwrap();

    assert_eq!(a.id, b.id);
    assert_eq!(ledger.transaction_count(), 1);
    assert_eq!(ledger.wallet_balance(seller), 2700);
}

#[tokio::test]
async fn test_interleaved_duplicates_reach_provider_once() {
    // The capture suspends mid-flight, so without per-key serialization
    // both submissions would pass the replay check and charge twice.
    let (ledger, gateway, service) = service_with_recording();
    let buyer = OwnerId::new();
    let seller = OwnerId::new();

    let mut req = charge_req(buyer, seller, 3000, 300);
    req.request_key = Some("order-interleaved".into());

    let (a, b) = tokio::join!(service.charge_card(req.clone()), service.charge_card(req));
    let a = a.unwrap().transaction.unwrap();
    let b = b.unwrap().transaction.unwrap();

    assert_eq!(a.id, b.id);
    assert_eq!(gateway.captured().len(), 1);
    assert_eq!(ledger.transaction_count(), 1);
    assert_eq!(ledger.wallet_balance(seller), 2700);
}

#[tokio::test]
async fn test_conflict_is_retried_until_success() {
    let ledger = Arc::new(MockLedger::with_conflicts(2));
    let mut factory = GatewayFactory::new();
    factory.register("Stripe", Arc::new(MockGateway::new(MockBehavior::Succeed)));
    let service = PaymentService::new(ledger.clone(), Arc::new(factory));

    let receipt = service
        .charge_card(charge_req(OwnerId::new(), OwnerId::new(), 1000, 0))
        .await
        .unwrap();

    assert!(receipt.transaction.is_some());
    assert_eq!(ledger.transaction_count(), 1);
}

#[tokio::test]
async fn test_exhausted_conflict_retries_surface_as_unavailable() {
    let ledger = Arc::new(MockLedger::with_conflicts(10));
    let mut factory = GatewayFactory::new();
    factory.register("Stripe", Arc::new(MockGateway::new(MockBehavior::Succeed)));
    let service = PaymentService::new(ledger, Arc::new(factory));

    let err = service
        .charge_card(charge_req(OwnerId::new(), OwnerId::new(), 1000, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unavailable(_)));
}

// ─────────────────────────────────────────────────────────────────────────────
// Wallet payments
// ─────────────────────────────────────────────────────────────────────────────

fn wallet_req(sender: OwnerId, recipient: OwnerId, amount: i64, fee: i64) -> WalletPaymentRequest {
    WalletPaymentRequest {
        sender_id: sender,
        recipient_id: recipient,
        amount,
        currency: Currency::USD,
        platform_fee: fee,
        request_key: None,
        reference: None,
    }
}

#[tokio::test]
async fn test_wallet_payment_debits_gross_credits_net() {
    let (ledger, _, service) = service_with(MockBehavior::Succeed);
    let buyer = OwnerId::new();
    let seller = OwnerId::new();

    // Fund the buyer through an external charge first.
    service
        .charge_card(charge_req(OwnerId::new(), buyer, 10000, 0))
        .await
        .unwrap();

    service
        .pay_from_wallet(wallet_req(buyer, seller, 4000, 400))
        .await
        .unwrap();

    assert_eq!(ledger.wallet_balance(buyer), 6000);
    assert_eq!(ledger.wallet_balance(seller), 3600);
}

#[tokio::test]
async fn test_wallet_payment_insufficient_funds() {
    let (ledger, _, service) = service_with(MockBehavior::Succeed);
    let buyer = OwnerId::new();
    let seller = OwnerId::new();

    let err = service
        .pay_from_wallet(wallet_req(buyer, seller, 4000, 0))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InsufficientFunds { .. }));
    assert_eq!(ledger.transaction_count(), 0);
    assert_eq!(ledger.wallet_balance(seller), 0);
}

#[tokio::test]
async fn test_self_payment_rejected() {
    let (_, _, service) = service_with(MockBehavior::Succeed);
    let owner = OwnerId::new();

    let err = service
        .pay_from_wallet(wallet_req(owner, owner, 100, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::BadRequest(_)));
}

// ─────────────────────────────────────────────────────────────────────────────
// History
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_history_is_symmetric_and_newest_first() {
    let (_, _, service) = service_with(MockBehavior::Succeed);
    let alice = OwnerId::new();
    let bob = OwnerId::new();

    let first = service
        .charge_card(charge_req(alice, bob, 5000, 500))
        .await
        .unwrap()
        .transaction
        .unwrap();

    service
        .charge_card(charge_req(OwnerId::new(), bob, 2000, 0))
        .await
        .unwrap();

    let bob_history = service.payment_history(bob).await.unwrap();
    assert_eq!(bob_history.wallet_balance, 4500 + 2000);
    assert_eq!(bob_history.transactions.len(), 2);
    assert_eq!(bob_history.transactions[1].id, first.id);

    // Alice sees the same row from the sender side, with no wallet yet.
    let alice_history = service.payment_history(alice).await.unwrap();
    assert_eq!(alice_history.wallet_balance, 0);
    assert_eq!(alice_history.transactions.len(), 1);
    assert_eq!(alice_history.transactions[0].id, first.id);
}

#[tokio::test]
async fn test_history_for_unknown_owner_is_empty() {
    let (_, _, service) = service_with(MockBehavior::Succeed);

    let history = service.payment_history(OwnerId::new()).await.unwrap();
    assert_eq!(history.wallet_balance, 0);
    assert!(history.transactions.is_empty());
}

#[tokio::test]
async fn test_fee_accounting_across_charges() {
    let (ledger, _, service) = service_with(MockBehavior::Succeed);
    let seller = OwnerId::new();

    service
        .charge_card(charge_req(OwnerId::new(), seller, 5000, 500))
        .await
        .unwrap();
    service
        .charge_card(charge_req(OwnerId::new(), seller, 10000, 1000))
        .await
        .unwrap();

    // 4500 + 9000 credited; 1500 retained off-wallet but on the ledger.
    assert_eq!(ledger.wallet_balance(seller), 13500);
    let history = service.payment_history(seller).await.unwrap();
    let fees: i64 = history
        .transactions
        .iter()
        .map(|t| t.platform_fee.amount())
        .sum();
    assert_eq!(fees, 1500);
}

#[tokio::test]
async fn test_repeat_charges_between_same_pair_are_distinct_rows() {
    let (ledger, _, service) = service_with(MockBehavior::Succeed);
    let buyer = OwnerId::new();
    let seller = OwnerId::new();

    service
        .charge_card(charge_req(buyer, seller, 5000, 500))
        .await
        .unwrap();
    service
        .charge_card(charge_req(buyer, seller, 10000, 1000))
        .await
        .unwrap();

    // Without a request key or reference nothing is deduplicated: a second
    // purchase between the same two parties is a second row.
    assert_eq!(ledger.transaction_count(), 2);
    assert_eq!(ledger.wallet_balance(seller), 4500 + 9000);
    assert_eq!(ledger.wallet_balance(buyer), 0);

    let seller_history = service.payment_history(seller).await.unwrap();
    assert_eq!(seller_history.transactions.len(), 2);
    let buyer_history = service.payment_history(buyer).await.unwrap();
    assert_eq!(buyer_history.transactions.len(), 2);
    assert_eq!(buyer_history.wallet_balance, 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Initiation
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_payment_passes_through_provider_result() {
    let (ledger, _, service) = service_with(MockBehavior::Succeed);

    let result = service
        .create_payment(PaymentRequest {
            amount: 2500,
            currency: Currency::USD,
            return_url: "https://shop.example/ok".into(),
            cancel_url: "https://shop.example/cancel".into(),
            gateway: "Stripe".into(),
        })
        .await
        .unwrap();

    assert!(result.payment_id.is_some());
    assert!(result.approval_url.is_some());
    // Initiation never touches the ledger.
    assert_eq!(ledger.transaction_count(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Subscriptions
// ─────────────────────────────────────────────────────────────────────────────

fn subscription_req(owner: OwnerId, recipient: OwnerId, key: Option<&str>) -> CreateSubscriptionRequest {
    CreateSubscriptionRequest {
        owner_id: owner,
        recipient_id: recipient,
        amount: 2500,
        currency: Currency::USD,
        gateway: "Stripe".into(),
        payment_method: "card_abc".into(),
        customer_ref: "cus_test".into(),
        billing_frequency: BillingFrequency::Monthly,
        request_key: key.map(String::from),
    }
}

#[tokio::test]
async fn test_subscription_pairs_charge_and_record() {
    let (ledger, _, service) = service_with(MockBehavior::Succeed);
    let owner = OwnerId::new();
    let platform = OwnerId::new();

    let receipt = service
        .create_subscription(subscription_req(owner, platform, None))
        .await
        .unwrap();

    assert!(receipt.payment.is_completed());
    let tx = ledger
        .get_transaction(receipt.transaction_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.amount.amount(), 2500);
    assert_eq!(ledger.wallet_balance(platform), 2500);
}

#[tokio::test]
async fn test_declined_subscription_creates_nothing() {
    let (ledger, _, service) = service_with(MockBehavior::Decline);

    let err = service
        .create_subscription(subscription_req(OwnerId::new(), OwnerId::new(), None))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::BadRequest(_)));
    assert_eq!(ledger.transaction_count(), 0);
    assert!(ledger.subscriptions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_subscription_replay_charges_once() {
    let (ledger, gateway, service) = service_with(MockBehavior::Succeed);
    let owner = OwnerId::new();
    let platform = OwnerId::new();

    let first = service
        .create_subscription(subscription_req(owner, platform, Some("sub-9")))
        .await
        .unwrap();
    let second = service
        .create_subscription(subscription_req(owner, platform, Some("sub-9")))
        .await
        .unwrap();

    assert_eq!(first.subscription_id, second.subscription_id);
    assert_eq!(first.transaction_id, second.transaction_id);
    assert_eq!(gateway.capture_calls(), 1);
    assert_eq!(ledger.wallet_balance(platform), 2500);
}

// ─────────────────────────────────────────────────────────────────────────────
// Card vault
// ─────────────────────────────────────────────────────────────────────────────

fn vault_with(behavior: MockBehavior) -> (Arc<MockCards>, CardVault<MockCards>) {
    let cards = Arc::new(MockCards::default());
    let tokenizer = Arc::new(MockGateway::new(behavior));
    (cards.clone(), CardVault::new(cards, tokenizer))
}

#[tokio::test]
async fn test_save_card_exchanges_token() {
    let (cards, vault) = vault_with(MockBehavior::Succeed);
    let owner = OwnerId::new();

    let card = vault
        .save_card(
            owner,
            SaveCardRequest {
                one_time_token: "tok_visa".into(),
                purpose: CardPurpose::Paying,
            },
        )
        .await
        .unwrap();

    assert_eq!(card.last4, "4242");
    assert_eq!(card.purpose, CardPurpose::Paying);
    assert!(card.is_active);
    assert_eq!(cards.cards.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_rejected_token_stores_nothing() {
    let (cards, vault) = vault_with(MockBehavior::Decline);

    let err = vault
        .save_card(
            OwnerId::new(),
            SaveCardRequest {
                one_time_token: "tok_bad".into(),
                purpose: CardPurpose::Paying,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidToken(_)));
    assert!(cards.cards.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_deactivate_card_scoped_to_owner() {
    let (_, vault) = vault_with(MockBehavior::Succeed);
    let owner = OwnerId::new();

    let card = vault
        .save_card(
            owner,
            SaveCardRequest {
                one_time_token: "tok_visa".into(),
                purpose: CardPurpose::Receiving,
            },
        )
        .await
        .unwrap();

    // Someone else cannot deactivate it.
    let err = vault.deactivate_card(OwnerId::new(), card.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    vault.deactivate_card(owner, card.id).await.unwrap();
    let cards = vault.user_cards(owner).await.unwrap();
    assert!(!cards[0].is_active);
}
