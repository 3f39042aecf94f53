//! Stripe adapter.
//!
//! Create maps to a Checkout Session (redirect flow), capture to a direct
//! charge against a stored customer instrument, and token exchange to
//! customer creation from a one-time card token.

use serde::Deserialize;
use tracing::warn;

use ledger_types::{
    CardTokenizer, GatewayError, Money, OwnerId, PaymentGateway, PaymentResult, TokenizedCard,
};

pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self::with_api_base(secret_key, "https://api.stripe.com")
    }

    /// Base override for sandboxes and test doubles.
    pub fn with_api_base(secret_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: secret_key.into(),
            api_base: api_base.into(),
        }
    }

    fn transport(e: reqwest::Error) -> GatewayError {
        GatewayError::Transport(format!("stripe: {}", e))
    }
}

#[derive(Deserialize)]
struct CheckoutSession {
    id: String,
    url: Option<String>,
}

#[derive(Deserialize)]
struct Charge {
    id: String,
    status: String,
}

#[derive(Deserialize)]
struct Customer {
    id: String,
    sources: Sources,
}

#[derive(Deserialize)]
struct Sources {
    data: Vec<Source>,
}

#[derive(Deserialize)]
struct Source {
    id: String,
    last4: String,
    brand: String,
    exp_month: i32,
    exp_year: i32,
}

#[async_trait::async_trait]
impl PaymentGateway for StripeGateway {
    fn name(&self) -> &'static str {
        "stripe"
    }

    async fn create_payment(
        &self,
        amount: Money,
        return_url: &str,
        cancel_url: &str,
    ) -> Result<PaymentResult, GatewayError> {
        let amount_str = amount.amount().to_string();
        let params = [
            ("mode", "payment"),
            ("success_url", return_url),
            ("cancel_url", cancel_url),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", amount.currency().code()),
            ("line_items[0][price_data][unit_amount]", amount_str.as_str()),
            (
                "line_items[0][price_data][product_data][name]",
                "Marketplace payment",
            ),
        ];

        let resp = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(Self::transport)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, "stripe checkout session rejected: {}", body.chars().take(200).collect::<String>());
            return Ok(PaymentResult::failed());
        }

        let session: CheckoutSession = resp.json().await.map_err(Self::transport)?;
        Ok(PaymentResult::pending(session.id, session.url))
    }

    async fn capture_payment(
        &self,
        payment_id: &str,
        customer_ref: &str,
        amount: Money,
        description: &str,
    ) -> Result<PaymentResult, GatewayError> {
        let amount_str = amount.amount().to_string();
        let params = [
            ("amount", amount_str.as_str()),
            ("currency", amount.currency().code()),
            ("customer", customer_ref),
            ("source", payment_id),
            ("description", description),
        ];

        let resp = self
            .client
            .post(format!("{}/v1/charges", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(Self::transport)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, "stripe charge declined: {}", body.chars().take(200).collect::<String>());
            return Ok(PaymentResult::failed());
        }

        let charge: Charge = resp.json().await.map_err(Self::transport)?;
        if charge.status == "succeeded" {
            Ok(PaymentResult::completed(charge.id))
        } else {
            Ok(PaymentResult::failed())
        }
    }
}

#[async_trait::async_trait]
impl CardTokenizer for StripeGateway {
    async fn exchange_token(
        &self,
        owner: OwnerId,
        one_time_token: &str,
    ) -> Result<TokenizedCard, GatewayError> {
        let owner_str = owner.to_string();
        let params = [
            ("source", one_time_token),
            ("metadata[owner_id]", owner_str.as_str()),
        ];

        let resp = self
            .client
            .post(format!("{}/v1/customers", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(Self::transport)?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::InvalidToken(
                body.chars().take(200).collect::<String>(),
            ));
        }

        let customer: Customer = resp.json().await.map_err(Self::transport)?;
        let card = customer
            .sources
            .data
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::InvalidToken("token carried no card".into()))?;

        // Later charges need the pair: the card id as the source and the
        // customer id it is attached to.
        Ok(TokenizedCard {
            provider_token: card.id,
            customer_ref: customer.id,
            last4: card.last4,
            brand: card.brand,
            exp_month: card.exp_month,
            exp_year: card.exp_year,
        })
    }
}
