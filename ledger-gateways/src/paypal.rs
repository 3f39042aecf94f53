//! PayPal adapter.
//!
//! Orders v2: create an order with an approval link, capture it after the
//! payer approves. Each call fetches a client-credentials token; PayPal
//! caches them server-side so this stays cheap at this volume.

use serde::Deserialize;
use tracing::warn;

use ledger_types::{GatewayError, Money, PaymentGateway, PaymentResult};

pub struct PayPalGateway {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    api_base: String,
}

impl PayPalGateway {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::with_api_base(client_id, client_secret, "https://api-m.paypal.com")
    }

    pub fn with_api_base(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_base: api_base.into(),
        }
    }

    fn transport(e: reqwest::Error) -> GatewayError {
        GatewayError::Transport(format!("paypal: {}", e))
    }

    async fn access_token(&self) -> Result<String, GatewayError> {
        let resp = self
            .client
            .post(format!("{}/v1/oauth2/token", self.api_base))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(Self::transport)?;

        if !resp.status().is_success() {
            return Err(GatewayError::Transport(format!(
                "paypal auth failed: HTTP {}",
                resp.status()
            )));
        }

        let token: OAuthToken = resp.json().await.map_err(Self::transport)?;
        Ok(token.access_token)
    }
}

#[derive(Deserialize)]
struct OAuthToken {
    access_token: String,
}

#[derive(Deserialize)]
struct Order {
    id: String,
    status: String,
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Deserialize)]
struct Link {
    rel: String,
    href: String,
}

#[async_trait::async_trait]
impl PaymentGateway for PayPalGateway {
    fn name(&self) -> &'static str {
        "paypal"
    }

    async fn create_payment(
        &self,
        amount: Money,
        return_url: &str,
        cancel_url: &str,
    ) -> Result<PaymentResult, GatewayError> {
        let token = self.access_token().await?;
        let body = serde_json::json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "amount": {
                    "currency_code": amount.currency().to_string(),
                    "value": amount.to_decimal_string(),
                }
            }],
            "application_context": {
                "return_url": return_url,
                "cancel_url": cancel_url,
            }
        });

        let resp = self
            .client
            .post(format!("{}/v2/checkout/orders", self.api_base))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(Self::transport)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, "paypal order rejected: {}", body.chars().take(200).collect::<String>());
            return Ok(PaymentResult::failed());
        }

        let order: Order = resp.json().await.map_err(Self::transport)?;
        let approval_url = order
            .links
            .iter()
            .find(|l| l.rel == "approve")
            .map(|l| l.href.clone());

        match order.status.as_str() {
            "COMPLETED" => Ok(PaymentResult::completed(order.id)),
            _ => Ok(PaymentResult::pending(order.id, approval_url)),
        }
    }

    async fn capture_payment(
        &self,
        payment_id: &str,
        _customer_ref: &str,
        _amount: Money,
        _description: &str,
    ) -> Result<PaymentResult, GatewayError> {
        let token = self.access_token().await?;

        let resp = self
            .client
            .post(format!(
                "{}/v2/checkout/orders/{}/capture",
                self.api_base, payment_id
            ))
            .bearer_auth(&token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(Self::transport)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, "paypal capture declined: {}", body.chars().take(200).collect::<String>());
            return Ok(PaymentResult::failed());
        }

        let order: Order = resp.json().await.map_err(Self::transport)?;
        if order.status == "COMPLETED" {
            Ok(PaymentResult::completed(order.id))
        } else {
            Ok(PaymentResult::failed())
        }
    }
}
