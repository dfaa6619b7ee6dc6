use crate::broker::rest::{build_query_string, value_to_f64, value_to_string, ApiResponse, StatusClass};
use crate::broker::signer::RequestSigner;
use crate::broker::{product_id, validate_amount, validate_asset, validate_date, Broker};
use crate::models::{Fill, TransactionRecord, Wallet};
use crate::{Error, ErrorKind, Result};
use reqwest::blocking::Client;
use reqwest::Method;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

pub const PRODUCTION_URL: &str = "https://api.pro.coinbase.com";
pub const SANDBOX_URL: &str = "https://api-public.sandbox.pro.coinbase.com";

const CASH_WALLET_NAME: &str = "Cash (USD)";

#[derive(Clone)]
pub struct CoinbaseConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for CoinbaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoinbaseConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

pub struct CoinbaseExchange {
    client: Client,
    signer: RequestSigner,
    config: CoinbaseConfig,
}

impl CoinbaseExchange {
    pub fn new(mut config: CoinbaseConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(Error::config("base_url must be set"));
        }
        if config.api_key.trim().is_empty() {
            return Err(Error::config("api_key must be set"));
        }
        if config.passphrase.trim().is_empty() {
            return Err(Error::config("passphrase must be set"));
        }
        let signer = RequestSigner::new(&config.api_secret)?;
        config.base_url = config.base_url.trim().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|err| Error::config(format!("http client build failed: {err}")))?;
        Ok(Self {
            client,
            signer,
            config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn is_sandbox(&self) -> bool {
        self.config.base_url.contains("sandbox")
    }

    fn signed_request(
        &self,
        method: Method,
        path: &str,
        params: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<ApiResponse> {
        let timestamp = RequestSigner::timestamp();
        let query = build_query_string(&params);
        let request_path = if query.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{query}")
        };
        let body_str = match body {
            Some(body) => serde_json::to_string(&body)
                .map_err(|err| Error::new(format!("json encode failed: {err}")))?,
            None => String::new(),
        };
        let sign = self
            .signer
            .sign(&timestamp, method.as_str(), &request_path, &body_str)?;

        let url = format!("{}{}", self.config.base_url, request_path);
        debug!(method = %method, path = %request_path, "broker request");
        let mut request = self
            .client
            .request(method, url)
            .header("CB-ACCESS-SIGN", sign)
            .header("CB-ACCESS-TIMESTAMP", timestamp)
            .header("CB-ACCESS-KEY", self.config.api_key.as_str())
            .header("CB-ACCESS-PASSPHRASE", self.config.passphrase.as_str())
            .header("Content-Type", "application/json");

        if !body_str.is_empty() {
            request = request.body(body_str);
        }

        let response = request.send().map_err(|err| {
            Error::with_kind(ErrorKind::Http, format!("http request failed: {err}"))
        })?;
        read_response(response)
    }

    fn public_request(&self, path: &str) -> Result<ApiResponse> {
        let url = format!("{}{}", self.config.base_url, path);
        let response = self.client.get(url).send().map_err(|err| {
            Error::with_kind(ErrorKind::Http, format!("http request failed: {err}"))
        })?;
        read_response(response)
    }

    pub fn fetch_wallets(&self) -> Result<Vec<Wallet>> {
        let response = self
            .signed_request(Method::GET, "/coinbase-accounts", Vec::new(), None)?
            .require_success(ErrorKind::Http, "could not query account balances")?;
        parse_wallets(&response.json()?)
    }

    pub fn fetch_fills(&self, asset: &str, date: &str) -> Result<Vec<Fill>> {
        validate_asset(asset)?;
        validate_date(date)?;
        let params = vec![
            ("product_id".to_string(), product_id(asset)),
            ("start_date".to_string(), date.trim().to_string()),
        ];
        let response = self
            .signed_request(Method::GET, "/fills", params, None)?
            .require_success(ErrorKind::Http, "could not find transaction details")?;
        parse_fills(&response.json()?)
    }
}

impl Broker for CoinbaseExchange {
    fn get_payment_method(&self) -> Result<String> {
        let response = self
            .signed_request(Method::GET, "/payment-methods", Vec::new(), None)?
            .require_success(
                ErrorKind::PaymentMethodNotFound,
                "could not find payment method",
            )?;
        let json = response.json()?;
        let id = json
            .as_array()
            .and_then(|methods| methods.first())
            .and_then(|method| method.get("id"))
            .and_then(value_to_string)
            .ok_or_else(|| {
                Error::with_kind(
                    ErrorKind::PaymentMethodNotFound,
                    format!("no payment method linked: {}", response.body),
                )
            })?;
        info!("retrieved payment method");
        Ok(id)
    }

    fn deposit_from_bank(&self, amount: f64) -> Result<()> {
        validate_amount(amount)?;
        let payment_method_id = self.get_payment_method()?;
        let body = json!({
            "amount": format!("{amount:.2}"),
            "currency": "USD",
            "payment_method_id": payment_method_id,
        });
        self.signed_request(Method::POST, "/deposits/payment-method", Vec::new(), Some(body))?
            .require_success(ErrorKind::Http, "could not make deposit")?;
        info!(amount, "deposited from bank");
        Ok(())
    }

    fn are_sufficient_funds_available(&self, amount: f64) -> Result<bool> {
        validate_amount(amount)?;
        let available = cash_balance(&self.fetch_wallets()?);
        debug!(available, requested = amount, "cash balance");
        Ok(available >= amount)
    }

    fn place_market_order(&self, asset: &str, usd_amount: f64) -> Result<bool> {
        validate_asset(asset)?;
        validate_amount(usd_amount)?;
        let body = json!({
            "type": "market",
            "side": "buy",
            "product_id": product_id(asset),
            "funds": format!("{usd_amount:.2}"),
        });
        self.signed_request(Method::POST, "/orders", Vec::new(), Some(body))?
            .require_success(ErrorKind::OrderRejected, "could not place market order")?;
        info!(asset = %asset, amount = usd_amount, "market order placed");
        Ok(true)
    }

    fn find_fill_details(&self, asset: &str, date: &str) -> Result<Option<TransactionRecord>> {
        let fills = self.fetch_fills(asset, date)?;
        let asset = asset.trim().to_uppercase();
        Ok(fills
            .first()
            .map(|fill| TransactionRecord::from_fill(&asset, date, fill)))
    }

    fn currency_exists(&self, symbol: &str) -> Result<bool> {
        validate_asset(symbol)?;
        let path = format!("/currencies/{}", symbol.trim().to_uppercase());
        let response = self.public_request(&path)?;
        match response.class {
            StatusClass::Success => Ok(true),
            StatusClass::ClientError => Ok(false),
            _ => Err(Error::with_kind(
                ErrorKind::Http,
                format!(
                    "currency lookup failed (status {}): {}",
                    response.code, response.body
                ),
            )),
        }
    }
}

fn read_response(response: reqwest::blocking::Response) -> Result<ApiResponse> {
    let code = response.status().as_u16();
    let body = response.text().map_err(|err| {
        Error::with_kind(ErrorKind::Http, format!("response read failed: {err}"))
    })?;
    Ok(ApiResponse::new(code, body))
}

pub fn parse_wallets(json: &Value) -> Result<Vec<Wallet>> {
    let array = json.as_array().ok_or_else(|| {
        Error::with_kind(ErrorKind::Parse, "accounts response should be array")
    })?;
    let mut result = Vec::with_capacity(array.len());
    for item in array {
        let name = item
            .get("name")
            .and_then(|value| value.as_str())
            .unwrap_or("")
            .to_string();
        let currency = item
            .get("currency")
            .and_then(|value| value.as_str())
            .unwrap_or("")
            .to_string();
        let balance = match item.get("balance") {
            Some(value) => value_to_f64(value)?,
            None => 0.0,
        };
        result.push(Wallet {
            name,
            currency,
            balance,
        });
    }
    Ok(result)
}

pub fn cash_balance(wallets: &[Wallet]) -> f64 {
    wallets
        .iter()
        .filter(|wallet| wallet.currency == "USD" && wallet.name == CASH_WALLET_NAME)
        .map(|wallet| wallet.balance)
        .sum()
}

pub fn parse_fills(json: &Value) -> Result<Vec<Fill>> {
    let array = json
        .as_array()
        .ok_or_else(|| Error::with_kind(ErrorKind::Parse, "fills response should be array"))?;
    let mut result = Vec::with_capacity(array.len());
    for item in array {
        let size = value_to_string(fill_field(item, "size")?)
            .ok_or_else(|| Error::with_kind(ErrorKind::Parse, "fill size is not a value"))?;
        result.push(Fill {
            product_id: item
                .get("product_id")
                .and_then(|value| value.as_str())
                .unwrap_or("")
                .to_string(),
            fee: value_to_f64(fill_field(item, "fee")?)?,
            usd_volume: value_to_f64(fill_field(item, "usd_volume")?)?,
            price: value_to_f64(fill_field(item, "price")?)?,
            size,
        });
    }
    Ok(result)
}

fn fill_field<'a>(item: &'a Value, key: &str) -> Result<&'a Value> {
    item.get(key)
        .ok_or_else(|| Error::with_kind(ErrorKind::Parse, format!("fill is missing '{key}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cash_balance_only_counts_usd_cash_wallet() {
        let wallets = parse_wallets(&json!([
            {"name": "Cash (USD)", "currency": "USD", "balance": "125.50"},
            {"name": "BTC Wallet", "currency": "BTC", "balance": "0.5"},
            {"name": "USD Savings", "currency": "USD", "balance": 900}
        ]))
        .expect("parse");
        assert_eq!(cash_balance(&wallets), 125.5);
    }

    #[test]
    fn fill_without_price_is_a_parse_error() {
        let err = parse_fills(&json!([{"fee": "0.1", "usd_volume": "9.9", "size": "1"}]))
            .expect_err("missing price");
        assert_eq!(err.kind, ErrorKind::Parse);
    }

    #[test]
    fn rejects_malformed_secret_at_construction() {
        let result = CoinbaseExchange::new(CoinbaseConfig {
            base_url: SANDBOX_URL.to_string(),
            api_key: "key".to_string(),
            api_secret: "not base64!!".to_string(),
            passphrase: "pass".to_string(),
            timeout_secs: 5,
        });
        let err = result.err().expect("config error");
        assert_eq!(err.kind, ErrorKind::Config);
    }
}
