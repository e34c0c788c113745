//! JSON-RPC plumbing for the Polygon endpoint set. All traffic goes over
//! curl with bounded timeouts; an endpoint is picked at random per request
//! so one flaky gateway does not pin the client.

use std::io::Read;
use std::thread;
use std::time::Duration;

use alloy_primitives::U256;
use anyhow::{anyhow, bail, Result};
use curl::easy::{Easy, List};
use rand::Rng;
use serde_json::Value;

use crate::settings::Settings;

const TIMEOUT_SECS: u64 = 60;
const RECEIPT_POLL_INTERVAL_MS: u64 = 3000;
const RECEIPT_POLL_ATTEMPTS: u32 = 60;

pub struct Endpoints {
    urls: Vec<String>,
}

impl Endpoints {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        if settings.app.rpc_urls.is_empty() {
            bail!("no rpc endpoints configured");
        }
        Ok(Endpoints {
            urls: settings.app.rpc_urls.clone(),
        })
    }

    pub fn pick(&self) -> &str {
        let idx = rand::thread_rng().gen_range(0..self.urls.len());
        &self.urls[idx]
    }
}

fn get_curl_easy() -> Result<Easy> {
    let mut easy = Easy::new();
    easy.connect_timeout(Duration::from_secs(TIMEOUT_SECS))?;
    easy.timeout(Duration::from_secs(TIMEOUT_SECS))?;
    easy.accept_encoding("gzip")?;

    Ok(easy)
}

/// One JSON-RPC round trip. Returns the `result` member; a populated
/// `error` member becomes an `Err`.
pub fn call(settings: &Settings, method: &str, params: Value) -> Result<Value> {
    let endpoints = Endpoints::from_settings(settings)?;
    let url = endpoints.pick().to_string();

    let request = json!({
        "jsonrpc": "2.0",
        "id": rand::thread_rng().gen::<u32>(),
        "method": method,
        "params": params,
    });
    let payload = serde_json::to_string(&request)?;
    debug!("rpc {} -> {}", method, url);

    let mut easy = get_curl_easy()?;
    easy.url(&url)?;
    let mut headers = List::new();
    headers.append("Content-Type: application/json")?;
    easy.http_headers(headers)?;
    easy.post(true)?;
    easy.post_field_size(payload.len() as u64)?;

    let mut payload_bytes = payload.as_bytes();
    let mut response_content = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.read_function(|buf| Ok(payload_bytes.read(buf).unwrap_or(0)))?;
        transfer.write_function(|data| {
            response_content.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    if status != 200 {
        bail!("rpc endpoint {} returned status {}", url, status);
    }

    let body: Value = serde_json::from_slice(&response_content)?;
    if !body["error"].is_null() {
        bail!("rpc {} failed: {}", method, body["error"]);
    }
    Ok(body["result"].clone())
}

/// `eth_call` against the configured contract. Calldata in, return bytes out.
pub fn eth_call(settings: &Settings, calldata: &[u8]) -> Result<Vec<u8>> {
    let params = json!([
        {
            "to": settings.app.contract_address,
            "data": format!("0x{}", hex::encode(calldata)),
        },
        "latest",
    ]);
    let result = call(settings, "eth_call", params)?;
    let hex_str = result
        .as_str()
        .ok_or_else(|| anyhow!("eth_call returned a non-string result: {}", result))?;
    let bytes = hex::decode(hex_str.trim_start_matches("0x"))?;
    Ok(bytes)
}

/// Submit a write transaction. The node signs for `from`; the returned
/// string is the pending transaction hash.
pub fn send_transaction(
    settings: &Settings,
    from: &str,
    calldata: &[u8],
    value: Option<U256>,
) -> Result<String> {
    let mut tx = json!({
        "from": from,
        "to": settings.app.contract_address,
        "data": format!("0x{}", hex::encode(calldata)),
    });
    if let Some(value) = value {
        tx["value"] = json!(format!("{:#x}", value));
    }

    let result = call(settings, "eth_sendTransaction", json!([tx]))?;
    let hash = result
        .as_str()
        .ok_or_else(|| anyhow!("eth_sendTransaction returned a non-string result: {}", result))?;
    Ok(hash.to_string())
}

#[derive(Debug)]
pub struct Receipt {
    pub tx_hash: String,
    pub success: bool,
    pub block_number: Option<u64>,
}

/// Poll until the transaction is mined. A write only counts as done once
/// its receipt lands, and only if the status word says success.
pub fn wait_for_receipt(settings: &Settings, tx_hash: &str) -> Result<Receipt> {
    for attempt in 0..RECEIPT_POLL_ATTEMPTS {
        let result = call(settings, "eth_getTransactionReceipt", json!([tx_hash]))?;
        if result.is_null() {
            debug!("tx {} not mined yet, attempt = {}", tx_hash, attempt);
            thread::sleep(Duration::from_millis(RECEIPT_POLL_INTERVAL_MS));
            continue;
        }

        let success = result["status"].as_str() == Some("0x1");
        let block_number = result["blockNumber"]
            .as_str()
            .and_then(|s| u64::from_str_radix(s.trim_start_matches("0x"), 16).ok());
        return Ok(Receipt {
            tx_hash: tx_hash.to_string(),
            success,
            block_number,
        });
    }

    Err(anyhow!("transaction {} was not confirmed in time", tx_hash))
}

/// Advisory check that the endpoint really serves the configured chain.
pub fn check_chain(settings: &Settings) {
    match call(settings, "eth_chainId", json!([])) {
        Ok(result) => {
            let reported = result
                .as_str()
                .and_then(|s| u64::from_str_radix(s.trim_start_matches("0x"), 16).ok());
            match reported {
                Some(id) if id == settings.app.chain_id => debug!("connected to chain id {}", id),
                Some(id) => warn!(
                    "endpoint reports chain id {}, expected {}",
                    id, settings.app.chain_id
                ),
                None => warn!("eth_chainId returned an unexpected result: {}", result),
            }
        }
        Err(e) => warn!("eth_chainId check failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{AppConf, Settings};

    fn test_settings(urls: Vec<String>) -> Settings {
        Settings {
            app: AppConf {
                rpc_urls: urls,
                chain_id: 137,
                contract_address: "0x501F1ABBFae1f7382cfA54871685eB1E8A845fb6".to_string(),
                bind_address: "127.0.0.1:8080".to_string(),
                sentry_dsn: None,
            },
            wallet: None,
        }
    }

    #[test]
    fn pick_returns_a_configured_endpoint() {
        let settings = test_settings(vec![
            "https://polygon-rpc.com/".to_string(),
            "https://polygon-bor-rpc.publicnode.com/".to_string(),
        ]);
        let endpoints = Endpoints::from_settings(&settings).unwrap();
        for _ in 0..20 {
            let url = endpoints.pick();
            assert!(settings.app.rpc_urls.iter().any(|u| u == url));
        }
    }

    #[test]
    fn empty_endpoint_set_is_rejected() {
        let settings = test_settings(Vec::new());
        assert!(Endpoints::from_settings(&settings).is_err());
    }
}
