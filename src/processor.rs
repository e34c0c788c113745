//! The write flows: validate locally, encode, submit, and wait for the
//! ledger to confirm. Validation failures and a missing wallet are caught
//! before anything touches the network, so the user's input is never
//! consumed by a doomed attempt.

use alloy_primitives::U256;
use anyhow::{anyhow, bail, Result};

use crate::codec;
use crate::ledger;
use crate::rpc;
use crate::settings::Settings;
use crate::util;

/// Outcome of a confirmed tip, for the caller's optimistic counter update.
#[derive(Debug)]
pub struct TipReceipt {
    pub tx_hash: String,
    pub amount_pol: f64,
}

pub fn validate_new_post(achievement: &str, text: &str) -> Result<()> {
    if achievement.trim().is_empty() {
        bail!("achievement is required");
    }
    if text.trim().is_empty() {
        bail!("description is required");
    }
    // the composite description field reserves this token
    if achievement.contains(codec::IMAGE_SEPARATOR) || text.contains(codec::IMAGE_SEPARATOR) {
        bail!(
            "text may not contain the reserved token {}",
            codec::IMAGE_SEPARATOR
        );
    }
    Ok(())
}

pub fn validate_tip(post_id: &str, amount: &str) -> Result<(U256, U256)> {
    let id = U256::from_str_radix(post_id.trim(), 10)
        .map_err(|_| anyhow!("invalid post id: {}", post_id))?;
    let value = util::pol_to_wei(amount)?;
    if value.is_zero() {
        bail!("tip amount must be positive");
    }
    Ok((id, value))
}

fn require_wallet(settings: &Settings) -> Result<&str> {
    settings.wallet_address().ok_or_else(|| {
        anyhow!(
            "no wallet connected - set [wallet] address in Settings.toml \
             to an account your node can sign for"
        )
    })
}

/// Publish an achievement post. Returns the transaction hash once the
/// ledger has confirmed it.
pub fn submit_post(
    settings: &Settings,
    achievement: &str,
    text: &str,
    image: Option<&str>,
) -> Result<String> {
    validate_new_post(achievement, text)?;
    let wallet = require_wallet(settings)?;

    let description = codec::encode_description(text, image);
    let tx_hash = ledger::create_post(settings, wallet, achievement, &description)?;
    info!("createPost submitted, tx = {}", tx_hash);

    let receipt = rpc::wait_for_receipt(settings, &tx_hash)?;
    if !receipt.success {
        bail!("transaction {} reverted", receipt.tx_hash);
    }
    debug!(
        "createPost confirmed, tx = {} block = {:?}",
        receipt.tx_hash, receipt.block_number
    );
    Ok(tx_hash)
}

/// Tip a post. The caller applies the optimistic counter update on success.
pub fn submit_tip(settings: &Settings, post_id: &str, amount: &str) -> Result<TipReceipt> {
    let (id, value) = validate_tip(post_id, amount)?;
    let wallet = require_wallet(settings)?;

    let tx_hash = ledger::tip_post(settings, wallet, id, value)?;
    info!(
        "tipPost submitted, post_id = {} value = {} tx = {}",
        post_id, value, tx_hash
    );

    let receipt = rpc::wait_for_receipt(settings, &tx_hash)?;
    if !receipt.success {
        bail!("transaction {} reverted", receipt.tx_hash);
    }
    debug!(
        "tipPost confirmed, tx = {} block = {:?}",
        receipt.tx_hash, receipt.block_number
    );
    Ok(TipReceipt {
        tx_hash,
        amount_pol: util::wei_to_pol(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{AppConf, Settings};

    fn offline_settings() -> Settings {
        Settings {
            app: AppConf {
                rpc_urls: Vec::new(),
                chain_id: 137,
                contract_address: "0x501F1ABBFae1f7382cfA54871685eB1E8A845fb6".to_string(),
                bind_address: "127.0.0.1:8080".to_string(),
                sentry_dsn: None,
            },
            wallet: None,
        }
    }

    #[test]
    fn empty_fields_fail_validation() {
        assert!(validate_new_post("", "details").is_err());
        assert!(validate_new_post("   ", "details").is_err());
        assert!(validate_new_post("did a thing", "").is_err());
        assert!(validate_new_post("did a thing", " \t").is_err());
        assert!(validate_new_post("did a thing", "details").is_ok());
    }

    #[test]
    fn reserved_token_fails_validation() {
        assert!(validate_new_post("did a |||IMAGE||| thing", "details").is_err());
        assert!(validate_new_post("did a thing", "see |||IMAGE||| here").is_err());
    }

    #[test]
    fn tip_validation_requires_a_positive_amount_and_numeric_id() {
        assert!(validate_tip("7", "0.05").is_ok());
        assert!(validate_tip("7", "0").is_err());
        assert!(validate_tip("7", "-1").is_err());
        assert!(validate_tip("7", "abc").is_err());
        assert!(validate_tip("seven", "0.05").is_err());
        assert!(validate_tip("0xff", "0.05").is_err());
    }

    #[test]
    fn invalid_post_never_reaches_the_ledger() {
        // validation runs before the wallet check and before any rpc, so
        // the error names the empty field even with nothing configured
        let err = submit_post(&offline_settings(), "", "details", None).unwrap_err();
        assert!(err.to_string().contains("achievement is required"));
    }

    #[test]
    fn missing_wallet_is_a_precondition_error() {
        let err = submit_post(&offline_settings(), "did a thing", "details", None).unwrap_err();
        assert!(err.to_string().contains("no wallet connected"));

        let err = submit_tip(&offline_settings(), "7", "0.05").unwrap_err();
        assert!(err.to_string().contains("no wallet connected"));
    }
}
