use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub app: AppConf,
    pub wallet: Option<WalletConf>,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("app.rpc_urls", vec!["https://polygon-rpc.com/"])?
            .set_default("app.chain_id", 137i64)?
            .set_default(
                "app.contract_address",
                "0x501F1ABBFae1f7382cfA54871685eB1E8A845fb6",
            )?
            .set_default("app.bind_address", "127.0.0.1:8080")?
            // `./Settings.toml`, then TIPPOL_* environment overrides
            .add_source(config::File::with_name("Settings").required(false))
            .add_source(config::Environment::with_prefix("TIPPOL").separator("__"))
            .build()?;
        let s: Settings = settings.try_deserialize()?;

        Ok(s)
    }

    /// The connected account, when one is configured.
    pub fn wallet_address(&self) -> Option<&str> {
        self.wallet.as_ref().map(|w| w.address.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConf {
    pub rpc_urls: Vec<String>,
    pub chain_id: u64,
    pub contract_address: String,
    pub bind_address: String,
    pub sentry_dsn: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConf {
    pub address: String,
}
