use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use alloy::network::EthereumWallet;
use alloy::providers::ProviderBuilder;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use alloy_primitives::Address;
use eyre::{eyre, Result, WrapErr};
use keep_chain::{AlloyLedger, ChainHandle, EthereumChain, RetryPolicy};

use crate::config::ClientConfig;

/// Runs the client until Ctrl-C.
pub async fn run(config_path: &Path) -> Result<()> {
    let config = ClientConfig::load_from_file(config_path)
        .await
        .wrap_err_with(|| format!("failed while reading config file [{}]", config_path.display()))?
        .with_env_overrides();

    let account = &config.ethereum.account;
    let signer = PrivateKeySigner::decrypt_keystore(&account.key_file, &account.key_file_password)
        .wrap_err_with(|| format!("failed to read key file [{}]", account.key_file.display()))?;
    let operator = signer.address();

    let url: Url = config
        .ethereum
        .url
        .parse()
        .wrap_err_with(|| format!("invalid ethereum url [{}]", config.ethereum.url))?;
    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(url);

    let factory_address = config
        .ethereum
        .contract_addresses
        .bonded_ecdsa_keep_factory()?;
    let chain = EthereumChain::new(
        Arc::new(AlloyLedger::new(provider, operator)),
        factory_address,
        Duration::from_millis(config.ethereum.polling_interval_ms),
    )
    .wrap_err("failed to connect to ethereum node")?;

    let chain_ref = &chain;
    let block_number = RetryPolicy::TRANSACTION_SUBMISSION
        .run("blockNumber", move || chain_ref.block_number())
        .await
        .wrap_err("failed to connect to ethereum node")?;

    tracing::info!(
        operator = %operator,
        factory = %factory_address,
        block_number,
        "🔗 Connected to ethereum node"
    );

    let applications = config
        .sanctioned_applications
        .parsed()
        .wrap_err("failed to get sanctioned applications addresses")?;

    if !chain.has_minimum_stake(operator).await? {
        tracing::warn!(operator = %operator, "Operator does not have the minimum stake");
    }
    for application in applications {
        report_operator_status(&chain, application).await?;
    }

    tracing::info!("✅ Client started");

    let shutdown = chain.watcher().shutdown_token();
    tokio::select! {
        _ = shutdown.cancelled() => Err(eyre!("unexpected context cancellation")),
        signal = tokio::signal::ctrl_c() => {
            signal.wrap_err("failed to listen for shutdown signal")?;
            tracing::info!("🛑 Shutdown signal received");
            chain.watcher().shutdown();
            Ok(())
        }
    }
}

async fn report_operator_status(chain: &EthereumChain, application: Address) -> Result<()> {
    let registered = chain.is_registered_for_application(application).await?;
    let eligible = chain.is_eligible_for_application(application).await?;
    let up_to_date = chain
        .is_status_up_to_date_for_application(application)
        .await?;

    tracing::info!(
        application = %application,
        registered,
        eligible,
        up_to_date,
        "Operator status"
    );
    if registered && !up_to_date {
        tracing::warn!(
            application = %application,
            "Operator status is out of date; update it with updateStatusForApplication"
        );
    }
    Ok(())
}
