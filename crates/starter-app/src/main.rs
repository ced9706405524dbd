use std::sync::Arc;
use std::time::Duration;

use chain_sol::Keypair;
use starter_app::{AppContext, Dashboard, LocalWallet, NetworkConfig, ToastKind};

/// Walk a throwaway keypair through the dashboard against the configured
/// cluster: connect, airdrop, watch the balance, mint a token.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = NetworkConfig::from_env()?;
    let poll = Duration::from_millis(config.poll_interval_ms);
    let ctx = AppContext::from_config(config)?;

    let wallet = Arc::new(LocalWallet::new(Keypair::generate()));
    let mut dashboard = Dashboard::new(ctx, wallet);
    dashboard.mount(true).await;
    if let Some(identity) = dashboard.identity() {
        tracing::info!(%identity, "wallet connected");
    }

    dashboard.request_airdrop().await;
    tokio::time::sleep(poll).await;
    dashboard.tick().await;
    tracing::info!(balance = %dashboard.balance.balance_text(), "after airdrop");

    dashboard.create_and_mint().await;
    if let Some(mint) = dashboard.mint.active_mint() {
        tracing::info!(
            mint,
            url = %dashboard.mint.mint_url(mint),
            tokens = ?dashboard.mint.token_balance(),
            "active mint"
        );
    }

    for toast in dashboard.take_toasts() {
        match toast.kind {
            ToastKind::Success => tracing::info!("{}", toast.message),
            ToastKind::Error => tracing::warn!("{}", toast.message),
        }
    }

    dashboard.unmount().await;
    Ok(())
}
