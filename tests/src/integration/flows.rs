//! # Integration Test Flows
//!
//! Drives `StakingSynchronizer` through whole user journeys with the real
//! codec, session and binding wired to `MockWallet` and the in-memory
//! staking contract.
//!
//! ## Flows Tested
//!
//! 1. **Connect → stake → confirmed refresh**: balances move only after the receipt
//! 2. **Validation short-circuit**: bad amounts never reach the contract
//! 3. **Wallet events**: disconnect and chain switch tear the engine down
//! 4. **Shared contract**: two engines observe each other's confirmed stakes
//! 5. **Observers**: subscriptions see every revision in order

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::Context;
    use futures::StreamExt;
    use parking_lot::Mutex;
    use tokio::time::timeout;

    use shared_types::{Address, Amount, OperationKind, U256};
    use ss_01_amount_codec::ValidationError;
    use ss_02_provider_session::{MockWallet, SessionError, SessionState, WalletEvent};
    use ss_03_contract_binding::{InMemoryStakingContract, RemoteError, STAKE};
    use ss_04_staking_sync::{
        EngineError, OperationOutcome, StakingApi, StakingSynchronizer, SyncConfig, SyncPhase,
    };

    type Engine = StakingSynchronizer<MockWallet, InMemoryStakingContract>;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn ether(n: u64) -> Amount {
        Amount::from_base_units(U256::from(n) * U256::exp10(18))
    }

    /// Contract at the configured address holding 100 tokens staked by someone else.
    fn seeded_contract(config: &SyncConfig) -> anyhow::Result<Arc<InMemoryStakingContract>> {
        let contract = Arc::new(InMemoryStakingContract::new(config.contract()?));
        contract.seed_stake(&Address::new("0x1"), ether(100));
        Ok(contract)
    }

    fn engine_for(
        account: &str,
        contract: &Arc<InMemoryStakingContract>,
        config: SyncConfig,
    ) -> anyhow::Result<(Arc<MockWallet>, Arc<Engine>)> {
        let wallet = Arc::new(MockWallet::with_account(account));
        let engine = StakingSynchronizer::new(Some(wallet.clone()), contract.clone(), config)?;
        Ok((wallet, Arc::new(engine)))
    }

    async fn wait_for(engine: &Engine, condition: impl Fn(&SessionState) -> bool) {
        timeout(Duration::from_secs(5), async {
            while !condition(&engine.state().session) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("engine never reached the expected session state");
    }

    // =============================================================================
    // CONNECT → STAKE → REFRESH
    // =============================================================================

    #[tokio::test]
    async fn test_stake_flow_updates_balances_after_confirmation() -> anyhow::Result<()> {
        stake_telemetry::init_test_logging();
        let config = SyncConfig::for_testing();
        let contract = seeded_contract(&config)?;
        let (_, engine) = engine_for("0xABC", &contract, config)?;

        let state = engine.connect().await?;
        let first = state.snapshot.context("no snapshot after connect")?;
        assert_eq!(state.address(), Some(&Address::new("0xabc")));
        assert_eq!(first.total_staked, ether(100));
        assert_eq!(first.user_staked, Amount::zero());

        let receipt = engine.stake("10").await?;
        assert!(receipt.success);

        let state = engine.state();
        let snapshot = state.snapshot.context("snapshot dropped after stake")?;
        assert_eq!(snapshot.as_of, first.as_of + 1);
        assert!(state.last_error.is_none());
        assert_eq!(state.phase, SyncPhase::Ready);

        let precision = engine.config().display_precision;
        let (total, mine) = snapshot.display(engine.codec(), precision);
        assert_eq!(total, "110.00000");
        assert_eq!(mine, "10.00000");

        // The contract agrees with what the engine shows
        assert_eq!(contract.total_staked(), snapshot.total_staked);
        assert_eq!(contract.balance_of(&Address::new("0xABC")), ether(10));

        let sends: Vec<_> = contract
            .recorded_calls()
            .into_iter()
            .filter(|c| c.is_transaction)
            .collect();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].method, STAKE);
        Ok(())
    }

    #[tokio::test]
    async fn test_stake_then_unstake_returns_to_start() -> anyhow::Result<()> {
        let config = SyncConfig::for_testing();
        let contract = seeded_contract(&config)?;
        let (_, engine) = engine_for("0xABC", &contract, config)?;

        engine.connect().await?;
        engine.stake("2.5").await?;
        engine.unstake("2.5").await?;

        let state = engine.state();
        let snapshot = state.snapshot.context("missing snapshot")?;
        assert_eq!(snapshot.total_staked, ether(100));
        assert_eq!(snapshot.user_staked, Amount::zero());
        assert_eq!(snapshot.as_of, 3);
        assert_eq!(
            state.operation(OperationKind::Unstake).map(|op| op.outcome.clone()),
            Some(Some(OperationOutcome::Confirmed))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_amount_never_reaches_contract() -> anyhow::Result<()> {
        let config = SyncConfig::for_testing();
        let contract = seeded_contract(&config)?;
        let (_, engine) = engine_for("0xABC", &contract, config)?;
        engine.connect().await?;
        let reads = contract.call_count();
        let version = engine.state().version();

        let err = engine.stake("-5").await.unwrap_err();
        assert_eq!(err, EngineError::Validation(ValidationError::Negative));

        let err = engine.unstake("1e18").await.unwrap_err();
        assert_eq!(err, EngineError::Validation(ValidationError::NotANumber));

        assert_eq!(contract.send_count(), 0);
        assert_eq!(contract.call_count(), reads);

        let state = engine.state();
        assert_eq!(state.version(), version);
        assert_eq!(state.last_error, Some(err));
        Ok(())
    }

    #[tokio::test]
    async fn test_user_rejection_keeps_balances() -> anyhow::Result<()> {
        let config = SyncConfig::for_testing();
        let contract = seeded_contract(&config)?;
        let (_, engine) = engine_for("0xABC", &contract, config)?;
        engine.connect().await?;

        contract.fail_next_send(RemoteError::UserRejected);
        let err = engine.stake("1").await.unwrap_err();
        assert!(err.is_user_rejection());

        let state = engine.state();
        assert_eq!(state.version(), Some(1));
        assert_eq!(contract.total_staked(), ether(100));

        // The next attempt goes through normally
        engine.stake("1").await?;
        assert_eq!(engine.state().version(), Some(2));
        Ok(())
    }

    // =============================================================================
    // WALLET EVENTS
    // =============================================================================

    #[tokio::test]
    async fn test_wallet_disconnect_then_reconnect() -> anyhow::Result<()> {
        let config = SyncConfig::for_testing();
        let contract = seeded_contract(&config)?;
        let (wallet, engine) = engine_for("0xABC", &contract, config)?;
        let _listener = engine
            .spawn_event_listener()
            .context("wallet exposes no events")?;

        engine.connect().await?;
        let before = engine.state().version().context("missing version")?;

        wallet.emit(WalletEvent::Disconnected);
        wait_for(&engine, |session| !session.is_connected()).await;

        let state = engine.state();
        assert!(!state.bound);
        assert!(state.snapshot.is_none());
        assert_eq!(state.phase, SyncPhase::Idle);

        let err = engine.stake("1").await.unwrap_err();
        assert!(matches!(err, EngineError::Sync(_)));
        assert_eq!(contract.send_count(), 0);

        let state = engine.connect().await?;
        assert_eq!(wallet.prompt_count(), 2);
        assert!(state.version().context("missing version")? > before);
        Ok(())
    }

    #[tokio::test]
    async fn test_chain_switch_to_unsupported_chain_tears_down() -> anyhow::Result<()> {
        let config = SyncConfig {
            allowed_chain_ids: vec![1],
            ..SyncConfig::for_testing()
        };
        let contract = seeded_contract(&config)?;
        let (wallet, engine) = engine_for("0xABC", &contract, config)?;
        let _listener = engine
            .spawn_event_listener()
            .context("wallet exposes no events")?;

        engine.connect().await?;

        wallet.emit(WalletEvent::ChainChanged(56));
        wait_for(&engine, |session| !session.is_connected()).await;
        assert!(!engine.state().bound);

        wallet.set_chain_id(56);
        let err = engine.connect().await.unwrap_err();
        assert_eq!(
            err,
            EngineError::Session(SessionError::UnsupportedChain { chain_id: 56 })
        );
        assert_eq!(contract.call_count(), 2);
        Ok(())
    }

    // =============================================================================
    // SHARED CONTRACT
    // =============================================================================

    #[tokio::test]
    async fn test_two_engines_share_one_contract() -> anyhow::Result<()> {
        let config = SyncConfig::for_testing();
        let contract = seeded_contract(&config)?;
        let (_, alice) = engine_for("0xA11CE", &contract, config.clone())?;
        let (_, bob) = engine_for("0xB0B", &contract, config)?;

        alice.connect().await?;
        bob.connect().await?;

        alice.stake("10").await?;
        let seen_by_bob = bob.refresh_balances().await?;
        assert_eq!(seen_by_bob.total_staked, ether(110));
        assert_eq!(seen_by_bob.user_staked, Amount::zero());

        bob.stake("5").await?;
        let seen_by_alice = alice.refresh_balances().await?;
        assert_eq!(seen_by_alice.total_staked, ether(115));
        assert_eq!(seen_by_alice.user_staked, ether(10));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_operations_of_different_kinds() -> anyhow::Result<()> {
        let config = SyncConfig::for_testing();
        let contract = seeded_contract(&config)?;
        let (_, engine) = engine_for("0xABC", &contract, config)?;
        engine.connect().await?;
        engine.stake("5").await?;

        let (staked, unstaked) = tokio::join!(engine.stake("3"), engine.unstake("2"));
        staked?;
        unstaked?;

        let snapshot = engine.state().snapshot.context("missing snapshot")?;
        assert_eq!(snapshot.user_staked, ether(6));
        assert_eq!(snapshot.total_staked, ether(106));
        Ok(())
    }

    // =============================================================================
    // OBSERVERS
    // =============================================================================

    #[tokio::test]
    async fn test_subscribers_see_ordered_revisions() -> anyhow::Result<()> {
        let config = SyncConfig::for_testing();
        let contract = seeded_contract(&config)?;
        let (_, engine) = engine_for("0xABC", &contract, config)?;
        let mut subscription = engine.subscribe();

        engine.connect().await?;
        engine.stake("1").await?;
        engine.refresh_balances().await?;

        let revisions: Vec<u64> = subscription.drain().iter().map(|s| s.revision).collect();
        let last = engine.state().revision;
        assert_eq!(revisions, (1..=last).collect::<Vec<_>>());
        Ok(())
    }

    #[tokio::test]
    async fn test_snapshot_versions_never_decrease() -> anyhow::Result<()> {
        let config = SyncConfig::for_testing();
        let contract = seeded_contract(&config)?;
        let (_, engine) = engine_for("0xABC", &contract, config)?;
        let versions = Arc::new(Mutex::new(Vec::new()));

        let sink = versions.clone();
        let _task = engine.on_state(move |state| {
            if let Some(version) = state.version() {
                sink.lock().push(version);
            }
        });

        let stream = engine.subscribe().into_stream();
        engine.connect().await?;
        engine.stake("1").await?;
        assert!(engine.disconnect());
        engine.connect().await?;
        engine.unstake("1").await?;

        let total = engine.state().revision as usize;
        let published: Vec<_> = stream.take(total).collect().await;
        let last = published.last().context("nothing published")?;
        assert_eq!(last.version(), Some(4));

        timeout(Duration::from_secs(5), async {
            while versions.lock().last() != Some(&4) {
                tokio::task::yield_now().await;
            }
        })
        .await?;
        let seen = versions.lock().clone();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        Ok(())
    }

    #[tokio::test]
    async fn test_state_renders_as_json() -> anyhow::Result<()> {
        let config = SyncConfig::for_testing();
        let contract = seeded_contract(&config)?;
        let (_, engine) = engine_for("0xABC", &contract, config)?;
        engine.connect().await?;

        let json: serde_json::Value = serde_json::from_str(&engine.state().to_json()?)?;
        assert_eq!(json["bound"], serde_json::Value::Bool(true));
        assert!(json.to_string().contains("0xabc"));
        Ok(())
    }

    #[tokio::test]
    async fn test_submissions_are_counted() -> anyhow::Result<()> {
        let config = SyncConfig::for_testing();
        let contract = seeded_contract(&config)?;
        let (_, engine) = engine_for("0xABC", &contract, config)?;
        engine.connect().await?;
        engine.stake("1").await?;

        let text = stake_telemetry::encode_metrics()?;
        assert!(text.contains("ss_contract_submissions_total"));
        assert!(text.contains("ss_sync_refreshes_total"));
        Ok(())
    }
}
