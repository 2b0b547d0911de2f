//! # Staking Synchronizer Service
//!
//! Orchestrates the provider session, the contract binding and the amount
//! codec, and publishes an `ObservableState` after every step.
//!
//! ## Consistency rules
//!
//! - A stake/unstake reports success only after a refresh that started after
//!   its confirmation has completed.
//! - Public refreshes that overlap share one set of reads.
//! - Results that arrive after a disconnect are dropped (`SessionEnded`).

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_bus::{InMemoryBus, Publisher, Subscription};
use shared_types::{Address, Amount, OperationKind};
use ss_01_amount_codec::AmountCodec;
use ss_02_provider_session::{ProviderSession, SessionApi, SessionError, WalletEvent};
use ss_03_contract_binding::{
    CallArg, ContractApi, ContractBinding, ContractError, MethodSet, TransactionReceipt,
    GET_BALANCE, GET_TOTAL_STAKED_AMOUNT, STAKE, UNSTAKE,
};
use stake_telemetry::{
    log_event, log_tx_event, register_metrics, HistogramTimer, CONFIRMATION_DURATION,
    ENGINE_ERRORS, REFRESHES, REFRESH_DURATION, SESSION_EVENTS, SNAPSHOT_VERSION, SUBMISSIONS,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::refresh::{RefreshResult, RefreshScope};
use crate::config::{ConfigError, SyncConfig};
use crate::domain::{
    BalanceSnapshot, EngineError, ObservableState, OperationOutcome, PendingOperation, SyncError,
    SyncPhase,
};
use crate::ports::{ContractProvider, StakingApi, WalletProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Initializing,
    Ready,
}

/// Mutable engine state; every change is followed by a publish.
struct Inner {
    lifecycle: Lifecycle,
    refreshing: bool,
    snapshot: Option<BalanceSnapshot>,
    pending: BTreeMap<OperationKind, PendingOperation>,
    last_error: Option<EngineError>,
    /// Bumped on every teardown; stale results compare unequal.
    epoch: u64,
    /// Last snapshot version handed out.
    version: u64,
    /// Refresh serialization for the current session.
    refresh: RefreshScope,
    current: Arc<ObservableState>,
}

impl Inner {
    fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Idle,
            refreshing: false,
            snapshot: None,
            pending: BTreeMap::new(),
            last_error: None,
            epoch: 0,
            version: 0,
            refresh: RefreshScope::default(),
            current: Arc::new(ObservableState::default()),
        }
    }

    fn phase(&self) -> SyncPhase {
        match self.lifecycle {
            Lifecycle::Idle => SyncPhase::Idle,
            Lifecycle::Initializing => SyncPhase::Initializing,
            Lifecycle::Ready if self.refreshing => SyncPhase::Refreshing,
            Lifecycle::Ready => self
                .pending
                .values()
                .find(|op| op.is_in_flight())
                .map(|op| SyncPhase::Submitting(op.kind))
                .unwrap_or(SyncPhase::Ready),
        }
    }

    fn next_snapshot(&mut self, total_staked: Amount, user_staked: Amount) -> BalanceSnapshot {
        self.version += 1;
        let snapshot = BalanceSnapshot {
            total_staked,
            user_staked,
            as_of: self.version,
        };
        self.snapshot = Some(snapshot);
        snapshot
    }
}

/// Staking Synchronizer - the engine the rendering shell embeds.
pub struct StakingSynchronizer<W, P>
where
    W: WalletProvider + 'static,
    P: ContractProvider + 'static,
{
    config: SyncConfig,
    codec: AmountCodec,
    contract: Address,
    methods: Arc<MethodSet>,
    session: ProviderSession<W>,
    binding: ContractBinding<P>,
    inner: Mutex<Inner>,
    bus: InMemoryBus<Arc<ObservableState>>,
}

impl<W, P> StakingSynchronizer<W, P>
where
    W: WalletProvider + 'static,
    P: ContractProvider + 'static,
{
    /// Build an idle engine.
    ///
    /// `wallet` is `None` when the host exposes no wallet; `connect()` then
    /// fails with `NoWalletDetected`.
    pub fn new(
        wallet: Option<Arc<W>>,
        provider: Arc<P>,
        config: SyncConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let codec = config.codec()?;
        let contract = config.contract()?;

        if let Err(e) = register_metrics() {
            warn!(error = %e, "[ss-04] Metrics registration failed");
        }

        Ok(Self {
            session: ProviderSession::new(wallet, config.session()),
            binding: ContractBinding::new(provider, config.binding()),
            methods: Arc::new(MethodSet::staking()),
            bus: InMemoryBus::with_capacity(config.bus_capacity),
            inner: Mutex::new(Inner::new()),
            codec,
            contract,
            config,
        })
    }

    /// Engine configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Amount codec for the configured token scale.
    pub fn codec(&self) -> &AmountCodec {
        &self.codec
    }

    /// The provider session.
    pub fn session(&self) -> &ProviderSession<W> {
        &self.session
    }

    /// The contract binding.
    pub fn binding(&self) -> &ContractBinding<P> {
        &self.binding
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    /// Run `callback` for every state published from now on.
    ///
    /// Must be called within a tokio runtime. The task ends when the engine
    /// is dropped. A callback that falls more than `bus_capacity` states
    /// behind skips the oldest ones and resumes from the newest still
    /// buffered, so it always converges on the latest state.
    pub fn on_state<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: Fn(Arc<ObservableState>) + Send + 'static,
    {
        let mut subscription = self.bus.subscribe();
        tokio::spawn(async move {
            while let Some(state) = subscription.recv().await {
                callback(state);
            }
        })
    }

    /// Apply a wallet event. Returns true if the engine was torn down.
    pub fn handle_wallet_event(&self, event: &WalletEvent) -> bool {
        debug!(event = ?event, "[ss-04] Wallet event");
        if self.session.handle_event(event) {
            self.teardown("wallet event")
        } else {
            false
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn publish(&self, inner: &mut Inner) {
        let state = Arc::new(ObservableState {
            revision: inner.current.revision + 1,
            session: self.session.state(),
            bound: self.binding.is_bound(),
            snapshot: inner.snapshot,
            pending: inner.pending.values().cloned().collect(),
            phase: inner.phase(),
            last_error: inner.last_error.clone(),
        });
        inner.current = state.clone();

        if let Some(snapshot) = inner.snapshot {
            SNAPSHOT_VERSION.set(snapshot.as_of as f64);
        }
        let receivers = self.bus.publish(state);
        trace!(
            revision = inner.current.revision,
            phase = %inner.current.phase,
            receivers = receivers,
            "[ss-04] State published"
        );
    }

    fn record_error(&self, inner: &mut Inner, error: &EngineError) {
        ENGINE_ERRORS.with_label_values(&[error.category()]).inc();
        inner.last_error = Some(error.clone());
    }

    /// Record, publish and hand back `error`.
    fn fail(&self, error: EngineError) -> EngineError {
        let mut inner = self.inner.lock();
        self.record_error(&mut inner, &error);
        self.publish(&mut inner);
        error
    }

    /// Publish the outcome of `kind`, then forget the operation.
    fn settle(&self, inner: &mut Inner, kind: OperationKind, outcome: OperationOutcome) {
        if let Some(op) = inner.pending.get_mut(&kind) {
            op.outcome = Some(outcome);
        }
        self.publish(inner);
        inner.pending.remove(&kind);
    }

    /// Drop binding and snapshot and return to `Idle`.
    fn teardown(&self, reason: &str) -> bool {
        let mut inner = self.inner.lock();
        let unbound = self.binding.unbind();
        let active = inner.lifecycle != Lifecycle::Idle || inner.snapshot.is_some();
        if !unbound && !active && inner.current.session == self.session.state() {
            return false;
        }

        inner.epoch += 1;
        inner.refresh = RefreshScope::default();
        inner.lifecycle = Lifecycle::Idle;
        inner.refreshing = false;
        inner.snapshot = None;
        inner.pending.clear();
        self.publish(&mut inner);

        SESSION_EVENTS.with_label_values(&["disconnected"]).inc();
        info!(reason = reason, "[ss-04] Engine torn down");
        true
    }

    /// Epoch and refresh scope of a ready engine, or a recorded `NotReady`.
    fn ready_session(&self) -> Result<(u64, RefreshScope), EngineError> {
        let mut inner = self.inner.lock();
        if inner.lifecycle != Lifecycle::Ready {
            let error = EngineError::from(SyncError::NotReady);
            self.record_error(&mut inner, &error);
            self.publish(&mut inner);
            return Err(error);
        }
        Ok((inner.epoch, inner.refresh.clone()))
    }

    /// Total staked and the signer's stake, in that order.
    async fn read_balances(&self) -> Result<(Amount, Amount), ContractError> {
        let signer = self
            .binding
            .handle()
            .map(|h| h.signer().clone())
            .ok_or(ContractError::BindingNotReady)?;

        let total = self.binding.query(GET_TOTAL_STAKED_AMOUNT, &[]).await?;
        let user = self
            .binding
            .query(GET_BALANCE, &[CallArg::Address(signer)])
            .await?;

        Ok((Amount::from_base_units(total), Amount::from_base_units(user)))
    }

    /// Connect, bind and take the first reads.
    async fn establish(&self) -> Result<(Amount, Amount), EngineError> {
        let address = self.session.connect().await?;
        debug!(address = %address, "[ss-04] Session established, binding contract");

        self.binding.bind(
            &self.session.state(),
            self.contract.clone(),
            self.methods.clone(),
        )?;
        Ok(self.read_balances().await?)
    }

    /// One refresh generation. The caller holds `scope.lock`.
    async fn run_refresh(&self, epoch: u64, scope: &RefreshScope) -> RefreshResult {
        let generation = scope.tracker.lock().begin();
        let result = self.refresh_once(epoch).await;
        scope.tracker.lock().finish(generation, result.clone());
        result
    }

    async fn refresh_once(&self, epoch: u64) -> RefreshResult {
        let _timer = HistogramTimer::new(&REFRESH_DURATION);
        {
            let mut inner = self.inner.lock();
            if inner.epoch != epoch {
                return Err(SyncError::SessionEnded.into());
            }
            inner.refreshing = true;
            self.publish(&mut inner);
        }

        let reads = self.read_balances().await;

        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            debug!("[ss-04] Dropping refresh result from an ended session");
            return Err(SyncError::SessionEnded.into());
        }
        inner.refreshing = false;

        match reads {
            Ok((total, user)) => {
                let snapshot = inner.next_snapshot(total, user);
                inner.last_error = None;
                self.publish(&mut inner);
                REFRESHES.with_label_values(&["fresh"]).inc();
                debug!(version = snapshot.as_of, "[ss-04] Balances refreshed");
                Ok(snapshot)
            }
            Err(e) => {
                let error = EngineError::from(e);
                self.record_error(&mut inner, &error);
                self.publish(&mut inner);
                REFRESHES.with_label_values(&["failed"]).inc();
                warn!(error = %error, "[ss-04] Balance refresh failed");
                Err(error)
            }
        }
    }

    /// A refresh that always performs new reads.
    async fn fresh_refresh(&self, epoch: u64, scope: &RefreshScope) -> RefreshResult {
        let _serial = scope.lock.lock().await;
        self.run_refresh(epoch, scope).await
    }

    async fn submit_operation(
        &self,
        kind: OperationKind,
        input: &str,
    ) -> Result<TransactionReceipt, EngineError> {
        let amount = match self.codec.encode(input) {
            Ok(amount) => amount,
            Err(e) => {
                SUBMISSIONS.with_label_values(&[kind.as_str(), "invalid"]).inc();
                debug!(kind = %kind, error = %e, "[ss-04] Amount rejected");
                return Err(self.fail(e.into()));
            }
        };

        let (epoch, scope) = {
            let mut inner = self.inner.lock();
            let refused = if inner.lifecycle != Lifecycle::Ready {
                Some(EngineError::from(SyncError::NotReady))
            } else if inner.pending.get(&kind).is_some_and(|op| op.is_in_flight()) {
                Some(EngineError::from(ContractError::AlreadyPending(kind)))
            } else {
                None
            };
            if let Some(error) = refused {
                SUBMISSIONS.with_label_values(&[kind.as_str(), "failed"]).inc();
                self.record_error(&mut inner, &error);
                self.publish(&mut inner);
                return Err(error);
            }

            inner.pending.insert(kind, PendingOperation::new(kind, amount));
            self.publish(&mut inner);
            (inner.epoch, inner.refresh.clone())
        };

        info!(
            kind = %kind,
            amount = %self.codec.decode(amount),
            "[ss-04] Submitting operation"
        );
        let started = Instant::now();
        let submitted = match kind {
            OperationKind::Stake => self.binding.submit(kind, STAKE, &[], Some(amount)).await,
            OperationKind::Unstake => {
                self.binding
                    .submit(kind, UNSTAKE, &[CallArg::from(amount)], None)
                    .await
            }
        };

        let receipt = match submitted {
            Ok(receipt) => {
                CONFIRMATION_DURATION
                    .with_label_values(&[kind.as_str()])
                    .observe(started.elapsed().as_secs_f64());
                receipt
            }
            Err(e) => {
                let outcome = if e == ContractError::UserRejected {
                    "rejected"
                } else {
                    "failed"
                };
                SUBMISSIONS.with_label_values(&[kind.as_str(), outcome]).inc();

                let mut inner = self.inner.lock();
                if inner.epoch != epoch {
                    return Err(SyncError::SessionEnded.into());
                }
                let error = EngineError::from(e);
                warn!(kind = %kind, error = %error, "[ss-04] Operation failed");
                self.record_error(&mut inner, &error);
                self.settle(&mut inner, kind, OperationOutcome::Failed(error.to_string()));
                return Err(error);
            }
        };

        let refreshed = self.fresh_refresh(epoch, &scope).await;

        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            return Err(SyncError::SessionEnded.into());
        }
        SUBMISSIONS.with_label_values(&[kind.as_str(), "confirmed"]).inc();

        match refreshed {
            Ok(snapshot) => {
                inner.last_error = None;
                self.settle(&mut inner, kind, OperationOutcome::Confirmed);
                log_tx_event!(
                    info,
                    "ss-04",
                    "Operation confirmed and balances refreshed",
                    receipt.tx_hash,
                    kind = %kind,
                    version = snapshot.as_of
                );
                Ok(receipt)
            }
            Err(e) => {
                let error = EngineError::from(SyncError::StaleAfterConfirmation(e.to_string()));
                self.record_error(&mut inner, &error);
                self.settle(&mut inner, kind, OperationOutcome::Confirmed);
                Err(error)
            }
        }
    }
}

#[async_trait]
impl<W, P> StakingApi for StakingSynchronizer<W, P>
where
    W: WalletProvider + 'static,
    P: ContractProvider + 'static,
{
    async fn connect(&self) -> Result<Arc<ObservableState>, EngineError> {
        let epoch = {
            let mut inner = self.inner.lock();
            match inner.lifecycle {
                Lifecycle::Ready
                    if !self.config.reprompt_on_connect
                        && self.session.current_address().is_some()
                        && self.binding.is_bound() =>
                {
                    SESSION_EVENTS.with_label_values(&["reused"]).inc();
                    return Ok(inner.current.clone());
                }
                Lifecycle::Initializing => {
                    let error = EngineError::from(SessionError::ConnectInProgress);
                    self.record_error(&mut inner, &error);
                    self.publish(&mut inner);
                    return Err(error);
                }
                _ => {}
            }
            inner.lifecycle = Lifecycle::Initializing;
            self.publish(&mut inner);
            inner.epoch
        };

        let established = self.establish().await;

        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            if inner.lifecycle == Lifecycle::Idle {
                self.binding.unbind();
            }
            return Err(SyncError::SessionEnded.into());
        }

        match established {
            Ok((total, user)) => {
                let snapshot = inner.next_snapshot(total, user);
                inner.lifecycle = Lifecycle::Ready;
                inner.last_error = None;
                self.publish(&mut inner);

                SESSION_EVENTS.with_label_values(&["connected"]).inc();
                log_event!(
                    info,
                    "ss-04",
                    "Engine ready",
                    address = %inner.current.session.address_or_empty(),
                    version = snapshot.as_of
                );
                Ok(inner.current.clone())
            }
            Err(error) => {
                self.binding.unbind();
                inner.lifecycle = Lifecycle::Idle;
                inner.snapshot = None;
                self.record_error(&mut inner, &error);
                self.publish(&mut inner);

                SESSION_EVENTS.with_label_values(&["failed"]).inc();
                warn!(error = %error, "[ss-04] Initialization failed");
                Err(error)
            }
        }
    }

    async fn stake(&self, amount: &str) -> Result<TransactionReceipt, EngineError> {
        self.submit_operation(OperationKind::Stake, amount).await
    }

    async fn unstake(&self, amount: &str) -> Result<TransactionReceipt, EngineError> {
        self.submit_operation(OperationKind::Unstake, amount).await
    }

    async fn refresh_balances(&self) -> Result<BalanceSnapshot, EngineError> {
        let (epoch, scope) = self.ready_session()?;
        let target = scope.tracker.lock().target();

        let _serial = scope.lock.lock().await;
        let shared = scope.tracker.lock().completed(target);
        if let Some(result) = shared {
            REFRESHES.with_label_values(&["coalesced"]).inc();
            trace!(generation = target, "[ss-04] Joined in-flight refresh");
            return result;
        }

        self.run_refresh(epoch, &scope).await
    }

    fn disconnect(&self) -> bool {
        self.session.handle_disconnect();
        self.teardown("requested")
    }

    fn subscribe(&self) -> Subscription<Arc<ObservableState>> {
        self.bus.subscribe()
    }

    fn state(&self) -> Arc<ObservableState> {
        self.inner.lock().current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use ss_01_amount_codec::ValidationError;
    use ss_02_provider_session::{MockWallet, SessionState};
    use ss_03_contract_binding::{InMemoryStakingContract, RemoteError};
    use shared_types::U256;
    use std::time::Duration;

    type Engine = StakingSynchronizer<MockWallet, InMemoryStakingContract>;

    fn ether(n: u64) -> Amount {
        Amount::from_base_units(U256::from(n) * U256::exp10(18))
    }

    fn setup() -> (Arc<MockWallet>, Arc<InMemoryStakingContract>, Arc<Engine>) {
        let config = SyncConfig::for_testing();
        let wallet = Arc::new(MockWallet::with_account("0xABC"));
        let contract = Arc::new(InMemoryStakingContract::new(config.contract().unwrap()));
        contract.seed_stake(&Address::new("0x1"), ether(100));
        let engine = Arc::new(
            StakingSynchronizer::new(Some(wallet.clone()), contract.clone(), config).unwrap(),
        );
        (wallet, contract, engine)
    }

    async fn connected() -> (Arc<MockWallet>, Arc<InMemoryStakingContract>, Arc<Engine>) {
        let (wallet, contract, engine) = setup();
        engine.connect().await.unwrap();
        (wallet, contract, engine)
    }

    async fn wait_until(condition: impl Fn() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("condition not reached");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SyncConfig {
            contract_address: "nowhere".to_string(),
            ..SyncConfig::for_testing()
        };
        let contract = Arc::new(InMemoryStakingContract::new(Address::new("0x1")));
        let result = Engine::new(None, contract, config);
        assert!(matches!(result, Err(ConfigError::InvalidContractAddress(_))));
    }

    #[test]
    fn test_initial_state_is_idle() {
        let (_, _, engine) = setup();
        let state = engine.state();
        assert_eq!(state.phase, SyncPhase::Idle);
        assert_eq!(state.revision, 0);
        assert!(state.snapshot.is_none());
    }

    #[tokio::test]
    async fn test_connect_takes_first_snapshot() {
        let (_, contract, engine) = setup();
        let state = engine.connect().await.unwrap();

        assert_eq!(state.phase, SyncPhase::Ready);
        assert_eq!(state.address().unwrap().as_str(), "0xabc");
        assert!(state.bound);
        let snapshot = state.snapshot.unwrap();
        assert_eq!(snapshot.total_staked, ether(100));
        assert_eq!(snapshot.user_staked, Amount::zero());
        assert_eq!(snapshot.as_of, 1);
        assert!(state.last_error.is_none());
        assert_eq!(contract.call_count(), 2);
        assert_eq!(engine.state(), state);
    }

    #[tokio::test]
    async fn test_connect_is_idempotent_when_ready() {
        let (wallet, contract, engine) = connected().await;
        let again = engine.connect().await.unwrap();

        assert_eq!(wallet.prompt_count(), 1);
        assert_eq!(contract.call_count(), 2);
        assert_eq!(again.version(), Some(1));
    }

    #[tokio::test]
    async fn test_connect_without_wallet() {
        let config = SyncConfig::for_testing();
        let contract = Arc::new(InMemoryStakingContract::new(config.contract().unwrap()));
        let engine: Engine = StakingSynchronizer::new(None, contract.clone(), config).unwrap();

        let err = engine.connect().await.unwrap_err();
        assert_eq!(err, EngineError::Session(SessionError::NoWalletDetected));

        let state = engine.state();
        assert_eq!(state.phase, SyncPhase::Idle);
        assert_eq!(state.last_error, Some(err));
        assert!(!state.bound);
        assert_eq!(contract.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_initial_read_discards_binding() {
        let (_, contract, engine) = setup();
        contract.fail_calls(Some("rpc down"));

        let err = engine.connect().await.unwrap_err();
        assert_eq!(
            err,
            EngineError::Contract(ContractError::RemoteFailure("rpc down".into()))
        );
        let state = engine.state();
        assert_eq!(state.phase, SyncPhase::Idle);
        assert!(!state.bound);
        assert!(state.snapshot.is_none());
        assert!(!engine.binding().is_bound());

        // Recovers once the remote does
        contract.fail_calls(None);
        assert!(engine.connect().await.is_ok());
        assert!(engine.state().last_error.is_none());
    }

    #[tokio::test]
    async fn test_stake_scenario() {
        let (_, contract, engine) = connected().await;
        let mut subscription = engine.subscribe();

        let receipt = engine.stake("10").await.unwrap();
        assert!(receipt.success);

        let sends: Vec<_> = contract
            .recorded_calls()
            .into_iter()
            .filter(|c| c.is_transaction)
            .collect();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].method, STAKE);
        assert_eq!(sends[0].value, ether(10).base_units());

        let state = engine.state();
        let snapshot = state.snapshot.unwrap();
        assert_eq!(engine.codec().decode(snapshot.total_staked), "110.0");
        assert_eq!(engine.codec().decode(snapshot.user_staked), "10.0");
        assert_eq!(snapshot.as_of, 2);
        assert!(state.last_error.is_none());
        assert_eq!(state.phase, SyncPhase::Ready);
        assert_eq!(
            state.operation(OperationKind::Stake).unwrap().outcome,
            Some(OperationOutcome::Confirmed)
        );

        let phases: Vec<SyncPhase> = subscription.drain().iter().map(|s| s.phase).collect();
        assert_eq!(phases.first(), Some(&SyncPhase::Submitting(OperationKind::Stake)));
        assert!(phases.contains(&SyncPhase::Refreshing));
        assert_eq!(phases.last(), Some(&SyncPhase::Ready));
    }

    #[tokio::test]
    async fn test_unstake_round_trip() {
        let (_, contract, engine) = connected().await;
        engine.stake("10").await.unwrap();
        engine.unstake("2.5").await.unwrap();

        let snapshot = engine.state().snapshot.unwrap();
        assert_eq!(engine.codec().decode(snapshot.user_staked), "7.5");
        assert_eq!(engine.codec().decode(snapshot.total_staked), "107.5");
        assert_eq!(snapshot.as_of, 3);
        assert_eq!(contract.send_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_amount_makes_no_network_call() {
        let (_, contract, engine) = connected().await;
        let calls_before = contract.recorded_calls().len();
        let before = engine.state();

        let err = engine.stake("-5").await.unwrap_err();
        assert_eq!(err, EngineError::Validation(ValidationError::Negative));

        assert_eq!(contract.recorded_calls().len(), calls_before);
        let after = engine.state();
        assert_eq!(after.last_error, Some(err));
        assert_eq!(after.snapshot, before.snapshot);
        assert_eq!(after.phase, SyncPhase::Ready);

        for (input, expected) in [
            ("", ValidationError::EmptyInput),
            ("ten", ValidationError::NotANumber),
        ] {
            assert_eq!(
                engine.unstake(input).await.unwrap_err(),
                EngineError::Validation(expected)
            );
        }
        assert_eq!(contract.recorded_calls().len(), calls_before);
    }

    #[tokio::test]
    async fn test_failed_submission_leaves_version_unchanged() {
        let (_, contract, engine) = connected().await;
        contract.fail_next_send(RemoteError::UserRejected);

        let err = engine.stake("1").await.unwrap_err();
        assert_eq!(err, EngineError::Contract(ContractError::UserRejected));
        assert!(err.is_user_rejection());

        let state = engine.state();
        assert_eq!(state.version(), Some(1));
        assert_eq!(state.phase, SyncPhase::Ready);
        assert_eq!(state.last_error, Some(err));
        assert!(matches!(
            state.operation(OperationKind::Stake).unwrap().outcome,
            Some(OperationOutcome::Failed(_))
        ));

        // The failed operation is forgotten; a retry is allowed
        assert!(engine.stake("1").await.is_ok());
        assert!(engine.state().last_error.is_none());
    }

    #[tokio::test]
    async fn test_reverted_unstake() {
        let (_, _, engine) = connected().await;
        let err = engine.unstake("1").await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Contract(ContractError::Reverted(_))
        ));
        assert_eq!(engine.state().version(), Some(1));
    }

    #[tokio::test]
    async fn test_operations_require_ready_engine() {
        let (_, contract, engine) = setup();
        assert_eq!(
            engine.stake("1").await.unwrap_err(),
            EngineError::Sync(SyncError::NotReady)
        );
        assert_eq!(
            engine.refresh_balances().await.unwrap_err(),
            EngineError::Sync(SyncError::NotReady)
        );
        assert!(contract.recorded_calls().is_empty());
    }

    #[tokio::test]
    async fn test_same_kind_rejected_other_kind_proceeds() {
        let (_, contract, engine) = connected().await;
        contract.seed_stake(&Address::new("0xABC"), ether(5));
        contract.hold_confirmations();

        let e = engine.clone();
        let first = tokio::spawn(async move { e.stake("1").await });
        wait_until(|| contract.waiting_confirmations() == 1).await;
        assert_eq!(
            engine.state().phase,
            SyncPhase::Submitting(OperationKind::Stake)
        );

        assert_eq!(
            engine.stake("1").await.unwrap_err(),
            EngineError::Contract(ContractError::AlreadyPending(OperationKind::Stake))
        );

        let e = engine.clone();
        let second = tokio::spawn(async move { e.unstake("2").await });
        wait_until(|| contract.waiting_confirmations() == 2).await;
        assert!(engine.state().is_pending(OperationKind::Stake));
        assert!(engine.state().is_pending(OperationKind::Unstake));

        contract.release_confirmations(2);
        assert!(first.await.unwrap().is_ok());
        assert!(second.await.unwrap().is_ok());

        let snapshot = engine.state().snapshot.unwrap();
        assert_eq!(snapshot.user_staked, ether(4));
        assert_eq!(snapshot.as_of, 3);
    }

    #[tokio::test]
    async fn test_overlapping_refreshes_share_reads() {
        let (_, contract, engine) = connected().await;
        contract.hold_calls();

        let e = engine.clone();
        let first = tokio::spawn(async move { e.refresh_balances().await });
        wait_until(|| contract.waiting_calls() == 1).await;
        assert_eq!(engine.state().phase, SyncPhase::Refreshing);

        let e = engine.clone();
        let second = tokio::spawn(async move { e.refresh_balances().await });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        contract.open_calls();
        let a = first.await.unwrap().unwrap();
        let b = second.await.unwrap().unwrap();

        assert_eq!(a, b);
        assert_eq!(a.as_of, 2);
        // Two reads for connect, two for the shared refresh
        assert_eq!(contract.call_count(), 4);
        assert_eq!(engine.state().phase, SyncPhase::Ready);
    }

    #[tokio::test]
    async fn test_sequential_refreshes_read_again() {
        let (_, contract, engine) = connected().await;
        let a = engine.refresh_balances().await.unwrap();
        let b = engine.refresh_balances().await.unwrap();
        assert!(b.as_of > a.as_of);
        assert_eq!(contract.call_count(), 6);
    }

    #[tokio::test]
    async fn test_post_confirmation_refresh_is_not_shared() {
        let (_, contract, engine) = connected().await;
        contract.hold_calls();

        let e = engine.clone();
        let refresh = tokio::spawn(async move { e.refresh_balances().await });
        wait_until(|| contract.waiting_calls() == 1).await;

        let e = engine.clone();
        let stake = tokio::spawn(async move { e.stake("10").await });
        wait_until(|| contract.send_count() == 1).await;

        contract.open_calls();
        assert!(refresh.await.unwrap().is_ok());
        assert!(stake.await.unwrap().is_ok());

        // connect + public refresh + the stake's own refresh
        assert_eq!(contract.call_count(), 6);
        let snapshot = engine.state().snapshot.unwrap();
        assert_eq!(snapshot.as_of, 3);
        assert_eq!(snapshot.user_staked, ether(10));
    }

    #[tokio::test]
    async fn test_refresh_failure_after_confirmation() {
        let (_, contract, engine) = connected().await;
        contract.hold_confirmations();

        let e = engine.clone();
        let stake = tokio::spawn(async move { e.stake("3").await });
        wait_until(|| contract.waiting_confirmations() == 1).await;
        contract.fail_calls(Some("rpc down"));
        contract.release_confirmations(1);

        let err = stake.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            EngineError::Sync(SyncError::StaleAfterConfirmation(_))
        ));
        let state = engine.state();
        assert_eq!(state.last_error, Some(err));
        assert_eq!(state.version(), Some(1));
        assert_eq!(
            state.operation(OperationKind::Stake).unwrap().outcome,
            Some(OperationOutcome::Confirmed)
        );
        // The chain did record the stake
        assert_eq!(contract.balance_of(&Address::new("0xABC")), ether(3));
    }

    #[tokio::test]
    async fn test_disconnect_clears_binding_and_snapshot() {
        let (wallet, _, engine) = connected().await;
        let listener = engine.spawn_event_listener().unwrap();

        wallet.emit(WalletEvent::Disconnected);
        wait_until(|| engine.state().phase == SyncPhase::Idle).await;

        let state = engine.state();
        assert_eq!(state.session, SessionState::Disconnected);
        assert!(!state.bound);
        assert!(state.snapshot.is_none());
        assert!(!engine.binding().is_bound());

        // Reconnect initializes from scratch, versions keep increasing
        let state = engine.connect().await.unwrap();
        assert_eq!(wallet.prompt_count(), 2);
        assert_eq!(state.version(), Some(2));

        listener.abort();
    }

    #[tokio::test]
    async fn test_account_switch_tears_down() {
        let (wallet, _, engine) = connected().await;
        let _listener = engine.spawn_event_listener().unwrap();

        wallet.emit(WalletEvent::AccountsChanged(vec!["0xDEF".into()]));
        wait_until(|| engine.state().phase == SyncPhase::Idle).await;
        assert!(engine.session().current_address().is_none());
    }

    #[tokio::test]
    async fn test_late_confirmation_after_disconnect_is_dropped() {
        let (_, contract, engine) = connected().await;
        contract.hold_confirmations();

        let e = engine.clone();
        let stake = tokio::spawn(async move { e.stake("1").await });
        wait_until(|| contract.waiting_confirmations() == 1).await;

        assert!(engine.disconnect());
        let revision = engine.state().revision;
        contract.release_confirmations(1);

        assert_eq!(
            stake.await.unwrap().unwrap_err(),
            EngineError::Sync(SyncError::SessionEnded)
        );
        let state = engine.state();
        assert_eq!(state.revision, revision);
        assert_eq!(state.phase, SyncPhase::Idle);
        assert!(state.snapshot.is_none());
        assert!(state.pending.is_empty());
    }

    #[tokio::test]
    async fn test_reconnect_does_not_wait_for_ended_refresh() {
        let (_, contract, engine) = connected().await;
        contract.hold_calls();

        let e = engine.clone();
        let stale = tokio::spawn(async move { e.refresh_balances().await });
        wait_until(|| contract.waiting_calls() == 1).await;
        assert!(engine.disconnect());

        // The old read stays parked on its own gate; new reads pass
        contract.hold_calls();
        contract.open_calls();
        let state = engine.connect().await.unwrap();
        assert_eq!(state.version(), Some(2));

        let snapshot = tokio::time::timeout(Duration::from_secs(5), engine.refresh_balances())
            .await
            .expect("refresh queued behind an ended session")
            .unwrap();
        assert_eq!(snapshot.as_of, 3);

        let receipt = tokio::time::timeout(Duration::from_secs(5), engine.stake("1"))
            .await
            .expect("stake queued behind an ended session")
            .unwrap();
        assert!(receipt.success);
        assert_eq!(engine.state().version(), Some(4));
        assert_eq!(engine.state().phase, SyncPhase::Ready);

        assert!(!stale.is_finished());
        stale.abort();
    }

    #[tokio::test]
    async fn test_reconnect_while_old_submission_in_flight() {
        let (_, contract, engine) = connected().await;
        contract.hold_confirmations();

        let e = engine.clone();
        let old = tokio::spawn(async move { e.stake("1").await });
        wait_until(|| contract.waiting_confirmations() == 1).await;
        assert!(engine.disconnect());

        let state = engine.connect().await.unwrap();
        assert!(!state.is_pending(OperationKind::Stake));
        assert!(!engine.binding().is_pending(OperationKind::Stake));

        let e = engine.clone();
        let new = tokio::spawn(async move { e.stake("2").await });
        wait_until(|| contract.waiting_confirmations() == 2).await;
        assert!(engine.state().is_pending(OperationKind::Stake));

        contract.release_confirmations(2);
        assert_eq!(
            old.await.unwrap().unwrap_err(),
            EngineError::Sync(SyncError::SessionEnded)
        );
        assert!(new.await.unwrap().unwrap().success);

        assert_eq!(contract.balance_of(&Address::new("0xABC")), ether(3));
        let state = engine.state();
        assert_eq!(state.version(), Some(3));
        assert!(!state.is_pending(OperationKind::Stake));
        assert!(engine.binding().pending_kinds().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_while_idle_is_noop() {
        let (_, _, engine) = setup();
        assert!(!engine.disconnect());
        assert_eq!(engine.state().revision, 0);
    }

    #[tokio::test]
    async fn test_subscription_stream_sees_every_revision() {
        let (_, _, engine) = setup();
        let stream = engine.subscribe().into_stream();

        engine.connect().await.unwrap();
        engine.stake("1").await.unwrap();

        let last = engine.state().revision;
        let revisions: Vec<u64> = stream
            .take(last as usize)
            .map(|s| s.revision)
            .collect()
            .await;
        assert_eq!(revisions, (1..=last).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_on_state_callback() {
        let (_, _, engine) = setup();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let _task = engine.on_state(move |state| sink.lock().push(state.phase));

        engine.connect().await.unwrap();
        wait_until(|| seen.lock().last() == Some(&SyncPhase::Ready)).await;
        assert_eq!(seen.lock().first(), Some(&SyncPhase::Initializing));
    }

    #[test]
    fn test_connect_resolves_with_block_on() {
        let (_, _, engine) = setup();
        let state = tokio_test::block_on(async { engine.connect().await.unwrap() });
        assert_eq!(state.phase, SyncPhase::Ready);
    }
}
