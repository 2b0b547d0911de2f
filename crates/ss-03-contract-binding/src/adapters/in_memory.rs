//! # In-Memory Staking Contract
//!
//! Simulates the deployed staking contract behind the same ABI the binding
//! speaks. Transactions take effect when their receipt is produced, so reads
//! issued between `send` and `wait_for_receipt` observe the old balances.

use async_trait::async_trait;
use parking_lot::Mutex;
use primitive_types::U256;
use shared_types::{Address, Amount, TxHash, H256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::{
    uint_word, MethodSet, TransactionReceipt, BALANCES, GET_BALANCE, GET_TOTAL_STAKED_AMOUNT,
    SELECTOR_SIZE, STAKE, TOTAL_STAKED, UNSTAKE, WORD_SIZE,
};
use crate::ports::{CallRequest, ContractProvider, RemoteError, SendRequest};

type Word = [u8; WORD_SIZE];

/// One request seen by the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Method name, or the hex selector if unknown.
    pub method: String,
    /// True for `send`, false for `call`.
    pub is_transaction: bool,
    /// Value attached (zero for calls).
    pub value: U256,
    /// Raw call data.
    pub data: Vec<u8>,
}

struct PendingTx {
    from: Word,
    method: String,
    amount: U256,
}

#[derive(Default)]
struct Ledger {
    total: U256,
    balances: HashMap<Word, U256>,
    pending: HashMap<TxHash, PendingTx>,
    mined: HashMap<TxHash, TransactionReceipt>,
    next_tx: u64,
    block_number: u64,
}

impl Ledger {
    /// Apply a mined transaction. Returns false when the contract would revert.
    fn apply(&mut self, tx: &PendingTx) -> bool {
        let balance = self.balances.get(&tx.from).copied().unwrap_or_default();
        match tx.method.as_str() {
            STAKE => match (balance.checked_add(tx.amount), self.total.checked_add(tx.amount)) {
                (Some(balance), Some(total)) => {
                    self.balances.insert(tx.from, balance);
                    self.total = total;
                    true
                }
                _ => false,
            },
            UNSTAKE if balance >= tx.amount && self.total >= tx.amount => {
                self.balances.insert(tx.from, balance - tx.amount);
                self.total -= tx.amount;
                true
            }
            _ => false,
        }
    }
}

/// In-memory staking contract with programmable failures.
pub struct InMemoryStakingContract {
    address: Address,
    methods: MethodSet,
    ledger: Mutex<Ledger>,
    calls: Mutex<Vec<RecordedCall>>,
    call_failure: Mutex<Option<String>>,
    send_failure: Mutex<Option<RemoteError>>,
    revert_next: AtomicBool,
    call_gate: Mutex<Option<Arc<Semaphore>>>,
    confirm_gate: Mutex<Option<Arc<Semaphore>>>,
    waiting_calls: AtomicUsize,
    waiting_confirmations: AtomicUsize,
}

impl InMemoryStakingContract {
    /// Empty contract deployed at `address`.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            methods: MethodSet::staking(),
            ledger: Mutex::new(Ledger::default()),
            calls: Mutex::new(Vec::new()),
            call_failure: Mutex::new(None),
            send_failure: Mutex::new(None),
            revert_next: AtomicBool::new(false),
            call_gate: Mutex::new(None),
            confirm_gate: Mutex::new(None),
            waiting_calls: AtomicUsize::new(0),
            waiting_confirmations: AtomicUsize::new(0),
        }
    }

    /// Contract address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Seed a stake for `account` (also added to the total).
    ///
    /// Returns false when the address cannot be represented on chain.
    pub fn seed_stake(&self, account: &Address, amount: Amount) -> bool {
        let Some(word) = account.to_word() else {
            return false;
        };
        let mut ledger = self.ledger.lock();
        let entry = ledger.balances.entry(word).or_default();
        *entry = entry.saturating_add(amount.base_units());
        ledger.total = ledger.total.saturating_add(amount.base_units());
        true
    }

    /// Current total staked.
    pub fn total_staked(&self) -> Amount {
        Amount::from_base_units(self.ledger.lock().total)
    }

    /// Current stake of `account`.
    pub fn balance_of(&self, account: &Address) -> Amount {
        let units = account
            .to_word()
            .and_then(|word| self.ledger.lock().balances.get(&word).copied())
            .unwrap_or_default();
        Amount::from_base_units(units)
    }

    /// Fail every read with a transport error until cleared.
    pub fn fail_calls(&self, message: Option<&str>) {
        *self.call_failure.lock() = message.map(str::to_string);
    }

    /// Fail the next `send` with `error`.
    pub fn fail_next_send(&self, error: RemoteError) {
        *self.send_failure.lock() = Some(error);
    }

    /// Mine the next transaction with a failed status.
    pub fn revert_next_receipt(&self) {
        self.revert_next.store(true, Ordering::SeqCst);
    }

    /// Make reads wait until released.
    pub fn hold_calls(&self) {
        *self.call_gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let `n` held reads complete.
    pub fn release_calls(&self, n: usize) {
        if let Some(gate) = self.call_gate.lock().as_ref() {
            gate.add_permits(n);
        }
    }

    /// Stop holding reads; waiting ones complete.
    pub fn open_calls(&self) {
        if let Some(gate) = self.call_gate.lock().take() {
            gate.close();
        }
    }

    /// Make receipts wait until released.
    pub fn hold_confirmations(&self) {
        *self.confirm_gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let `n` held receipts complete.
    pub fn release_confirmations(&self, n: usize) {
        if let Some(gate) = self.confirm_gate.lock().as_ref() {
            gate.add_permits(n);
        }
    }

    /// Reads currently waiting on the gate.
    pub fn waiting_calls(&self) -> usize {
        self.waiting_calls.load(Ordering::SeqCst)
    }

    /// Receipts currently waiting on the gate.
    pub fn waiting_confirmations(&self) -> usize {
        self.waiting_confirmations.load(Ordering::SeqCst)
    }

    /// Every request seen so far.
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Number of reads seen.
    pub fn call_count(&self) -> usize {
        self.calls.lock().iter().filter(|c| !c.is_transaction).count()
    }

    /// Number of transactions seen.
    pub fn send_count(&self) -> usize {
        self.calls.lock().iter().filter(|c| c.is_transaction).count()
    }

    fn record(&self, data: &[u8], value: U256, is_transaction: bool) -> Option<String> {
        let name = data
            .get(..SELECTOR_SIZE)
            .and_then(|selector| self.methods.by_selector(selector))
            .map(|m| m.name().to_string());
        self.calls.lock().push(RecordedCall {
            method: name
                .clone()
                .unwrap_or_else(|| hex::encode(&data[..data.len().min(SELECTOR_SIZE)])),
            is_transaction,
            value,
            data: data.to_vec(),
        });
        name
    }

    async fn pass(gate: &Mutex<Option<Arc<Semaphore>>>, waiting: &AtomicUsize) {
        let gate = gate.lock().clone();
        if let Some(gate) = gate {
            waiting.fetch_add(1, Ordering::SeqCst);
            // A closed gate lets everything through
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
            waiting.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

fn word_at(data: &[u8], index: usize) -> Option<Word> {
    let start = SELECTOR_SIZE + index * WORD_SIZE;
    let mut word = [0u8; WORD_SIZE];
    word.copy_from_slice(data.get(start..start + WORD_SIZE)?);
    Some(word)
}

#[async_trait]
impl ContractProvider for InMemoryStakingContract {
    async fn call(&self, request: CallRequest) -> Result<Vec<u8>, RemoteError> {
        let method = self.record(&request.data, U256::zero(), false);
        Self::pass(&self.call_gate, &self.waiting_calls).await;

        if let Some(message) = self.call_failure.lock().clone() {
            return Err(RemoteError::Transport(message));
        }
        if request.to != self.address {
            return Err(RemoteError::Transport(format!("no contract at {}", request.to)));
        }

        let ledger = self.ledger.lock();
        let value = match method.as_deref() {
            Some(GET_TOTAL_STAKED_AMOUNT) | Some(TOTAL_STAKED) => ledger.total,
            Some(GET_BALANCE) | Some(BALANCES) => {
                let account = word_at(&request.data, 0)
                    .ok_or_else(|| RemoteError::Reverted("missing account".to_string()))?;
                ledger.balances.get(&account).copied().unwrap_or_default()
            }
            _ => return Err(RemoteError::Reverted("unknown view method".to_string())),
        };

        Ok(uint_word(value).to_vec())
    }

    async fn send(&self, request: SendRequest) -> Result<TxHash, RemoteError> {
        let method = self.record(&request.data, request.value, true);

        if let Some(error) = self.send_failure.lock().take() {
            return Err(error);
        }
        if request.to != self.address {
            return Err(RemoteError::Transport(format!("no contract at {}", request.to)));
        }
        let from = request
            .from
            .to_word()
            .ok_or_else(|| RemoteError::Transport(format!("invalid sender {}", request.from)))?;

        let (method, amount) = match method.as_deref() {
            Some(STAKE) if request.value.is_zero() => {
                return Err(RemoteError::Reverted("stake amount must be positive".to_string()))
            }
            Some(STAKE) => (STAKE, request.value),
            Some(UNSTAKE) => {
                let amount = word_at(&request.data, 0)
                    .map(|w| U256::from_big_endian(&w))
                    .ok_or_else(|| RemoteError::Reverted("missing amount".to_string()))?;
                (UNSTAKE, amount)
            }
            _ => return Err(RemoteError::Reverted("unknown method".to_string())),
        };

        let mut ledger = self.ledger.lock();
        ledger.next_tx += 1;
        let tx_hash = H256::from_low_u64_be(ledger.next_tx);
        ledger.pending.insert(
            tx_hash,
            PendingTx {
                from,
                method: method.to_string(),
                amount,
            },
        );
        debug!(tx = ?tx_hash, method = method, "[in-memory] Transaction accepted");
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt, RemoteError> {
        Self::pass(&self.confirm_gate, &self.waiting_confirmations).await;

        let mut ledger = self.ledger.lock();
        if let Some(receipt) = ledger.mined.get(&tx_hash) {
            return Ok(receipt.clone());
        }
        let tx = ledger
            .pending
            .remove(&tx_hash)
            .ok_or_else(|| RemoteError::Transport(format!("unknown transaction {tx_hash:?}")))?;

        let forced_revert = self.revert_next.swap(false, Ordering::SeqCst);
        let success = !forced_revert && ledger.apply(&tx);

        ledger.block_number += 1;
        let receipt = TransactionReceipt {
            tx_hash,
            block_number: ledger.block_number,
            success,
        };
        ledger.mined.insert(tx_hash, receipt.clone());
        Ok(receipt)
    }
}
