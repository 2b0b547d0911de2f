//! # ABI
//!
//! Method descriptors and the Solidity call-data encoding the staking
//! contract understands.
//!
//! ## Layout
//!
//! ```text
//! call data = keccak256("name(type,...)")[0..4] || word(arg0) || word(arg1) ...
//! word      = 32 bytes, big-endian, left-padded
//! ```
//!
//! Only static types appear in the staking interface, so every argument and
//! every return value occupies exactly one word.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use shared_types::{Address, Amount};
use std::fmt;

use super::errors::ContractError;

/// Size of an ABI word.
pub const WORD_SIZE: usize = 32;

/// Size of a function selector.
pub const SELECTOR_SIZE: usize = 4;

/// `stake() payable`
pub const STAKE: &str = "stake";
/// `unstake(uint256)`
pub const UNSTAKE: &str = "unstake";
/// `balances(address) view returns (uint256)`
pub const BALANCES: &str = "balances";
/// `getBalance(address) view returns (uint256)`
pub const GET_BALANCE: &str = "getBalance";
/// `getTotalStakedAmount() view returns (uint256)`
pub const GET_TOTAL_STAKED_AMOUNT: &str = "getTotalStakedAmount";
/// `totalStaked() view returns (uint256)`
pub const TOTAL_STAKED: &str = "totalStaked";

/// Static ABI types used by the staking interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbiType {
    /// 20-byte account address.
    Address,
    /// 256-bit unsigned integer.
    Uint256,
}

impl AbiType {
    /// Canonical Solidity name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AbiType::Address => "address",
            AbiType::Uint256 => "uint256",
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Solidity state mutability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateMutability {
    /// Reads state only.
    View,
    /// Writes state, rejects value.
    NonPayable,
    /// Writes state, accepts value.
    Payable,
}

/// A single argument value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallArg {
    /// An account.
    Address(Address),
    /// An unsigned integer.
    Uint(U256),
}

impl CallArg {
    /// ABI type this value encodes as.
    #[must_use]
    pub fn abi_type(&self) -> AbiType {
        match self {
            CallArg::Address(_) => AbiType::Address,
            CallArg::Uint(_) => AbiType::Uint256,
        }
    }
}

impl From<Address> for CallArg {
    fn from(address: Address) -> Self {
        CallArg::Address(address)
    }
}

impl From<Amount> for CallArg {
    fn from(amount: Amount) -> Self {
        CallArg::Uint(amount.base_units())
    }
}

/// One contract method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    name: String,
    inputs: Vec<AbiType>,
    outputs: Vec<AbiType>,
    mutability: StateMutability,
}

impl MethodDescriptor {
    /// Describe a method.
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<AbiType>,
        outputs: Vec<AbiType>,
        mutability: StateMutability,
    ) -> Self {
        Self {
            name: name.into(),
            inputs,
            outputs,
            mutability,
        }
    }

    /// Method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Input types.
    #[must_use]
    pub fn inputs(&self) -> &[AbiType] {
        &self.inputs
    }

    /// Output types.
    #[must_use]
    pub fn outputs(&self) -> &[AbiType] {
        &self.outputs
    }

    /// State mutability.
    #[must_use]
    pub fn mutability(&self) -> StateMutability {
        self.mutability
    }

    /// True for `view` methods.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.mutability == StateMutability::View
    }

    /// True for `payable` methods.
    #[must_use]
    pub fn is_payable(&self) -> bool {
        self.mutability == StateMutability::Payable
    }

    /// Canonical signature, e.g. `unstake(uint256)`.
    #[must_use]
    pub fn signature(&self) -> String {
        let inputs: Vec<&str> = self.inputs.iter().map(AbiType::as_str).collect();
        format!("{}({})", self.name, inputs.join(","))
    }

    /// First four bytes of the signature's Keccak-256 hash.
    #[must_use]
    pub fn selector(&self) -> [u8; SELECTOR_SIZE] {
        let mut hasher = Keccak256::new();
        hasher.update(self.signature().as_bytes());
        let hash = hasher.finalize();

        let mut selector = [0u8; SELECTOR_SIZE];
        selector.copy_from_slice(&hash[..SELECTOR_SIZE]);
        selector
    }

    /// Build call data for `args`.
    ///
    /// # Errors
    /// `InvalidArguments` on an arity or type mismatch, or an address that
    /// cannot be packed into a word.
    pub fn encode_call(&self, args: &[CallArg]) -> Result<Vec<u8>, ContractError> {
        if args.len() != self.inputs.len() {
            return Err(self.invalid(format!(
                "expected {} argument(s), got {}",
                self.inputs.len(),
                args.len()
            )));
        }

        let mut data = Vec::with_capacity(SELECTOR_SIZE + WORD_SIZE * args.len());
        data.extend_from_slice(&self.selector());

        for (position, (arg, expected)) in args.iter().zip(&self.inputs).enumerate() {
            if arg.abi_type() != *expected {
                return Err(self.invalid(format!(
                    "argument {position} must be {expected}, got {}",
                    arg.abi_type()
                )));
            }
            let word = match arg {
                CallArg::Address(address) => address
                    .to_word()
                    .ok_or_else(|| self.invalid(format!("malformed address {address:?}")))?,
                CallArg::Uint(value) => uint_word(*value),
            };
            data.extend_from_slice(&word);
        }

        Ok(data)
    }

    /// Decode the first return value as a `uint256`.
    ///
    /// # Errors
    /// `MalformedResponse` when the method returns nothing or the data is
    /// shorter than one word.
    pub fn decode_uint(&self, data: &[u8]) -> Result<U256, ContractError> {
        if self.outputs.first() != Some(&AbiType::Uint256) {
            return Err(self.malformed("method does not return uint256".to_string()));
        }
        if data.len() < WORD_SIZE {
            return Err(self.malformed(format!(
                "expected at least {WORD_SIZE} bytes, got {}",
                data.len()
            )));
        }
        Ok(U256::from_big_endian(&data[..WORD_SIZE]))
    }

    fn invalid(&self, reason: String) -> ContractError {
        ContractError::InvalidArguments {
            method: self.name.clone(),
            reason,
        }
    }

    fn malformed(&self, reason: String) -> ContractError {
        ContractError::MalformedResponse {
            method: self.name.clone(),
            reason,
        }
    }
}

/// The bound contract interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSet {
    methods: Vec<MethodDescriptor>,
}

impl MethodSet {
    /// Interface from explicit descriptors.
    #[must_use]
    pub fn new(methods: Vec<MethodDescriptor>) -> Self {
        Self { methods }
    }

    /// The staking contract's interface.
    #[must_use]
    pub fn staking() -> Self {
        use AbiType::{Address, Uint256};
        use StateMutability::{NonPayable, Payable, View};

        Self::new(vec![
            MethodDescriptor::new(STAKE, vec![], vec![], Payable),
            MethodDescriptor::new(UNSTAKE, vec![Uint256], vec![], NonPayable),
            MethodDescriptor::new(BALANCES, vec![Address], vec![Uint256], View),
            MethodDescriptor::new(GET_BALANCE, vec![Address], vec![Uint256], View),
            MethodDescriptor::new(GET_TOTAL_STAKED_AMOUNT, vec![], vec![Uint256], View),
            MethodDescriptor::new(TOTAL_STAKED, vec![], vec![Uint256], View),
        ])
    }

    /// Look up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Look up by selector.
    #[must_use]
    pub fn by_selector(&self, selector: &[u8]) -> Option<&MethodDescriptor> {
        self.methods
            .iter()
            .find(|m| m.selector().as_slice() == selector)
    }

    /// All descriptors.
    pub fn iter(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.iter()
    }

    /// Number of methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// True when the interface has no methods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Big-endian word for an unsigned integer.
#[must_use]
pub fn uint_word(value: U256) -> [u8; WORD_SIZE] {
    let mut word = [0u8; WORD_SIZE];
    value.to_big_endian(&mut word);
    word
}
