//! Construction-time configuration of a raffle.

use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    program_error::ProgramError,
    program_pack::{Pack, Sealed},
    pubkey::Pubkey,
};

use crate::error::RaffleError;

/// Entry fee used when none is given: 0.01 SOL
pub const DEFAULT_ENTRY_FEE: u64 = 10_000_000;
/// Seconds between draws used when none is given
pub const DEFAULT_INTERVAL: u64 = 30;
/// 30 gwei gas lane of the reference coordinator
pub const DEFAULT_KEY_HASH: [u8; 32] = [
    0x47, 0x4e, 0x34, 0xa0, 0x77, 0xdf, 0x58, 0x80, 0x7d, 0xbe, 0x9c, 0x96, 0xd3, 0xc0, 0x09, 0xb2,
    0x3b, 0x3c, 0x6d, 0x0c, 0xce, 0x43, 0x3e, 0x59, 0xbb, 0xf5, 0xb3, 0x4f, 0x82, 0x3b, 0xc5, 0x6c,
];
pub const DEFAULT_SUBSCRIPTION_ID: u64 = 588;
pub const DEFAULT_REQUEST_CONFIRMATIONS: u16 = 3;
pub const DEFAULT_CALLBACK_GAS_LIMIT: u32 = 500_000;
pub const DEFAULT_NUM_WORDS: u32 = 1;

pub const ORACLE_CONFIG_LEN: usize = 32 + 32 + 32 + 8 + 2 + 4 + 4;
pub const RAFFLE_CONFIG_LEN: usize = 8 + 8 + ORACLE_CONFIG_LEN;

/// Oracle connection parameters.
///
/// `coordinator` receives randomness requests and `fulfillment_authority`
/// is the only signer allowed to deliver the answer. The remaining fields
/// are forwarded to the coordinator untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OracleConfig {
    /// Program id of the randomness coordinator
    pub coordinator: Pubkey,
    /// Signer of fulfillment callbacks
    pub fulfillment_authority: Pubkey,
    /// Gas lane
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

impl OracleConfig {
    pub fn new(coordinator: Pubkey, fulfillment_authority: Pubkey) -> Self {
        Self {
            coordinator,
            fulfillment_authority,
            key_hash: DEFAULT_KEY_HASH,
            subscription_id: DEFAULT_SUBSCRIPTION_ID,
            request_confirmations: DEFAULT_REQUEST_CONFIRMATIONS,
            callback_gas_limit: DEFAULT_CALLBACK_GAS_LIMIT,
            num_words: DEFAULT_NUM_WORDS,
        }
    }
}

impl Sealed for OracleConfig {}

impl Pack for OracleConfig {
    const LEN: usize = ORACLE_CONFIG_LEN;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, ORACLE_CONFIG_LEN];
        let (
            coordinator,
            fulfillment_authority,
            key_hash,
            subscription_id,
            request_confirmations,
            callback_gas_limit,
            num_words,
        ) = array_refs![src, 32, 32, 32, 8, 2, 4, 4];

        Ok(OracleConfig {
            coordinator: Pubkey::new_from_array(*coordinator),
            fulfillment_authority: Pubkey::new_from_array(*fulfillment_authority),
            key_hash: *key_hash,
            subscription_id: u64::from_le_bytes(*subscription_id),
            request_confirmations: u16::from_le_bytes(*request_confirmations),
            callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
            num_words: u32::from_le_bytes(*num_words),
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, ORACLE_CONFIG_LEN];
        let (
            coordinator_dst,
            fulfillment_authority_dst,
            key_hash_dst,
            subscription_id_dst,
            request_confirmations_dst,
            callback_gas_limit_dst,
            num_words_dst,
        ) = mut_array_refs![dst, 32, 32, 32, 8, 2, 4, 4];

        coordinator_dst.copy_from_slice(self.coordinator.as_ref());
        fulfillment_authority_dst.copy_from_slice(self.fulfillment_authority.as_ref());
        key_hash_dst.copy_from_slice(&self.key_hash);
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        *request_confirmations_dst = self.request_confirmations.to_le_bytes();
        *callback_gas_limit_dst = self.callback_gas_limit.to_le_bytes();
        *num_words_dst = self.num_words.to_le_bytes();
    }
}

/// Everything fixed when a raffle is created
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaffleConfig {
    /// Minimum deposit in lamports
    pub entry_fee: u64,
    /// Minimum seconds between draws
    pub interval: u64,
    pub oracle: OracleConfig,
}

impl RaffleConfig {
    /// Development-network defaults wired to the given oracle
    pub fn new(coordinator: Pubkey, fulfillment_authority: Pubkey) -> Self {
        Self {
            entry_fee: DEFAULT_ENTRY_FEE,
            interval: DEFAULT_INTERVAL,
            oracle: OracleConfig::new(coordinator, fulfillment_authority),
        }
    }

    pub fn with_entry_fee(mut self, entry_fee: u64) -> Self {
        self.entry_fee = entry_fee;
        self
    }

    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval;
        self
    }

    pub fn validate(&self) -> Result<(), RaffleError> {
        if self.entry_fee == 0 || self.oracle.num_words == 0 {
            return Err(RaffleError::InvalidConfig);
        }
        if self.oracle.coordinator == Pubkey::default()
            || self.oracle.fulfillment_authority == Pubkey::default()
        {
            return Err(RaffleError::InvalidConfig);
        }
        Ok(())
    }
}

impl Sealed for RaffleConfig {}

impl Pack for RaffleConfig {
    const LEN: usize = RAFFLE_CONFIG_LEN;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, RAFFLE_CONFIG_LEN];
        let (entry_fee, interval, oracle) = array_refs![src, 8, 8, ORACLE_CONFIG_LEN];

        Ok(RaffleConfig {
            entry_fee: u64::from_le_bytes(*entry_fee),
            interval: u64::from_le_bytes(*interval),
            oracle: OracleConfig::unpack_from_slice(oracle)?,
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, RAFFLE_CONFIG_LEN];
        let (entry_fee_dst, interval_dst, oracle_dst) =
            mut_array_refs![dst, 8, 8, ORACLE_CONFIG_LEN];

        *entry_fee_dst = self.entry_fee.to_le_bytes();
        *interval_dst = self.interval.to_le_bytes();
        self.oracle.pack_into_slice(oracle_dst);
    }
}
