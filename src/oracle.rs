// Randomness coordinator integration
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    instruction::{AccountMeta, Instruction},
    msg,
    program::{get_return_data, invoke},
    program_error::ProgramError,
    pubkey::Pubkey,
};
use std::convert::TryInto;

use crate::config::OracleConfig;
use crate::coordinator::RandomnessOracle;
use crate::error::RaffleError;

/// Instructions understood by a randomness coordinator program
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum CoordinatorInstruction {
    /// Register a request and answer with its id as return data
    /// (8 bytes, little endian).
    ///
    /// Accounts expected:
    /// 0. `[writable]` Coordinator state
    /// 1. `[]` Consumer (the raffle account)
    RequestRandomWords {
        key_hash: [u8; 32],
        subscription_id: u64,
        request_confirmations: u16,
        callback_gas_limit: u32,
        num_words: u32,
    },
}

impl CoordinatorInstruction {
    pub fn request_for(config: &OracleConfig) -> Self {
        Self::RequestRandomWords {
            key_hash: config.key_hash,
            subscription_id: config.subscription_id,
            request_confirmations: config.request_confirmations,
            callback_gas_limit: config.callback_gas_limit,
            num_words: config.num_words,
        }
    }
}

/// Create a request_random_words instruction for the coordinator
pub fn request_random_words(
    config: &OracleConfig,
    coordinator_state: &Pubkey,
    consumer: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let data = CoordinatorInstruction::request_for(config)
        .try_to_vec()
        .map_err(|_| ProgramError::InvalidInstructionData)?;

    Ok(Instruction {
        program_id: config.coordinator,
        accounts: vec![
            AccountMeta::new(*coordinator_state, false),
            AccountMeta::new_readonly(*consumer, false),
        ],
        data,
    })
}

/// Requests randomness by invoking the coordinator program
pub struct CpiOracle<'a, 'b> {
    coordinator_program: &'a AccountInfo<'b>,
    coordinator_state: &'a AccountInfo<'b>,
    consumer: &'a AccountInfo<'b>,
}

impl<'a, 'b> CpiOracle<'a, 'b> {
    pub fn new(
        coordinator_program: &'a AccountInfo<'b>,
        coordinator_state: &'a AccountInfo<'b>,
        consumer: &'a AccountInfo<'b>,
    ) -> Self {
        Self {
            coordinator_program,
            coordinator_state,
            consumer,
        }
    }
}

impl RandomnessOracle for CpiOracle<'_, '_> {
    fn request_randomness(&mut self, config: &OracleConfig) -> Result<u64, ProgramError> {
        if *self.coordinator_program.key != config.coordinator {
            msg!(
                "Coordinator {} is not the configured coordinator {}",
                self.coordinator_program.key,
                config.coordinator
            );
            return Err(RaffleError::InvalidCoordinator.into());
        }

        let instruction =
            request_random_words(config, self.coordinator_state.key, self.consumer.key)?;
        invoke(
            &instruction,
            &[
                self.coordinator_state.clone(),
                self.consumer.clone(),
                self.coordinator_program.clone(),
            ],
        )?;

        let (program_id, data) = get_return_data().ok_or_else(|| {
            msg!("Coordinator returned no data");
            RaffleError::OracleRequestFailed
        })?;
        if program_id != config.coordinator {
            msg!("Return data came from {}, not the coordinator", program_id);
            return Err(RaffleError::OracleRequestFailed.into());
        }
        let request_id = data
            .get(..8)
            .and_then(|bytes| bytes.try_into().ok())
            .map(u64::from_le_bytes)
            .ok_or(RaffleError::OracleRequestFailed)?;

        msg!("Coordinator accepted randomness request {}", request_id);
        Ok(request_id)
    }
}
