// VRF Raffle
// A self-administering raffle on Solana: entries accrue a pot, upkeep requests
// randomness from a coordinator and the fulfillment pays a random participant.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod instruction;
pub mod ledger;
pub mod machine;
pub mod oracle;
pub mod processor;
pub mod state;
pub mod upkeep;
pub mod winner;

#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;

use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    program_error::{PrintProgramError, ProgramError},
    pubkey::Pubkey,
};

use crate::error::RaffleError;

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    if let Err(error) = processor::Processor::process(program_id, accounts, instruction_data) {
        if let ProgramError::Custom(code) = error {
            if let Some(raffle_error) = RaffleError::from_code(code) {
                raffle_error.print::<RaffleError>();
            }
        }
        return Err(error);
    }
    Ok(())
}
