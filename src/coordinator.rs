//! Bookkeeping for the single outstanding randomness request.

use solana_program::{entrypoint::ProgramResult, msg, program_error::ProgramError};

use crate::config::OracleConfig;
use crate::error::RaffleError;
use crate::state::{Raffle, RafflePhase};

/// Source of verifiable randomness.
///
/// A request returns a fresh identifier right away; the value itself is
/// delivered later through the raffle's fulfillment entry point.
pub trait RandomnessOracle {
    fn request_randomness(&mut self, config: &OracleConfig) -> Result<u64, ProgramError>;
}

/// Ask the oracle for randomness and remember the request.
///
/// Callers gate this on the raffle phase; nothing here checks it.
pub fn open_request<O: RandomnessOracle>(
    raffle: &mut Raffle,
    oracle: &mut O,
) -> Result<u64, ProgramError> {
    let request_id = oracle.request_randomness(&raffle.oracle)?;
    raffle.pending_request_id = Some(request_id);
    Ok(request_id)
}

/// Missing, stale, replayed and forged ids are all rejected the same way.
pub fn validate_fulfillment(raffle: &Raffle, request_id: u64) -> ProgramResult {
    if raffle.phase != RafflePhase::Calculating || raffle.pending_request_id != Some(request_id) {
        msg!("No pending randomness request with id {}", request_id);
        return Err(RaffleError::UnknownRequest.into());
    }
    Ok(())
}

pub fn clear_request(raffle: &mut Raffle) {
    raffle.pending_request_id = None;
}
