//! Participant list and pot of the current round.

use solana_program::{entrypoint::ProgramResult, msg, pubkey::Pubkey};

use crate::error::RaffleError;
use crate::state::{Raffle, RafflePhase, MAX_PARTICIPANTS};

/// Record one entry. A participant may hold several slots.
pub fn record_entry(raffle: &mut Raffle, participant: Pubkey, amount: u64) -> ProgramResult {
    if raffle.phase != RafflePhase::Open {
        msg!("Raffle is not open for entries");
        return Err(RaffleError::NotOpen.into());
    }

    if amount < raffle.entry_fee {
        msg!(
            "Entry of {} lamports is below the entry fee of {} lamports",
            amount,
            raffle.entry_fee
        );
        return Err(RaffleError::InsufficientFunds.into());
    }

    if raffle.participants.len() >= MAX_PARTICIPANTS {
        msg!("All {} participant slots are taken", MAX_PARTICIPANTS);
        return Err(RaffleError::RaffleFull.into());
    }

    let pot = raffle
        .pot
        .checked_add(amount)
        .ok_or(RaffleError::Overflow)?;

    raffle.participants.push(participant);
    raffle.pot = pot;
    Ok(())
}

pub(crate) fn reset(raffle: &mut Raffle) {
    raffle.participants.clear();
    raffle.pot = 0;
}
