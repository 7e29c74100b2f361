//! Draw readiness predicate.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::clock::UnixTimestamp;
use std::convert::TryFrom;

use crate::state::{Raffle, RafflePhase};

/// Result of an upkeep check with each condition broken out
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpkeepCheck {
    pub upkeep_needed: bool,
    pub is_open: bool,
    pub time_passed: bool,
    pub has_balance: bool,
    pub has_players: bool,
}

/// A draw may begin only when the raffle is open, the interval has elapsed
/// since the last draw, and there is both a pot and at least one entrant.
pub fn evaluate(raffle: &Raffle, now: UnixTimestamp) -> UpkeepCheck {
    let is_open = raffle.phase == RafflePhase::Open;
    // A clock reading behind the last draw never counts as elapsed
    let time_passed = u64::try_from(now.saturating_sub(raffle.last_draw_timestamp))
        .map(|elapsed| elapsed >= raffle.interval)
        .unwrap_or(false);
    let has_balance = raffle.pot > 0;
    let has_players = !raffle.participants.is_empty();

    UpkeepCheck {
        upkeep_needed: is_open && time_passed && has_balance && has_players,
        is_open,
        time_passed,
        has_balance,
        has_players,
    }
}
