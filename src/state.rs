use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};
use std::convert::TryFrom;

use crate::config::{OracleConfig, RaffleConfig, ORACLE_CONFIG_LEN};
use crate::upkeep::{self, UpkeepCheck};

/// Participant slots available in one raffle account
pub const MAX_PARTICIPANTS: usize = 100;

const PARTICIPANTS_LEN: usize = 32 * MAX_PARTICIPANTS;
const HEADER_LEN: usize = 1 + 1 + 8 + 8 + ORACLE_CONFIG_LEN + 8 + 8 + 8 + 1 + 8 + 1 + 32 + 4;

/// Phase of the current round
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RafflePhase {
    /// Accepting entries, waiting for the interval to pass
    Open,
    /// Randomness requested, entries blocked
    Calculating,
}

impl TryFrom<u8> for RafflePhase {
    type Error = &'static str;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(RafflePhase::Open),
            1 => Ok(RafflePhase::Calculating),
            _ => Err("Invalid raffle phase"),
        }
    }
}

impl From<RafflePhase> for u8 {
    fn from(phase: RafflePhase) -> Self {
        match phase {
            RafflePhase::Open => 0,
            RafflePhase::Calculating => 1,
        }
    }
}

/// Raffle account data.
///
/// The account is created once and reset in place after every payout.
/// Its lamports hold the pot on top of the rent-exempt minimum.
#[derive(Clone, Debug, PartialEq)]
pub struct Raffle {
    /// Is the account initialized
    pub is_initialized: bool,
    pub phase: RafflePhase,
    /// Minimum deposit in lamports
    pub entry_fee: u64,
    /// Minimum seconds between draws
    pub interval: u64,
    pub oracle: OracleConfig,
    /// Round number, starting at 1
    pub round: u64,
    /// Lamports collected this round
    pub pot: u64,
    /// Time of the last completed draw, or of initialization
    pub last_draw_timestamp: UnixTimestamp,
    /// Outstanding randomness request, present only while calculating
    pub pending_request_id: Option<u64>,
    pub last_winner: Option<Pubkey>,
    /// Entries in insertion order; one slot per entry
    pub participants: Vec<Pubkey>,
}

impl Raffle {
    pub fn new(config: &RaffleConfig, now: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            phase: RafflePhase::Open,
            entry_fee: config.entry_fee,
            interval: config.interval,
            oracle: config.oracle,
            round: 1,
            pot: 0,
            last_draw_timestamp: now,
            pending_request_id: None,
            last_winner: None,
            participants: Vec::new(),
        }
    }

    pub fn phase(&self) -> RafflePhase {
        self.phase
    }

    pub fn entry_fee(&self) -> u64 {
        self.entry_fee
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn participant(&self, index: usize) -> Option<Pubkey> {
        self.participants.get(index).copied()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn pot(&self) -> u64 {
        self.pot
    }

    pub fn last_winner(&self) -> Option<Pubkey> {
        self.last_winner
    }

    pub fn last_draw_timestamp(&self) -> UnixTimestamp {
        self.last_draw_timestamp
    }

    pub fn pending_request_id(&self) -> Option<u64> {
        self.pending_request_id
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn request_confirmations(&self) -> u16 {
        self.oracle.request_confirmations
    }

    pub fn num_words(&self) -> u32 {
        self.oracle.num_words
    }

    /// Off-chain view of the upkeep predicate
    pub fn check_upkeep(&self, now: UnixTimestamp) -> UpkeepCheck {
        upkeep::evaluate(self, now)
    }
}

impl Sealed for Raffle {}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Raffle {
    const LEN: usize = HEADER_LEN + PARTICIPANTS_LEN;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Raffle::LEN];
        let (
            is_initialized,
            phase,
            entry_fee,
            interval,
            oracle,
            round,
            pot,
            last_draw_timestamp,
            pending_flag,
            pending_request_id,
            winner_flag,
            last_winner,
            participant_count,
            participants,
        ) = array_refs![
            src, 1, 1, 8, 8, ORACLE_CONFIG_LEN, 8, 8, 8, 1, 8, 1, 32, 4, PARTICIPANTS_LEN
        ];

        let phase = RafflePhase::try_from(phase[0]).map_err(|_| ProgramError::InvalidAccountData)?;

        let participant_count = u32::from_le_bytes(*participant_count) as usize;
        if participant_count > MAX_PARTICIPANTS {
            return Err(ProgramError::InvalidAccountData);
        }
        let participants = participants
            .chunks_exact(32)
            .take(participant_count)
            .map(|key| Pubkey::new_from_array(*array_ref![key, 0, 32]))
            .collect();

        Ok(Raffle {
            is_initialized: is_initialized[0] != 0,
            phase,
            entry_fee: u64::from_le_bytes(*entry_fee),
            interval: u64::from_le_bytes(*interval),
            oracle: OracleConfig::unpack_from_slice(oracle)?,
            round: u64::from_le_bytes(*round),
            pot: u64::from_le_bytes(*pot),
            last_draw_timestamp: UnixTimestamp::from_le_bytes(*last_draw_timestamp),
            pending_request_id: match pending_flag[0] {
                0 => None,
                _ => Some(u64::from_le_bytes(*pending_request_id)),
            },
            last_winner: match winner_flag[0] {
                0 => None,
                _ => Some(Pubkey::new_from_array(*last_winner)),
            },
            participants,
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Raffle::LEN];
        let (
            is_initialized_dst,
            phase_dst,
            entry_fee_dst,
            interval_dst,
            oracle_dst,
            round_dst,
            pot_dst,
            last_draw_timestamp_dst,
            pending_flag_dst,
            pending_request_id_dst,
            winner_flag_dst,
            last_winner_dst,
            participant_count_dst,
            participants_dst,
        ) = mut_array_refs![
            dst, 1, 1, 8, 8, ORACLE_CONFIG_LEN, 8, 8, 8, 1, 8, 1, 32, 4, PARTICIPANTS_LEN
        ];

        is_initialized_dst[0] = self.is_initialized as u8;
        phase_dst[0] = self.phase.into();
        *entry_fee_dst = self.entry_fee.to_le_bytes();
        *interval_dst = self.interval.to_le_bytes();
        self.oracle.pack_into_slice(oracle_dst);
        *round_dst = self.round.to_le_bytes();
        *pot_dst = self.pot.to_le_bytes();
        *last_draw_timestamp_dst = self.last_draw_timestamp.to_le_bytes();

        pending_flag_dst[0] = self.pending_request_id.is_some() as u8;
        *pending_request_id_dst = self.pending_request_id.unwrap_or(0).to_le_bytes();

        winner_flag_dst[0] = self.last_winner.is_some() as u8;
        last_winner_dst.copy_from_slice(self.last_winner.unwrap_or_default().as_ref());

        // Ledger never exceeds MAX_PARTICIPANTS; extra slots are zeroed
        *participant_count_dst = (self.participants.len() as u32).to_le_bytes();
        participants_dst.fill(0);
        for (slot, key) in participants_dst.chunks_exact_mut(32).zip(&self.participants) {
            slot.copy_from_slice(key.as_ref());
        }
    }
}
