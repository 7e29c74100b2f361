//! Notifications for off-chain observers.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    Entered {
        round: u64,
        participant: Pubkey,
        amount: u64,
    },
    DrawStarted {
        round: u64,
        request_id: u64,
    },
    DrawCompleted {
        round: u64,
        request_id: u64,
        winner: Pubkey,
        prize: u64,
    },
}

/// Best-effort delivery; emitting never fails the operation that triggered it
pub trait EventSink {
    fn emit(&mut self, event: RaffleEvent);
}

/// Writes events to the program log, readable and as borsh `Program data:` records
pub struct ProgramLogSink;

impl EventSink for ProgramLogSink {
    fn emit(&mut self, event: RaffleEvent) {
        match &event {
            RaffleEvent::Entered {
                round,
                participant,
                amount,
            } => msg!(
                "Raffle entered: round={}, participant={}, amount={}",
                round,
                participant,
                amount
            ),
            RaffleEvent::DrawStarted { round, request_id } => {
                msg!("Draw started: round={}, request_id={}", round, request_id)
            }
            RaffleEvent::DrawCompleted {
                round,
                request_id,
                winner,
                prize,
            } => msg!(
                "Draw completed: round={}, request_id={}, winner={}, prize={}",
                round,
                request_id,
                winner,
                prize
            ),
        }

        match event.try_to_vec() {
            Ok(data) => sol_log_data(&[&data]),
            Err(err) => msg!("Could not encode event: {}", err),
        }
    }
}
