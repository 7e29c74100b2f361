use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction, system_program,
};
use std::convert::TryInto;
use std::mem::size_of;

use crate::config::RaffleConfig;
use crate::error::RaffleError;
use crate::state::Raffle;

#[derive(Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Initialize a raffle account
    ///
    /// Accounts expected:
    /// 0. `[signer]` The creator of the raffle
    /// 1. `[writable]` The raffle account, created beforehand with `Raffle::LEN`
    ///    bytes, owned by this program and rent exempt
    Initialize {
        /// Entry fee, interval and oracle parameters; fixed from here on
        config: RaffleConfig,
    },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The participant paying the entry
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The system program
    EnterRaffle {
        /// Lamports deposited, at least the entry fee
        amount: u64,
    },

    /// Report whether a draw may start, as borsh-encoded `UpkeepCheck` return data
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    CheckUpkeep {},

    /// Start a draw by requesting randomness from the coordinator
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any caller (the automation trigger)
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The coordinator program
    /// 3. `[writable]` The coordinator state account
    PerformUpkeep {},

    /// Deliver randomness for the pending request, pay the winner and reset
    ///
    /// Accounts expected:
    /// 0. `[signer]` The oracle fulfillment authority
    /// 1. `[writable]` The raffle account
    /// 2. `[writable]` The drawn participant
    FulfillRandomness {
        request_id: u64,
        random_value: u64,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(RaffleError::InvalidInstruction)?;

        Ok(match tag {
            0 => {
                let config = rest
                    .get(..RaffleConfig::LEN)
                    .ok_or(RaffleError::InvalidInstruction)?;
                Self::Initialize {
                    config: RaffleConfig::unpack_from_slice(config)?,
                }
            }
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::EnterRaffle { amount }
            }
            2 => Self::CheckUpkeep {},
            3 => Self::PerformUpkeep {},
            4 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (random_value, _) = Self::unpack_u64(rest)?;
                Self::FulfillRandomness {
                    request_id,
                    random_value,
                }
            }
            _ => return Err(RaffleError::InvalidInstruction.into()),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(size_of::<Self>());
        match self {
            Self::Initialize { config } => {
                buf.push(0);
                let mut packed = [0u8; RaffleConfig::LEN];
                config.pack_into_slice(&mut packed);
                buf.extend_from_slice(&packed);
            }
            Self::EnterRaffle { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep {} => buf.push(2),
            Self::PerformUpkeep {} => buf.push(3),
            Self::FulfillRandomness {
                request_id,
                random_value,
            } => {
                buf.push(4);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.extend_from_slice(&random_value.to_le_bytes());
            }
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let value = input
            .get(..8)
            .and_then(|slice| slice.try_into().ok())
            .map(u64::from_le_bytes)
            .ok_or(RaffleError::InvalidInstruction)?;
        Ok((value, &input[8..]))
    }
}

/// Create the system instruction allocating a raffle account owned by the program
pub fn create_raffle_account(
    program_id: &Pubkey,
    payer: &Pubkey,
    raffle_account: &Pubkey,
    rent: &Rent,
) -> Instruction {
    system_instruction::create_account(
        payer,
        raffle_account,
        rent.minimum_balance(Raffle::LEN),
        Raffle::LEN as u64,
        program_id,
    )
}

/// Create initialize instruction
pub fn initialize(
    program_id: &Pubkey,
    creator: &Pubkey,
    raffle_account: &Pubkey,
    config: RaffleConfig,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*creator, true),
            AccountMeta::new(*raffle_account, false),
        ],
        data: RaffleInstruction::Initialize { config }.pack(),
    }
}

/// Create enter_raffle instruction
pub fn enter_raffle(
    program_id: &Pubkey,
    participant: &Pubkey,
    raffle_account: &Pubkey,
    amount: u64,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*participant, true),
            AccountMeta::new(*raffle_account, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: RaffleInstruction::EnterRaffle { amount }.pack(),
    }
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey, raffle_account: &Pubkey) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(*raffle_account, false)],
        data: RaffleInstruction::CheckUpkeep {}.pack(),
    }
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(
    program_id: &Pubkey,
    caller: &Pubkey,
    raffle_account: &Pubkey,
    coordinator_program: &Pubkey,
    coordinator_state: &Pubkey,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*caller, true),
            AccountMeta::new(*raffle_account, false),
            AccountMeta::new_readonly(*coordinator_program, false),
            AccountMeta::new(*coordinator_state, false),
        ],
        data: RaffleInstruction::PerformUpkeep {}.pack(),
    }
}

/// Create fulfill_randomness instruction
pub fn fulfill_randomness(
    program_id: &Pubkey,
    fulfillment_authority: &Pubkey,
    raffle_account: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    random_value: u64,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*fulfillment_authority, true),
            AccountMeta::new(*raffle_account, false),
            AccountMeta::new(*winner, false),
        ],
        data: RaffleInstruction::FulfillRandomness {
            request_id,
            random_value,
        }
        .pack(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_reads_packed_instructions() {
        let config = RaffleConfig::new(Pubkey::new_unique(), Pubkey::new_unique()).with_interval(60);
        for instruction in [
            RaffleInstruction::Initialize { config },
            RaffleInstruction::EnterRaffle { amount: 10_000_000 },
            RaffleInstruction::CheckUpkeep {},
            RaffleInstruction::PerformUpkeep {},
            RaffleInstruction::FulfillRandomness {
                request_id: 3,
                random_value: 7,
            },
        ] {
            assert_eq!(RaffleInstruction::unpack(&instruction.pack()), Ok(instruction));
        }
    }

    #[test]
    fn unpack_rejects_bad_input() {
        let invalid = Err(ProgramError::from(RaffleError::InvalidInstruction));
        assert_eq!(RaffleInstruction::unpack(&[]), invalid);
        assert_eq!(RaffleInstruction::unpack(&[9]), invalid);
        assert_eq!(RaffleInstruction::unpack(&[1, 0, 0]), invalid);
        assert_eq!(RaffleInstruction::unpack(&[0; 20]), invalid);
        assert_eq!(RaffleInstruction::unpack(&[4, 1, 0, 0, 0, 0, 0, 0, 0]), invalid);
    }
}
