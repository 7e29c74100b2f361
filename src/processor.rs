use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, set_return_data},
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack},
    pubkey::Pubkey,
    system_instruction,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

use crate::config::RaffleConfig;
use crate::error::RaffleError;
use crate::events::ProgramLogSink;
use crate::instruction::RaffleInstruction;
use crate::machine::RaffleMachine;
use crate::oracle::CpiOracle;
use crate::state::Raffle;
use crate::winner::LamportPayout;

pub struct Processor;

impl Processor {
    /// Process an instruction for the raffle program
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::Initialize { config } => {
                msg!("Instruction: Initialize");
                Self::process_initialize(program_id, accounts, config)
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(program_id, accounts, amount)
            }
            RaffleInstruction::CheckUpkeep {} => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(program_id, accounts)
            }
            RaffleInstruction::PerformUpkeep {} => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(program_id, accounts)
            }
            RaffleInstruction::FulfillRandomness {
                request_id,
                random_value,
            } => {
                msg!("Instruction: Fulfill Randomness");
                Self::process_fulfill_randomness(program_id, accounts, request_id, random_value)
            }
        }
    }

    /// Process the Initialize instruction
    fn process_initialize(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        config: RaffleConfig,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let creator_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;

        // Verify the creator signed the transaction
        if !creator_info.is_signer {
            msg!("Creator must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        if raffle_info.data_len() != Raffle::LEN {
            msg!("Raffle account must hold {} bytes", Raffle::LEN);
            return Err(ProgramError::InvalidAccountData);
        }

        if !Rent::get()?.is_exempt(raffle_info.lamports(), Raffle::LEN) {
            msg!("Raffle account is not rent exempt");
            return Err(ProgramError::AccountNotRentExempt);
        }

        // Refuse to overwrite a live raffle
        let existing = Raffle::unpack_unchecked(&raffle_info.data.borrow())?;
        if existing.is_initialized() {
            msg!("Raffle account is already initialized");
            return Err(RaffleError::AlreadyInitialized.into());
        }

        config.validate()?;

        let now = Clock::get()?.unix_timestamp;
        Raffle::pack(Raffle::new(&config, now), &mut raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle initialized: EntryFee={}, Interval={}s, Coordinator={}",
            config.entry_fee,
            config.interval,
            config.oracle.coordinator
        );
        Ok(())
    }

    /// Process the EnterRaffle instruction
    fn process_enter_raffle(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        amount: u64,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let participant_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        // Verify the participant signed the transaction
        if !participant_info.is_signer {
            msg!("Participant must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(program_id, raffle_info)?;
        RaffleMachine::new(&mut raffle).enter(*participant_info.key, amount, &mut ProgramLogSink)?;

        // Move the entry into the raffle account
        invoke(
            &system_instruction::transfer(participant_info.key, raffle_info.key, amount),
            &[
                participant_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;
        Ok(())
    }

    /// Process the CheckUpkeep instruction
    fn process_check_upkeep(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;

        let raffle = Self::load_raffle(program_id, raffle_info)?;
        let check = raffle.check_upkeep(Clock::get()?.unix_timestamp);

        msg!(
            "Upkeep needed={}: open={}, time_passed={}, has_balance={}, has_players={}",
            check.upkeep_needed,
            check.is_open,
            check.time_passed,
            check.has_balance,
            check.has_players
        );
        let data = check
            .try_to_vec()
            .map_err(|_| ProgramError::InvalidAccountData)?;
        set_return_data(&data);
        Ok(())
    }

    /// Process the PerformUpkeep instruction
    fn process_perform_upkeep(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_program_info = next_account_info(account_info_iter)?;
        let coordinator_state_info = next_account_info(account_info_iter)?;

        // Anyone may trigger upkeep; the upkeep conditions are the only gate
        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(program_id, raffle_info)?;
        let now = Clock::get()?.unix_timestamp;
        let mut oracle = CpiOracle::new(coordinator_program_info, coordinator_state_info, raffle_info);

        let request_id =
            RaffleMachine::new(&mut raffle).perform_upkeep(now, &mut oracle, &mut ProgramLogSink)?;

        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;
        msg!("Randomness requested for raffle {}: request {}", raffle_info.key, request_id);
        Ok(())
    }

    /// Process the FulfillRandomness instruction
    fn process_fulfill_randomness(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        request_id: u64,
        random_value: u64,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        let mut raffle = Self::load_raffle(program_id, raffle_info)?;

        // Only the oracle's fulfillment authority may deliver randomness
        if !authority_info.is_signer || *authority_info.key != raffle.oracle.fulfillment_authority {
            msg!("Fulfillment must be signed by {}", raffle.oracle.fulfillment_authority);
            return Err(RaffleError::UnauthorizedFulfillment.into());
        }

        let now = Clock::get()?.unix_timestamp;
        let mut payout = LamportPayout::new(raffle_info, winner_info, Rent::get()?);

        let winner = RaffleMachine::new(&mut raffle).fulfill_randomness(
            request_id,
            random_value,
            now,
            &mut payout,
            &mut ProgramLogSink,
        )?;

        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;
        msg!("Raffle completed with oracle randomness! Winner: {}", winner);
        Ok(())
    }

    /// Load an initialized raffle owned by this program
    fn load_raffle(program_id: &Pubkey, raffle_info: &AccountInfo) -> Result<Raffle, ProgramError> {
        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by the program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let raffle = Raffle::unpack_unchecked(&raffle_info.data.borrow())?;
        if !raffle.is_initialized() {
            return Err(RaffleError::NotInitialized.into());
        }
        Ok(raffle)
    }
}
