use solana_program::{
    decode_error::DecodeError, msg, program_error::PrintProgramError, program_error::ProgramError,
};
use thiserror::Error;

/// Errors that may be returned by the raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstruction,

    #[error("Raffle already initialized")]
    AlreadyInitialized,

    #[error("Raffle not initialized")]
    NotInitialized,

    /// Entry fee, word count or oracle keys rejected at construction
    #[error("Invalid raffle configuration")]
    InvalidConfig,

    /// Entry amount below the configured entry fee
    #[error("Entry amount is below the entry fee")]
    InsufficientFunds,

    /// Entries are only accepted while the raffle is open
    #[error("Raffle is not open")]
    NotOpen,

    #[error("Raffle has no free participant slots")]
    RaffleFull,

    /// Upkeep was performed while one of its conditions did not hold
    #[error("Upkeep not needed")]
    UpkeepNotNeeded,

    /// Fulfillment does not match the pending randomness request
    #[error("Unknown randomness request")]
    UnknownRequest,

    #[error("Fulfillment not signed by the oracle authority")]
    UnauthorizedFulfillment,

    #[error("Coordinator account does not match the raffle configuration")]
    InvalidCoordinator,

    #[error("Coordinator returned no request id")]
    OracleRequestFailed,

    #[error("No participants to draw from")]
    NoParticipants,

    /// Winner account passed in does not belong to the drawn participant
    #[error("Winner account does not match the drawn participant")]
    RecipientMismatch,

    /// Prize could not be moved; the draw stays pending
    #[error("Prize payout failed")]
    PayoutFailed,

    #[error("Arithmetic overflow")]
    Overflow,
}

impl RaffleError {
    const ALL: [RaffleError; 16] = [
        RaffleError::InvalidInstruction,
        RaffleError::AlreadyInitialized,
        RaffleError::NotInitialized,
        RaffleError::InvalidConfig,
        RaffleError::InsufficientFunds,
        RaffleError::NotOpen,
        RaffleError::RaffleFull,
        RaffleError::UpkeepNotNeeded,
        RaffleError::UnknownRequest,
        RaffleError::UnauthorizedFulfillment,
        RaffleError::InvalidCoordinator,
        RaffleError::OracleRequestFailed,
        RaffleError::NoParticipants,
        RaffleError::RecipientMismatch,
        RaffleError::PayoutFailed,
        RaffleError::Overflow,
    ];

    /// Maps a `ProgramError::Custom` code back to the raffle error it encodes
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }
}

impl num_traits::FromPrimitive for RaffleError {
    fn from_i64(n: i64) -> Option<Self> {
        u32::try_from(n).ok().and_then(Self::from_code)
    }

    fn from_u64(n: u64) -> Option<Self> {
        u32::try_from(n).ok().and_then(Self::from_code)
    }
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
