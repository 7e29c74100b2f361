//! Winner selection and prize payout.

use solana_program::{
    account_info::AccountInfo, entrypoint::ProgramResult, msg, pubkey::Pubkey, rent::Rent,
};

use crate::error::RaffleError;

/// Moves the prize to the winner
pub trait PrizeTransfer {
    fn transfer(&mut self, recipient: &Pubkey, amount: u64) -> ProgramResult;
}

/// Map a random value onto the entry list.
///
/// Returns the index and the participant at `random_value % len`.
pub fn select_winner(random_value: u64, participants: &[Pubkey]) -> Option<(usize, Pubkey)> {
    if participants.is_empty() {
        return None;
    }
    let index = (random_value % participants.len() as u64) as usize;
    Some((index, participants[index]))
}

/// Pays out of the raffle account's own lamports.
pub struct LamportPayout<'a, 'b> {
    vault: &'a AccountInfo<'b>,
    recipient: &'a AccountInfo<'b>,
    rent: Rent,
}

impl<'a, 'b> LamportPayout<'a, 'b> {
    pub fn new(vault: &'a AccountInfo<'b>, recipient: &'a AccountInfo<'b>, rent: Rent) -> Self {
        Self {
            vault,
            recipient,
            rent,
        }
    }
}

impl PrizeTransfer for LamportPayout<'_, '_> {
    fn transfer(&mut self, recipient: &Pubkey, amount: u64) -> ProgramResult {
        if self.recipient.key != recipient {
            msg!(
                "Winner account {} does not match drawn participant {}",
                self.recipient.key,
                recipient
            );
            return Err(RaffleError::RecipientMismatch.into());
        }

        if !self.recipient.is_writable || self.recipient.executable {
            msg!("Winner account {} cannot receive lamports", recipient);
            return Err(RaffleError::PayoutFailed.into());
        }

        // The vault must stay rent exempt after paying out
        let reserve = self.rent.minimum_balance(self.vault.data_len());
        let remaining = self
            .vault
            .lamports()
            .checked_sub(amount)
            .filter(|remaining| *remaining >= reserve)
            .ok_or_else(|| {
                msg!(
                    "Vault holds {} lamports, cannot pay {} and keep {} for rent",
                    self.vault.lamports(),
                    amount,
                    reserve
                );
                RaffleError::PayoutFailed
            })?;
        let credited = self
            .recipient
            .lamports()
            .checked_add(amount)
            .ok_or(RaffleError::PayoutFailed)?;

        // An empty or rent-exempt winner may not be left rent-paying
        let data_len = self.recipient.data_len();
        let starts_clean = self.recipient.lamports() == 0
            || self.rent.is_exempt(self.recipient.lamports(), data_len);
        if starts_clean && !self.rent.is_exempt(credited, data_len) {
            msg!(
                "Prize of {} lamports leaves winner {} below the rent-exempt minimum of {}",
                amount,
                recipient,
                self.rent.minimum_balance(data_len)
            );
            return Err(RaffleError::PayoutFailed.into());
        }

        **self.vault.try_borrow_mut_lamports()? = remaining;
        **self.recipient.try_borrow_mut_lamports()? = credited;

        msg!("Paid {} lamports to {}", amount, recipient);
        Ok(())
    }
}
