//! The raffle state machine.
//!
//! `Open --perform_upkeep--> Calculating --fulfill_randomness--> Open`, forever.
//! Every operation either applies completely or leaves the raffle as it was.

use solana_program::{
    clock::UnixTimestamp, entrypoint::ProgramResult, msg, program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::coordinator::{self, RandomnessOracle};
use crate::error::RaffleError;
use crate::events::{EventSink, RaffleEvent};
use crate::ledger;
use crate::state::{Raffle, RafflePhase};
use crate::upkeep::{self, UpkeepCheck};
use crate::winner::{self, PrizeTransfer};

pub struct RaffleMachine<'a> {
    raffle: &'a mut Raffle,
}

impl<'a> RaffleMachine<'a> {
    pub fn new(raffle: &'a mut Raffle) -> Self {
        Self { raffle }
    }

    pub fn enter<E: EventSink>(
        &mut self,
        participant: Pubkey,
        amount: u64,
        events: &mut E,
    ) -> ProgramResult {
        ledger::record_entry(self.raffle, participant, amount)?;

        events.emit(RaffleEvent::Entered {
            round: self.raffle.round,
            participant,
            amount,
        });
        Ok(())
    }

    pub fn check_upkeep(&self, now: UnixTimestamp) -> UpkeepCheck {
        upkeep::evaluate(self.raffle, now)
    }

    /// Start a draw if every upkeep condition holds right now.
    pub fn perform_upkeep<O: RandomnessOracle, E: EventSink>(
        &mut self,
        now: UnixTimestamp,
        oracle: &mut O,
        events: &mut E,
    ) -> Result<u64, ProgramError> {
        let check = self.check_upkeep(now);
        if !check.upkeep_needed {
            msg!(
                "Upkeep not needed: open={}, time_passed={}, pot={}, players={}",
                check.is_open,
                check.time_passed,
                self.raffle.pot,
                self.raffle.participants.len()
            );
            return Err(RaffleError::UpkeepNotNeeded.into());
        }

        let request_id = coordinator::open_request(self.raffle, oracle)?;
        self.raffle.phase = RafflePhase::Calculating;

        events.emit(RaffleEvent::DrawStarted {
            round: self.raffle.round,
            request_id,
        });
        Ok(request_id)
    }

    /// Complete the pending draw with the oracle's value.
    ///
    /// Nothing is written unless the payout succeeds; a failed payout keeps
    /// the raffle calculating with the same request pending.
    pub fn fulfill_randomness<T: PrizeTransfer, E: EventSink>(
        &mut self,
        request_id: u64,
        random_value: u64,
        now: UnixTimestamp,
        payout: &mut T,
        events: &mut E,
    ) -> Result<Pubkey, ProgramError> {
        coordinator::validate_fulfillment(self.raffle, request_id)?;

        let (index, winner) = winner::select_winner(random_value, &self.raffle.participants)
            .ok_or(RaffleError::NoParticipants)?;
        let prize = self.raffle.pot;
        let round = self.raffle.round;
        let next_round = round.checked_add(1).ok_or(RaffleError::Overflow)?;
        msg!(
            "Random value {} selects entry {} of {}",
            random_value,
            index,
            self.raffle.participants.len()
        );

        payout.transfer(&winner, prize)?;

        coordinator::clear_request(self.raffle);
        ledger::reset(self.raffle);
        self.raffle.last_winner = Some(winner);
        self.raffle.last_draw_timestamp = now;
        self.raffle.round = next_round;
        self.raffle.phase = RafflePhase::Open;

        events.emit(RaffleEvent::DrawCompleted {
            round,
            request_id,
            winner,
            prize,
        });
        Ok(winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OracleConfig, RaffleConfig};

    const FEE: u64 = 10_000_000;
    const INTERVAL: u64 = 30;
    const START: UnixTimestamp = 1_700_000_000;

    /// Hands out 1, 2, 3, ... like the reference coordinator
    #[derive(Default)]
    struct CountingOracle {
        issued: u64,
    }

    impl RandomnessOracle for CountingOracle {
        fn request_randomness(&mut self, _config: &OracleConfig) -> Result<u64, ProgramError> {
            self.issued += 1;
            Ok(self.issued)
        }
    }

    #[derive(Default)]
    struct RecordingPayout {
        paid: Vec<(Pubkey, u64)>,
        fail: bool,
    }

    impl PrizeTransfer for RecordingPayout {
        fn transfer(&mut self, recipient: &Pubkey, amount: u64) -> ProgramResult {
            if self.fail {
                return Err(RaffleError::PayoutFailed.into());
            }
            self.paid.push((*recipient, amount));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink(Vec<RaffleEvent>);

    impl EventSink for RecordingSink {
        fn emit(&mut self, event: RaffleEvent) {
            self.0.push(event);
        }
    }

    fn raffle() -> Raffle {
        let config = RaffleConfig::new(Pubkey::new_unique(), Pubkey::new_unique())
            .with_entry_fee(FEE)
            .with_interval(INTERVAL);
        Raffle::new(&config, START)
    }

    /// Enters `players`, lets the interval pass and starts the draw
    fn calculating(
        raffle: &mut Raffle,
        players: &[Pubkey],
        oracle: &mut CountingOracle,
    ) -> u64 {
        let mut sink = RecordingSink::default();
        let mut machine = RaffleMachine::new(raffle);
        for player in players {
            machine.enter(*player, FEE, &mut sink).unwrap();
        }
        machine
            .perform_upkeep(START + INTERVAL as i64 + 1, oracle, &mut sink)
            .unwrap()
    }

    #[test]
    fn entry_emits_notification_with_round() {
        let mut raffle = raffle();
        let mut sink = RecordingSink::default();
        let player = Pubkey::new_unique();

        RaffleMachine::new(&mut raffle)
            .enter(player, FEE, &mut sink)
            .unwrap();

        assert_eq!(raffle.participant(0), Some(player));
        assert_eq!(raffle.pot(), FEE);
        assert_eq!(
            sink.0,
            vec![RaffleEvent::Entered {
                round: 1,
                participant: player,
                amount: FEE
            }]
        );
    }

    #[test]
    fn rejected_entry_emits_nothing() {
        let mut raffle = raffle();
        let mut sink = RecordingSink::default();

        let result = RaffleMachine::new(&mut raffle).enter(Pubkey::new_unique(), FEE - 1, &mut sink);

        assert_eq!(result, Err(RaffleError::InsufficientFunds.into()));
        assert!(sink.0.is_empty());
    }

    #[test]
    fn upkeep_without_conditions_changes_nothing() {
        let mut raffle = raffle();
        let before = raffle.clone();
        let mut oracle = CountingOracle::default();
        let mut sink = RecordingSink::default();

        let result = RaffleMachine::new(&mut raffle).perform_upkeep(
            START + 100,
            &mut oracle,
            &mut sink,
        );

        assert_eq!(result, Err(RaffleError::UpkeepNotNeeded.into()));
        assert_eq!(raffle, before);
        assert_eq!(oracle.issued, 0);
        assert!(sink.0.is_empty());
    }

    #[test]
    fn upkeep_before_interval_is_rejected() {
        let mut raffle = raffle();
        let mut oracle = CountingOracle::default();
        let mut sink = RecordingSink::default();
        let mut machine = RaffleMachine::new(&mut raffle);
        machine.enter(Pubkey::new_unique(), FEE, &mut sink).unwrap();

        assert_eq!(
            machine.perform_upkeep(START + 10, &mut oracle, &mut sink),
            Err(RaffleError::UpkeepNotNeeded.into())
        );
        assert_eq!(raffle.phase(), RafflePhase::Open);
    }

    #[test]
    fn upkeep_opens_exactly_one_request() {
        let mut raffle = raffle();
        let mut oracle = CountingOracle::default();
        let request_id = calculating(&mut raffle, &[Pubkey::new_unique()], &mut oracle);

        assert_eq!(request_id, 1);
        assert_eq!(raffle.phase(), RafflePhase::Calculating);
        assert_eq!(raffle.pending_request_id(), Some(1));

        let mut sink = RecordingSink::default();
        let again = RaffleMachine::new(&mut raffle).perform_upkeep(
            START + 1_000,
            &mut oracle,
            &mut sink,
        );
        assert_eq!(again, Err(RaffleError::UpkeepNotNeeded.into()));
        assert_eq!(raffle.pending_request_id(), Some(1));
        assert_eq!(oracle.issued, 1);
    }

    #[test]
    fn entries_blocked_while_calculating() {
        let mut raffle = raffle();
        let mut oracle = CountingOracle::default();
        calculating(&mut raffle, &[Pubkey::new_unique()], &mut oracle);

        let mut sink = RecordingSink::default();
        assert_eq!(
            RaffleMachine::new(&mut raffle).enter(Pubkey::new_unique(), FEE * 5, &mut sink),
            Err(RaffleError::NotOpen.into())
        );
        assert_eq!(raffle.participant_count(), 1);
    }

    #[test]
    fn bogus_fulfillment_is_rejected_without_change() {
        let mut raffle = raffle();
        let mut oracle = CountingOracle::default();
        let request_id = calculating(&mut raffle, &[Pubkey::new_unique()], &mut oracle);
        let before = raffle.clone();
        let mut payout = RecordingPayout::default();
        let mut sink = RecordingSink::default();

        let result = RaffleMachine::new(&mut raffle).fulfill_randomness(
            request_id + 1,
            7,
            START + 40,
            &mut payout,
            &mut sink,
        );

        assert_eq!(result, Err(RaffleError::UnknownRequest.into()));
        assert_eq!(raffle, before);
        assert!(payout.paid.is_empty());
    }

    #[test]
    fn fulfillment_before_any_request_is_unknown() {
        let mut raffle = raffle();
        let mut sink = RecordingSink::default();
        let mut payout = RecordingPayout::default();
        let mut machine = RaffleMachine::new(&mut raffle);
        machine.enter(Pubkey::new_unique(), FEE, &mut sink).unwrap();

        assert_eq!(
            machine.fulfill_randomness(0, 7, START + 40, &mut payout, &mut sink),
            Err(RaffleError::UnknownRequest.into())
        );
    }

    #[test]
    fn single_entrant_draw_pays_and_resets() {
        let mut raffle = raffle();
        let mut oracle = CountingOracle::default();
        let player = Pubkey::new_unique();
        let request_id = calculating(&mut raffle, &[player], &mut oracle);
        let mut payout = RecordingPayout::default();
        let mut sink = RecordingSink::default();
        let now = START + 45;

        let winner = RaffleMachine::new(&mut raffle)
            .fulfill_randomness(request_id, 123_456_789, now, &mut payout, &mut sink)
            .unwrap();

        assert_eq!(winner, player);
        assert_eq!(payout.paid, vec![(player, FEE)]);
        assert_eq!(raffle.phase(), RafflePhase::Open);
        assert_eq!(raffle.pot(), 0);
        assert_eq!(raffle.participant_count(), 0);
        assert_eq!(raffle.last_winner(), Some(player));
        assert_eq!(raffle.pending_request_id(), None);
        assert_eq!(raffle.last_draw_timestamp(), now);
        assert_eq!(raffle.round(), 2);
        assert_eq!(
            sink.0,
            vec![RaffleEvent::DrawCompleted {
                round: 1,
                request_id,
                winner: player,
                prize: FEE
            }]
        );
    }

    #[test]
    fn winner_follows_random_value_modulo_entries() {
        let mut raffle = raffle();
        let mut oracle = CountingOracle::default();
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let c = Pubkey::new_unique();
        let request_id = calculating(&mut raffle, &[a, b, c], &mut oracle);
        let mut payout = RecordingPayout::default();
        let mut sink = RecordingSink::default();

        let winner = RaffleMachine::new(&mut raffle)
            .fulfill_randomness(request_id, 7, START + 45, &mut payout, &mut sink)
            .unwrap();

        assert_eq!(winner, b);
        assert_eq!(payout.paid, vec![(b, FEE * 3)]);
    }

    #[test]
    fn replayed_fulfillment_does_not_pay_twice() {
        let mut raffle = raffle();
        let mut oracle = CountingOracle::default();
        let request_id = calculating(&mut raffle, &[Pubkey::new_unique()], &mut oracle);
        let mut payout = RecordingPayout::default();
        let mut sink = RecordingSink::default();
        let mut machine = RaffleMachine::new(&mut raffle);

        machine
            .fulfill_randomness(request_id, 1, START + 45, &mut payout, &mut sink)
            .unwrap();
        assert_eq!(
            machine.fulfill_randomness(request_id, 1, START + 46, &mut payout, &mut sink),
            Err(RaffleError::UnknownRequest.into())
        );
        assert_eq!(payout.paid.len(), 1);
    }

    #[test]
    fn failed_payout_keeps_draw_pending() {
        let mut raffle = raffle();
        let mut oracle = CountingOracle::default();
        let player = Pubkey::new_unique();
        let request_id = calculating(&mut raffle, &[player], &mut oracle);
        let before = raffle.clone();
        let mut payout = RecordingPayout {
            fail: true,
            ..Default::default()
        };
        let mut sink = RecordingSink::default();

        let result = RaffleMachine::new(&mut raffle).fulfill_randomness(
            request_id,
            0,
            START + 45,
            &mut payout,
            &mut sink,
        );
        assert_eq!(result, Err(RaffleError::PayoutFailed.into()));
        assert_eq!(raffle, before);
        assert!(sink.0.is_empty());

        // Same request can be delivered again once the recipient is fixed
        payout.fail = false;
        let winner = RaffleMachine::new(&mut raffle)
            .fulfill_randomness(request_id, 0, START + 50, &mut payout, &mut sink)
            .unwrap();
        assert_eq!(winner, player);
        assert_eq!(raffle.phase(), RafflePhase::Open);
    }

    #[test]
    fn next_round_uses_fresh_request() {
        let mut raffle = raffle();
        let mut oracle = CountingOracle::default();
        let first = calculating(&mut raffle, &[Pubkey::new_unique()], &mut oracle);
        let mut payout = RecordingPayout::default();
        let mut sink = RecordingSink::default();
        let drawn_at = START + 45;

        let mut machine = RaffleMachine::new(&mut raffle);
        machine
            .fulfill_randomness(first, 3, drawn_at, &mut payout, &mut sink)
            .unwrap();
        machine.enter(Pubkey::new_unique(), FEE, &mut sink).unwrap();

        // Interval is measured from the completed draw
        assert!(!machine.check_upkeep(drawn_at + 10).upkeep_needed);
        let second = machine
            .perform_upkeep(drawn_at + INTERVAL as i64, &mut oracle, &mut sink)
            .unwrap();

        assert_eq!(second, 2);
        assert_eq!(
            sink.0.last(),
            Some(&RaffleEvent::DrawStarted {
                round: 2,
                request_id: 2
            })
        );
        assert_eq!(
            machine.fulfill_randomness(first, 3, drawn_at + 50, &mut payout, &mut sink),
            Err(RaffleError::UnknownRequest.into())
        );
    }
}
