//! Match session state machine
//!
//! A [`Match`] owns both participants, the turn indicator, each player's
//! hand and life total. It is always accessed through its own lock (see
//! [`crate::lobby::Lobby`]), so every operation here takes `&mut self` and
//! never awaits.
//!
//! States are `AwaitingAction` while the match is live and `Finished` once a
//! life total reaches zero or a participant leaves. Every operation on a
//! finished match fails with [`GameError::NotInMatch`].

use crate::catalog::Card;
use crate::error::GameError;
use crate::player::{Player, PlayerId};
use shared::CardId;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "match-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingAction,
    Finished,
}

/// One of the two places at the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    pub fn other(self) -> Seat {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }

    fn index(self) -> usize {
        match self {
            Seat::First => 0,
            Seat::Second => 1,
        }
    }
}

/// Cards a player may currently play, in the order they were received
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn contains(&self, id: CardId) -> bool {
        self.cards.iter().any(|card| card.id == id)
    }

    /// Removes the first card with this id
    pub fn remove(&mut self, id: CardId) -> Result<Card, GameError> {
        let pos = self
            .cards
            .iter()
            .position(|card| card.id == id)
            .ok_or(GameError::CardNotInHand(id))?;
        Ok(self.cards.remove(pos))
    }

    pub fn extend(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.cards.extend(cards);
    }

    pub fn describe(&self) -> String {
        let mut text = String::from("Your hand:");
        if self.cards.is_empty() {
            text.push_str("\n  (empty)");
        }
        for card in &self.cards {
            text.push_str(&format!("\n  {}", card));
        }
        text
    }
}

/// Result of a successful card play
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayOutcome {
    pub card: Card,
    pub damage: u32,
    pub attacker_life: u32,
    pub defender_life: u32,
    /// Set when this play ended the match
    pub winner: Option<PlayerId>,
}

pub struct Match {
    id: MatchId,
    players: [Arc<Player>; 2],
    hands: [Hand; 2],
    life: [u32; 2],
    turn: Seat,
    phase: Phase,
    created_at: Instant,
}

impl Match {
    /// Starts a match with `first` holding the turn
    pub fn new(
        id: MatchId,
        first: Arc<Player>,
        second: Arc<Player>,
        hands: [Vec<Card>; 2],
        starting_life: u32,
    ) -> Self {
        let [first_hand, second_hand] = hands;
        Self {
            id,
            players: [first, second],
            hands: [Hand::new(first_hand), Hand::new(second_hand)],
            life: [starting_life; 2],
            turn: Seat::First,
            phase: Phase::AwaitingAction,
            created_at: Instant::now(),
        }
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn players(&self) -> &[Arc<Player>; 2] {
        &self.players
    }

    pub fn player(&self, seat: Seat) -> &Arc<Player> {
        &self.players[seat.index()]
    }

    pub fn turn(&self) -> Seat {
        self.turn
    }

    pub fn turn_holder(&self) -> &Arc<Player> {
        self.player(self.turn)
    }

    /// Seat of a participant, or `None` for anyone else
    pub fn seat_of(&self, player: PlayerId) -> Option<Seat> {
        if self.players[0].id == player {
            Some(Seat::First)
        } else if self.players[1].id == player {
            Some(Seat::Second)
        } else {
            None
        }
    }

    pub fn opponent_of(&self, player: PlayerId) -> Option<&Arc<Player>> {
        self.seat_of(player).map(|seat| self.player(seat.other()))
    }

    pub fn life_of(&self, player: PlayerId) -> Option<u32> {
        self.seat_of(player).map(|seat| self.life[seat.index()])
    }

    pub fn hand_of(&self, player: PlayerId) -> Option<&Hand> {
        self.seat_of(player).map(|seat| &self.hands[seat.index()])
    }

    /// Seat of a participant of a live match
    fn active_seat(&self, player: PlayerId) -> Result<Seat, GameError> {
        if self.is_finished() {
            return Err(GameError::NotInMatch);
        }
        self.seat_of(player).ok_or(GameError::NotInMatch)
    }

    /// Fails with `NotInMatch` if the match is over or `player` is not in it
    pub fn ensure_active(&self, player: PlayerId) -> Result<(), GameError> {
        self.active_seat(player).map(|_| ())
    }

    /// Plays a card from the acting player's hand against the opponent.
    /// The turn does not advance; only [`Match::end_turn`] does that.
    pub fn play_card(&mut self, player: PlayerId, card_id: CardId) -> Result<PlayOutcome, GameError> {
        let seat = self.active_seat(player)?;
        if seat != self.turn {
            return Err(GameError::NotYourTurn);
        }

        let card = self.hands[seat.index()].remove(card_id)?;
        let damage = card.rarity.damage();

        let defender = seat.other().index();
        self.life[defender] = self.life[defender].saturating_sub(damage);

        let winner = if self.life[defender] == 0 {
            self.phase = Phase::Finished;
            Some(player)
        } else {
            None
        };

        Ok(PlayOutcome {
            card,
            damage,
            attacker_life: self.life[seat.index()],
            defender_life: self.life[defender],
            winner,
        })
    }

    /// Passes the turn to the other player; only the turn holder may do so
    pub fn end_turn(&mut self, player: PlayerId) -> Result<&Arc<Player>, GameError> {
        let seat = self.active_seat(player)?;
        if seat != self.turn {
            return Err(GameError::NotYourTurn);
        }
        self.turn = self.turn.other();
        Ok(self.turn_holder())
    }

    /// Appends booster cards to a participant's hand, regardless of turn
    pub fn receive_cards(&mut self, player: PlayerId, cards: Vec<Card>) -> Result<(), GameError> {
        let seat = self.active_seat(player)?;
        self.hands[seat.index()].extend(cards);
        Ok(())
    }

    /// Ends the match because `departed` left. Returns the surviving player
    /// the first time, `None` if the match was already finished.
    pub fn abandon(&mut self, departed: PlayerId) -> Option<Arc<Player>> {
        if self.is_finished() {
            return None;
        }
        let survivor = self.opponent_of(departed).cloned()?;
        self.phase = Phase::Finished;
        Some(survivor)
    }

    /// Delivers a state-changing line to both participants
    pub fn announce(&self, line: &str) {
        for player in &self.players {
            player.outbound.deliver(line);
        }
    }

    pub fn describe_play(&self, attacker: &Player, outcome: &PlayOutcome) -> String {
        let defender = self
            .opponent_of(attacker.id)
            .map(|p| p.name.as_str())
            .unwrap_or("Opponent");
        format!(
            "{} played {} dealing {} damage!\n{} life: {} | {} life: {}",
            attacker.name,
            outcome.card,
            outcome.damage,
            attacker.name,
            outcome.attacker_life,
            defender,
            outcome.defender_life,
        )
    }
}

impl fmt::Debug for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("id", &self.id)
            .field("players", &[self.players[0].id, self.players[1].id])
            .field("life", &self.life)
            .field("turn", &self.turn)
            .field("phase", &self.phase)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Rarity};
    use crate::player::{Outbound, OutboundReceiver};
    use tokio_test::{assert_err, assert_ok};

    fn player(id: u64, name: &str) -> (Arc<Player>, OutboundReceiver) {
        let (outbound, receiver) = Outbound::channel(16);
        (Arc::new(Player::new(PlayerId(id), name, outbound)), receiver)
    }

    fn cards(ids: &[CardId]) -> Vec<Card> {
        let catalog = Catalog::standard();
        ids.iter().map(|id| catalog.get(*id).unwrap().clone()).collect()
    }

    fn alice_vs_bob() -> (Match, OutboundReceiver, OutboundReceiver) {
        let (alice, alice_rx) = player(1, "Alice");
        let (bob, bob_rx) = player(2, "Bob");
        let game = Match::new(
            MatchId(1),
            alice,
            bob,
            [cards(&[1, 6, 11, 12, 21]), cards(&[2, 7, 13, 14, 22])],
            100,
        );
        (game, alice_rx, bob_rx)
    }

    const ALICE: PlayerId = PlayerId(1);
    const BOB: PlayerId = PlayerId(2);

    #[test]
    fn test_new_match() {
        let (game, _, _) = alice_vs_bob();

        assert_eq!(game.phase(), Phase::AwaitingAction);
        assert_eq!(game.turn_holder().id, ALICE);
        assert_eq!(game.life_of(ALICE), Some(100));
        assert_eq!(game.life_of(BOB), Some(100));
        assert_eq!(game.hand_of(ALICE).unwrap().len(), 5);
        assert_eq!(game.hand_of(BOB).unwrap().len(), 5);
        assert_eq!(game.opponent_of(ALICE).unwrap().id, BOB);
        assert_eq!(game.life_of(PlayerId(99)), None);
        assert_eq!(game.id().to_string(), "match-1");
    }

    #[test]
    fn test_rare_card_deals_thirty_and_keeps_turn() {
        let (mut game, _, _) = alice_vs_bob();

        let outcome = assert_ok!(game.play_card(ALICE, 1));
        assert_eq!(outcome.card.rarity, Rarity::Rare);
        assert_eq!(outcome.damage, 30);
        assert_eq!(outcome.defender_life, 70);
        assert_eq!(outcome.attacker_life, 100);
        assert_eq!(outcome.winner, None);

        assert_eq!(game.life_of(BOB), Some(70));
        assert_eq!(game.turn_holder().id, ALICE);
        assert!(!game.hand_of(ALICE).unwrap().contains(1));
    }

    #[test]
    fn test_play_out_of_turn() {
        let (mut game, _, _) = alice_vs_bob();

        assert_eq!(game.play_card(BOB, 2), Err(GameError::NotYourTurn));
        assert_eq!(game.life_of(ALICE), Some(100));
        assert_eq!(game.hand_of(BOB).unwrap().len(), 5);
    }

    #[test]
    fn test_card_not_in_hand_changes_nothing() {
        let (mut game, _, _) = alice_vs_bob();
        let hand_before = game.hand_of(ALICE).unwrap().clone();

        assert_eq!(game.play_card(ALICE, 2), Err(GameError::CardNotInHand(2)));
        assert_eq!(game.play_card(ALICE, 999), Err(GameError::CardNotInHand(999)));

        assert_eq!(game.hand_of(ALICE).unwrap(), &hand_before);
        assert_eq!(game.life_of(ALICE), Some(100));
        assert_eq!(game.life_of(BOB), Some(100));
    }

    #[test]
    fn test_duplicate_cards_are_removed_one_at_a_time() {
        let (alice, _a) = player(1, "Alice");
        let (bob, _b) = player(2, "Bob");
        let mut game = Match::new(MatchId(2), alice, bob, [cards(&[11, 11]), cards(&[12])], 100);

        assert_ok!(game.play_card(ALICE, 11));
        assert!(game.hand_of(ALICE).unwrap().contains(11));
        assert_ok!(game.play_card(ALICE, 11));
        assert_eq!(game.play_card(ALICE, 11), Err(GameError::CardNotInHand(11)));
    }

    #[test]
    fn test_end_turn_toggles() {
        let (mut game, _, _) = alice_vs_bob();

        assert_eq!(game.end_turn(BOB).map(|p| p.id), Err(GameError::NotYourTurn));
        assert_eq!(assert_ok!(game.end_turn(ALICE)).id, BOB);
        assert_eq!(game.turn(), Seat::Second);
        assert_eq!(assert_ok!(game.end_turn(BOB)).id, ALICE);
        assert_eq!(game.turn(), Seat::First);
    }

    #[test]
    fn test_life_is_clamped_and_match_finishes_once() {
        let (alice, _a) = player(1, "Alice");
        let (bob, _b) = player(2, "Bob");
        let mut game = Match::new(MatchId(3), alice, bob, [cards(&[21, 22, 1]), cards(&[11])], 50);

        let first = assert_ok!(game.play_card(ALICE, 21));
        assert_eq!(first.defender_life, 10);
        assert_eq!(first.winner, None);

        let finishing = assert_ok!(game.play_card(ALICE, 22));
        assert_eq!(finishing.defender_life, 0);
        assert_eq!(finishing.winner, Some(ALICE));
        assert!(game.is_finished());

        assert_eq!(game.play_card(ALICE, 1), Err(GameError::NotInMatch));
        assert_err!(game.end_turn(ALICE).map(|_| ()));
        assert_eq!(game.receive_cards(BOB, cards(&[1])), Err(GameError::NotInMatch));
        assert_eq!(game.life_of(BOB), Some(0));
    }

    #[test]
    fn test_receive_cards_ignores_turn() {
        let (mut game, _, _) = alice_vs_bob();

        assert_ok!(game.receive_cards(BOB, cards(&[3, 8, 15])));
        assert_eq!(game.hand_of(BOB).unwrap().len(), 8);
        assert_eq!(
            game.receive_cards(PlayerId(42), cards(&[3])),
            Err(GameError::NotInMatch)
        );
    }

    #[test]
    fn test_abandon_is_idempotent() {
        let (mut game, _, _) = alice_vs_bob();

        let survivor = game.abandon(BOB).unwrap();
        assert_eq!(survivor.id, ALICE);
        assert!(game.is_finished());
        assert!(game.abandon(BOB).is_none());
        assert!(game.abandon(ALICE).is_none());
    }

    #[test]
    fn test_announce_reaches_both_players() {
        let (game, mut alice_rx, mut bob_rx) = alice_vs_bob();

        game.announce("Turn changed");

        assert_eq!(alice_rx.drain(), vec!["Turn changed"]);
        assert_eq!(bob_rx.drain(), vec!["Turn changed"]);
    }

    #[test]
    fn test_describe_play() {
        let (mut game, _, _) = alice_vs_bob();
        let outcome = game.play_card(ALICE, 6).unwrap();
        let alice = Arc::clone(game.player(Seat::First));

        let text = game.describe_play(&alice, &outcome);
        assert!(text.starts_with("Alice played [6] Card 6 (Uncommon) dealing 20 damage!"));
        assert!(text.contains("Bob life: 80"));
    }

    #[test]
    fn test_hand_describe() {
        let hand = Hand::new(cards(&[1, 11]));
        assert_eq!(
            hand.describe(),
            "Your hand:\n  [1] Card 1 (Rare)\n  [11] Card 11 (Common)"
        );
        assert_eq!(Hand::default().describe(), "Your hand:\n  (empty)");
    }
}
