use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, sync::Arc};
use thiserror::Error;

use super::constants;
use crate::net::messages::{MessageSender, ServerMessage};

use super::states::Stage;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    #[serde(rename = "h")]
    Heart,
    #[serde(rename = "d")]
    Diamond,
    #[serde(rename = "c")]
    Club,
    #[serde(rename = "s")]
    Spade,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Heart, Suit::Diamond, Suit::Club, Suit::Spade];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Heart => "♥",
            Self::Diamond => "♦",
            Self::Club => "♣",
            Self::Spade => "♠",
        };
        write!(f, "{repr}")
    }
}

/// Card values run from 2 up to 14 (ace). Aces only count as 1 inside an
/// A-2-3-4-5 straight, which the evaluator handles.
pub type Value = u8;

pub const ACE: Value = 14;
pub const KING: Value = 13;
pub const QUEEN: Value = 12;
pub const JACK: Value = 11;
pub const TEN: Value = 10;

const VALUE_CHARS: &[u8; 13] = b"23456789TJQKA";

/// Character used on the wire and in logs for a card value.
#[must_use]
pub fn value_char(value: Value) -> char {
    VALUE_CHARS[usize::from(value.clamp(2, ACE) - 2)] as char
}

fn value_from_char(c: char) -> Option<Value> {
    VALUE_CHARS
        .iter()
        .position(|&v| v as char == c.to_ascii_uppercase())
        .map(|idx| idx as Value + 2)
}

/// A card is a value (2..=14) and a suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(into = "CardRepr", try_from = "CardRepr")]
pub struct Card(pub Value, pub Suit);

/// Wire form of a card: `{"rank": "A", "suit": "s"}`.
#[derive(Clone, Debug, Deserialize, Serialize)]
struct CardRepr {
    rank: char,
    suit: Suit,
}

impl From<Card> for CardRepr {
    fn from(card: Card) -> Self {
        Self {
            rank: value_char(card.0),
            suit: card.1,
        }
    }
}

impl TryFrom<CardRepr> for Card {
    type Error = String;

    fn try_from(repr: CardRepr) -> Result<Self, Self::Error> {
        value_from_char(repr.rank)
            .map(|value| Card(value, repr.suit))
            .ok_or_else(|| format!("unknown card rank '{}'", repr.rank))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", value_char(self.0), self.1)
    }
}

/// Hand categories, weakest first.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "High Card",
            Self::OnePair => "One Pair",
            Self::TwoPair => "Two Pair",
            Self::ThreeOfAKind => "Three of a Kind",
            Self::Straight => "Straight",
            Self::Flush => "Flush",
            Self::FullHouse => "Full House",
            Self::FourOfAKind => "Four of a Kind",
            Self::StraightFlush => "Straight Flush",
        };
        write!(f, "{repr}")
    }
}

#[derive(Debug, Eq, Error, PartialEq)]
pub enum DeckError {
    #[error("deck exhausted")]
    EmptyDeck,
}

/// A 52-card deck. Cards are drawn from the back.
#[derive(Debug)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Put all 52 cards back in their fixed, unshuffled order.
    pub fn reset(&mut self) {
        self.cards.clear();
        for suit in Suit::ALL {
            for value in 2..=ACE {
                self.cards.push(Card(value, suit));
            }
        }
    }

    /// Fisher-Yates: walk from the last index down to 1 and swap each slot
    /// with a uniformly chosen slot at or below it.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for i in (1..self.cards.len()).rev() {
            let j = rng.random_range(0..=i);
            self.cards.swap(i, j);
        }
    }

    pub fn draw(&mut self) -> Result<Card, DeckError> {
        self.cards.pop().ok_or(DeckError::EmptyDeck)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl Default for Deck {
    fn default() -> Self {
        let mut deck = Self {
            cards: Vec::with_capacity(52),
        };
        deck.reset();
        deck
    }
}

/// Whole chips. Balances, bets and pots never go negative.
pub type Chips = u32;

/// Stable identity of a participant, as resolved from their credential.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(s: &str) -> Self {
        let mut id = s.trim().to_string();
        if let Some((idx, _)) = id.char_indices().nth(constants::MAX_USER_INPUT_LENGTH * 2) {
            id.truncate(idx);
        }
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Tables are addressed by an opaque string handed out by the lobby.
pub type TableId = String;

/// Clip a display name to a printable, bounded form. Empty names fall back
/// to "User".
#[must_use]
pub fn display_name(raw: &str) -> String {
    let name: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(constants::MAX_USER_INPUT_LENGTH)
        .collect();
    if name.is_empty() {
        "User".to_string()
    } else {
        name
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Blinds {
    pub small: Chips,
    pub big: Chips,
}

impl Blinds {
    /// The big blind is always twice the small blind.
    #[must_use]
    pub fn from_small(small: Chips) -> Self {
        Self {
            small,
            big: small.saturating_mul(2),
        }
    }
}

impl fmt::Display for Blinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.small, self.big)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Action {
    Fold,
    /// Match the current bet, or check when nothing is owed.
    CallCheck,
    /// Raise the round contribution to this total (not a delta).
    RaiseTo(Chips),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Fold => write!(f, "folds"),
            Self::CallCheck => write!(f, "calls/checks"),
            Self::RaiseTo(amount) => write!(f, "raises to {amount}"),
        }
    }
}

/// A seated player. Only the owning table mutates it.
#[derive(Debug)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub balance: Chips,
    pub cards: Vec<Card>,
    /// Chips put in during the current betting round.
    pub current_bet: Chips,
    /// Chips put in during the whole hand, used to refund an aborted hand.
    pub hand_contribution: Chips,
    /// Still contesting the pot.
    pub is_active: bool,
    /// Dealt out of the current hand because the seat had no chips.
    pub sitting_out: bool,
    /// Acted since the last raise in this round.
    pub has_acted: bool,
    connection: Option<MessageSender>,
}

impl Player {
    #[must_use]
    pub fn new(
        id: PlayerId,
        name: String,
        balance: Chips,
        connection: Option<MessageSender>,
    ) -> Self {
        Self {
            id,
            name,
            balance,
            cards: Vec::with_capacity(2),
            current_bet: 0,
            hand_contribution: 0,
            is_active: false,
            sitting_out: false,
            has_acted: false,
            connection,
        }
    }

    /// Clear everything tied to the previous hand.
    pub fn reset(&mut self) {
        self.cards.clear();
        self.current_bet = 0;
        self.hand_contribution = 0;
        self.is_active = false;
        self.sitting_out = false;
        self.has_acted = false;
    }

    pub fn attach(&mut self, connection: MessageSender) {
        self.connection = Some(connection);
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|sender| !sender.is_closed())
    }

    /// Still in the hand and able to put chips in.
    #[must_use]
    pub fn can_act(&self) -> bool {
        self.is_active && self.balance > 0
    }

    /// Move up to `amount` chips from the stack into the current round.
    /// Returns what was actually moved.
    pub fn commit(&mut self, amount: Chips) -> Chips {
        let moved = amount.min(self.balance);
        self.balance -= moved;
        self.current_bet += moved;
        self.hand_contribution += moved;
        moved
    }

    /// Forward a message to this player's connection, if any. Delivery
    /// never blocks and never fails the caller.
    pub fn send(&self, message: ServerMessage) {
        let Some(sender) = &self.connection else {
            return;
        };
        match sender.try_send(message) {
            Ok(()) => {}
            Err(tokio::sync::mpsc::error::TrySendError::Full(_)) => {
                log::warn!("Outbox for player {} is full, dropping message", self.id);
            }
            Err(tokio::sync::mpsc::error::TrySendError::Closed(_)) => {
                log::debug!("Outbox for player {} is closed", self.id);
            }
        }
    }

    #[must_use]
    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            balance: self.balance,
        }
    }
}

/// What other players learn about a newcomer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub balance: Chips,
}

/// Public information about one seat. Never carries hole cards.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub balance: Chips,
    pub current_bet: Chips,
    pub is_active: bool,
    pub is_turn: bool,
}

// Helper module for Arc serialization
mod arc_serde {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S, T>(arc: &Arc<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        arc.as_ref().serialize(serializer)
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Arc<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        T::deserialize(deserializer).map(Arc::new)
    }
}

/// The table as one player sees it. Everything except `my_hand` is shared
/// by every recipient of the same broadcast.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub table_id: TableId,
    pub pot: Chips,
    #[serde(with = "arc_serde")]
    pub community_cards: Arc<Vec<Card>>,
    #[serde(with = "arc_serde")]
    pub players: Arc<Vec<PlayerView>>,
    pub my_hand: Vec<Card>,
    pub current_turn: Option<PlayerId>,
    pub min_bet: Chips,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub stage: Stage,
    /// Unix milliseconds at which the current turn started.
    pub turn_start_time: i64,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    // === Card Tests ===

    #[test]
    fn test_card_serializes_as_rank_and_suit() {
        let json = serde_json::to_string(&Card(ACE, Suit::Spade)).unwrap();
        assert_eq!(json, r#"{"rank":"A","suit":"s"}"#);

        let json = serde_json::to_string(&Card(10, Suit::Heart)).unwrap();
        assert_eq!(json, r#"{"rank":"T","suit":"h"}"#);
    }

    #[test]
    fn test_card_rejects_unknown_rank() {
        let result = serde_json::from_str::<Card>(r#"{"rank":"Z","suit":"h"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_card_display() {
        assert_eq!(Card(2, Suit::Club).to_string(), "2♣");
        assert_eq!(Card(QUEEN, Suit::Diamond).to_string(), "Q♦");
    }

    #[test]
    fn test_rank_ordering() {
        assert!(Rank::HighCard < Rank::OnePair);
        assert!(Rank::OnePair < Rank::TwoPair);
        assert!(Rank::TwoPair < Rank::ThreeOfAKind);
        assert!(Rank::ThreeOfAKind < Rank::Straight);
        assert!(Rank::Straight < Rank::Flush);
        assert!(Rank::Flush < Rank::FullHouse);
        assert!(Rank::FullHouse < Rank::FourOfAKind);
        assert!(Rank::FourOfAKind < Rank::StraightFlush);
    }

    // === Deck Tests ===

    #[test]
    fn test_deck_reset_has_52_distinct_cards() {
        let deck = Deck::default();
        assert_eq!(deck.len(), 52);
        let unique: HashSet<_> = deck.cards.iter().collect();
        assert_eq!(unique.len(), 52);
    }

    #[test]
    fn test_deck_reset_is_deterministic() {
        let a = Deck::default();
        let mut b = Deck::default();
        b.draw().unwrap();
        b.reset();
        assert_eq!(a.cards, b.cards);
    }

    #[test]
    fn test_deck_shuffle_keeps_multiset() {
        let fresh = Deck::default();
        let mut deck = Deck::default();
        deck.shuffle(&mut StdRng::seed_from_u64(7));

        let mut shuffled = deck.cards.clone();
        let mut original = fresh.cards.clone();
        shuffled.sort();
        original.sort();
        assert_eq!(shuffled, original);
    }

    #[test]
    fn test_deck_draws_52_distinct_cards_then_fails() {
        let mut deck = Deck::default();
        deck.shuffle(&mut StdRng::seed_from_u64(42));

        let mut seen = HashSet::new();
        for _ in 0..52 {
            assert!(seen.insert(deck.draw().unwrap()));
        }
        assert!(deck.is_empty());
        assert_eq!(deck.draw(), Err(DeckError::EmptyDeck));
    }

    #[test]
    fn test_deck_draws_from_the_back() {
        let mut deck = Deck::default();
        assert_eq!(deck.draw().unwrap(), Card(ACE, Suit::Spade));
        assert_eq!(deck.draw().unwrap(), Card(KING, Suit::Spade));
    }

    // === PlayerId Tests ===

    #[test]
    fn test_player_id_trims() {
        assert_eq!(PlayerId::new("  alice "), PlayerId::from("alice"));
    }

    #[test]
    fn test_player_id_serializes_transparently() {
        let id = PlayerId::from("u-17");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""u-17""#);
    }

    #[test]
    fn test_display_name_defaults_and_clips() {
        assert_eq!(display_name("   "), "User");
        assert_eq!(display_name("Ann\n"), "Ann");
        let long = "x".repeat(100);
        assert_eq!(display_name(&long).len(), constants::MAX_USER_INPUT_LENGTH);
    }

    // === Blinds Tests ===

    #[test]
    fn test_big_blind_is_twice_small() {
        let blinds = Blinds::from_small(10);
        assert_eq!(blinds.big, 20);
        assert_eq!(blinds.to_string(), "10/20");
    }

    // === Player Tests ===

    #[test]
    fn test_player_commit_caps_at_balance() {
        let mut player = Player::new("p".into(), "P".to_string(), 30, None);
        assert_eq!(player.commit(50), 30);
        assert_eq!(player.balance, 0);
        assert_eq!(player.current_bet, 30);
        assert_eq!(player.hand_contribution, 30);
    }

    #[test]
    fn test_player_send_without_connection_is_noop() {
        let player = Player::new("p".into(), "P".to_string(), 30, None);
        player.send(ServerMessage::PlayerLeft {
            player_id: "q".into(),
        });
        assert!(!player.is_connected());
    }

    #[test]
    fn test_player_send_to_full_outbox_does_not_block() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(1);
        let player = Player::new("p".into(), "P".to_string(), 30, Some(tx));
        for _ in 0..3 {
            player.send(ServerMessage::PlayerLeft {
                player_id: "q".into(),
            });
        }
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_player_send_to_closed_outbox_is_noop() {
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        drop(rx);
        let player = Player::new("p".into(), "P".to_string(), 30, Some(tx));
        player.send(ServerMessage::PlayerLeft {
            player_id: "q".into(),
        });
        assert!(!player.is_connected());
    }

    #[test]
    fn test_player_reset_clears_hand_state() {
        let mut player = Player::new("p".into(), "P".to_string(), 100, None);
        player.cards = vec![Card(2, Suit::Club), Card(3, Suit::Club)];
        player.commit(20);
        player.is_active = true;
        player.has_acted = true;
        player.reset();
        assert!(player.cards.is_empty());
        assert_eq!(player.current_bet, 0);
        assert_eq!(player.hand_contribution, 0);
        assert!(!player.is_active);
        assert!(!player.has_acted);
        assert_eq!(player.balance, 80);
    }
}
