//! Hand evaluation.
//!
//! A hand is scored by trying every five-card combination of the cards
//! available and keeping the strongest. Strengths compare with plain `Ord`.

use std::fmt;
use thiserror::Error;

use super::entities::{ACE, Card, Rank, Value, value_char};

#[derive(Debug, Eq, Error, PartialEq)]
pub enum EvalError {
    #[error("expected 2 hole cards, got {0}")]
    HoleCards(usize),
    #[error("expected 3 to 5 board cards, got {0}")]
    BoardCards(usize),
}

/// Score of the best five cards in a hand.
///
/// Ordering is by category first, then by `values`, which lists the
/// deciding card values from most to least significant (grouped cards
/// before kickers, e.g. `[K, 9]` for kings full of nines).
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct HandStrength {
    pub category: Rank,
    pub values: Vec<Value>,
}

impl fmt::Display for HandStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: String = self.values.iter().map(|&v| value_char(v)).collect();
        if values.is_empty() {
            write!(f, "{}", self.category)
        } else {
            write!(f, "{} ({values})", self.category)
        }
    }
}

/// Evaluate a player's two hole cards against the community cards.
///
/// # Arguments
///
/// * `hole` - Exactly two private cards
/// * `board` - Three to five community cards
///
/// # Returns
///
/// * `Ok(HandStrength)` - Best five-card hand available
/// * `Err(EvalError)` - Card counts don't describe a post-flop hand
pub fn eval(hole: &[Card], board: &[Card]) -> Result<HandStrength, EvalError> {
    if hole.len() != 2 {
        return Err(EvalError::HoleCards(hole.len()));
    }
    if !(3..=5).contains(&board.len()) {
        return Err(EvalError::BoardCards(board.len()));
    }
    let mut cards = Vec::with_capacity(hole.len() + board.len());
    cards.extend_from_slice(hole);
    cards.extend_from_slice(board);
    Ok(best_hand(&cards))
}

/// Best hand out of any set of cards, without count checks.
///
/// With fewer than five cards the partial hand is scored as-is; straights
/// and flushes need all five.
#[must_use]
pub fn best_hand(cards: &[Card]) -> HandStrength {
    let k = cards.len().min(5);
    let mut best: Option<HandStrength> = None;
    let mut combo = Vec::with_capacity(k);
    for_each_combination(cards, k, 0, &mut combo, &mut |hand| {
        let strength = score(hand);
        if best.as_ref().is_none_or(|b| strength > *b) {
            best = Some(strength);
        }
    });
    best.unwrap_or(HandStrength {
        category: Rank::HighCard,
        values: Vec::new(),
    })
}

/// Index of the strongest hand. Ties go to the lowest index.
#[must_use]
pub fn argmax(hands: &[HandStrength]) -> Option<usize> {
    let mut winner: Option<usize> = None;
    for (idx, hand) in hands.iter().enumerate() {
        match winner {
            Some(w) if hands[w] >= *hand => {}
            _ => winner = Some(idx),
        }
    }
    winner
}

fn for_each_combination<F>(cards: &[Card], k: usize, start: usize, combo: &mut Vec<Card>, f: &mut F)
where
    F: FnMut(&[Card]),
{
    if combo.len() == k {
        f(combo);
        return;
    }
    let needed = k - combo.len();
    for idx in start..=cards.len().saturating_sub(needed) {
        if idx >= cards.len() {
            break;
        }
        combo.push(cards[idx]);
        for_each_combination(cards, k, idx + 1, combo, f);
        combo.pop();
    }
}

fn score(hand: &[Card]) -> HandStrength {
    let mut values: Vec<Value> = hand.iter().map(|c| c.0).collect();
    values.sort_unstable_by(|a, b| b.cmp(a));

    let is_full = hand.len() == 5;
    let is_flush = is_full && hand.windows(2).all(|w| w[0].1 == w[1].1);
    let straight_high = if is_full { straight_high(&values) } else { None };

    if let Some(high) = straight_high {
        let category = if is_flush {
            Rank::StraightFlush
        } else {
            Rank::Straight
        };
        return HandStrength {
            category,
            values: vec![high],
        };
    }

    // (count, value) pairs, largest groups first, then highest value.
    let mut counts = [0u8; ACE as usize + 1];
    for &v in &values {
        counts[usize::from(v)] += 1;
    }
    let mut groups: Vec<(u8, Value)> = counts
        .iter()
        .enumerate()
        .filter(|(_, c)| **c > 0)
        .map(|(v, c)| (*c, v as Value))
        .collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));
    let grouped: Vec<Value> = groups.iter().map(|(_, v)| *v).collect();

    let category = match (groups.first().map(|g| g.0), groups.get(1).map(|g| g.0)) {
        (Some(4), _) => Rank::FourOfAKind,
        (Some(3), Some(2)) => Rank::FullHouse,
        _ if is_flush => Rank::Flush,
        (Some(3), _) => Rank::ThreeOfAKind,
        (Some(2), Some(2)) => Rank::TwoPair,
        (Some(2), _) => Rank::OnePair,
        _ => Rank::HighCard,
    };

    let values = if category == Rank::Flush {
        values
    } else {
        grouped
    };
    HandStrength { category, values }
}

/// High card of a straight in five values sorted high to low. A-2-3-4-5
/// plays as five-high.
fn straight_high(sorted: &[Value]) -> Option<Value> {
    if sorted.windows(2).all(|w| w[0] == w[1] + 1) {
        return sorted.first().copied();
    }
    if sorted == [ACE, 5, 4, 3, 2] {
        return Some(5);
    }
    None
}
