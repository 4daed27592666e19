/// Property-based tests for hand evaluation using proptest
///
/// These tests verify that the hand evaluation logic is correct
/// across a wide range of randomly generated card combinations.
use live_poker::game::{
    entities::{Card, Rank, Suit},
    functional::{argmax, best_hand, eval},
};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn suit_from(idx: u8) -> Suit {
    match idx {
        0 => Suit::Club,
        1 => Suit::Diamond,
        2 => Suit::Heart,
        _ => Suit::Spade,
    }
}

// Strategy to generate a valid card (values 2-14, aces are 14)
fn card_strategy() -> impl Strategy<Value = Card> {
    (2u8..=14, 0u8..=3).prop_map(|(value, suit_idx)| Card(value, suit_from(suit_idx)))
}

// Strategy to generate a vec of unique cards (no duplicates)
fn unique_cards_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<Card>> {
    prop::collection::vec(card_strategy(), min..=max).prop_filter("Cards must be unique", |cards| {
        let set: BTreeSet<_> = cards.iter().collect();
        set.len() == cards.len()
    })
}

// 7 unique cards: 2 hole + 5 board
fn seven_card_hand_strategy() -> impl Strategy<Value = Vec<Card>> {
    unique_cards_strategy(7, 7)
}

proptest! {
    #[test]
    fn test_eval_accepts_every_board_size(cards in seven_card_hand_strategy(), board_len in 3usize..=5) {
        let result = eval(&cards[..2], &cards[2..2 + board_len]);
        prop_assert!(result.is_ok());
    }

    #[test]
    fn test_eval_deterministic(cards in seven_card_hand_strategy()) {
        let hand1 = eval(&cards[..2], &cards[2..]).unwrap();
        let hand2 = eval(&cards[..2], &cards[2..]).unwrap();
        prop_assert_eq!(hand1, hand2, "eval() should be deterministic");
    }

    #[test]
    fn test_eval_order_independent(cards in seven_card_hand_strategy()) {
        let forward = eval(&cards[..2], &cards[2..]).unwrap();

        let mut board = cards[2..].to_vec();
        board.reverse();
        let backward = eval(&[cards[1], cards[0]], &board).unwrap();
        prop_assert_eq!(forward, backward, "card order must not matter");
    }

    #[test]
    fn test_more_cards_never_weaker(cards in seven_card_hand_strategy()) {
        let flop = eval(&cards[..2], &cards[2..5]).unwrap();
        let turn = eval(&cards[..2], &cards[2..6]).unwrap();
        let river = eval(&cards[..2], &cards[2..7]).unwrap();
        prop_assert!(turn >= flop);
        prop_assert!(river >= turn);
    }

    #[test]
    fn test_best_of_seven_beats_every_five(cards in seven_card_hand_strategy()) {
        let best = best_hand(&cards);
        for skip_a in 0..7 {
            for skip_b in (skip_a + 1)..7 {
                let five: Vec<Card> = cards
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != skip_a && *i != skip_b)
                    .map(|(_, c)| *c)
                    .collect();
                prop_assert!(best >= best_hand(&five));
            }
        }
    }

    #[test]
    fn test_argmax_single_hand_returns_zero(cards in seven_card_hand_strategy()) {
        let hand = eval(&cards[..2], &cards[2..]).unwrap();
        prop_assert_eq!(argmax(&[hand]), Some(0), "Single hand should always win");
    }

    #[test]
    fn test_argmax_identical_hands_first_wins(cards in seven_card_hand_strategy()) {
        let hand = eval(&cards[..2], &cards[2..]).unwrap();
        prop_assert_eq!(argmax(&[hand.clone(), hand.clone(), hand]), Some(0));
    }

    #[test]
    fn test_argmax_returns_a_maximum(
        hands in prop::collection::vec(unique_cards_strategy(5, 5), 2..=10)
    ) {
        let evaluated: Vec<_> = hands.iter().map(|h| best_hand(h)).collect();
        let winner = argmax(&evaluated).unwrap();
        for (idx, hand) in evaluated.iter().enumerate() {
            prop_assert!(evaluated[winner] >= *hand);
            if idx < winner {
                prop_assert!(evaluated[winner] > *hand, "earlier ties must win");
            }
        }
    }

    /// A straight flush beats four of a kind
    #[test]
    fn test_straight_flush_beats_four_kind(suit_idx in 0u8..=3, low in 2u8..=10) {
        let suit = suit_from(suit_idx);
        let straight_flush: Vec<Card> = (low..low + 5).map(|v| Card(v, suit)).collect();
        let four_kind = vec![
            Card(14, Suit::Club),
            Card(14, Suit::Diamond),
            Card(14, Suit::Heart),
            Card(14, Suit::Spade),
            Card(13, Suit::Club),
        ];

        let sf = best_hand(&straight_flush);
        let fk = best_hand(&four_kind);
        prop_assert_eq!(sf.category, Rank::StraightFlush);
        prop_assert!(sf > fk, "Straight flush should beat four of a kind");
    }

    /// Any pair beats any high-card hand, whatever the kickers
    #[test]
    fn test_category_dominates_kickers(cards in unique_cards_strategy(5, 5), pair_value in 2u8..=14) {
        let high = best_hand(&cards);
        prop_assume!(high.category == Rank::HighCard);

        let pair = best_hand(&[
            Card(pair_value, Suit::Club),
            Card(pair_value, Suit::Diamond),
            Card(if pair_value == 2 { 3 } else { 2 }, Suit::Heart),
            Card(if pair_value == 4 { 5 } else { 4 }, Suit::Spade),
            Card(if pair_value == 7 { 6 } else { 7 }, Suit::Heart),
        ]);
        prop_assert_eq!(pair.category, Rank::OnePair);
        prop_assert!(pair > high);
    }
}

#[test]
fn test_category_ladder() {
    let ladder = [
        // High card
        vec![Card(2, Suit::Club), Card(5, Suit::Heart), Card(9, Suit::Diamond), Card(11, Suit::Spade), Card(13, Suit::Club)],
        // One pair
        vec![Card(2, Suit::Club), Card(2, Suit::Heart), Card(9, Suit::Diamond), Card(11, Suit::Spade), Card(13, Suit::Club)],
        // Two pair
        vec![Card(2, Suit::Club), Card(2, Suit::Heart), Card(9, Suit::Diamond), Card(9, Suit::Spade), Card(13, Suit::Club)],
        // Three of a kind
        vec![Card(2, Suit::Club), Card(2, Suit::Heart), Card(2, Suit::Diamond), Card(9, Suit::Spade), Card(13, Suit::Club)],
        // Straight (wheel)
        vec![Card(14, Suit::Club), Card(2, Suit::Heart), Card(3, Suit::Diamond), Card(4, Suit::Spade), Card(5, Suit::Club)],
        // Flush
        vec![Card(2, Suit::Heart), Card(5, Suit::Heart), Card(9, Suit::Heart), Card(11, Suit::Heart), Card(13, Suit::Heart)],
        // Full house
        vec![Card(2, Suit::Club), Card(2, Suit::Heart), Card(2, Suit::Diamond), Card(9, Suit::Spade), Card(9, Suit::Club)],
        // Four of a kind
        vec![Card(2, Suit::Club), Card(2, Suit::Heart), Card(2, Suit::Diamond), Card(2, Suit::Spade), Card(9, Suit::Club)],
        // Straight flush
        vec![Card(14, Suit::Spade), Card(2, Suit::Spade), Card(3, Suit::Spade), Card(4, Suit::Spade), Card(5, Suit::Spade)],
    ];

    let hands: Vec<_> = ladder.iter().map(|cards| best_hand(cards)).collect();
    for pair in hands.windows(2) {
        assert!(pair[1] > pair[0], "{} should beat {}", pair[1], pair[0]);
    }
}
