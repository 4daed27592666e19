//! Hand Evaluation Example
//!
//! Scores a showdown between three players on a shared board.

use live_poker::entities::{Card, Suit};
use live_poker::functional::{argmax, eval};

fn main() {
    println!("=== Poker Hand Evaluation Example ===\n");

    let board = [
        Card(14, Suit::Heart),
        Card(13, Suit::Heart),
        Card(10, Suit::Club),
        Card(9, Suit::Diamond),
        Card(2, Suit::Spade),
    ];
    println!(
        "Board: {}",
        board.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
    );

    let holes = [
        ("Ann", [Card(14, Suit::Spade), Card(3, Suit::Club)]),
        ("Bo", [Card(12, Suit::Heart), Card(11, Suit::Spade)]),
        ("Cy", [Card(13, Suit::Club), Card(10, Suit::Heart)]),
    ];

    let mut strengths = Vec::with_capacity(holes.len());
    for (name, hole) in &holes {
        match eval(hole, &board) {
            Ok(strength) => {
                println!("{name:>4}: {} {} -> {strength}", hole[0], hole[1]);
                strengths.push(strength);
            }
            Err(e) => {
                eprintln!("{name}: {e}");
                return;
            }
        }
    }

    match argmax(&strengths) {
        Some(idx) => println!("\nWinner: {} with {}", holes[idx].0, strengths[idx]),
        None => println!("\nNo hands to compare"),
    }

    // Partial boards are fine once the flop is out.
    let flop = &board[..3];
    if let Ok(strength) = eval(&holes[0].1, flop) {
        println!("On the flop alone {} had {strength}", holes[0].0);
    }
}
