use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use parlor_shared::errors::{AppError, AppResult, ErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];

    pub fn symbol(&self) -> char {
        match self {
            Self::Hearts => '♥',
            Self::Diamonds => '♦',
            Self::Clubs => '♣',
            Self::Spades => '♠',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Blackjack value with the ace counted high.
    pub fn base_value(&self) -> u32 {
        match self {
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
            Self::Nine => 9,
            Self::Ten | Self::Jack | Self::Queen | Self::King => 10,
            Self::Ace => 11,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Five => "5",
            Self::Six => "6",
            Self::Seven => "7",
            Self::Eight => "8",
            Self::Nine => "9",
            Self::Ten => "10",
            Self::Jack => "J",
            Self::Queen => "Q",
            Self::King => "K",
            Self::Ace => "A",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// Human-friendly label, e.g. `J♦`, `10♥`.
    pub fn label(&self) -> String {
        format!("{}{}", self.rank.label(), self.suit.symbol())
    }
}

pub type Hand = Vec<Card>;

pub fn format_hand(hand: &[Card]) -> String {
    hand.iter()
        .map(Card::label)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One standard 52-card deck in uniformly random order. The top of the
/// deck is the end of the vec, so draws are O(1) pops.
pub fn build_deck() -> Vec<Card> {
    let mut deck: Vec<Card> = Rank::ALL
        .iter()
        .flat_map(|&rank| Suit::ALL.iter().map(move |&suit| Card::new(rank, suit)))
        .collect();
    deck.shuffle(&mut rand::thread_rng());
    deck
}

/// Unreachable with 52 cards and realistic hand sizes, but exhaustion is
/// a defined failure, not a panic.
pub fn draw_card(deck: &mut Vec<Card>) -> AppResult<Card> {
    deck.pop()
        .ok_or_else(|| AppError::new(ErrorCode::EmptyDeck, "deck exhausted"))
}

/// Total with aces demoted from 11 to 1 until the hand no longer busts.
/// `soft` is true while at least one ace is still counted as 11.
pub fn hand_value(hand: &[Card]) -> (u32, bool) {
    let mut total = 0;
    let mut aces = 0;
    for card in hand {
        if card.rank == Rank::Ace {
            aces += 1;
        }
        total += card.rank.base_value();
    }
    while total > 21 && aces > 0 {
        total -= 10;
        aces -= 1;
    }
    (total, aces > 0)
}

pub fn is_blackjack(hand: &[Card]) -> bool {
    hand.len() == 2 && hand_value(hand).0 == 21
}

/// Dealer policy: hit below 17 and on soft 17, stand on hard 17 and above.
pub fn dealer_play(hand: &mut Hand, deck: &mut Vec<Card>) -> AppResult<()> {
    loop {
        let (total, soft) = hand_value(hand);
        if total < 17 || (total == 17 && soft) {
            hand.push(draw_card(deck)?);
        } else {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn card(rank: Rank) -> Card {
        Card::new(rank, Suit::Spades)
    }

    #[test]
    fn deck_has_52_distinct_cards() {
        let deck = build_deck();
        assert_eq!(deck.len(), 52);
        let distinct: HashSet<String> = deck.iter().map(Card::label).collect();
        assert_eq!(distinct.len(), 52);
    }

    #[test]
    fn draw_from_empty_deck_is_an_error() {
        let mut deck = Vec::new();
        assert!(draw_card(&mut deck).is_err());
    }

    #[test]
    fn two_aces_and_nine_is_soft_21() {
        let hand = vec![
            card(Rank::Ace),
            Card::new(Rank::Ace, Suit::Hearts),
            Card::new(Rank::Nine, Suit::Clubs),
        ];
        assert_eq!(hand_value(&hand), (21, true));
    }

    #[test]
    fn two_aces_and_king_is_hard_12() {
        let hand = vec![
            card(Rank::Ace),
            Card::new(Rank::Ace, Suit::Hearts),
            Card::new(Rank::King, Suit::Clubs),
        ];
        assert_eq!(hand_value(&hand), (12, false));
    }

    #[test]
    fn blackjack_is_exactly_two_cards_totalling_21() {
        assert!(is_blackjack(&[card(Rank::Ace), card(Rank::King)]));
        assert!(!is_blackjack(&[
            card(Rank::Seven),
            card(Rank::Seven),
            card(Rank::Seven)
        ]));
        assert!(!is_blackjack(&[card(Rank::Ten), card(Rank::Nine)]));
    }

    #[test]
    fn dealer_stands_on_hard_17() {
        let mut hand = vec![card(Rank::Ten), card(Rank::Seven)];
        let mut deck = vec![card(Rank::Two)];
        dealer_play(&mut hand, &mut deck).unwrap();
        assert_eq!(hand.len(), 2);
        assert_eq!(deck.len(), 1);
    }

    #[test]
    fn dealer_hits_soft_17() {
        // A♠ + 6♣ is soft 17; the dealer must draw at least once.
        let mut hand = vec![card(Rank::Ace), Card::new(Rank::Six, Suit::Clubs)];
        let mut deck = vec![card(Rank::Five), card(Rank::King)];
        dealer_play(&mut hand, &mut deck).unwrap();
        // Drew the king (hard 17), then stood.
        assert_eq!(hand.len(), 3);
        assert_eq!(hand_value(&hand), (17, false));
    }

    #[test]
    fn dealer_keeps_drawing_below_17() {
        let mut hand = vec![card(Rank::Two), card(Rank::Three)];
        let mut deck = build_deck();
        dealer_play(&mut hand, &mut deck).unwrap();
        let (total, _) = hand_value(&hand);
        assert!(total >= 17);
    }

    fn arb_card() -> impl Strategy<Value = Card> {
        (0..13usize, 0..4usize)
            .prop_map(|(r, s)| Card::new(Rank::ALL[r], Suit::ALL[s]))
    }

    proptest! {
        #[test]
        fn valuation_invariants(hand in proptest::collection::vec(arb_card(), 1..12)) {
            let (total, soft) = hand_value(&hand);
            let aces = hand.iter().filter(|c| c.rank == Rank::Ace).count() as u32;
            let hard_min: u32 = hand
                .iter()
                .map(|c| c.rank.base_value())
                .sum::<u32>()
                - 10 * aces;

            // At most one ace can be worth 11 without busting, so the
            // final total is the hard minimum plus at most one promotion.
            if soft {
                prop_assert!(aces > 0);
                prop_assert_eq!(total, hard_min + 10);
                prop_assert!(total <= 21);
            } else {
                prop_assert_eq!(total, hard_min);
            }
            // A busted hand never still counts an ace as 11.
            if total > 21 {
                prop_assert!(!soft);
            }
        }
    }
}
