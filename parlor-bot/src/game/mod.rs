pub mod cards;
pub mod blackjack;
