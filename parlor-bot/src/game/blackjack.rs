use rand::Rng;

use parlor_shared::errors::{AppError, AppResult, ErrorCode};

use crate::game::cards::{self, Card, Hand};
use crate::models::UserStat;
use crate::store::Store;

pub const STATUS_ACTIVE: &str = "active";

/// Full mutable state of one betting round, persisted after every
/// transition so a restart or delayed callback resumes exactly where the
/// round left off. At most one session exists per user.
#[derive(Debug, Clone)]
pub struct BlackjackSession {
    pub user_id: i64,
    pub deck: Vec<Card>,
    pub player_hand: Hand,
    pub dealer_hand: Hand,
    pub bet: i32,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    PlayerBlackjack { payout: i32 },
    DealerBlackjack,
    Bust,
    DealerBust { payout: i32, forced: bool },
    PlayerWin { payout: i32 },
    DealerWin,
    Push { refund: i32 },
}

/// Mid-round view: the dealer shows only the upcard.
#[derive(Debug, Clone)]
pub struct RoundView {
    pub player_hand: Hand,
    pub dealer_upcard: Card,
    pub bet: i32,
    pub allow_double: bool,
}

#[derive(Debug, Clone)]
pub struct Settlement {
    pub player_hand: Hand,
    pub dealer_hand: Hand,
    pub bet: i32,
    pub outcome: RoundOutcome,
    pub balance: i32,
}

#[derive(Debug, Clone)]
pub enum TurnResult {
    Continue(RoundView),
    Settled(Settlement),
}

/// Places a bet and deals the opening hands. The bet is debited from the
/// wallet immediately: a crash mid-round leaves the stake escrowed, never
/// duplicated. Naturals resolve on the spot.
pub fn place_bet(store: &dyn Store, user_id: i64, bet: i32) -> AppResult<TurnResult> {
    if store.load_blackjack_session(user_id)?.is_some() {
        return Err(AppError::new(
            ErrorCode::RoundAlreadyActive,
            "finish the current round first",
        ));
    }
    if bet <= 0 {
        return Err(AppError::new(ErrorCode::InvalidBet, "bet must be positive"));
    }
    let balance = store.balance(user_id)?;
    if bet > balance {
        return Err(AppError::insufficient_funds(format!(
            "bet {bet} exceeds balance {balance}"
        )));
    }

    store.increment_stat(user_id, UserStat::GamesPlayed, 1)?;
    start_with_deck(store, user_id, bet, cards::build_deck())
}

fn start_with_deck(
    store: &dyn Store,
    user_id: i64,
    bet: i32,
    mut deck: Vec<Card>,
) -> AppResult<TurnResult> {
    let player_hand = vec![cards::draw_card(&mut deck)?, cards::draw_card(&mut deck)?];
    let dealer_hand = vec![cards::draw_card(&mut deck)?, cards::draw_card(&mut deck)?];

    store.adjust_balance(user_id, -bet)?;
    let session = BlackjackSession {
        user_id,
        deck,
        player_hand,
        dealer_hand,
        bet,
        status: STATUS_ACTIVE.to_string(),
    };
    store.save_blackjack_session(&session)?;

    let player_natural = cards::is_blackjack(&session.player_hand);
    let dealer_natural = cards::is_blackjack(&session.dealer_hand);
    if player_natural || dealer_natural {
        let outcome = if player_natural && dealer_natural {
            RoundOutcome::Push { refund: bet }
        } else if player_natural {
            RoundOutcome::PlayerBlackjack { payout: bet * 2 }
        } else {
            RoundOutcome::DealerBlackjack
        };
        return settle(store, session, outcome).map(TurnResult::Settled);
    }

    Ok(TurnResult::Continue(view(&session, true)))
}

/// Draws one card for the player. Busting forfeits the escrowed bet.
pub fn hit(store: &dyn Store, user_id: i64) -> AppResult<TurnResult> {
    let mut session = active_session(store, user_id)?;
    let card = match cards::draw_card(&mut session.deck) {
        Ok(card) => card,
        Err(err) => return abort_round(store, &session, err),
    };
    session.player_hand.push(card);
    store.save_blackjack_session(&session)?;

    let (total, _) = cards::hand_value(&session.player_hand);
    if total > 21 {
        return settle(store, session, RoundOutcome::Bust).map(TurnResult::Settled);
    }
    Ok(TurnResult::Continue(view(&session, false)))
}

/// Dealer plays out, then the totals are compared.
pub fn stand(store: &dyn Store, user_id: i64, rng: &mut impl Rng) -> AppResult<TurnResult> {
    let mut session = active_session(store, user_id)?;
    if let Err(err) = cards::dealer_play(&mut session.dealer_hand, &mut session.deck) {
        return abort_round(store, &session, err);
    }
    let boost = store.blackjack_boost(user_id)?;
    let outcome = resolve(&session, boost, rng);
    settle(store, session, outcome).map(TurnResult::Settled)
}

/// First action only: doubles the stake, draws exactly one card, then the
/// round resolves either way.
pub fn double_down(store: &dyn Store, user_id: i64, rng: &mut impl Rng) -> AppResult<TurnResult> {
    let mut session = active_session(store, user_id)?;
    if session.player_hand.len() != 2 {
        return Err(AppError::new(
            ErrorCode::DoubleNotAllowed,
            "double is only available as the first action",
        ));
    }
    let balance = store.balance(user_id)?;
    if balance < session.bet {
        return Err(AppError::insufficient_funds(format!(
            "doubling needs {} more points",
            session.bet
        )));
    }

    store.adjust_balance(user_id, -session.bet)?;
    session.bet *= 2;
    let card = match cards::draw_card(&mut session.deck) {
        Ok(card) => card,
        Err(err) => return abort_round(store, &session, err),
    };
    session.player_hand.push(card);
    store.save_blackjack_session(&session)?;

    let (total, _) = cards::hand_value(&session.player_hand);
    if total > 21 {
        return settle(store, session, RoundOutcome::Bust).map(TurnResult::Settled);
    }
    if let Err(err) = cards::dealer_play(&mut session.dealer_hand, &mut session.deck) {
        return abort_round(store, &session, err);
    }
    let boost = store.blackjack_boost(user_id)?;
    let outcome = resolve(&session, boost, rng);
    settle(store, session, outcome).map(TurnResult::Settled)
}

/// Deck exhaustion aborts the round: the escrowed stake is refunded and
/// the session is cleared before the error propagates.
fn abort_round<T>(
    store: &dyn Store,
    session: &BlackjackSession,
    err: AppError,
) -> AppResult<T> {
    store.adjust_balance(session.user_id, session.bet)?;
    store.clear_blackjack_session(session.user_id)?;
    tracing::warn!(
        user_id = session.user_id,
        bet = session.bet,
        "deck exhausted, round aborted"
    );
    Err(err)
}

fn active_session(store: &dyn Store, user_id: i64) -> AppResult<BlackjackSession> {
    store
        .load_blackjack_session(user_id)?
        .ok_or_else(|| AppError::new(ErrorCode::NoActiveRound, "no round in progress"))
}

fn view(session: &BlackjackSession, allow_double: bool) -> RoundView {
    RoundView {
        player_hand: session.player_hand.clone(),
        dealer_upcard: session.dealer_hand[0],
        bet: session.bet,
        allow_double,
    }
}

/// Compares final totals. The admin-set boost can flip a dealer win or tie
/// against a standing player into a simulated dealer bust; it is evaluated
/// here and nowhere else, so hits are never perturbed.
fn resolve(session: &BlackjackSession, boost: f64, rng: &mut impl Rng) -> RoundOutcome {
    let (player, _) = cards::hand_value(&session.player_hand);
    let (dealer, _) = cards::hand_value(&session.dealer_hand);
    let bet = session.bet;

    if player > 21 {
        return RoundOutcome::Bust;
    }
    let forced = boost > 0.0 && dealer >= player && dealer <= 21 && rng.gen::<f64>() < boost;
    if forced || dealer > 21 {
        return RoundOutcome::DealerBust {
            payout: bet * 2,
            forced,
        };
    }
    if player > dealer {
        RoundOutcome::PlayerWin { payout: bet * 2 }
    } else if dealer > player {
        RoundOutcome::DealerWin
    } else {
        RoundOutcome::Push { refund: bet }
    }
}

/// Applies the payout, deletes the session and reports the final balance.
/// Losses pay nothing here because the stake was debited at bet time.
fn settle(
    store: &dyn Store,
    session: BlackjackSession,
    outcome: RoundOutcome,
) -> AppResult<Settlement> {
    let payout = match outcome {
        RoundOutcome::PlayerBlackjack { payout }
        | RoundOutcome::DealerBust { payout, .. }
        | RoundOutcome::PlayerWin { payout } => payout,
        RoundOutcome::Push { refund } => refund,
        RoundOutcome::Bust | RoundOutcome::DealerBlackjack | RoundOutcome::DealerWin => 0,
    };
    let balance = if payout > 0 {
        store.adjust_balance(session.user_id, payout)?
    } else {
        store.balance(session.user_id)?
    };
    store.clear_blackjack_session(session.user_id)?;

    tracing::debug!(
        user_id = session.user_id,
        bet = session.bet,
        ?outcome,
        balance,
        "blackjack round settled"
    );
    Ok(Settlement {
        player_hand: session.player_hand,
        dealer_hand: session.dealer_hand,
        bet: session.bet,
        outcome,
        balance,
    })
}
