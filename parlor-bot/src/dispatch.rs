//! Routes inbound updates to the matching, game, voting, shop and flow
//! subsystems. Callback payloads are parsed into a closed [`Action`] enum
//! and matched exhaustively; there is no stringly-typed routing past this
//! module's boundary.

use std::sync::atomic::Ordering;

use chrono::Utc;
use uuid::Uuid;

use parlor_shared::errors::{AppError, AppResult, ErrorCode};
use parlor_shared::types::chat::{
    Content, InboundMessage, InboundUpdate, InlineButton, Keyboard, OutboundMessage,
};

use crate::flows::engine::{Advance, FlowEvent};
use crate::flows::profile::ProfileDraft;
use crate::flows::{checkout, contest, profile, santa, ActiveFlow};
use crate::game::blackjack::{self, RoundOutcome, RoundView, Settlement, TurnResult};
use crate::game::cards::{format_hand, hand_value};
use crate::matching::{self, locality, SwipeOutcome};
use crate::models::{Gender, NewUser, Profile, SwipeStatus};
use crate::store::Store;
use crate::voting::{self, VoteOutcome};
use crate::wallet::{self, CheckinResult};
use crate::AppState;

pub const FEATURE_MATCHING: &str = "matching";
pub const FEATURE_GAME: &str = "game";
pub const FEATURE_VOTING: &str = "voting";
pub const FEATURE_SHOP: &str = "shop";
pub const FEATURE_CONTEST: &str = "contest";
pub const FEATURE_SANTA: &str = "santa";

const BET_OPTIONS: [i32; 3] = [5, 10, 25];

/// Every inline-button payload the bot ever emits, parsed back on the
/// way in. Unknown payloads are dropped with a log line, never executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Menu,
    Checkin,
    SwipeStart,
    Swipe { target: i64, status: SwipeStatus },
    WhoLikedMe,
    ProfileHide,
    ProfileShow,
    GameMenu,
    Bet { amount: i32 },
    Hit,
    Stand,
    Double,
    VoteStart,
    Rate { candidate_id: i32, rating: i32 },
    Shop,
    Buy { item_id: i32 },
    ClaimGift { purchase_id: Uuid },
    /// Payload scoped to whichever flow is active ("flow:<choice>").
    FlowChoice(String),
    Cancel,
}

impl Action {
    pub fn parse(data: &str) -> Option<Self> {
        if let Some(choice) = data.strip_prefix("flow:") {
            return Some(Self::FlowChoice(choice.to_string()));
        }
        let mut parts = data.split(':');
        let head = parts.next()?;
        let action = match head {
            "menu" => Self::Menu,
            "checkin" => Self::Checkin,
            "swipe" => match parts.next()? {
                "start" => Self::SwipeStart,
                target => {
                    let target: i64 = target.parse().ok()?;
                    let status = match parts.next()? {
                        "like" => SwipeStatus::Like,
                        "dislike" => SwipeStatus::Dislike,
                        _ => return None,
                    };
                    Self::Swipe { target, status }
                }
            },
            "likes" => Self::WhoLikedMe,
            "profile" => match parts.next()? {
                "hide" => Self::ProfileHide,
                "show" => Self::ProfileShow,
                _ => return None,
            },
            "game" => Self::GameMenu,
            "bet" => Self::Bet {
                amount: parts.next()?.parse().ok()?,
            },
            "hit" => Self::Hit,
            "stand" => Self::Stand,
            "double" => Self::Double,
            "vote" => Self::VoteStart,
            "rate" => Self::Rate {
                candidate_id: parts.next()?.parse().ok()?,
                rating: parts.next()?.parse().ok()?,
            },
            "shop" => Self::Shop,
            "buy" => Self::Buy {
                item_id: parts.next()?.parse().ok()?,
            },
            "gift" => Self::ClaimGift {
                purchase_id: parts.next()?.parse().ok()?,
            },
            "cancel" => Self::Cancel,
            _ => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(action)
    }
}

/// Entry point for one inbound update. Returns the replies for the
/// sender; notifications to third parties are delivered inline as
/// best-effort sends.
pub async fn handle_update(
    state: &AppState,
    update: InboundUpdate,
) -> AppResult<Vec<OutboundMessage>> {
    let store = state.store.as_ref();
    store.upsert_user_basic(&NewUser {
        id: update.user_id,
        username: update.username.as_deref(),
        first_name: update.first_name.as_deref(),
        last_name: update.last_name.as_deref(),
        language: update.language_code.as_deref(),
    })?;

    if state.guest_mode.load(Ordering::Relaxed) && !is_admin(state, update.user_id)? {
        return Ok(vec![OutboundMessage::text(
            "The bot is temporarily closed for maintenance. Come back soon!",
        )]);
    }

    let mut replies = Vec::new();
    if let Some(count) = update.boost_count {
        if let Some(granted) =
            wallet::credit_boosts(store, update.user_id, count, state.config.boost_bonus)?
        {
            replies.push(OutboundMessage::text(format!(
                "Thanks for boosting the channel! +{granted} points."
            )));
        }
    }
    replies.extend(route_update(state, &update).await?);
    Ok(replies)
}

async fn route_update(
    state: &AppState,
    update: &InboundUpdate,
) -> AppResult<Vec<OutboundMessage>> {
    if let Some(data) = update.callback.as_deref() {
        return handle_action(state, update, data).await;
    }

    let Some(message) = update.message.clone() else {
        return Ok(vec![]);
    };
    if let Some(text) = message.text.as_deref() {
        if text.starts_with('/') {
            return handle_command(state, update, text).await;
        }
    }
    if state.flows.active_kind(update.user_id).is_some() {
        let event = message_event(state, &message).await;
        return drive_flow(state, update.user_id, event).await;
    }
    Ok(vec![menu_message()])
}

async fn handle_action(
    state: &AppState,
    update: &InboundUpdate,
    data: &str,
) -> AppResult<Vec<OutboundMessage>> {
    let store = state.store.as_ref();
    let user_id = update.user_id;
    let Some(action) = Action::parse(data) else {
        tracing::warn!(user_id, data, "unknown callback payload dropped");
        return Ok(vec![]);
    };

    match action {
        Action::Menu => Ok(vec![menu_message()]),
        Action::Checkin => {
            match wallet::daily_checkin(
                store,
                user_id,
                Utc::now().date_naive(),
                state.config.checkin_reward,
            )? {
                CheckinResult::Granted { reward, balance } => Ok(vec![OutboundMessage::text(
                    format!("+{reward} points! Your balance is {balance}."),
                )]),
                CheckinResult::AlreadyClaimed => Ok(vec![OutboundMessage::text(
                    "Already claimed today. Come back tomorrow!",
                )]),
            }
        }
        Action::SwipeStart => {
            require_feature(store, FEATURE_MATCHING)?;
            next_swipe_card(store, user_id)
        }
        Action::Swipe { target, status } => {
            require_feature(store, FEATURE_MATCHING)?;
            let mut replies = Vec::new();
            if matching::submit_swipe(store, user_id, target, status)? == SwipeOutcome::Matched {
                replies.push(OutboundMessage::text("It's a match! 🎉"));
                state
                    .chat
                    .notify(
                        target,
                        &OutboundMessage::text("Someone liked you back — it's a match! 🎉"),
                    )
                    .await;
            }
            replies.extend(next_swipe_card(store, user_id)?);
            Ok(replies)
        }
        Action::WhoLikedMe => {
            require_feature(store, FEATURE_MATCHING)?;
            let likers = matching::who_liked_me(store, user_id)?;
            if likers.is_empty() {
                return Ok(vec![OutboundMessage::text("No new likes yet.")]);
            }
            Ok(vec![OutboundMessage::text(format!(
                "{} people liked your profile. Keep swiping to find them!",
                likers.len()
            ))])
        }
        Action::ProfileHide => {
            store.set_profile_active(user_id, false)?;
            Ok(vec![OutboundMessage::text("Your profile is now hidden.")])
        }
        Action::ProfileShow => {
            store.set_profile_active(user_id, true)?;
            Ok(vec![OutboundMessage::text("Your profile is visible again.")])
        }
        Action::GameMenu => {
            require_feature(store, FEATURE_GAME)?;
            Ok(vec![game_menu(store, user_id)?])
        }
        Action::Bet { amount } => {
            require_feature(store, FEATURE_GAME)?;
            let result = blackjack::place_bet(store, user_id, amount)?;
            Ok(vec![render_turn(result)])
        }
        Action::Hit => Ok(vec![render_turn(blackjack::hit(store, user_id)?)]),
        Action::Stand => Ok(vec![render_turn(blackjack::stand(
            store,
            user_id,
            &mut rand::thread_rng(),
        )?)]),
        Action::Double => Ok(vec![render_turn(blackjack::double_down(
            store,
            user_id,
            &mut rand::thread_rng(),
        )?)]),
        Action::VoteStart => {
            require_feature(store, FEATURE_VOTING)?;
            next_vote_card(store, user_id)
        }
        Action::Rate {
            candidate_id,
            rating,
        } => {
            require_feature(store, FEATURE_VOTING)?;
            let mut replies = Vec::new();
            if voting::cast_vote(store, user_id, candidate_id, rating)? == VoteOutcome::AlreadyVoted
            {
                replies.push(OutboundMessage::text("You already rated this one."));
            }
            replies.extend(next_vote_card(store, user_id)?);
            Ok(replies)
        }
        Action::Shop => {
            require_feature(store, FEATURE_SHOP)?;
            Ok(vec![shop_menu(store, user_id)?])
        }
        Action::Buy { item_id } => {
            require_feature(store, FEATURE_SHOP)?;
            let (flow, prompt) = checkout::begin(store, user_id, item_id)?;
            state.flows.put(user_id, ActiveFlow::Checkout(flow));
            Ok(vec![prompt])
        }
        Action::ClaimGift { purchase_id } => {
            let (flow, prompt) =
                checkout::begin_claim(store, user_id, update.username.as_deref(), purchase_id)?;
            state.flows.put(user_id, ActiveFlow::Checkout(flow));
            Ok(vec![prompt])
        }
        Action::FlowChoice(choice) => {
            drive_flow(state, user_id, FlowEvent::Choice(choice)).await
        }
        Action::Cancel => {
            if state.flows.clear(user_id) {
                Ok(vec![OutboundMessage::text("Cancelled. Nothing was saved.")])
            } else {
                Ok(vec![menu_message()])
            }
        }
    }
}

async fn handle_command(
    state: &AppState,
    update: &InboundUpdate,
    text: &str,
) -> AppResult<Vec<OutboundMessage>> {
    let store = state.store.as_ref();
    let user_id = update.user_id;
    let mut parts = text.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match command {
        "/start" => {
            if let Some(lang) = update.language_code.as_deref() {
                store.set_user_language(user_id, lang)?;
            }
            // Referral payload pays out once: seeding the invitee's wallet
            // right after the grant makes a replayed /start a no-op.
            if let Some(referrer) = args
                .first()
                .and_then(|a| a.strip_prefix("ref_"))
                .and_then(|id| id.parse::<i64>().ok())
            {
                if referrer != user_id && !store.has_wallet(user_id)? {
                    let bonus = state.config.referral_bonus;
                    wallet::grant(store, referrer, bonus)?;
                    store.balance(user_id)?;
                    tracing::info!(referrer, invitee = user_id, "referral bonus granted");
                    state
                        .chat
                        .notify(
                            referrer,
                            &OutboundMessage::text(format!(
                                "Your invite just joined! +{bonus} points."
                            )),
                        )
                        .await;
                }
            }
            let mut replies = vec![OutboundMessage::text(
                "Welcome! Pick something from the menu below.",
            )];
            replies.extend(gift_arrivals(store, user_id, update.username.as_deref())?);
            replies.push(menu_message());
            Ok(replies)
        }
        "/menu" => Ok(vec![menu_message()]),
        "/profile" => {
            require_feature(store, FEATURE_MATCHING)?;
            let draft = ProfileDraft::with_last_city(store.get_profile(user_id)?.map(|p| p.city));
            let (flow, prompt) = profile::ENGINE.start(draft);
            state.flows.put(user_id, ActiveFlow::Profile(flow));
            Ok(vec![prompt])
        }
        "/swipe" => {
            require_feature(store, FEATURE_MATCHING)?;
            next_swipe_card(store, user_id)
        }
        "/likes" => handle_action(state, update, "likes").await,
        "/game" => {
            require_feature(store, FEATURE_GAME)?;
            Ok(vec![game_menu(store, user_id)?])
        }
        "/bet" => {
            require_feature(store, FEATURE_GAME)?;
            let amount: i32 = args
                .first()
                .and_then(|a| a.parse().ok())
                .ok_or_else(|| AppError::new(ErrorCode::InvalidBet, "usage: /bet <amount>"))?;
            Ok(vec![render_turn(blackjack::place_bet(
                store, user_id, amount,
            )?)])
        }
        "/vote" => {
            require_feature(store, FEATURE_VOTING)?;
            next_vote_card(store, user_id)
        }
        "/contest" => {
            require_feature(store, FEATURE_CONTEST)?;
            let (flow, prompt) = contest::ENGINE.start(Default::default());
            state.flows.put(user_id, ActiveFlow::Contest(flow));
            Ok(vec![prompt])
        }
        "/shop" => {
            require_feature(store, FEATURE_SHOP)?;
            Ok(vec![shop_menu(store, user_id)?])
        }
        "/santa" => {
            require_feature(store, FEATURE_SANTA)?;
            let (flow, prompt) = santa::ENGINE.start(Default::default());
            state.flows.put(user_id, ActiveFlow::Santa(flow));
            Ok(vec![prompt])
        }
        "/balance" => Ok(vec![OutboundMessage::text(format!(
            "Your balance: {} points.",
            wallet::balance(store, user_id)?
        ))
        .with_keyboard(Keyboard::Inline {
            rows: vec![vec![InlineButton::new("Daily check-in", "checkin")]],
        })]),
        "/checkin" => handle_action(state, update, "checkin").await,
        "/cancel" => handle_action(state, update, "cancel").await,
        _ => handle_admin_command(state, user_id, command, &args).await,
    }
}

async fn handle_admin_command(
    state: &AppState,
    user_id: i64,
    command: &str,
    args: &[&str],
) -> AppResult<Vec<OutboundMessage>> {
    let store = state.store.as_ref();
    let is_admin_command = matches!(
        command,
        "/guest" | "/boost" | "/grant" | "/feature" | "/approve" | "/wipe"
    );
    if !is_admin_command {
        return Ok(vec![OutboundMessage::text("Unknown command. Try /menu.")]);
    }
    if !is_admin(state, user_id)? {
        return Err(AppError::new(ErrorCode::Forbidden, "admins only"));
    }

    match command {
        "/guest" => {
            let on = parse_toggle(args.first())?;
            state.guest_mode.store(on, Ordering::Relaxed);
            Ok(vec![OutboundMessage::text(format!(
                "Guest mode {}.",
                if on { "enabled" } else { "disabled" }
            ))])
        }
        "/boost" => {
            let target: i64 = parse_arg(args.first(), "usage: /boost <user_id> <fraction>")?;
            let boost: f64 = parse_arg(args.get(1), "usage: /boost <user_id> <fraction>")?;
            if !(0.0..=1.0).contains(&boost) {
                return Err(AppError::bad_request("fraction must be within 0.0-1.0"));
            }
            store.set_blackjack_boost(target, boost)?;
            Ok(vec![OutboundMessage::text(format!(
                "Boost for {target} set to {boost}."
            ))])
        }
        "/grant" => {
            let target: i64 = parse_arg(args.first(), "usage: /grant <user_id> <amount>")?;
            let amount: i32 = parse_arg(args.get(1), "usage: /grant <user_id> <amount>")?;
            let balance = wallet::grant(store, target, amount)?;
            state
                .chat
                .notify(
                    target,
                    &OutboundMessage::text(format!(
                        "You received {amount} points. New balance: {balance}."
                    )),
                )
                .await;
            Ok(vec![OutboundMessage::text(format!(
                "Balance of {target} is now {balance}."
            ))])
        }
        "/feature" => {
            let name = args
                .first()
                .ok_or_else(|| AppError::bad_request("usage: /feature <name> <on|off>"))?;
            let on = parse_toggle(args.get(1))?;
            store.set_feature_enabled(name, on)?;
            Ok(vec![OutboundMessage::text(format!(
                "Feature {name} is now {}.",
                if on { "on" } else { "off" }
            ))])
        }
        "/approve" => {
            let candidate_id: i32 = parse_arg(args.first(), "usage: /approve <candidate_id>")?;
            store.approve_candidate(candidate_id, true)?;
            Ok(vec![OutboundMessage::text(format!(
                "Candidate {candidate_id} approved."
            ))])
        }
        "/wipe" => {
            let target: i64 = parse_arg(args.first(), "usage: /wipe <user_id>")?;
            state.flows.clear(target);
            store.wipe_user(target)?;
            Ok(vec![OutboundMessage::text(format!(
                "User {target} and all owned records deleted."
            ))])
        }
        _ => unreachable!("gated above"),
    }
}

fn parse_arg<T: std::str::FromStr>(arg: Option<&&str>, usage: &str) -> AppResult<T> {
    arg.and_then(|a| a.parse().ok())
        .ok_or_else(|| AppError::bad_request(usage))
}

fn parse_toggle(arg: Option<&&str>) -> AppResult<bool> {
    match arg.copied() {
        Some("on") => Ok(true),
        Some("off") => Ok(false),
        _ => Err(AppError::bad_request("expected on or off")),
    }
}

fn is_admin(state: &AppState, user_id: i64) -> AppResult<bool> {
    if state.config.admin_user_id == Some(user_id) {
        return Ok(true);
    }
    state.store.is_admin(user_id)
}

fn require_feature(store: &dyn Store, name: &str) -> AppResult<()> {
    if store.is_feature_enabled(name, true)? {
        Ok(())
    } else {
        Err(AppError::feature_disabled(name))
    }
}

/// Converts a raw message into a flow event, resolving shared locations
/// (and coordinate-looking text) through the geocoder. A failed lookup
/// degrades to literal coordinates inside the geocoder, never here.
async fn message_event(state: &AppState, message: &InboundMessage) -> FlowEvent {
    if let Some(point) = message.location {
        let lookup = state.geocoder.reverse(point.lat, point.lon).await;
        return FlowEvent::Place {
            label: lookup.city.unwrap_or(lookup.label),
            lat: Some(point.lat),
            lon: Some(point.lon),
        };
    }
    if let Some(text) = message.text.as_deref() {
        if let Some((lat, lon)) = locality::parse_lat_lon(text) {
            let lookup = state.geocoder.reverse(lat, lon).await;
            return FlowEvent::Place {
                label: lookup.city.unwrap_or(lookup.label),
                lat: Some(lat),
                lon: Some(lon),
            };
        }
        return FlowEvent::Text(text.to_string());
    }
    if let Some(file_id) = message.photo.clone() {
        return FlowEvent::Photo(file_id);
    }
    if let Some(file_id) = message.video.clone() {
        return FlowEvent::Video(file_id);
    }
    FlowEvent::Text(String::new())
}

/// Advances whichever flow the user has open. Finalization errors leave
/// the flow in place so the user can retry or /cancel.
async fn drive_flow(
    state: &AppState,
    user_id: i64,
    event: FlowEvent,
) -> AppResult<Vec<OutboundMessage>> {
    let store = state.store.as_ref();
    let Some(flow) = state.flows.take(user_id) else {
        return Ok(vec![menu_message()]);
    };

    match flow {
        ActiveFlow::Profile(mut flow) => match profile::ENGINE.handle(&mut flow, &event)? {
            Advance::Rejected { hint, prompt } => {
                state.flows.put(user_id, ActiveFlow::Profile(flow));
                Ok(vec![OutboundMessage::text(hint), prompt])
            }
            Advance::Prompt(prompt) => {
                state.flows.put(user_id, ActiveFlow::Profile(flow));
                Ok(vec![prompt])
            }
            Advance::Complete => {
                profile::finalize(store, user_id, &flow.draft)?;
                Ok(vec![OutboundMessage::text(
                    "Profile saved! Use /swipe to start browsing.",
                )])
            }
        },
        ActiveFlow::Contest(mut flow) => match contest::ENGINE.handle(&mut flow, &event)? {
            Advance::Rejected { hint, prompt } => {
                state.flows.put(user_id, ActiveFlow::Contest(flow));
                Ok(vec![OutboundMessage::text(hint), prompt])
            }
            Advance::Prompt(prompt) => {
                state.flows.put(user_id, ActiveFlow::Contest(flow));
                Ok(vec![prompt])
            }
            Advance::Complete => {
                contest::finalize(store, user_id, &flow.draft)?;
                Ok(vec![OutboundMessage::text(
                    "Entry submitted! It will appear after moderation.",
                )])
            }
        },
        ActiveFlow::Checkout(mut flow) => match checkout::ENGINE.handle(&mut flow, &event)? {
            Advance::Rejected { hint, prompt } => {
                state.flows.put(user_id, ActiveFlow::Checkout(flow));
                Ok(vec![OutboundMessage::text(hint), prompt])
            }
            Advance::Prompt(prompt) => {
                state.flows.put(user_id, ActiveFlow::Checkout(flow));
                Ok(vec![prompt])
            }
            Advance::Complete => match checkout::finalize(store, user_id, &flow.draft) {
                Ok(receipt) => {
                    let mut replies = Vec::new();
                    if let Some(balance) = receipt.balance {
                        replies.push(OutboundMessage::text(format!(
                            "{} is yours! Remaining balance: {balance}.",
                            receipt.item_name
                        )));
                    } else {
                        replies.push(OutboundMessage::text("Details saved. Enjoy your gift!"));
                    }
                    if receipt.awaiting_recipient {
                        notify_gift_recipient(state, store, receipt.purchase_id).await?;
                    }
                    Ok(replies)
                }
                Err(err) => {
                    // Retryable: the draft survives so the user can top up
                    // or /cancel.
                    state.flows.put(user_id, ActiveFlow::Checkout(flow));
                    Err(err)
                }
            },
        },
        ActiveFlow::Santa(mut flow) => match santa::ENGINE.handle(&mut flow, &event)? {
            Advance::Rejected { hint, prompt } => {
                state.flows.put(user_id, ActiveFlow::Santa(flow));
                Ok(vec![OutboundMessage::text(hint), prompt])
            }
            Advance::Prompt(prompt) => {
                state.flows.put(user_id, ActiveFlow::Santa(flow));
                Ok(vec![prompt])
            }
            Advance::Complete => {
                let number = santa::finalize(store, user_id, &flow.draft)?;
                Ok(vec![OutboundMessage::text(format!(
                    "You're in! Your gift number is {number}."
                ))])
            }
        },
    }
}

/// Tells a known recipient their gift arrived, right when it is bought.
/// Unknown usernames are picked up later by `gift_arrivals` on /start.
async fn notify_gift_recipient(
    state: &AppState,
    store: &dyn Store,
    purchase_id: Uuid,
) -> AppResult<()> {
    let Some(purchase) = store.get_purchase(purchase_id)? else {
        return Ok(());
    };
    let Some(recipient_id) = purchase.recipient_id else {
        return Ok(());
    };
    let item_name = store
        .get_shop_item(purchase.item_id)?
        .map(|i| i.name)
        .unwrap_or_else(|| "A gift".to_string());
    state
        .chat
        .notify(
            recipient_id,
            &OutboundMessage::text(format!("🎁 {item_name} was gifted to you!")).with_keyboard(
                Keyboard::Inline {
                    rows: vec![vec![InlineButton::new(
                        "Fill in delivery details",
                        format!("gift:{purchase_id}"),
                    )]],
                },
            ),
        )
        .await;
    store.mark_purchase_notified(purchase_id)?;
    Ok(())
}

/// Unclaimed gifts addressed to this user by id or username, surfaced on
/// /start and marked notified so they only appear once.
fn gift_arrivals(
    store: &dyn Store,
    user_id: i64,
    username: Option<&str>,
) -> AppResult<Vec<OutboundMessage>> {
    let mut replies = Vec::new();
    for purchase in store.pending_gifts_for(user_id, username)? {
        let item_name = store
            .get_shop_item(purchase.item_id)?
            .map(|i| i.name)
            .unwrap_or_else(|| "A gift".to_string());
        let mut message = OutboundMessage::text(format!("🎁 {item_name} was gifted to you!"));
        if purchase.status == checkout::STATUS_AWAITING_DETAILS {
            message = message.with_keyboard(Keyboard::Inline {
                rows: vec![vec![InlineButton::new(
                    "Fill in delivery details",
                    format!("gift:{}", purchase.id),
                )]],
            });
        }
        store.mark_purchase_notified(purchase.id)?;
        replies.push(message);
    }
    Ok(replies)
}

fn menu_message() -> OutboundMessage {
    OutboundMessage::text("What would you like to do?").with_keyboard(Keyboard::Inline {
        rows: vec![
            vec![
                InlineButton::new("💘 Swipe", "swipe:start"),
                InlineButton::new("❤️ My likes", "likes"),
            ],
            vec![
                InlineButton::new("🃏 Blackjack", "game"),
                InlineButton::new("⭐ Vote", "vote"),
            ],
            vec![
                InlineButton::new("🛍 Shop", "shop"),
                InlineButton::new("💰 Check-in", "checkin"),
            ],
        ],
    })
}

fn game_menu(store: &dyn Store, user_id: i64) -> AppResult<OutboundMessage> {
    let balance = store.balance(user_id)?;
    let buttons = BET_OPTIONS
        .iter()
        .map(|amount| InlineButton::new(format!("{amount}"), format!("bet:{amount}")))
        .collect();
    Ok(
        OutboundMessage::text(format!("Balance: {balance} points. Place your bet:"))
            .with_keyboard(Keyboard::Inline {
                rows: vec![buttons],
            }),
    )
}

fn shop_menu(store: &dyn Store, user_id: i64) -> AppResult<OutboundMessage> {
    let balance = store.balance(user_id)?;
    let rows = store
        .list_shop_items()?
        .into_iter()
        .map(|item| {
            vec![InlineButton::new(
                format!("{} — {}", item.name, item.price),
                format!("buy:{}", item.id),
            )]
        })
        .collect();
    Ok(
        OutboundMessage::text(format!("You have {balance} points. Pick an item:"))
            .with_keyboard(Keyboard::Inline { rows }),
    )
}

fn profile_card(profile: &Profile, photo: Option<String>) -> OutboundMessage {
    let caption = format!(
        "{}, {} — {}\n{}",
        profile.name, profile.age, profile.city, profile.bio
    );
    let keyboard = Keyboard::Inline {
        rows: vec![vec![
            InlineButton::new("❤️", format!("swipe:{}:like", profile.user_id)),
            InlineButton::new("👎", format!("swipe:{}:dislike", profile.user_id)),
        ]],
    };
    let content = match photo {
        Some(file_id) => Content::Photo { file_id, caption },
        None => Content::text(caption),
    };
    OutboundMessage {
        content,
        keyboard: Some(keyboard),
    }
}

fn next_swipe_card(store: &dyn Store, user_id: i64) -> AppResult<Vec<OutboundMessage>> {
    let Some(candidate) = matching::next_candidate(store, user_id)? else {
        return Ok(vec![OutboundMessage::text(
            "No more profiles around for now. Check back later!",
        )]);
    };
    let photo = store
        .list_profile_media(candidate.user_id)?
        .into_iter()
        .next()
        .map(|m| m.file_id);
    Ok(vec![profile_card(&candidate, photo)])
}

fn next_vote_card(store: &dyn Store, user_id: i64) -> AppResult<Vec<OutboundMessage>> {
    let voter_gender = store
        .get_user(user_id)?
        .and_then(|u| u.gender)
        .and_then(|g| Gender::parse(&g));
    let Some(candidate) = voting::next_unrated(store, user_id, voter_gender)? else {
        return Ok(vec![OutboundMessage::text(
            "You've rated everyone. Thanks for voting!",
        )]);
    };
    let caption = match &candidate.instagram {
        Some(handle) => format!("{}, {} (@{handle})", candidate.name, candidate.age),
        None => format!("{}, {}", candidate.name, candidate.age),
    };
    let rating_row = |range: std::ops::RangeInclusive<i32>| {
        range
            .map(|n| InlineButton::new(format!("{n}"), format!("rate:{}:{n}", candidate.id)))
            .collect::<Vec<_>>()
    };
    Ok(vec![OutboundMessage {
        content: Content::Photo {
            file_id: candidate.photo_file_id.clone(),
            caption,
        },
        keyboard: Some(Keyboard::Inline {
            rows: vec![rating_row(1..=5), rating_row(6..=10)],
        }),
    }])
}

fn render_turn(result: TurnResult) -> OutboundMessage {
    match result {
        TurnResult::Continue(view) => render_view(&view),
        TurnResult::Settled(settlement) => render_settlement(&settlement),
    }
}

fn render_view(view: &RoundView) -> OutboundMessage {
    let (total, _) = hand_value(&view.player_hand);
    let mut row = vec![
        InlineButton::new("Hit", "hit"),
        InlineButton::new("Stand", "stand"),
    ];
    if view.allow_double {
        row.push(InlineButton::new("Double", "double"));
    }
    OutboundMessage::text(format!(
        "Your hand: {} ({total})\nDealer shows: {}\nBet: {}",
        format_hand(&view.player_hand),
        view.dealer_upcard.label(),
        view.bet,
    ))
    .with_keyboard(Keyboard::Inline { rows: vec![row] })
}

fn render_settlement(settlement: &Settlement) -> OutboundMessage {
    let (player_total, _) = hand_value(&settlement.player_hand);
    let (dealer_total, _) = hand_value(&settlement.dealer_hand);
    let verdict = match settlement.outcome {
        RoundOutcome::PlayerBlackjack { payout } => format!("Blackjack! You win {payout}."),
        RoundOutcome::DealerBlackjack => "Dealer has blackjack. You lose.".to_string(),
        RoundOutcome::Bust => "Bust! You lose.".to_string(),
        RoundOutcome::DealerBust { payout, .. } => format!("Dealer busts! You win {payout}."),
        RoundOutcome::PlayerWin { payout } => format!("You win {payout}!"),
        RoundOutcome::DealerWin => "Dealer wins.".to_string(),
        RoundOutcome::Push { refund } => format!("Push. Your {refund} is returned."),
    };
    OutboundMessage::text(format!(
        "Your hand: {} ({player_total})\nDealer: {} ({dealer_total})\n{verdict}\nBalance: {}",
        format_hand(&settlement.player_hand),
        format_hand(&settlement.dealer_hand),
        settlement.balance,
    ))
    .with_keyboard(Keyboard::Inline {
        rows: vec![vec![
            InlineButton::new("Play again", "game"),
            InlineButton::new("Menu", "menu"),
        ]],
    })
}
