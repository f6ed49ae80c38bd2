use chrono::NaiveDate;

use parlor_shared::errors::{AppError, AppResult};

use crate::models::UserStat;
use crate::store::Store;

/// Outcome of the daily check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckinResult {
    Granted { reward: i32, balance: i32 },
    AlreadyClaimed,
}

pub fn balance(store: &dyn Store, user_id: i64) -> AppResult<i32> {
    store.balance(user_id)
}

/// One reward per calendar day. The stored date is the idempotency key,
/// so a retried tap on the same day claims nothing.
pub fn daily_checkin(
    store: &dyn Store,
    user_id: i64,
    today: NaiveDate,
    reward: i32,
) -> AppResult<CheckinResult> {
    if store.last_checkin(user_id)? == Some(today) {
        return Ok(CheckinResult::AlreadyClaimed);
    }
    let balance = store.record_checkin(user_id, today, reward)?;
    tracing::info!(user_id, reward, balance, "daily check-in claimed");
    Ok(CheckinResult::Granted { reward, balance })
}

/// Rewards channel boosts. The platform reports the user's current boost
/// count; only boosts beyond the already-credited tally pay out, so a
/// repeated report grants nothing. Returns the points granted, if any.
pub fn credit_boosts(
    store: &dyn Store,
    user_id: i64,
    current: i32,
    bonus: i32,
) -> AppResult<Option<i32>> {
    let credited = store
        .get_user(user_id)?
        .map(|u| u.boosts_credited)
        .unwrap_or(0);
    let delta = current - credited;
    if delta <= 0 {
        return Ok(None);
    }
    let granted = delta * bonus;
    let balance = store.adjust_balance(user_id, granted)?;
    store.increment_stat(user_id, UserStat::BoostsCredited, delta)?;
    tracing::info!(user_id, boosts = delta, granted, balance, "channel boosts credited");
    Ok(Some(granted))
}

/// Admin grant (or deduction). Refuses to push a balance negative.
pub fn grant(store: &dyn Store, user_id: i64, amount: i32) -> AppResult<i32> {
    if amount < 0 && store.balance(user_id)? + amount < 0 {
        return Err(AppError::insufficient_funds(
            "deduction would make the balance negative",
        ));
    }
    store.adjust_balance(user_id, amount)
}
