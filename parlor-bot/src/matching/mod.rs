use parlor_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Gender, Interest, Profile, SwipeStatus, UserStat};
use crate::store::Store;

pub mod locality;

/// What a swipe produced, from the actor's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeOutcome {
    /// Decision stored, nothing else happened.
    Recorded,
    /// The pair already existed; nothing was stored and no stats moved.
    Duplicate,
    /// The like was mutual and a new match row was created.
    Matched,
}

/// Records one swipe decision. Replays of the same (actor, target) pair
/// are absorbed before any counter moves, so a double-tapped button can
/// never inflate stats or spawn a second match.
pub fn submit_swipe(
    store: &dyn Store,
    actor: i64,
    target: i64,
    status: SwipeStatus,
) -> AppResult<SwipeOutcome> {
    if actor == target {
        return Err(AppError::bad_request("cannot swipe on yourself"));
    }
    if !store.record_swipe(actor, target, status)? {
        return Ok(SwipeOutcome::Duplicate);
    }

    store.increment_stat(actor, UserStat::Swipes, 1)?;
    if status == SwipeStatus::Like {
        store.increment_stat(actor, UserStat::LikesGiven, 1)?;
        if store.has_like(target, actor)? && store.insert_match_if_absent(actor, target)? {
            store.increment_stat(actor, UserStat::Matches, 1)?;
            store.increment_stat(target, UserStat::Matches, 1)?;
            tracing::info!(actor, target, "mutual like, match created");
            return Ok(SwipeOutcome::Matched);
        }
    }
    Ok(SwipeOutcome::Recorded)
}

/// Next profile for the actor's queue. Tries the actor's own locality
/// first and silently widens to everywhere once the local pool is
/// exhausted.
pub fn next_candidate(store: &dyn Store, actor: i64) -> AppResult<Option<Profile>> {
    let profile = store
        .get_profile(actor)?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "create a profile first"))?;
    let gender = Gender::parse(&profile.gender)
        .ok_or_else(|| AppError::internal(format!("bad stored gender: {}", profile.gender)))?;
    let interest = Interest::parse(&profile.interest)
        .ok_or_else(|| AppError::internal(format!("bad stored interest: {}", profile.interest)))?;

    let locality = Some(profile.normalized_city.as_str()).filter(|c| !c.is_empty());
    if let Some(city) = locality {
        if let Some(found) = store.next_candidate_profile(actor, gender, interest, Some(city))? {
            return Ok(Some(found));
        }
    }
    store.next_candidate_profile(actor, gender, interest, None)
}

/// Users who liked `target` and are still waiting for an answer.
pub fn who_liked_me(store: &dyn Store, target: i64) -> AppResult<Vec<i64>> {
    store.who_liked_me(target)
}
