use parlor_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Candidate, Gender, UserStat};
use crate::store::Store;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 10;

/// Voters rate the opposite gender; a voter with no recorded gender sees
/// everyone.
pub fn target_gender_for_voter(voter_gender: Option<Gender>) -> Option<Gender> {
    match voter_gender {
        Some(Gender::Male) => Some(Gender::Female),
        Some(Gender::Female) => Some(Gender::Male),
        None => None,
    }
}

/// Next approved candidate the voter has not rated yet, lowest entry
/// number first so everyone walks the same queue.
pub fn next_unrated(
    store: &dyn Store,
    voter: i64,
    voter_gender: Option<Gender>,
) -> AppResult<Option<Candidate>> {
    store.next_unrated_candidate(voter, target_gender_for_voter(voter_gender))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Counted,
    AlreadyVoted,
}

/// Records one rating. A replayed callback for an already-rated candidate
/// is absorbed without touching the stats counter.
pub fn cast_vote(
    store: &dyn Store,
    voter: i64,
    candidate_id: i32,
    rating: i32,
) -> AppResult<VoteOutcome> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            format!("rating must be between {MIN_RATING} and {MAX_RATING}"),
        ));
    }
    if !store.add_vote(voter, candidate_id, rating)? {
        return Ok(VoteOutcome::AlreadyVoted);
    }
    store.increment_stat(voter, UserStat::VotesCast, 1)?;
    Ok(VoteOutcome::Counted)
}
