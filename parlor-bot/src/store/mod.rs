use chrono::NaiveDate;
use uuid::Uuid;

use parlor_shared::errors::AppResult;

use crate::game::blackjack::BlackjackSession;
use crate::models::{
    Candidate, Contact, Gender, Interest, ItemKind, MediaItem, MediaKind, NewCandidate,
    NewPurchase, NewUser, Profile, ProfileRecord, Purchase, SantaEntry, ShopItem, SwipeStatus,
    User, UserStat,
};

pub mod pg;

#[cfg(test)]
pub mod memory;

/// Record-store contract consumed by the engine code. Production wiring
/// uses [`pg::PgStore`]; tests run against an in-memory implementation.
///
/// Every method is an independent idempotent operation. There are no
/// cross-statement transactions: the platform delivers one update per
/// conversation at a time, so all mutation for a given user is serialized
/// upstream of this trait.
pub trait Store: Send + Sync {
    // --- Users ---

    /// Insert-or-refresh the basic identity fields. Never touches stats,
    /// language or gender.
    fn upsert_user_basic(&self, user: &NewUser<'_>) -> AppResult<()>;
    fn get_user(&self, user_id: i64) -> AppResult<Option<User>>;
    fn set_user_language(&self, user_id: i64, language: &str) -> AppResult<()>;
    fn set_user_gender(&self, user_id: i64, gender: Gender) -> AppResult<()>;
    fn find_user_by_username(&self, username: &str) -> AppResult<Option<i64>>;
    fn increment_stat(&self, user_id: i64, stat: UserStat, delta: i32) -> AppResult<()>;
    /// Admin wipe: deletes the user and every owned record, including
    /// matches the user is either side of.
    fn wipe_user(&self, user_id: i64) -> AppResult<()>;

    // --- Wallet ledger ---

    /// Reads the balance, seeding a fresh wallet on first touch.
    fn balance(&self, user_id: i64) -> AppResult<i32>;
    /// Whether the user has ever touched the wallet. Never seeds one.
    fn has_wallet(&self, user_id: i64) -> AppResult<bool>;
    /// Atomic increment; returns the new balance.
    fn adjust_balance(&self, user_id: i64, delta: i32) -> AppResult<i32>;
    fn last_checkin(&self, user_id: i64) -> AppResult<Option<NaiveDate>>;
    fn record_checkin(&self, user_id: i64, today: NaiveDate, reward: i32) -> AppResult<i32>;

    // --- Dating profiles ---

    fn upsert_profile(&self, record: &ProfileRecord) -> AppResult<()>;
    fn get_profile(&self, user_id: i64) -> AppResult<Option<Profile>>;
    fn set_profile_active(&self, user_id: i64, active: bool) -> AppResult<()>;
    /// Replaces the full ordered attachment list for a profile.
    fn replace_profile_media(&self, user_id: i64, media: &[(String, MediaKind)]) -> AppResult<()>;
    fn list_profile_media(&self, user_id: i64) -> AppResult<Vec<MediaItem>>;

    // --- Swipes & matches ---

    /// Insert-or-ignore on the (actor, target) pair; returns false when the
    /// decision was already recorded. Stat counters are the caller's job.
    fn record_swipe(&self, actor: i64, target: i64, status: SwipeStatus) -> AppResult<bool>;
    fn has_like(&self, actor: i64, target: i64) -> AppResult<bool>;
    /// Canonically ordered insert-if-absent; returns true when the row was
    /// actually created.
    fn insert_match_if_absent(&self, a: i64, b: i64) -> AppResult<bool>;
    fn match_exists(&self, a: i64, b: i64) -> AppResult<bool>;
    /// Most recently updated active profile the actor has not swiped on,
    /// honoring gender compatibility and interest reciprocity, optionally
    /// restricted to one normalized locality.
    fn next_candidate_profile(
        &self,
        actor: i64,
        actor_gender: Gender,
        actor_interest: Interest,
        locality: Option<&str>,
    ) -> AppResult<Option<Profile>>;
    /// Actors who liked `target` and have not been swiped back, most
    /// recent first.
    fn who_liked_me(&self, target: i64) -> AppResult<Vec<i64>>;

    // --- Blackjack ---

    /// Upsert-by-user-id: at most one live session per user.
    fn save_blackjack_session(&self, session: &BlackjackSession) -> AppResult<()>;
    fn load_blackjack_session(&self, user_id: i64) -> AppResult<Option<BlackjackSession>>;
    fn clear_blackjack_session(&self, user_id: i64) -> AppResult<()>;
    fn blackjack_boost(&self, user_id: i64) -> AppResult<f64>;
    fn set_blackjack_boost(&self, user_id: i64, boost: f64) -> AppResult<()>;

    // --- Contest candidates & votes ---

    /// Create or refresh a user's contest entry; re-submission resets the
    /// approval flag. Returns true when the entry is new.
    fn upsert_candidate(&self, candidate: &NewCandidate) -> AppResult<bool>;
    fn next_unrated_candidate(
        &self,
        user_id: i64,
        target_gender: Option<Gender>,
    ) -> AppResult<Option<Candidate>>;
    /// Returns false when the user already voted on this candidate.
    fn add_vote(&self, user_id: i64, candidate_id: i32, rating: i32) -> AppResult<bool>;
    fn approve_candidate(&self, candidate_id: i32, approved: bool) -> AppResult<()>;

    // --- Shop ---

    fn list_shop_items(&self) -> AppResult<Vec<ShopItem>>;
    fn get_shop_item(&self, item_id: i32) -> AppResult<Option<ShopItem>>;
    fn ensure_shop_item(&self, code: &str, name: &str, kind: ItemKind, price: i32)
        -> AppResult<()>;
    fn create_purchase(&self, purchase: &NewPurchase) -> AppResult<()>;
    fn get_purchase(&self, id: Uuid) -> AppResult<Option<Purchase>>;
    fn update_purchase_details(&self, id: Uuid, details: &serde_json::Value) -> AppResult<()>;
    fn set_purchase_recipient(
        &self,
        id: Uuid,
        recipient_id: i64,
        username: Option<&str>,
    ) -> AppResult<()>;
    fn mark_purchase_notified(&self, id: Uuid) -> AppResult<()>;
    fn update_purchase_status(&self, id: Uuid, status: &str) -> AppResult<()>;
    /// Unnotified gifts addressed to this user by id or username.
    fn pending_gifts_for(&self, user_id: i64, username: Option<&str>) -> AppResult<Vec<Purchase>>;
    fn get_contact(&self, user_id: i64) -> AppResult<Option<Contact>>;
    fn upsert_contact(&self, contact: &Contact) -> AppResult<()>;

    // --- Gift draw ---

    fn santa_entry(&self, user_id: i64) -> AppResult<Option<SantaEntry>>;
    /// Sequential number, stable across re-registration.
    fn assign_santa_number(&self, user_id: i64) -> AppResult<i32>;
    fn update_santa_details(&self, user_id: i64, name: &str, gift_photo_id: &str) -> AppResult<()>;

    // --- Admin & feature flags ---

    fn is_admin(&self, user_id: i64) -> AppResult<bool>;
    fn is_feature_enabled(&self, name: &str, default: bool) -> AppResult<bool>;
    fn set_feature_enabled(&self, name: &str, enabled: bool) -> AppResult<()>;
}
