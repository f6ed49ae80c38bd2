use chrono::{NaiveDate, Utc};
use diesel::dsl::{exists, max, not};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::upsert::excluded;
use uuid::Uuid;

use parlor_shared::clients::db::DbPool;
use parlor_shared::errors::{AppError, AppResult};

use crate::game::blackjack::BlackjackSession;
use crate::models::{
    Candidate, Contact, Gender, Interest, ItemKind, MediaItem, MediaKind, NewCandidate, NewMatch,
    NewMediaItem, NewPurchase, NewSantaEntry, NewSessionRow, NewShopItem, NewSwipe, NewUser,
    NewVote, NewWallet, Profile, ProfileRecord, Purchase, SantaEntry, SessionRow, ShopItem,
    SwipeStatus, User, UserStat,
};
use crate::schema::{
    admin_users, blackjack_boosts, blackjack_sessions, candidates, contacts, feature_flags,
    matches, profile_media, profiles, purchases, secret_santa_entries, shop_items,
    swipe_decisions, users, votes, wallets,
};
use crate::store::Store;

type PgConn = PooledConnection<ConnectionManager<PgConnection>>;

/// Postgres-backed record store. Uniqueness of swipe pairs, match pairs
/// and vote pairs is carried by unique indexes, so re-delivered updates
/// collapse into no-ops at the insert.
pub struct PgStore {
    pool: DbPool,
    initial_balance: i32,
}

impl PgStore {
    pub fn new(pool: DbPool, initial_balance: i32) -> Self {
        Self {
            pool,
            initial_balance,
        }
    }

    fn conn(&self) -> AppResult<PgConn> {
        self.pool
            .get()
            .map_err(|e| AppError::internal(format!("failed to get db connection: {e}")))
    }

    fn ensure_wallet(&self, conn: &mut PgConn, user_id: i64) -> AppResult<()> {
        diesel::insert_into(wallets::table)
            .values(&NewWallet {
                user_id,
                balance: self.initial_balance,
            })
            .on_conflict(wallets::user_id)
            .do_nothing()
            .execute(conn)?;
        Ok(())
    }
}

impl Store for PgStore {
    // --- Users ---

    fn upsert_user_basic(&self, user: &NewUser<'_>) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::insert_into(users::table)
            .values(user)
            .on_conflict(users::id)
            .do_update()
            .set((
                users::username.eq(excluded(users::username)),
                users::first_name.eq(excluded(users::first_name)),
                users::last_name.eq(excluded(users::last_name)),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    fn get_user(&self, user_id: i64) -> AppResult<Option<User>> {
        let mut conn = self.conn()?;
        let user = users::table
            .find(user_id)
            .first::<User>(&mut conn)
            .optional()?;
        Ok(user)
    }

    fn set_user_language(&self, user_id: i64, language: &str) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::update(users::table.find(user_id))
            .set(users::language.eq(language))
            .execute(&mut conn)?;
        Ok(())
    }

    fn set_user_gender(&self, user_id: i64, gender: Gender) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::update(users::table.find(user_id))
            .set(users::gender.eq(gender.as_str()))
            .execute(&mut conn)?;
        Ok(())
    }

    fn find_user_by_username(&self, username: &str) -> AppResult<Option<i64>> {
        let mut conn = self.conn()?;
        let id = users::table
            .filter(users::username.eq(username))
            .select(users::id)
            .first::<i64>(&mut conn)
            .optional()?;
        Ok(id)
    }

    fn increment_stat(&self, user_id: i64, stat: UserStat, delta: i32) -> AppResult<()> {
        let mut conn = self.conn()?;
        let target = users::table.find(user_id);
        match stat {
            UserStat::Swipes => diesel::update(target)
                .set(users::swipes.eq(users::swipes + delta))
                .execute(&mut conn)?,
            UserStat::LikesGiven => diesel::update(target)
                .set(users::likes_given.eq(users::likes_given + delta))
                .execute(&mut conn)?,
            UserStat::Matches => diesel::update(target)
                .set(users::matches.eq(users::matches + delta))
                .execute(&mut conn)?,
            UserStat::VotesCast => diesel::update(target)
                .set(users::votes_cast.eq(users::votes_cast + delta))
                .execute(&mut conn)?,
            UserStat::GamesPlayed => diesel::update(target)
                .set(users::games_played.eq(users::games_played + delta))
                .execute(&mut conn)?,
            UserStat::CandidatesSubmitted => diesel::update(target)
                .set(users::candidates_submitted.eq(users::candidates_submitted + delta))
                .execute(&mut conn)?,
            UserStat::Purchases => diesel::update(target)
                .set(users::purchases.eq(users::purchases + delta))
                .execute(&mut conn)?,
            UserStat::BoostsCredited => diesel::update(target)
                .set(users::boosts_credited.eq(users::boosts_credited + delta))
                .execute(&mut conn)?,
        };
        Ok(())
    }

    fn wipe_user(&self, user_id: i64) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::delete(profile_media::table.filter(profile_media::user_id.eq(user_id)))
            .execute(&mut conn)?;
        diesel::delete(profiles::table.find(user_id)).execute(&mut conn)?;
        diesel::delete(
            swipe_decisions::table.filter(
                swipe_decisions::actor_id
                    .eq(user_id)
                    .or(swipe_decisions::target_id.eq(user_id)),
            ),
        )
        .execute(&mut conn)?;
        diesel::delete(
            matches::table.filter(matches::user_a.eq(user_id).or(matches::user_b.eq(user_id))),
        )
        .execute(&mut conn)?;
        diesel::delete(blackjack_sessions::table.find(user_id)).execute(&mut conn)?;
        diesel::delete(blackjack_boosts::table.find(user_id)).execute(&mut conn)?;
        diesel::delete(votes::table.filter(votes::user_id.eq(user_id))).execute(&mut conn)?;
        diesel::delete(candidates::table.filter(candidates::user_id.eq(user_id)))
            .execute(&mut conn)?;
        diesel::delete(purchases::table.filter(purchases::buyer_id.eq(user_id)))
            .execute(&mut conn)?;
        diesel::delete(contacts::table.find(user_id)).execute(&mut conn)?;
        diesel::delete(secret_santa_entries::table.find(user_id)).execute(&mut conn)?;
        diesel::delete(wallets::table.find(user_id)).execute(&mut conn)?;
        diesel::delete(users::table.find(user_id)).execute(&mut conn)?;
        Ok(())
    }

    // --- Wallet ledger ---

    fn balance(&self, user_id: i64) -> AppResult<i32> {
        let mut conn = self.conn()?;
        self.ensure_wallet(&mut conn, user_id)?;
        let balance = wallets::table
            .find(user_id)
            .select(wallets::balance)
            .first::<i32>(&mut conn)?;
        Ok(balance)
    }

    fn has_wallet(&self, user_id: i64) -> AppResult<bool> {
        let mut conn = self.conn()?;
        let found = diesel::select(exists(wallets::table.find(user_id)))
            .get_result::<bool>(&mut conn)?;
        Ok(found)
    }

    fn adjust_balance(&self, user_id: i64, delta: i32) -> AppResult<i32> {
        let mut conn = self.conn()?;
        self.ensure_wallet(&mut conn, user_id)?;
        let balance = diesel::update(wallets::table.find(user_id))
            .set(wallets::balance.eq(wallets::balance + delta))
            .returning(wallets::balance)
            .get_result::<i32>(&mut conn)?;
        Ok(balance)
    }

    fn last_checkin(&self, user_id: i64) -> AppResult<Option<NaiveDate>> {
        let mut conn = self.conn()?;
        let date = wallets::table
            .find(user_id)
            .select(wallets::last_checkin)
            .first::<Option<NaiveDate>>(&mut conn)
            .optional()?;
        Ok(date.flatten())
    }

    fn record_checkin(&self, user_id: i64, today: NaiveDate, reward: i32) -> AppResult<i32> {
        let mut conn = self.conn()?;
        self.ensure_wallet(&mut conn, user_id)?;
        let balance = diesel::update(wallets::table.find(user_id))
            .set((
                wallets::balance.eq(wallets::balance + reward),
                wallets::last_checkin.eq(today),
            ))
            .returning(wallets::balance)
            .get_result::<i32>(&mut conn)?;
        Ok(balance)
    }

    // --- Dating profiles ---

    fn upsert_profile(&self, record: &ProfileRecord) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::insert_into(profiles::table)
            .values(record)
            .on_conflict(profiles::user_id)
            .do_update()
            .set(record)
            .execute(&mut conn)?;
        Ok(())
    }

    fn get_profile(&self, user_id: i64) -> AppResult<Option<Profile>> {
        let mut conn = self.conn()?;
        let profile = profiles::table
            .find(user_id)
            .first::<Profile>(&mut conn)
            .optional()?;
        Ok(profile)
    }

    fn set_profile_active(&self, user_id: i64, active: bool) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::update(profiles::table.find(user_id))
            .set((
                profiles::active.eq(active),
                profiles::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    fn replace_profile_media(&self, user_id: i64, media: &[(String, MediaKind)]) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::delete(profile_media::table.filter(profile_media::user_id.eq(user_id)))
            .execute(&mut conn)?;
        let rows: Vec<NewMediaItem> = media
            .iter()
            .enumerate()
            .map(|(position, (file_id, kind))| NewMediaItem {
                id: Uuid::new_v4(),
                user_id,
                file_id: file_id.clone(),
                kind: kind.as_str().to_string(),
                position: position as i32,
            })
            .collect();
        diesel::insert_into(profile_media::table)
            .values(&rows)
            .execute(&mut conn)?;
        Ok(())
    }

    fn list_profile_media(&self, user_id: i64) -> AppResult<Vec<MediaItem>> {
        let mut conn = self.conn()?;
        let items = profile_media::table
            .filter(profile_media::user_id.eq(user_id))
            .order(profile_media::position.asc())
            .load::<MediaItem>(&mut conn)?;
        Ok(items)
    }

    // --- Swipes & matches ---

    fn record_swipe(&self, actor: i64, target: i64, status: SwipeStatus) -> AppResult<bool> {
        let mut conn = self.conn()?;
        let inserted = diesel::insert_into(swipe_decisions::table)
            .values(&NewSwipe {
                id: Uuid::new_v4(),
                actor_id: actor,
                target_id: target,
                status: status.as_str().to_string(),
            })
            .on_conflict((swipe_decisions::actor_id, swipe_decisions::target_id))
            .do_nothing()
            .execute(&mut conn)?;
        Ok(inserted > 0)
    }

    fn has_like(&self, actor: i64, target: i64) -> AppResult<bool> {
        let mut conn = self.conn()?;
        let found = diesel::select(exists(
            swipe_decisions::table
                .filter(swipe_decisions::actor_id.eq(actor))
                .filter(swipe_decisions::target_id.eq(target))
                .filter(swipe_decisions::status.eq(SwipeStatus::Like.as_str())),
        ))
        .get_result::<bool>(&mut conn)?;
        Ok(found)
    }

    fn insert_match_if_absent(&self, a: i64, b: i64) -> AppResult<bool> {
        let (lo, hi) = (a.min(b), a.max(b));
        let mut conn = self.conn()?;
        let inserted = diesel::insert_into(matches::table)
            .values(&NewMatch {
                id: Uuid::new_v4(),
                user_a: lo,
                user_b: hi,
            })
            .on_conflict((matches::user_a, matches::user_b))
            .do_nothing()
            .execute(&mut conn)?;
        Ok(inserted > 0)
    }

    fn match_exists(&self, a: i64, b: i64) -> AppResult<bool> {
        let (lo, hi) = (a.min(b), a.max(b));
        let mut conn = self.conn()?;
        let found = diesel::select(exists(
            matches::table
                .filter(matches::user_a.eq(lo))
                .filter(matches::user_b.eq(hi)),
        ))
        .get_result::<bool>(&mut conn)?;
        Ok(found)
    }

    fn next_candidate_profile(
        &self,
        actor: i64,
        actor_gender: Gender,
        actor_interest: Interest,
        locality: Option<&str>,
    ) -> AppResult<Option<Profile>> {
        let mut conn = self.conn()?;
        let already_seen = swipe_decisions::table
            .filter(swipe_decisions::actor_id.eq(actor))
            .select(swipe_decisions::target_id);

        let mut query = profiles::table
            .filter(profiles::active.eq(true))
            .filter(profiles::user_id.ne(actor))
            .filter(profiles::interest.eq_any(vec![actor_gender.as_str(), Interest::Any.as_str()]))
            .filter(not(profiles::user_id.eq_any(already_seen)))
            .into_boxed();
        if actor_interest != Interest::Any {
            query = query.filter(profiles::gender.eq(actor_interest.as_str()));
        }
        if let Some(city) = locality {
            query = query.filter(profiles::normalized_city.eq(city.to_string()));
        }

        let profile = query
            .order(profiles::updated_at.desc())
            .first::<Profile>(&mut conn)
            .optional()?;
        Ok(profile)
    }

    fn who_liked_me(&self, target: i64) -> AppResult<Vec<i64>> {
        let mut conn = self.conn()?;
        let likers = swipe_decisions::table
            .filter(swipe_decisions::target_id.eq(target))
            .filter(swipe_decisions::status.eq(SwipeStatus::Like.as_str()))
            .order(swipe_decisions::created_at.desc())
            .select(swipe_decisions::actor_id)
            .load::<i64>(&mut conn)?;
        let answered: std::collections::HashSet<i64> = swipe_decisions::table
            .filter(swipe_decisions::actor_id.eq(target))
            .select(swipe_decisions::target_id)
            .load::<i64>(&mut conn)?
            .into_iter()
            .collect();
        Ok(likers
            .into_iter()
            .filter(|id| !answered.contains(id))
            .collect())
    }

    // --- Blackjack ---

    fn save_blackjack_session(&self, session: &BlackjackSession) -> AppResult<()> {
        let mut conn = self.conn()?;
        let row = NewSessionRow {
            user_id: session.user_id,
            deck: serde_json::to_value(&session.deck)
                .map_err(|e| AppError::internal(format!("serialize deck: {e}")))?,
            player_hand: serde_json::to_value(&session.player_hand)
                .map_err(|e| AppError::internal(format!("serialize player hand: {e}")))?,
            dealer_hand: serde_json::to_value(&session.dealer_hand)
                .map_err(|e| AppError::internal(format!("serialize dealer hand: {e}")))?,
            bet: session.bet,
            status: session.status.clone(),
            updated_at: Utc::now(),
        };
        diesel::insert_into(blackjack_sessions::table)
            .values(&row)
            .on_conflict(blackjack_sessions::user_id)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    fn load_blackjack_session(&self, user_id: i64) -> AppResult<Option<BlackjackSession>> {
        let mut conn = self.conn()?;
        let row = blackjack_sessions::table
            .find(user_id)
            .first::<SessionRow>(&mut conn)
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };
        let session = BlackjackSession {
            user_id: row.user_id,
            deck: serde_json::from_value(row.deck)
                .map_err(|e| AppError::internal(format!("deserialize deck: {e}")))?,
            player_hand: serde_json::from_value(row.player_hand)
                .map_err(|e| AppError::internal(format!("deserialize player hand: {e}")))?,
            dealer_hand: serde_json::from_value(row.dealer_hand)
                .map_err(|e| AppError::internal(format!("deserialize dealer hand: {e}")))?,
            bet: row.bet,
            status: row.status,
        };
        Ok(Some(session))
    }

    fn clear_blackjack_session(&self, user_id: i64) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::delete(blackjack_sessions::table.find(user_id)).execute(&mut conn)?;
        Ok(())
    }

    fn blackjack_boost(&self, user_id: i64) -> AppResult<f64> {
        let mut conn = self.conn()?;
        let boost = blackjack_boosts::table
            .find(user_id)
            .select(blackjack_boosts::boost)
            .first::<f64>(&mut conn)
            .optional()?;
        Ok(boost.unwrap_or(0.0))
    }

    fn set_blackjack_boost(&self, user_id: i64, boost: f64) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::insert_into(blackjack_boosts::table)
            .values((
                blackjack_boosts::user_id.eq(user_id),
                blackjack_boosts::boost.eq(boost),
            ))
            .on_conflict(blackjack_boosts::user_id)
            .do_update()
            .set(blackjack_boosts::boost.eq(boost))
            .execute(&mut conn)?;
        Ok(())
    }

    // --- Contest candidates & votes ---

    fn upsert_candidate(&self, candidate: &NewCandidate) -> AppResult<bool> {
        let mut conn = self.conn()?;
        let existing = candidates::table
            .filter(candidates::user_id.eq(candidate.user_id))
            .select(candidates::id)
            .first::<i32>(&mut conn)
            .optional()?;
        match existing {
            Some(id) => {
                diesel::update(candidates::table.find(id))
                    .set((
                        candidates::name.eq(&candidate.name),
                        candidates::age.eq(candidate.age),
                        candidates::gender.eq(&candidate.gender),
                        candidates::instagram.eq(&candidate.instagram),
                        candidates::photo_file_id.eq(&candidate.photo_file_id),
                        candidates::approved.eq(candidate.approved),
                    ))
                    .execute(&mut conn)?;
                Ok(false)
            }
            None => {
                diesel::insert_into(candidates::table)
                    .values(candidate)
                    .execute(&mut conn)?;
                Ok(true)
            }
        }
    }

    fn next_unrated_candidate(
        &self,
        user_id: i64,
        target_gender: Option<Gender>,
    ) -> AppResult<Option<Candidate>> {
        let mut conn = self.conn()?;
        let rated = votes::table
            .filter(votes::user_id.eq(user_id))
            .select(votes::candidate_id);

        let mut query = candidates::table
            .filter(candidates::approved.eq(true))
            .filter(candidates::user_id.ne(user_id))
            .filter(not(candidates::id.eq_any(rated)))
            .into_boxed();
        if let Some(gender) = target_gender {
            query = query.filter(candidates::gender.eq(gender.as_str()));
        }

        let candidate = query
            .order(candidates::id.asc())
            .first::<Candidate>(&mut conn)
            .optional()?;
        Ok(candidate)
    }

    fn add_vote(&self, user_id: i64, candidate_id: i32, rating: i32) -> AppResult<bool> {
        let mut conn = self.conn()?;
        let already = diesel::select(exists(
            votes::table
                .filter(votes::user_id.eq(user_id))
                .filter(votes::candidate_id.eq(candidate_id)),
        ))
        .get_result::<bool>(&mut conn)?;
        if already {
            return Ok(false);
        }
        diesel::insert_into(votes::table)
            .values(&NewVote {
                id: Uuid::new_v4(),
                user_id,
                candidate_id,
                rating,
            })
            .execute(&mut conn)?;
        Ok(true)
    }

    fn approve_candidate(&self, candidate_id: i32, approved: bool) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::update(candidates::table.find(candidate_id))
            .set(candidates::approved.eq(approved))
            .execute(&mut conn)?;
        Ok(())
    }

    // --- Shop ---

    fn list_shop_items(&self) -> AppResult<Vec<ShopItem>> {
        let mut conn = self.conn()?;
        let items = shop_items::table
            .order(shop_items::id.asc())
            .load::<ShopItem>(&mut conn)?;
        Ok(items)
    }

    fn get_shop_item(&self, item_id: i32) -> AppResult<Option<ShopItem>> {
        let mut conn = self.conn()?;
        let item = shop_items::table
            .find(item_id)
            .first::<ShopItem>(&mut conn)
            .optional()?;
        Ok(item)
    }

    fn ensure_shop_item(
        &self,
        code: &str,
        name: &str,
        kind: ItemKind,
        price: i32,
    ) -> AppResult<()> {
        let mut conn = self.conn()?;
        let exists_already = diesel::select(exists(
            shop_items::table.filter(shop_items::code.eq(code)),
        ))
        .get_result::<bool>(&mut conn)?;
        if !exists_already {
            diesel::insert_into(shop_items::table)
                .values(&NewShopItem {
                    code,
                    name,
                    kind: kind.as_str(),
                    price,
                })
                .execute(&mut conn)?;
        }
        Ok(())
    }

    fn create_purchase(&self, purchase: &NewPurchase) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::insert_into(purchases::table)
            .values(purchase)
            .execute(&mut conn)?;
        Ok(())
    }

    fn get_purchase(&self, id: Uuid) -> AppResult<Option<Purchase>> {
        let mut conn = self.conn()?;
        let purchase = purchases::table
            .find(id)
            .first::<Purchase>(&mut conn)
            .optional()?;
        Ok(purchase)
    }

    fn update_purchase_details(&self, id: Uuid, details: &serde_json::Value) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::update(purchases::table.find(id))
            .set(purchases::details.eq(details.clone()))
            .execute(&mut conn)?;
        Ok(())
    }

    fn set_purchase_recipient(
        &self,
        id: Uuid,
        recipient_id: i64,
        username: Option<&str>,
    ) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::update(purchases::table.find(id))
            .set((
                purchases::recipient_id.eq(recipient_id),
                purchases::recipient_username.eq(username),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    fn mark_purchase_notified(&self, id: Uuid) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::update(purchases::table.find(id))
            .set(purchases::notified.eq(true))
            .execute(&mut conn)?;
        Ok(())
    }

    fn update_purchase_status(&self, id: Uuid, status: &str) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::update(purchases::table.find(id))
            .set(purchases::status.eq(status))
            .execute(&mut conn)?;
        Ok(())
    }

    fn pending_gifts_for(&self, user_id: i64, username: Option<&str>) -> AppResult<Vec<Purchase>> {
        let mut conn = self.conn()?;
        let mut query = purchases::table
            .filter(purchases::notified.eq(false))
            .into_boxed();
        query = match username {
            Some(name) => query.filter(
                purchases::recipient_id
                    .eq(user_id)
                    .or(purchases::recipient_username.eq(name.to_string())),
            ),
            None => query.filter(purchases::recipient_id.eq(user_id)),
        };
        let gifts = query
            .order(purchases::created_at.asc())
            .load::<Purchase>(&mut conn)?;
        Ok(gifts)
    }

    fn get_contact(&self, user_id: i64) -> AppResult<Option<Contact>> {
        let mut conn = self.conn()?;
        let contact = contacts::table
            .find(user_id)
            .first::<Contact>(&mut conn)
            .optional()?;
        Ok(contact)
    }

    fn upsert_contact(&self, contact: &Contact) -> AppResult<()> {
        let mut conn = self.conn()?;
        // AsChangeset skips None fields, so a hoodie checkout does not
        // erase the email saved by an earlier ticket checkout.
        diesel::insert_into(contacts::table)
            .values(contact)
            .on_conflict(contacts::user_id)
            .do_update()
            .set(contact)
            .execute(&mut conn)?;
        Ok(())
    }

    // --- Gift draw ---

    fn santa_entry(&self, user_id: i64) -> AppResult<Option<SantaEntry>> {
        let mut conn = self.conn()?;
        let entry = secret_santa_entries::table
            .find(user_id)
            .first::<SantaEntry>(&mut conn)
            .optional()?;
        Ok(entry)
    }

    fn assign_santa_number(&self, user_id: i64) -> AppResult<i32> {
        let mut conn = self.conn()?;
        let existing = secret_santa_entries::table
            .find(user_id)
            .select(secret_santa_entries::gift_number)
            .first::<i32>(&mut conn)
            .optional()?;
        if let Some(number) = existing {
            return Ok(number);
        }
        let highest = secret_santa_entries::table
            .select(max(secret_santa_entries::gift_number))
            .first::<Option<i32>>(&mut conn)?
            .unwrap_or(0);
        let number = highest + 1;
        diesel::insert_into(secret_santa_entries::table)
            .values(&NewSantaEntry {
                user_id,
                gift_number: number,
            })
            .execute(&mut conn)?;
        Ok(number)
    }

    fn update_santa_details(&self, user_id: i64, name: &str, gift_photo_id: &str) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::update(secret_santa_entries::table.find(user_id))
            .set((
                secret_santa_entries::name.eq(name),
                secret_santa_entries::gift_photo_id.eq(gift_photo_id),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    // --- Admin & feature flags ---

    fn is_admin(&self, user_id: i64) -> AppResult<bool> {
        let mut conn = self.conn()?;
        let found = diesel::select(exists(admin_users::table.find(user_id)))
            .get_result::<bool>(&mut conn)?;
        Ok(found)
    }

    fn is_feature_enabled(&self, name: &str, default: bool) -> AppResult<bool> {
        let mut conn = self.conn()?;
        let enabled = feature_flags::table
            .find(name)
            .select(feature_flags::enabled)
            .first::<bool>(&mut conn)
            .optional()?;
        Ok(enabled.unwrap_or(default))
    }

    fn set_feature_enabled(&self, name: &str, enabled: bool) -> AppResult<()> {
        let mut conn = self.conn()?;
        diesel::insert_into(feature_flags::table)
            .values((
                feature_flags::name.eq(name),
                feature_flags::enabled.eq(enabled),
            ))
            .on_conflict(feature_flags::name)
            .do_update()
            .set(feature_flags::enabled.eq(enabled))
            .execute(&mut conn)?;
        Ok(())
    }
}
