//! In-memory [`Store`] used by unit tests. Mirrors the Postgres
//! semantics closely enough for the engine code to be exercised without
//! a database: seeded wallets, insert-or-ignore swipe pairs, canonical
//! match ordering, recency-ordered queues.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use parlor_shared::errors::AppResult;

use crate::game::blackjack::BlackjackSession;
use crate::models::{
    Candidate, Contact, Gender, Interest, ItemKind, MediaItem, MediaKind, NewCandidate,
    NewPurchase, NewUser, Profile, ProfileRecord, Purchase, SantaEntry, ShopItem, SwipeStatus,
    User, UserStat,
};
use crate::store::Store;

struct SwipeRec {
    actor: i64,
    target: i64,
    status: SwipeStatus,
}

#[derive(Default)]
struct Inner {
    users: HashMap<i64, User>,
    wallets: HashMap<i64, (i32, Option<NaiveDate>)>,
    profiles: HashMap<i64, Profile>,
    media: HashMap<i64, Vec<MediaItem>>,
    swipes: Vec<SwipeRec>,
    matches: HashSet<(i64, i64)>,
    sessions: HashMap<i64, BlackjackSession>,
    boosts: HashMap<i64, f64>,
    candidates: Vec<Candidate>,
    next_candidate_id: i32,
    votes: HashMap<(i64, i32), i32>,
    shop_items: Vec<ShopItem>,
    next_item_id: i32,
    purchases: HashMap<Uuid, Purchase>,
    purchase_order: Vec<Uuid>,
    contacts: HashMap<i64, Contact>,
    santa: HashMap<i64, SantaEntry>,
    admins: HashSet<i64>,
    flags: HashMap<String, bool>,
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
    initial_balance: i32,
}

impl MemoryStore {
    pub fn new(initial_balance: i32) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            initial_balance,
        }
    }

    fn blank_user(id: i64) -> User {
        User {
            id,
            username: None,
            first_name: None,
            last_name: None,
            language: None,
            gender: None,
            swipes: 0,
            likes_given: 0,
            matches: 0,
            votes_cast: 0,
            games_played: 0,
            candidates_submitted: 0,
            purchases: 0,
            boosts_credited: 0,
            created_at: Utc::now(),
        }
    }
}

impl Store for MemoryStore {
    fn upsert_user_basic(&self, user: &NewUser<'_>) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner
            .users
            .entry(user.id)
            .or_insert_with(|| Self::blank_user(user.id));
        entry.username = user.username.map(str::to_string);
        entry.first_name = user.first_name.map(str::to_string);
        entry.last_name = user.last_name.map(str::to_string);
        Ok(())
    }

    fn get_user(&self, user_id: i64) -> AppResult<Option<User>> {
        Ok(self.inner.lock().unwrap().users.get(&user_id).cloned())
    }

    fn set_user_language(&self, user_id: i64, language: &str) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.get_mut(&user_id) {
            user.language = Some(language.to_string());
        }
        Ok(())
    }

    fn set_user_gender(&self, user_id: i64, gender: Gender) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.get_mut(&user_id) {
            user.gender = Some(gender.as_str().to_string());
        }
        Ok(())
    }

    fn find_user_by_username(&self, username: &str) -> AppResult<Option<i64>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .values()
            .find(|u| u.username.as_deref() == Some(username))
            .map(|u| u.id))
    }

    fn increment_stat(&self, user_id: i64, stat: UserStat, delta: i32) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .entry(user_id)
            .or_insert_with(|| Self::blank_user(user_id));
        let field = match stat {
            UserStat::Swipes => &mut user.swipes,
            UserStat::LikesGiven => &mut user.likes_given,
            UserStat::Matches => &mut user.matches,
            UserStat::VotesCast => &mut user.votes_cast,
            UserStat::GamesPlayed => &mut user.games_played,
            UserStat::CandidatesSubmitted => &mut user.candidates_submitted,
            UserStat::Purchases => &mut user.purchases,
            UserStat::BoostsCredited => &mut user.boosts_credited,
        };
        *field += delta;
        Ok(())
    }

    fn wipe_user(&self, user_id: i64) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.users.remove(&user_id);
        inner.wallets.remove(&user_id);
        inner.profiles.remove(&user_id);
        inner.media.remove(&user_id);
        inner
            .swipes
            .retain(|s| s.actor != user_id && s.target != user_id);
        inner.matches.retain(|(a, b)| *a != user_id && *b != user_id);
        inner.sessions.remove(&user_id);
        inner.boosts.remove(&user_id);
        inner.candidates.retain(|c| c.user_id != user_id);
        inner.votes.retain(|(voter, _), _| *voter != user_id);
        let owned: Vec<Uuid> = inner
            .purchases
            .values()
            .filter(|p| p.buyer_id == user_id)
            .map(|p| p.id)
            .collect();
        for id in owned {
            inner.purchases.remove(&id);
            inner.purchase_order.retain(|p| *p != id);
        }
        inner.contacts.remove(&user_id);
        inner.santa.remove(&user_id);
        Ok(())
    }

    fn balance(&self, user_id: i64) -> AppResult<i32> {
        let mut inner = self.inner.lock().unwrap();
        let seed = self.initial_balance;
        Ok(inner.wallets.entry(user_id).or_insert((seed, None)).0)
    }

    fn has_wallet(&self, user_id: i64) -> AppResult<bool> {
        Ok(self.inner.lock().unwrap().wallets.contains_key(&user_id))
    }

    fn adjust_balance(&self, user_id: i64, delta: i32) -> AppResult<i32> {
        let mut inner = self.inner.lock().unwrap();
        let seed = self.initial_balance;
        let wallet = inner.wallets.entry(user_id).or_insert((seed, None));
        wallet.0 += delta;
        Ok(wallet.0)
    }

    fn last_checkin(&self, user_id: i64) -> AppResult<Option<NaiveDate>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.wallets.get(&user_id).and_then(|w| w.1))
    }

    fn record_checkin(&self, user_id: i64, today: NaiveDate, reward: i32) -> AppResult<i32> {
        let mut inner = self.inner.lock().unwrap();
        let seed = self.initial_balance;
        let wallet = inner.wallets.entry(user_id).or_insert((seed, None));
        wallet.0 += reward;
        wallet.1 = Some(today);
        Ok(wallet.0)
    }

    fn upsert_profile(&self, record: &ProfileRecord) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.profiles.insert(
            record.user_id,
            Profile {
                user_id: record.user_id,
                age: record.age,
                gender: record.gender.clone(),
                interest: record.interest.clone(),
                city: record.city.clone(),
                normalized_city: record.normalized_city.clone(),
                lat: record.lat,
                lon: record.lon,
                name: record.name.clone(),
                bio: record.bio.clone(),
                active: record.active,
                updated_at: record.updated_at,
            },
        );
        Ok(())
    }

    fn get_profile(&self, user_id: i64) -> AppResult<Option<Profile>> {
        Ok(self.inner.lock().unwrap().profiles.get(&user_id).cloned())
    }

    fn set_profile_active(&self, user_id: i64, active: bool) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(profile) = inner.profiles.get_mut(&user_id) {
            profile.active = active;
            profile.updated_at = Utc::now();
        }
        Ok(())
    }

    fn replace_profile_media(&self, user_id: i64, media: &[(String, MediaKind)]) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let items = media
            .iter()
            .enumerate()
            .map(|(position, (file_id, kind))| MediaItem {
                id: Uuid::new_v4(),
                user_id,
                file_id: file_id.clone(),
                kind: kind.as_str().to_string(),
                position: position as i32,
            })
            .collect();
        inner.media.insert(user_id, items);
        Ok(())
    }

    fn list_profile_media(&self, user_id: i64) -> AppResult<Vec<MediaItem>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.media.get(&user_id).cloned().unwrap_or_default())
    }

    fn record_swipe(&self, actor: i64, target: i64, status: SwipeStatus) -> AppResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .swipes
            .iter()
            .any(|s| s.actor == actor && s.target == target)
        {
            return Ok(false);
        }
        inner.swipes.push(SwipeRec {
            actor,
            target,
            status,
        });
        Ok(true)
    }

    fn has_like(&self, actor: i64, target: i64) -> AppResult<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.swipes.iter().any(|s| {
            s.actor == actor && s.target == target && s.status == SwipeStatus::Like
        }))
    }

    fn insert_match_if_absent(&self, a: i64, b: i64) -> AppResult<bool> {
        let key = (a.min(b), a.max(b));
        Ok(self.inner.lock().unwrap().matches.insert(key))
    }

    fn match_exists(&self, a: i64, b: i64) -> AppResult<bool> {
        let key = (a.min(b), a.max(b));
        Ok(self.inner.lock().unwrap().matches.contains(&key))
    }

    fn next_candidate_profile(
        &self,
        actor: i64,
        actor_gender: Gender,
        actor_interest: Interest,
        locality: Option<&str>,
    ) -> AppResult<Option<Profile>> {
        let inner = self.inner.lock().unwrap();
        let seen: HashSet<i64> = inner
            .swipes
            .iter()
            .filter(|s| s.actor == actor)
            .map(|s| s.target)
            .collect();
        let mut eligible: Vec<&Profile> = inner
            .profiles
            .values()
            .filter(|p| p.active && p.user_id != actor && !seen.contains(&p.user_id))
            .filter(|p| {
                Interest::parse(&p.interest)
                    .map(|i| i.accepts(actor_gender))
                    .unwrap_or(false)
            })
            .filter(|p| {
                Gender::parse(&p.gender)
                    .map(|g| actor_interest.accepts(g))
                    .unwrap_or(false)
            })
            .filter(|p| locality.map_or(true, |city| p.normalized_city == city))
            .collect();
        eligible.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(eligible.first().map(|p| (*p).clone()))
    }

    fn who_liked_me(&self, target: i64) -> AppResult<Vec<i64>> {
        let inner = self.inner.lock().unwrap();
        let answered: HashSet<i64> = inner
            .swipes
            .iter()
            .filter(|s| s.actor == target)
            .map(|s| s.target)
            .collect();
        Ok(inner
            .swipes
            .iter()
            .rev()
            .filter(|s| s.target == target && s.status == SwipeStatus::Like)
            .map(|s| s.actor)
            .filter(|actor| !answered.contains(actor))
            .collect())
    }

    fn save_blackjack_session(&self, session: &BlackjackSession) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.sessions.insert(session.user_id, session.clone());
        Ok(())
    }

    fn load_blackjack_session(&self, user_id: i64) -> AppResult<Option<BlackjackSession>> {
        Ok(self.inner.lock().unwrap().sessions.get(&user_id).cloned())
    }

    fn clear_blackjack_session(&self, user_id: i64) -> AppResult<()> {
        self.inner.lock().unwrap().sessions.remove(&user_id);
        Ok(())
    }

    fn blackjack_boost(&self, user_id: i64) -> AppResult<f64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.boosts.get(&user_id).copied().unwrap_or(0.0))
    }

    fn set_blackjack_boost(&self, user_id: i64, boost: f64) -> AppResult<()> {
        self.inner.lock().unwrap().boosts.insert(user_id, boost);
        Ok(())
    }

    fn upsert_candidate(&self, candidate: &NewCandidate) -> AppResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner
            .candidates
            .iter_mut()
            .find(|c| c.user_id == candidate.user_id)
        {
            existing.name = candidate.name.clone();
            existing.age = candidate.age;
            existing.gender = candidate.gender.clone();
            existing.instagram = candidate.instagram.clone();
            existing.photo_file_id = candidate.photo_file_id.clone();
            existing.approved = candidate.approved;
            return Ok(false);
        }
        inner.next_candidate_id += 1;
        let id = inner.next_candidate_id;
        inner.candidates.push(Candidate {
            id,
            user_id: candidate.user_id,
            name: candidate.name.clone(),
            age: candidate.age,
            gender: candidate.gender.clone(),
            instagram: candidate.instagram.clone(),
            photo_file_id: candidate.photo_file_id.clone(),
            approved: candidate.approved,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    fn next_unrated_candidate(
        &self,
        user_id: i64,
        target_gender: Option<Gender>,
    ) -> AppResult<Option<Candidate>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .candidates
            .iter()
            .filter(|c| c.approved && c.user_id != user_id)
            .filter(|c| !inner.votes.contains_key(&(user_id, c.id)))
            .filter(|c| target_gender.map_or(true, |g| c.gender == g.as_str()))
            .min_by_key(|c| c.id)
            .cloned())
    }

    fn add_vote(&self, user_id: i64, candidate_id: i32, rating: i32) -> AppResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        if inner.votes.contains_key(&(user_id, candidate_id)) {
            return Ok(false);
        }
        inner.votes.insert((user_id, candidate_id), rating);
        Ok(true)
    }

    fn approve_candidate(&self, candidate_id: i32, approved: bool) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(candidate) = inner.candidates.iter_mut().find(|c| c.id == candidate_id) {
            candidate.approved = approved;
        }
        Ok(())
    }

    fn list_shop_items(&self) -> AppResult<Vec<ShopItem>> {
        Ok(self.inner.lock().unwrap().shop_items.clone())
    }

    fn get_shop_item(&self, item_id: i32) -> AppResult<Option<ShopItem>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.shop_items.iter().find(|i| i.id == item_id).cloned())
    }

    fn ensure_shop_item(
        &self,
        code: &str,
        name: &str,
        kind: ItemKind,
        price: i32,
    ) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.shop_items.iter().any(|i| i.code == code) {
            return Ok(());
        }
        inner.next_item_id += 1;
        let id = inner.next_item_id;
        inner.shop_items.push(ShopItem {
            id,
            code: code.to_string(),
            name: name.to_string(),
            kind: kind.as_str().to_string(),
            price,
        });
        Ok(())
    }

    fn create_purchase(&self, purchase: &NewPurchase) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.purchases.insert(
            purchase.id,
            Purchase {
                id: purchase.id,
                buyer_id: purchase.buyer_id,
                item_id: purchase.item_id,
                recipient_id: purchase.recipient_id,
                recipient_username: purchase.recipient_username.clone(),
                details: purchase.details.clone(),
                status: purchase.status.clone(),
                notified: false,
                created_at: Utc::now(),
            },
        );
        inner.purchase_order.push(purchase.id);
        Ok(())
    }

    fn get_purchase(&self, id: Uuid) -> AppResult<Option<Purchase>> {
        Ok(self.inner.lock().unwrap().purchases.get(&id).cloned())
    }

    fn update_purchase_details(&self, id: Uuid, details: &serde_json::Value) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(purchase) = inner.purchases.get_mut(&id) {
            purchase.details = details.clone();
        }
        Ok(())
    }

    fn set_purchase_recipient(
        &self,
        id: Uuid,
        recipient_id: i64,
        username: Option<&str>,
    ) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(purchase) = inner.purchases.get_mut(&id) {
            purchase.recipient_id = Some(recipient_id);
            purchase.recipient_username = username.map(str::to_string);
        }
        Ok(())
    }

    fn mark_purchase_notified(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(purchase) = inner.purchases.get_mut(&id) {
            purchase.notified = true;
        }
        Ok(())
    }

    fn update_purchase_status(&self, id: Uuid, status: &str) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(purchase) = inner.purchases.get_mut(&id) {
            purchase.status = status.to_string();
        }
        Ok(())
    }

    fn pending_gifts_for(&self, user_id: i64, username: Option<&str>) -> AppResult<Vec<Purchase>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .purchase_order
            .iter()
            .filter_map(|id| inner.purchases.get(id))
            .filter(|p| !p.notified)
            .filter(|p| {
                p.recipient_id == Some(user_id)
                    || (username.is_some() && p.recipient_username.as_deref() == username)
            })
            .cloned()
            .collect())
    }

    fn get_contact(&self, user_id: i64) -> AppResult<Option<Contact>> {
        Ok(self.inner.lock().unwrap().contacts.get(&user_id).cloned())
    }

    fn upsert_contact(&self, contact: &Contact) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner
            .contacts
            .entry(contact.user_id)
            .or_insert_with(|| Contact {
                user_id: contact.user_id,
                ..Contact::default()
            });
        // None fields leave the stored value alone, same as the SQL upsert.
        if contact.full_name.is_some() {
            entry.full_name = contact.full_name.clone();
        }
        if contact.email.is_some() {
            entry.email = contact.email.clone();
        }
        if contact.address.is_some() {
            entry.address = contact.address.clone();
        }
        if contact.size.is_some() {
            entry.size = contact.size.clone();
        }
        Ok(())
    }

    fn santa_entry(&self, user_id: i64) -> AppResult<Option<SantaEntry>> {
        Ok(self.inner.lock().unwrap().santa.get(&user_id).cloned())
    }

    fn assign_santa_number(&self, user_id: i64) -> AppResult<i32> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(entry) = inner.santa.get(&user_id) {
            return Ok(entry.gift_number);
        }
        let number = inner.santa.values().map(|e| e.gift_number).max().unwrap_or(0) + 1;
        inner.santa.insert(
            user_id,
            SantaEntry {
                user_id,
                gift_number: number,
                name: None,
                gift_photo_id: None,
                created_at: Utc::now(),
            },
        );
        Ok(number)
    }

    fn update_santa_details(&self, user_id: i64, name: &str, gift_photo_id: &str) -> AppResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(entry) = inner.santa.get_mut(&user_id) {
            entry.name = Some(name.to_string());
            entry.gift_photo_id = Some(gift_photo_id.to_string());
        }
        Ok(())
    }

    fn is_admin(&self, user_id: i64) -> AppResult<bool> {
        Ok(self.inner.lock().unwrap().admins.contains(&user_id))
    }

    fn is_feature_enabled(&self, name: &str, default: bool) -> AppResult<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.flags.get(name).copied().unwrap_or(default))
    }

    fn set_feature_enabled(&self, name: &str, enabled: bool) -> AppResult<()> {
        self.inner
            .lock()
            .unwrap()
            .flags
            .insert(name.to_string(), enabled);
        Ok(())
    }
}
