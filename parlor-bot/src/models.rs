use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{
    blackjack_sessions, candidates, contacts, matches, profile_media, profiles, purchases,
    secret_santa_entries, shop_items, swipe_decisions, users, votes, wallets,
};

// --- Domain enums ---
// Stored as their string form in Varchar columns.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Male" => Some(Self::Male),
            "Female" => Some(Self::Female),
            _ => None,
        }
    }
}

/// Who a profile owner wants to see in their queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interest {
    Male,
    Female,
    Any,
}

impl Interest {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Any => "Any",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Male" => Some(Self::Male),
            "Female" => Some(Self::Female),
            "Any" => Some(Self::Any),
            _ => None,
        }
    }

    pub fn accepts(&self, gender: Gender) -> bool {
        match self {
            Self::Any => true,
            Self::Male => gender == Gender::Male,
            Self::Female => gender == Gender::Female,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeStatus {
    Like,
    Dislike,
}

impl SwipeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "photo" => Some(Self::Photo),
            "video" => Some(Self::Video),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Ticket,
    Hoodie,
    Bottle,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ticket => "ticket",
            Self::Hoodie => "hoodie",
            Self::Bottle => "bottle",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ticket" => Some(Self::Ticket),
            "hoodie" => Some(Self::Hoodie),
            "bottle" => Some(Self::Bottle),
            _ => None,
        }
    }
}

/// Per-kind checkout payload. Each item kind carries exactly the fields it
/// needs; `Pending` marks a gift whose recipient fills the details later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PurchaseDetails {
    Ticket {
        full_name: String,
        email: String,
    },
    Bottle {
        full_name: String,
        email: String,
    },
    Hoodie {
        full_name: String,
        email: String,
        size: String,
        address: String,
    },
    Pending,
}

/// Statistics counters kept on the user row, bumped atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStat {
    Swipes,
    LikesGiven,
    Matches,
    VotesCast,
    GamesPlayed,
    CandidatesSubmitted,
    Purchases,
    BoostsCredited,
}

// --- User ---

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language: Option<String>,
    pub gender: Option<String>,
    pub swipes: i32,
    pub likes_given: i32,
    pub matches: i32,
    pub votes_cast: i32,
    pub games_played: i32,
    pub candidates_submitted: i32,
    pub purchases: i32,
    /// Channel boosts already rewarded; the bonus pays the delta only.
    pub boosts_credited: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub id: i64,
    pub username: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub language: Option<&'a str>,
}

// --- Wallet ---

#[derive(Debug, Clone, Queryable, Serialize)]
#[diesel(table_name = wallets)]
pub struct Wallet {
    pub user_id: i64,
    pub balance: i32,
    pub last_checkin: Option<NaiveDate>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = wallets)]
pub struct NewWallet {
    pub user_id: i64,
    pub balance: i32,
}

// --- Dating profile ---

#[derive(Debug, Clone, Queryable, Serialize)]
#[diesel(table_name = profiles)]
pub struct Profile {
    pub user_id: i64,
    pub age: i32,
    pub gender: String,
    pub interest: String,
    pub city: String,
    pub normalized_city: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub name: String,
    pub bio: String,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = profiles)]
pub struct ProfileRecord {
    pub user_id: i64,
    pub age: i32,
    pub gender: String,
    pub interest: String,
    pub city: String,
    pub normalized_city: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub name: String,
    pub bio: String,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Serialize)]
#[diesel(table_name = profile_media)]
pub struct MediaItem {
    pub id: Uuid,
    pub user_id: i64,
    pub file_id: String,
    pub kind: String,
    pub position: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profile_media)]
pub struct NewMediaItem {
    pub id: Uuid,
    pub user_id: i64,
    pub file_id: String,
    pub kind: String,
    pub position: i32,
}

// --- Swipes & matches ---

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = swipe_decisions)]
pub struct SwipeDecision {
    pub id: Uuid,
    pub actor_id: i64,
    pub target_id: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = swipe_decisions)]
pub struct NewSwipe {
    pub id: Uuid,
    pub actor_id: i64,
    pub target_id: i64,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = matches)]
pub struct MatchRow {
    pub id: Uuid,
    pub user_a: i64,
    pub user_b: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = matches)]
pub struct NewMatch {
    pub id: Uuid,
    pub user_a: i64,
    pub user_b: i64,
}

// --- Blackjack ---

#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = blackjack_sessions)]
pub struct SessionRow {
    pub user_id: i64,
    pub deck: serde_json::Value,
    pub player_hand: serde_json::Value,
    pub dealer_hand: serde_json::Value,
    pub bet: i32,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = blackjack_sessions)]
pub struct NewSessionRow {
    pub user_id: i64,
    pub deck: serde_json::Value,
    pub player_hand: serde_json::Value,
    pub dealer_hand: serde_json::Value,
    pub bet: i32,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

// --- Contest candidates & votes ---

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = candidates)]
pub struct Candidate {
    pub id: i32,
    pub user_id: i64,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub instagram: Option<String>,
    pub photo_file_id: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = candidates)]
pub struct NewCandidate {
    pub user_id: i64,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub instagram: Option<String>,
    pub photo_file_id: String,
    pub approved: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = votes)]
pub struct Vote {
    pub id: Uuid,
    pub user_id: i64,
    pub candidate_id: i32,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = votes)]
pub struct NewVote {
    pub id: Uuid,
    pub user_id: i64,
    pub candidate_id: i32,
    pub rating: i32,
}

// --- Shop ---

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = shop_items)]
pub struct ShopItem {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub kind: String,
    pub price: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shop_items)]
pub struct NewShopItem<'a> {
    pub code: &'a str,
    pub name: &'a str,
    pub kind: &'a str,
    pub price: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = purchases)]
pub struct Purchase {
    pub id: Uuid,
    pub buyer_id: i64,
    pub item_id: i32,
    pub recipient_id: Option<i64>,
    pub recipient_username: Option<String>,
    pub details: serde_json::Value,
    pub status: String,
    pub notified: bool,
    pub created_at: DateTime<Utc>,
}

impl Purchase {
    pub fn parsed_details(&self) -> Option<PurchaseDetails> {
        serde_json::from_value(self.details.clone()).ok()
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = purchases)]
pub struct NewPurchase {
    pub id: Uuid,
    pub buyer_id: i64,
    pub item_id: i32,
    pub recipient_id: Option<i64>,
    pub recipient_username: Option<String>,
    pub details: serde_json::Value,
    pub status: String,
}

#[derive(Debug, Clone, Default, Queryable, Insertable, AsChangeset, Serialize)]
#[diesel(table_name = contacts)]
pub struct Contact {
    pub user_id: i64,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub size: Option<String>,
}

// --- Secret santa ---

#[derive(Debug, Clone, Queryable, Serialize)]
#[diesel(table_name = secret_santa_entries)]
pub struct SantaEntry {
    pub user_id: i64,
    pub gift_number: i32,
    pub name: Option<String>,
    pub gift_photo_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = secret_santa_entries)]
pub struct NewSantaEntry {
    pub user_id: i64,
    pub gift_number: i32,
}
