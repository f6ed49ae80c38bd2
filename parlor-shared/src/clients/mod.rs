pub mod db;
pub mod chat;
pub mod geocode;
