//! Key Namespace Module
//!
//! Canonical key templates per entity, the matching invalidation patterns,
//! and the TTL tiers callers store them with.
//!
//! Every templated key starts with a stable entity prefix so that
//! `prefix:*` matches exactly the intended family of keys.

use std::fmt::Display;

use base64::{engine::general_purpose::STANDARD, Engine as _};

// == TTL Tiers ==
/// Named expirations for cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlTier {
    Short,
    Medium,
    Long,
    VeryLong,
    UserProfile,
    UserStats,
    Posts,
    Locations,
    Notifications,
    SearchResults,
    Analytics,
}

impl TtlTier {
    /// Tier length in seconds.
    pub const fn secs(self) -> u64 {
        match self {
            TtlTier::Short => 300,
            TtlTier::Medium => 1800,
            TtlTier::Long => 3600,
            TtlTier::VeryLong => 86_400,
            TtlTier::UserProfile => 1800,
            TtlTier::UserStats => 600,
            TtlTier::Posts => 900,
            TtlTier::Locations => 3600,
            TtlTier::Notifications => 300,
            TtlTier::SearchResults => 1800,
            TtlTier::Analytics => 3600,
        }
    }
}

impl From<TtlTier> for u64 {
    fn from(tier: TtlTier) -> Self {
        tier.secs()
    }
}

// == Users ==
pub fn user_key(id: impl Display) -> String {
    format!("user:{}", id)
}

pub fn user_profile_key(id: impl Display) -> String {
    format!("user:profile:{}", id)
}

pub fn user_stats_key(id: impl Display) -> String {
    format!("user:stats:{}", id)
}

pub fn user_followers_key(id: impl Display) -> String {
    format!("user:followers:{}", id)
}

pub fn user_following_key(id: impl Display) -> String {
    format!("user:following:{}", id)
}

/// One page of a user's own posts.
pub fn user_posts_key(user_id: impl Display, page: u32) -> String {
    format!("user:posts:{}:{}", user_id, page)
}

pub fn user_posts_pattern(user_id: impl Display) -> String {
    format!("user:posts:{}:*", user_id)
}

// == Feeds and Posts ==
pub fn post_key(id: impl Display) -> String {
    format!("post:{}", id)
}

/// One page of the feed assembled for a user.
pub fn feed_posts_key(user_id: impl Display, page: u32) -> String {
    format!("feed:posts:{}:{}", user_id, page)
}

pub fn feed_posts_pattern(user_id: impl Display) -> String {
    format!("feed:posts:{}:*", user_id)
}

pub fn trending_posts_key(limit: u32) -> String {
    format!("posts:trending:{}", limit)
}

pub fn trending_posts_pattern() -> String {
    "posts:trending:*".to_string()
}

// == Locations ==
pub fn location_key(id: impl Display) -> String {
    format!("location:{}", id)
}

/// Nearby-location query. Coordinates are rounded to 4 decimal places so
/// requests a few metres apart share an entry.
pub fn nearby_locations_key(lat: f64, lng: f64, radius_km: impl Display) -> String {
    format!(
        "locations:nearby:{}:{}:{}",
        round_coordinate(lat),
        round_coordinate(lng),
        radius_km
    )
}

pub fn nearby_locations_pattern() -> String {
    "locations:nearby:*".to_string()
}

pub fn location_reviews_key(location_id: impl Display, page: u32) -> String {
    format!("location:reviews:{}:{}", location_id, page)
}

pub fn location_reviews_pattern(location_id: impl Display) -> String {
    format!("location:reviews:{}:*", location_id)
}

// == Notifications ==
pub fn notifications_key(user_id: impl Display, page: u32) -> String {
    format!("notifications:{}:{}", user_id, page)
}

pub fn notifications_pattern(user_id: impl Display) -> String {
    format!("notifications:{}:*", user_id)
}

pub fn unread_notifications_count_key(user_id: impl Display) -> String {
    format!("notifications:unread:count:{}", user_id)
}

// == Search ==
/// Search results page. The raw query is base64-encoded so separators and
/// wildcards inside it cannot collide with the key structure.
pub fn search_results_key(query: &str, search_type: &str, page: u32) -> String {
    format!("search:{}:{}:{}", search_type, STANDARD.encode(query), page)
}

pub fn search_results_pattern(search_type: &str) -> String {
    format!("search:{}:*", search_type)
}

fn round_coordinate(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    // Avoid "-0.0000" for values that round to zero
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{:.4}", rounded)
}
