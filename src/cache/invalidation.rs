//! Invalidation Module
//!
//! Turns "entity X changed" into the set of key patterns to drop.

use std::fmt::Display;

use tracing::{debug, warn};

use crate::cache::{keys, KeyPattern, SharedStore};
use crate::error::{CacheError, Result};

// == Invalidator ==
/// Entity-oriented invalidation recipes over the shared store.
///
/// Each recipe holds the store's write lock for all of its deletions and
/// finishes before returning, so a read issued afterwards cannot see the
/// dropped data. Entity IDs are literal: an ID containing `*` is rejected.
#[derive(Debug, Clone)]
pub struct Invalidator {
    store: SharedStore,
}

impl Invalidator {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    // == Users ==
    /// Drops the user's entry, profile, stats, follow lists and every page of
    /// their posts, feed and notifications.
    pub async fn invalidate_user(&self, user_id: impl Display) -> Result<usize> {
        let user_id = literal_id("user", user_id)?;
        let patterns = [
            keys::user_key(&user_id),
            keys::user_profile_key(&user_id),
            keys::user_stats_key(&user_id),
            keys::user_followers_key(&user_id),
            keys::user_following_key(&user_id),
            keys::unread_notifications_count_key(&user_id),
            keys::user_posts_pattern(&user_id),
            keys::feed_posts_pattern(&user_id),
            keys::notifications_pattern(&user_id),
        ];
        Ok(self.drop_all(format!("user {}", user_id), &patterns).await)
    }

    // == Posts ==
    /// Drops the post entry and trending lists; with an author, also the
    /// author's post pages and feed pages.
    pub async fn invalidate_post(
        &self,
        post_id: impl Display,
        author_id: Option<&str>,
    ) -> Result<usize> {
        let post_id = literal_id("post", post_id)?;
        let mut patterns = vec![keys::post_key(&post_id), keys::trending_posts_pattern()];
        if let Some(author) = author_id {
            let author = literal_id("author", author)?;
            patterns.push(keys::user_posts_pattern(&author));
            patterns.push(keys::feed_posts_pattern(&author));
        }
        Ok(self.drop_all(format!("post {}", post_id), &patterns).await)
    }

    // == Locations ==
    /// Drops the location entry, its review pages and every nearby-location
    /// query, since any of them may include this location.
    pub async fn invalidate_location(&self, location_id: impl Display) -> Result<usize> {
        let location_id = literal_id("location", location_id)?;
        let patterns = [
            keys::location_key(&location_id),
            keys::location_reviews_pattern(&location_id),
            keys::nearby_locations_pattern(),
        ];
        Ok(self.drop_all(format!("location {}", location_id), &patterns).await)
    }

    // == Arbitrary Pattern ==
    /// Drops every key matching a caller-supplied pattern.
    ///
    /// A malformed pattern is the caller's error and is returned as such.
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<usize> {
        let compiled = KeyPattern::compile(pattern)?;
        let removed = self.store.write().await.delete_compiled(&compiled);
        debug!("Invalidated {} keys matching '{}'", removed, pattern);
        Ok(removed)
    }

    async fn drop_all<S: AsRef<str>>(&self, target: String, patterns: &[S]) -> usize {
        let compiled: Vec<KeyPattern> = patterns
            .iter()
            .filter_map(|p| match KeyPattern::compile(p.as_ref()) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!("Skipping invalidation pattern '{}': {}", p.as_ref(), e);
                    None
                }
            })
            .collect();

        let mut store = self.store.write().await;
        let removed: usize = compiled
            .iter()
            .map(|pattern| store.delete_compiled(pattern))
            .sum();

        debug!("Invalidated {} keys for {}", removed, target);
        removed
    }
}

/// Renders an entity ID for use inside an invalidation pattern.
///
/// Only the page segment of a pattern may be a wildcard, so the ID must be
/// non-empty and free of `*`.
fn literal_id(entity: &str, id: impl Display) -> Result<String> {
    let id = id.to_string();
    if id.is_empty() {
        return Err(CacheError::InvalidArgument(format!("{} id cannot be empty", entity)));
    }
    if id.contains('*') {
        return Err(CacheError::InvalidArgument(format!(
            "{} id '{}' must not contain '*'",
            entity, id
        )));
    }
    Ok(id)
}
