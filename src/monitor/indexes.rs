//! Index Registry Module
//!
//! Declarative list of the secondary indexes the application's collections
//! should carry. A separate setup routine creates them; the monitor only
//! reports how many are declared per collection.

use std::collections::BTreeMap;

use serde::Serialize;

// == Index Spec ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSpec {
    pub collection: String,
    /// Indexed fields in order; a leading `-` marks a descending field
    pub fields: Vec<String>,
    pub unique: bool,
    pub sparse: bool,
    pub name: String,
}

impl IndexSpec {
    pub fn new(collection: &str, name: &str, fields: &[&str]) -> Self {
        Self {
            collection: collection.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            unique: false,
            sparse: false,
            name: name.to_string(),
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn sparse(mut self) -> Self {
        self.sparse = true;
        self
    }
}

// == Index Registry ==
/// Ordered list of index specs.
#[derive(Debug, Clone, Default)]
pub struct IndexRegistry {
    specs: Vec<IndexSpec>,
}

impl IndexRegistry {
    pub fn new(specs: Vec<IndexSpec>) -> Self {
        Self { specs }
    }

    pub fn specs(&self) -> &[IndexSpec] {
        &self.specs
    }

    /// Distinct collection names in first-declared order.
    pub fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for spec in &self.specs {
            if !names.contains(&spec.collection) {
                names.push(spec.collection.clone());
            }
        }
        names
    }

    pub fn count_for(&self, collection: &str) -> usize {
        self.specs
            .iter()
            .filter(|spec| spec.collection == collection)
            .count()
    }

    pub fn count_by_collection(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for spec in &self.specs {
            *counts.entry(spec.collection.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Indexes for the application's collections.
pub fn default_index_registry() -> IndexRegistry {
    IndexRegistry::new(vec![
        IndexSpec::new("users", "users_email_unique", &["email"]).unique(),
        IndexSpec::new("users", "users_username_unique", &["username"])
            .unique()
            .sparse(),
        IndexSpec::new("users", "users_location", &["location"]),
        IndexSpec::new("posts", "posts_author_created", &["author", "-createdAt"]),
        IndexSpec::new("posts", "posts_created", &["-createdAt"]),
        IndexSpec::new("posts", "posts_likes_created", &["-likesCount", "-createdAt"]),
        IndexSpec::new("bucket_lists", "bucket_lists_user", &["user", "-createdAt"]),
        IndexSpec::new("bucket_lists", "bucket_lists_completed", &["user", "completed"]),
        IndexSpec::new("events", "events_start_date", &["startDate"]),
        IndexSpec::new("events", "events_location_start", &["location", "startDate"]),
        IndexSpec::new("events", "events_organizer", &["organizer"]),
        IndexSpec::new("locations", "locations_coordinates", &["coordinates"]),
        IndexSpec::new("locations", "locations_category_rating", &["category", "-rating"]),
        IndexSpec::new("reviews", "reviews_location_created", &["location", "-createdAt"]),
        IndexSpec::new("reviews", "reviews_author_location", &["author", "location"]).unique(),
        IndexSpec::new("notifications", "notifications_recipient_read", &["recipient", "read", "-createdAt"]),
        IndexSpec::new("follows", "follows_pair_unique", &["follower", "following"]).unique(),
        IndexSpec::new("follows", "follows_following", &["following"]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_flags() {
        let spec = IndexSpec::new("users", "users_email", &["email"]).unique().sparse();
        assert!(spec.unique);
        assert!(spec.sparse);
        assert_eq!(spec.fields, vec!["email"]);
    }

    #[test]
    fn test_counts_by_collection() {
        let registry = IndexRegistry::new(vec![
            IndexSpec::new("posts", "a", &["author"]),
            IndexSpec::new("users", "b", &["email"]),
            IndexSpec::new("posts", "c", &["-createdAt"]),
        ]);

        assert_eq!(registry.collections(), vec!["posts", "users"]);
        assert_eq!(registry.count_for("posts"), 2);
        assert_eq!(registry.count_for("events"), 0);
        assert_eq!(registry.count_by_collection()["users"], 1);
    }

    #[test]
    fn test_default_registry_names_are_unique() {
        let registry = default_index_registry();
        let mut names: Vec<&str> = registry.specs().iter().map(|s| s.name.as_str()).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
        assert_eq!(registry.collections().len(), 8);
    }
}
