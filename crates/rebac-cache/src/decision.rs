use crate::error::Result;
use crate::redis_cache::Cache;
use rebac_models::{Subject, TupleKey};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default lifetime of a memoized decision.
pub const DEFAULT_TTL_SECONDS: u64 = 300;

/// A memoized check outcome. `stamped_at` is the zookie time of the check
/// that produced it, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedDecision {
    pub allowed: bool,
    pub stamped_at: i64,
}

/// Memoization of check outcomes over any [`Cache`] backend.
///
/// Key shape: `check:{namespace}:{object_id}:{relation}:{user_type}:{user_id}`.
#[derive(Clone)]
pub struct DecisionCache {
    backend: Arc<dyn Cache>,
    ttl_seconds: u64,
}

impl DecisionCache {
    pub fn new(backend: Arc<dyn Cache>, ttl_seconds: u64) -> Self {
        Self {
            backend,
            ttl_seconds,
        }
    }

    pub fn key(check: &TupleKey) -> String {
        let (user_type, user_id) = check.subject.to_parts();
        format!(
            "check:{}:{}:{}:{}:{}",
            check.namespace, check.object_id, check.relation, user_type, user_id
        )
    }

    /// Fetch a usable decision. An entry stamped earlier than `min_stamp`
    /// (the caller's input zookie) is stale for that caller and reported as
    /// a miss.
    pub async fn get(
        &self,
        check: &TupleKey,
        min_stamp: Option<i64>,
    ) -> Result<Option<CachedDecision>> {
        let raw = match self.backend.get(&Self::key(check)).await? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let decision: CachedDecision = serde_json::from_str(&raw)?;

        if let Some(min_stamp) = min_stamp {
            if decision.stamped_at < min_stamp {
                return Ok(None);
            }
        }
        Ok(Some(decision))
    }

    /// Memoize a decision with the zookie time of the check that computed it.
    pub async fn put(&self, check: &TupleKey, allowed: bool, stamped_at: i64) -> Result<()> {
        let decision = CachedDecision { allowed, stamped_at };
        self.backend
            .set(
                &Self::key(check),
                &serde_json::to_string(&decision)?,
                self.ttl_seconds,
            )
            .await
    }

    /// Purge every decision a mutation of `tuple` could have influenced:
    /// all relations on the object, all decisions naming the tuple's
    /// subject, and, for userset subjects, the referenced (object, relation)
    /// one hop out. Deeper transitive staleness is healed by TTL.
    pub async fn invalidate_for(&self, tuple: &TupleKey) -> Result<u64> {
        let mut removed = 0;

        removed += self
            .backend
            .delete_pattern(&format!("check:{}:{}:*", tuple.namespace, tuple.object_id))
            .await?;

        let (user_type, user_id) = tuple.subject.to_parts();
        removed += self
            .backend
            .delete_pattern(&format!("check:*:{}:{}", user_type, user_id))
            .await?;

        if let Subject::Userset(r) = &tuple.subject {
            removed += self
                .backend
                .delete_pattern(&format!(
                    "check:{}:{}:{}:*",
                    r.namespace, r.object_id, r.relation
                ))
                .await?;
        }

        tracing::debug!("Invalidated {} cached decisions for {}", removed, tuple);
        Ok(removed)
    }

    pub async fn ping(&self) -> Result<()> {
        self.backend.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCache;
    use rebac_models::Subject;

    fn check_key(object_id: &str, relation: &str, user: &str) -> TupleKey {
        TupleKey::new("document", object_id, relation, Subject::user(user))
    }

    fn decision_cache() -> DecisionCache {
        DecisionCache::new(Arc::new(MemoryCache::new()), DEFAULT_TTL_SECONDS)
    }

    #[tokio::test]
    async fn put_then_get_roundtrip() {
        let cache = decision_cache();
        let key = check_key("d1", "viewer", "alice");

        cache.put(&key, true, 1_000).await.unwrap();
        let hit = cache.get(&key, None).await.unwrap().unwrap();
        assert!(hit.allowed);
        assert_eq!(hit.stamped_at, 1_000);
    }

    #[tokio::test]
    async fn entries_older_than_the_zookie_are_bypassed() {
        let cache = decision_cache();
        let key = check_key("d1", "viewer", "alice");
        cache.put(&key, true, 1_000).await.unwrap();

        // Caller demands freshness past the entry's stamp.
        assert!(cache.get(&key, Some(2_000)).await.unwrap().is_none());
        // A stamp at or before the entry is satisfied by it.
        assert!(cache.get(&key, Some(1_000)).await.unwrap().is_some());
        assert!(cache.get(&key, Some(500)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn invalidation_purges_object_and_subject_keys() {
        let cache = decision_cache();

        cache.put(&check_key("d1", "viewer", "alice"), true, 1).await.unwrap();
        cache.put(&check_key("d1", "owner", "bob"), true, 1).await.unwrap();
        cache.put(&check_key("d2", "viewer", "alice"), true, 1).await.unwrap();
        cache.put(&check_key("d3", "viewer", "carol"), false, 1).await.unwrap();

        // Mutating a d1 tuple naming alice purges all of d1 plus every
        // decision about alice, but leaves carol's d3 decision alone.
        let mutated = TupleKey::new("document", "d1", "viewer", Subject::user("alice"));
        cache.invalidate_for(&mutated).await.unwrap();

        assert!(cache.get(&check_key("d1", "viewer", "alice"), None).await.unwrap().is_none());
        assert!(cache.get(&check_key("d1", "owner", "bob"), None).await.unwrap().is_none());
        assert!(cache.get(&check_key("d2", "viewer", "alice"), None).await.unwrap().is_none());
        assert!(cache.get(&check_key("d3", "viewer", "carol"), None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn userset_mutation_purges_the_referenced_userset_one_hop() {
        let cache = decision_cache();

        let team_member_check = TupleKey::new("team", "t1", "member", Subject::user("bob"));
        cache.put(&team_member_check, true, 1).await.unwrap();

        // document:d2#editor@userset:team:t1#member also purges decisions on
        // team:t1#member.
        let mutated = TupleKey::new(
            "document",
            "d2",
            "editor",
            Subject::userset("team", "t1", "member"),
        );
        cache.invalidate_for(&mutated).await.unwrap();

        assert!(cache.get(&team_member_check, None).await.unwrap().is_none());
    }
}
