use crate::error::{Result, StoreError};
use crate::store::{choose_index, IndexChoice, TupleStore};
use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use rebac_models::{RelationTuple, Subject, TupleFilter, TupleKey};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

type IndexKey = (String, String, String, String, String);

/// In-process tuple store keeping the same four orderings as the Postgres
/// tables. Backs the engine's unit and end-to-end tests.
#[derive(Default)]
pub struct MemoryTupleStore {
    inner: RwLock<Indexes>,
}

#[derive(Default)]
struct Indexes {
    /// (namespace, object_id, relation, user_type, user_id) -> created_at
    primary: BTreeMap<IndexKey, DateTime<Utc>>,
    /// (user_id, user_type, namespace, object_id, relation)
    by_subject: BTreeSet<IndexKey>,
    /// (namespace, object_id, relation, user_type, user_id)
    by_object: BTreeSet<IndexKey>,
    /// (namespace, relation, object_id, user_type, user_id)
    by_relation: BTreeSet<IndexKey>,
}

fn primary_key(key: &TupleKey) -> IndexKey {
    let (user_type, user_id) = key.subject.to_parts();
    (
        key.namespace.clone(),
        key.object_id.clone(),
        key.relation.clone(),
        user_type,
        user_id,
    )
}

fn tuple_from_primary(entry: (&IndexKey, &DateTime<Utc>)) -> Result<RelationTuple> {
    let ((namespace, object_id, relation, user_type, user_id), created_at) = entry;
    let subject = Subject::from_parts(user_type, user_id)
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    Ok(RelationTuple::new(
        TupleKey::new(namespace, object_id, relation, subject),
        *created_at,
    ))
}

impl MemoryTupleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, Indexes>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Other("tuple index lock poisoned".to_string()))
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, Indexes>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Other("tuple index lock poisoned".to_string()))
    }

    /// Entry counts of (primary, by_subject, by_object, by_relation).
    pub fn index_counts(&self) -> (usize, usize, usize, usize) {
        let inner = self.inner.read().expect("tuple index lock poisoned");
        (
            inner.primary.len(),
            inner.by_subject.len(),
            inner.by_object.len(),
            inner.by_relation.len(),
        )
    }
}

#[async_trait]
impl TupleStore for MemoryTupleStore {
    async fn insert(&self, key: &TupleKey) -> Result<()> {
        let created_at = Utc::now().trunc_subsecs(6);
        let (namespace, object_id, relation, user_type, user_id) = primary_key(key);

        let mut inner = self.write_guard()?;
        inner.by_subject.insert((
            user_id.clone(),
            user_type.clone(),
            namespace.clone(),
            object_id.clone(),
            relation.clone(),
        ));
        inner.by_object.insert((
            namespace.clone(),
            object_id.clone(),
            relation.clone(),
            user_type.clone(),
            user_id.clone(),
        ));
        inner.by_relation.insert((
            namespace.clone(),
            relation.clone(),
            object_id.clone(),
            user_type.clone(),
            user_id.clone(),
        ));
        // Idempotent: an existing entry keeps its original created_at.
        inner
            .primary
            .entry((namespace, object_id, relation, user_type, user_id))
            .or_insert(created_at);

        Ok(())
    }

    async fn delete(&self, key: &TupleKey) -> Result<()> {
        let (namespace, object_id, relation, user_type, user_id) = primary_key(key);

        let mut inner = self.write_guard()?;
        inner.primary.remove(&(
            namespace.clone(),
            object_id.clone(),
            relation.clone(),
            user_type.clone(),
            user_id.clone(),
        ));
        inner.by_subject.remove(&(
            user_id.clone(),
            user_type.clone(),
            namespace.clone(),
            object_id.clone(),
            relation.clone(),
        ));
        inner.by_object.remove(&(
            namespace.clone(),
            object_id.clone(),
            relation.clone(),
            user_type.clone(),
            user_id.clone(),
        ));
        inner
            .by_relation
            .remove(&(namespace, relation, object_id, user_type, user_id));

        Ok(())
    }

    async fn find_direct(
        &self,
        namespace: &str,
        object_id: &str,
        relation: &str,
        subject: &Subject,
    ) -> Result<bool> {
        let (user_type, user_id) = subject.to_parts();
        let inner = self.read_guard()?;
        Ok(inner.primary.contains_key(&(
            namespace.to_string(),
            object_id.to_string(),
            relation.to_string(),
            user_type,
            user_id,
        )))
    }

    async fn find_tuples_for(
        &self,
        namespace: &str,
        object_id: &str,
        relation: &str,
    ) -> Result<Vec<RelationTuple>> {
        let inner = self.read_guard()?;
        let lower = (
            namespace.to_string(),
            object_id.to_string(),
            relation.to_string(),
            String::new(),
            String::new(),
        );
        inner
            .primary
            .range(lower..)
            .take_while(|((ns, obj, rel, _, _), _)| {
                ns == namespace && obj == object_id && rel == relation
            })
            .map(tuple_from_primary)
            .collect()
    }

    async fn find_memberships(&self, subject: &Subject) -> Result<Vec<RelationTuple>> {
        let (user_type, user_id) = subject.to_parts();
        let inner = self.read_guard()?;
        let lower = (
            user_id.clone(),
            user_type.clone(),
            String::new(),
            String::new(),
            String::new(),
        );
        inner
            .by_subject
            .range(lower..)
            .take_while(|(uid, ut, _, _, _)| *uid == user_id && *ut == user_type)
            .map(|(uid, ut, ns, obj, rel)| {
                let created_at = inner
                    .primary
                    .get(&(ns.clone(), obj.clone(), rel.clone(), ut.clone(), uid.clone()))
                    .copied()
                    .ok_or_else(|| {
                        StoreError::Other(format!("by-subject entry missing from primary: {}", uid))
                    })?;
                let subject = Subject::from_parts(ut, uid)
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?;
                Ok(RelationTuple::new(
                    TupleKey::new(ns, obj, rel, subject),
                    created_at,
                ))
            })
            .collect()
    }

    async fn query(
        &self,
        filter: &TupleFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RelationTuple>> {
        // The index choice fixes the enumeration order, matching the SQL
        // ORDER BY on the equivalent table.
        let choice = choose_index(filter)?;
        let inner = self.read_guard()?;

        let matches = |ns: &str, obj: &str, rel: &str, ut: &str, uid: &str| {
            filter.namespace.as_deref().map_or(true, |v| v == ns)
                && filter.object_id.as_deref().map_or(true, |v| v == obj)
                && filter.relation.as_deref().map_or(true, |v| v == rel)
                && filter.user_type.as_deref().map_or(true, |v| v == ut)
                && filter.user_id.as_deref().map_or(true, |v| v == uid)
        };

        let ordered: Vec<IndexKey> = match choice {
            IndexChoice::Primary => inner
                .by_object
                .iter()
                .filter(|(ns, obj, rel, ut, uid)| matches(ns, obj, rel, ut, uid))
                .cloned()
                .collect(),
            IndexChoice::BySubject => inner
                .by_subject
                .iter()
                .filter(|(uid, ut, ns, obj, rel)| matches(ns, obj, rel, ut, uid))
                .map(|(uid, ut, ns, obj, rel)| {
                    (ns.clone(), obj.clone(), rel.clone(), ut.clone(), uid.clone())
                })
                .collect(),
            IndexChoice::ByRelation => inner
                .by_relation
                .iter()
                .filter(|(ns, rel, obj, ut, uid)| matches(ns, obj, rel, ut, uid))
                .map(|(ns, rel, obj, ut, uid)| {
                    (ns.clone(), obj.clone(), rel.clone(), ut.clone(), uid.clone())
                })
                .collect(),
        };

        ordered
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|key| {
                let created_at = inner.primary.get(&key).copied().ok_or_else(|| {
                    StoreError::Other("index entry missing from primary".to_string())
                })?;
                tuple_from_primary((&key, &created_at))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(namespace: &str, object_id: &str, relation: &str, subject: Subject) -> TupleKey {
        TupleKey::new(namespace, object_id, relation, subject)
    }

    #[tokio::test]
    async fn insert_populates_all_four_indexes() {
        let store = MemoryTupleStore::new();
        store
            .insert(&key("document", "d1", "owner", Subject::user("alice")))
            .await
            .unwrap();

        assert_eq!(store.index_counts(), (1, 1, 1, 1));

        store
            .delete(&key("document", "d1", "owner", Subject::user("alice")))
            .await
            .unwrap();
        assert_eq!(store.index_counts(), (0, 0, 0, 0));
    }

    #[tokio::test]
    async fn insert_is_idempotent_and_keeps_created_at() {
        let store = MemoryTupleStore::new();
        let k = key("document", "d1", "owner", Subject::user("alice"));

        store.insert(&k).await.unwrap();
        let first = store.find_tuples_for("document", "d1", "owner").await.unwrap();

        store.insert(&k).await.unwrap();
        let second = store.find_tuples_for("document", "d1", "owner").await.unwrap();

        assert_eq!(store.index_counts(), (1, 1, 1, 1));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn delete_of_absent_tuple_is_a_noop() {
        let store = MemoryTupleStore::new();
        store
            .delete(&key("document", "ghost", "owner", Subject::user("alice")))
            .await
            .unwrap();
        assert_eq!(store.index_counts(), (0, 0, 0, 0));
    }

    #[tokio::test]
    async fn find_tuples_for_scans_only_the_prefix() {
        let store = MemoryTupleStore::new();
        store
            .insert(&key("document", "d2", "editor", Subject::userset("team", "t1", "member")))
            .await
            .unwrap();
        store
            .insert(&key("document", "d2", "editor", Subject::user("erin")))
            .await
            .unwrap();
        store
            .insert(&key("document", "d2", "viewer", Subject::user("frank")))
            .await
            .unwrap();
        store
            .insert(&key("document", "d3", "editor", Subject::user("gus")))
            .await
            .unwrap();

        let tuples = store.find_tuples_for("document", "d2", "editor").await.unwrap();
        assert_eq!(tuples.len(), 2);
        assert!(tuples.iter().all(|t| t.key.object_id == "d2" && t.key.relation == "editor"));
    }

    #[tokio::test]
    async fn find_memberships_uses_subject_index() {
        let store = MemoryTupleStore::new();
        store
            .insert(&key("team", "t1", "member", Subject::user("bob")))
            .await
            .unwrap();
        store
            .insert(&key("document", "d9", "viewer", Subject::user("bob")))
            .await
            .unwrap();
        store
            .insert(&key("document", "d9", "viewer", Subject::user("carol")))
            .await
            .unwrap();

        let memberships = store.find_memberships(&Subject::user("bob")).await.unwrap();
        assert_eq!(memberships.len(), 2);
        assert!(memberships.iter().all(|t| t.key.subject == Subject::user("bob")));
    }

    #[tokio::test]
    async fn query_selects_index_and_pages() {
        let store = MemoryTupleStore::new();
        for object_id in ["a", "b", "c"] {
            store
                .insert(&key("document", object_id, "viewer", Subject::user("alice")))
                .await
                .unwrap();
        }

        let filter = TupleFilter {
            namespace: Some("document".to_string()),
            relation: Some("viewer".to_string()),
            ..Default::default()
        };
        let page1 = store.query(&filter, 2, 0).await.unwrap();
        let page2 = store.query(&filter, 2, 2).await.unwrap();
        assert_eq!(page1.len(), 2);
        assert_eq!(page2.len(), 1);

        let unindexed = TupleFilter {
            object_id: Some("a".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            store.query(&unindexed, 10, 0).await,
            Err(StoreError::UnindexedFilter(_))
        ));
    }
}
