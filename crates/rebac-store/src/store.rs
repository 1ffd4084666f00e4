use crate::error::Result;
use async_trait::async_trait;
use rebac_models::{RelationTuple, Subject, TupleFilter, TupleKey};

/// Indexed tuple storage. Every implementation keeps four access paths
/// mutually consistent so each read below is a single indexed lookup:
///
/// | Index        | Key order                                        |
/// |--------------|--------------------------------------------------|
/// | Primary      | (namespace, object_id, relation, user_type, user_id) |
/// | By subject   | (user_id, user_type, namespace, object_id, relation) |
/// | By object    | (namespace, object_id, relation, user_type, user_id) |
/// | By relation  | (namespace, relation, object_id, user_type, user_id) |
#[async_trait]
pub trait TupleStore: Send + Sync {
    /// Backend reachability, reported by the health endpoint. In-process
    /// implementations are trivially reachable.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    /// Write the tuple to all four indexes in one logical unit. Idempotent:
    /// re-inserting an existing key is a no-op and does not rewind the
    /// stored created_at. A failure leaves index state undefined from the
    /// caller's view; the caller retries.
    async fn insert(&self, key: &TupleKey) -> Result<()>;

    /// Remove the tuple from all four indexes. Missing entries are not an
    /// error.
    async fn delete(&self, key: &TupleKey) -> Result<()>;

    /// Single-key probe on the Primary index.
    async fn find_direct(
        &self,
        namespace: &str,
        object_id: &str,
        relation: &str,
        subject: &Subject,
    ) -> Result<bool>;

    /// Prefix scan on the Primary index: every tuple on
    /// `(namespace, object_id, relation)`.
    async fn find_tuples_for(
        &self,
        namespace: &str,
        object_id: &str,
        relation: &str,
    ) -> Result<Vec<RelationTuple>>;

    /// Prefix scan on the by-subject index: every tuple naming this subject.
    async fn find_memberships(&self, subject: &Subject) -> Result<Vec<RelationTuple>>;

    /// Filtered enumeration for the Read operation. The most selective
    /// populated prefix picks the index; a filter that does not cover any
    /// indexed prefix fails with [`StoreError::UnindexedFilter`].
    ///
    /// [`StoreError::UnindexedFilter`]: crate::error::StoreError::UnindexedFilter
    async fn query(
        &self,
        filter: &TupleFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RelationTuple>>;
}

/// Which index a filter resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexChoice {
    Primary,
    BySubject,
    ByRelation,
}

/// Shared index-selection rule: the most selective populated prefix wins.
pub fn choose_index(filter: &TupleFilter) -> Result<IndexChoice> {
    if filter.namespace.is_some() && filter.object_id.is_some() {
        return Ok(IndexChoice::Primary);
    }
    if filter.user_id.is_some() && filter.user_type.is_some() {
        return Ok(IndexChoice::BySubject);
    }
    if filter.namespace.is_some() && filter.relation.is_some() {
        return Ok(IndexChoice::ByRelation);
    }
    Err(crate::error::StoreError::UnindexedFilter(
        "populate (namespace, object_id), (user_id, user_type) or (namespace, relation)"
            .to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(
        namespace: Option<&str>,
        object_id: Option<&str>,
        relation: Option<&str>,
        user_type: Option<&str>,
        user_id: Option<&str>,
    ) -> TupleFilter {
        TupleFilter {
            namespace: namespace.map(String::from),
            object_id: object_id.map(String::from),
            relation: relation.map(String::from),
            user_type: user_type.map(String::from),
            user_id: user_id.map(String::from),
        }
    }

    #[test]
    fn object_prefix_hits_primary() {
        let choice = choose_index(&filter(Some("document"), Some("d1"), None, None, None));
        assert_eq!(choice.unwrap(), IndexChoice::Primary);
    }

    #[test]
    fn subject_prefix_hits_by_subject() {
        let choice = choose_index(&filter(None, None, None, Some("user"), Some("alice")));
        assert_eq!(choice.unwrap(), IndexChoice::BySubject);
    }

    #[test]
    fn relation_prefix_hits_by_relation() {
        let choice = choose_index(&filter(Some("document"), None, Some("editor"), None, None));
        assert_eq!(choice.unwrap(), IndexChoice::ByRelation);
    }

    #[test]
    fn bare_namespace_is_unindexed() {
        assert!(choose_index(&filter(Some("document"), None, None, None, None)).is_err());
        assert!(choose_index(&filter(None, None, None, None, Some("alice"))).is_err());
        assert!(choose_index(&TupleFilter::default()).is_err());
    }
}
