use crate::error::ModelError;
use crate::subject::Subject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique key of a relation tuple: one edge of the authorization graph.
/// Display form: `namespace:object_id#relation@user_type:user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TupleKeyWire", into = "TupleKeyWire")]
pub struct TupleKey {
    pub namespace: String,
    pub object_id: String,
    pub relation: String,
    pub subject: Subject,
}

impl TupleKey {
    pub fn new(namespace: &str, object_id: &str, relation: &str, subject: Subject) -> Self {
        Self {
            namespace: namespace.to_string(),
            object_id: object_id.to_string(),
            relation: relation.to_string(),
            subject,
        }
    }
}

impl std::fmt::Display for TupleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}#{}@{}",
            self.namespace, self.object_id, self.relation, self.subject
        )
    }
}

/// Wire shape of a tuple key; `user_type`/`user_id` carry the subject parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TupleKeyWire {
    namespace: String,
    object_id: String,
    relation: String,
    user_type: String,
    user_id: String,
}

impl TryFrom<TupleKeyWire> for TupleKey {
    type Error = ModelError;

    fn try_from(wire: TupleKeyWire) -> Result<Self, Self::Error> {
        let subject = Subject::from_parts(&wire.user_type, &wire.user_id)?;
        Ok(TupleKey {
            namespace: wire.namespace,
            object_id: wire.object_id,
            relation: wire.relation,
            subject,
        })
    }
}

impl From<TupleKey> for TupleKeyWire {
    fn from(key: TupleKey) -> Self {
        let (user_type, user_id) = key.subject.to_parts();
        TupleKeyWire {
            namespace: key.namespace,
            object_id: key.object_id,
            relation: key.relation,
            user_type,
            user_id,
        }
    }
}

/// A stored relation tuple. `created_at` is assigned by the store on first
/// insert (microsecond resolution) and is not rewound by idempotent
/// re-inserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RelationTupleWire", into = "RelationTupleWire")]
pub struct RelationTuple {
    pub key: TupleKey,
    pub created_at: DateTime<Utc>,
}

impl RelationTuple {
    pub fn new(key: TupleKey, created_at: DateTime<Utc>) -> Self {
        Self { key, created_at }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RelationTupleWire {
    namespace: String,
    object_id: String,
    relation: String,
    user_type: String,
    user_id: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RelationTupleWire> for RelationTuple {
    type Error = ModelError;

    fn try_from(wire: RelationTupleWire) -> Result<Self, Self::Error> {
        let subject = Subject::from_parts(&wire.user_type, &wire.user_id)?;
        Ok(RelationTuple {
            key: TupleKey {
                namespace: wire.namespace,
                object_id: wire.object_id,
                relation: wire.relation,
                subject,
            },
            created_at: wire.created_at,
        })
    }
}

impl From<RelationTuple> for RelationTupleWire {
    fn from(tuple: RelationTuple) -> Self {
        let (user_type, user_id) = tuple.key.subject.to_parts();
        RelationTupleWire {
            namespace: tuple.key.namespace,
            object_id: tuple.key.object_id,
            relation: tuple.key.relation,
            user_type,
            user_id,
            created_at: tuple.created_at,
        }
    }
}

/// Filter over the five tuple fields; any subset may be populated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TupleFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl TupleFilter {
    pub fn is_empty(&self) -> bool {
        self.namespace.is_none()
            && self.object_id.is_none()
            && self.relation.is_none()
            && self.user_type.is_none()
            && self.user_id.is_none()
    }
}
