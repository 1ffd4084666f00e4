use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

/// user_type of a direct principal.
pub const USER_TYPE: &str = "user";
/// Marker user_type for userset subjects in canonical form.
pub const USERSET_TYPE: &str = "userset";

/// Reference to a userset: every subject holding `relation` on
/// `namespace:object_id`.
/// Wire encoding: `namespace:object_id#relation`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsersetRef {
    pub namespace: String,
    pub object_id: String,
    pub relation: String,
}

impl UsersetRef {
    pub fn new(namespace: &str, object_id: &str, relation: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            object_id: object_id.to_string(),
            relation: relation.to_string(),
        }
    }

    /// Parse the `ns:obj#rel` encoding.
    pub fn parse(s: &str) -> Result<Self> {
        let (object_part, relation) = s
            .split_once('#')
            .ok_or_else(|| ModelError::InvalidSubject(format!("missing '#rel' in '{}'", s)))?;
        let (namespace, object_id) = object_part
            .split_once(':')
            .ok_or_else(|| ModelError::InvalidSubject(format!("missing 'ns:' in '{}'", s)))?;

        if namespace.is_empty() || object_id.is_empty() || relation.is_empty() {
            return Err(ModelError::InvalidSubject(format!(
                "empty component in userset '{}'",
                s
            )));
        }

        Ok(Self::new(namespace, object_id, relation))
    }

    pub fn encode(&self) -> String {
        format!("{}:{}#{}", self.namespace, self.object_id, self.relation)
    }
}

impl std::fmt::Display for UsersetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}

/// Subject of a relation tuple: either a concrete principal or a userset.
///
/// Two userset spellings are accepted on the wire and normalize to the same
/// variant:
///   - `user_type = "userset"`, `user_id = "ns:obj#rel"`
///   - `user_type = "<namespace-as-group>"`, `user_id = "obj#rel"`
///
/// The canonical stored encoding is always `("userset", "ns:obj#rel")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    User { id: String },
    Userset(UsersetRef),
}

impl Subject {
    pub fn user(id: &str) -> Self {
        Subject::User { id: id.to_string() }
    }

    pub fn userset(namespace: &str, object_id: &str, relation: &str) -> Self {
        Subject::Userset(UsersetRef::new(namespace, object_id, relation))
    }

    /// Build a subject from its wire parts.
    pub fn from_parts(user_type: &str, user_id: &str) -> Result<Self> {
        if user_type.is_empty() {
            return Err(ModelError::InvalidSubject("empty user_type".to_string()));
        }
        if user_id.is_empty() {
            return Err(ModelError::InvalidSubject("empty user_id".to_string()));
        }

        match user_type {
            USER_TYPE => Ok(Subject::User {
                id: user_id.to_string(),
            }),
            USERSET_TYPE => Ok(Subject::Userset(UsersetRef::parse(user_id)?)),
            // A namespace used as a group: user_id carries `obj#rel` within it.
            namespace => {
                let (object_id, relation) = user_id.split_once('#').ok_or_else(|| {
                    ModelError::InvalidSubject(format!(
                        "user_id '{}' of group namespace '{}' is not 'obj#rel'",
                        user_id, namespace
                    ))
                })?;
                if object_id.is_empty() || relation.is_empty() {
                    return Err(ModelError::InvalidSubject(format!(
                        "empty component in '{}:{}'",
                        namespace, user_id
                    )));
                }
                Ok(Subject::Userset(UsersetRef::new(
                    namespace, object_id, relation,
                )))
            }
        }
    }

    /// Canonical `(user_type, user_id)` wire parts.
    pub fn to_parts(&self) -> (String, String) {
        match self {
            Subject::User { id } => (USER_TYPE.to_string(), id.clone()),
            Subject::Userset(r) => (USERSET_TYPE.to_string(), r.encode()),
        }
    }

    pub fn user_type(&self) -> &'static str {
        match self {
            Subject::User { .. } => USER_TYPE,
            Subject::Userset(_) => USERSET_TYPE,
        }
    }

    pub fn user_id(&self) -> String {
        match self {
            Subject::User { id } => id.clone(),
            Subject::Userset(r) => r.encode(),
        }
    }

    pub fn is_userset(&self) -> bool {
        matches!(self, Subject::Userset(_))
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (user_type, user_id) = self.to_parts();
        write!(f, "{}:{}", user_type, user_id)
    }
}
