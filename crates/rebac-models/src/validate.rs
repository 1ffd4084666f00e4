use crate::error::{ModelError, Result};
use crate::subject::Subject;
use crate::tuple::{TupleFilter, TupleKey};

/// Upper bound on any identifier accepted over the wire.
pub const MAX_IDENTIFIER_LEN: usize = 256;

fn validate_identifier(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ModelError::Validation(format!("{} must not be empty", field)));
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(ModelError::Validation(format!(
            "{} exceeds {} bytes",
            field, MAX_IDENTIFIER_LEN
        )));
    }
    if value.chars().any(|c| c.is_control()) {
        return Err(ModelError::Validation(format!(
            "{} contains non-printable characters",
            field
        )));
    }
    Ok(())
}

/// Namespaces are restricted to `[A-Za-z0-9_-]`.
pub fn validate_namespace(namespace: &str) -> Result<()> {
    validate_identifier("namespace", namespace)?;
    if !namespace
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ModelError::Validation(format!(
            "namespace '{}' contains characters outside [A-Za-z0-9_-]",
            namespace
        )));
    }
    Ok(())
}

/// Relations share the identifier rules. Membership in the permission chain
/// is only consulted for inheritance, never enforced here.
pub fn validate_relation(relation: &str) -> Result<()> {
    validate_identifier("relation", relation)
}

pub fn validate_object_id(object_id: &str) -> Result<()> {
    validate_identifier("object_id", object_id)
}

fn validate_subject(subject: &Subject) -> Result<()> {
    match subject {
        Subject::User { id } => validate_identifier("user_id", id),
        Subject::Userset(r) => {
            validate_namespace(&r.namespace)?;
            validate_identifier("object_id", &r.object_id)?;
            validate_identifier("relation", &r.relation)
        }
    }
}

/// Full validation of a tuple key, applied at the API boundary before any
/// store or checker dispatch.
pub fn validate_tuple_key(key: &TupleKey) -> Result<()> {
    validate_namespace(&key.namespace)?;
    validate_object_id(&key.object_id)?;
    validate_relation(&key.relation)?;
    validate_subject(&key.subject)
}

/// Validate the populated fields of a read filter. Whether the filter hits
/// an indexed prefix is the store's decision, not a shape concern.
pub fn validate_filter(filter: &TupleFilter) -> Result<()> {
    if filter.is_empty() {
        return Err(ModelError::Validation(
            "tuple_filter must populate at least one field".to_string(),
        ));
    }
    if let Some(namespace) = &filter.namespace {
        validate_namespace(namespace)?;
    }
    if let Some(object_id) = &filter.object_id {
        validate_object_id(object_id)?;
    }
    if let Some(relation) = &filter.relation {
        validate_relation(relation)?;
    }
    if let Some(user_type) = &filter.user_type {
        validate_identifier("user_type", user_type)?;
    }
    if let Some(user_id) = &filter.user_id {
        validate_identifier("user_id", user_id)?;
    }
    Ok(())
}
