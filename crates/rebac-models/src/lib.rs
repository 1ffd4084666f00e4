pub mod error;
pub mod subject;
pub mod tuple;
pub mod validate;

pub use error::{ModelError, Result};
pub use subject::{Subject, UsersetRef, USERSET_TYPE, USER_TYPE};
pub use tuple::{RelationTuple, TupleFilter, TupleKey};
pub use validate::{validate_filter, validate_relation, validate_tuple_key, MAX_IDENTIFIER_LEN};
