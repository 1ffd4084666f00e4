pub mod checker;
pub mod error;
pub mod hierarchy;
pub mod zookie;

pub use checker::{CheckRequest, CheckResponse, CheckerConfig, PermissionChecker};
pub use error::{EngineError, Result};
pub use hierarchy::{level, relations_above};
pub use zookie::{Zookie, ZookieManager};
