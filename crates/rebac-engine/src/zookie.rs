use crate::error::{EngineError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

/// Opaque consistency token. The decoded form is a wall-clock microsecond
/// timestamp; callers must not depend on the encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Zookie(String);

impl Zookie {
    pub fn encode(timestamp_micros: i64) -> Self {
        Zookie(URL_SAFE_NO_PAD.encode(format!("v1:{}", timestamp_micros)))
    }

    /// Decode back to microseconds. Undecodable tokens are a validation
    /// error, surfaced as 400 at the API boundary.
    pub fn parse(token: &str) -> Result<i64> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| EngineError::Validation("undecodable zookie".to_string()))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| EngineError::Validation("undecodable zookie".to_string()))?;
        let micros = text
            .strip_prefix("v1:")
            .and_then(|rest| rest.parse::<i64>().ok())
            .ok_or_else(|| EngineError::Validation("undecodable zookie".to_string()))?;
        Ok(micros)
    }

    pub fn timestamp_micros(&self) -> Result<i64> {
        Self::parse(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Zookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mints zookies that are strictly increasing within the process, even when
/// the wall clock stalls inside one microsecond.
#[derive(Debug, Default)]
pub struct ZookieManager {
    last_issued: AtomicI64,
}

impl ZookieManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_micros(&self) -> i64 {
        let wall = Utc::now().timestamp_micros();
        loop {
            let prev = self.last_issued.load(Ordering::SeqCst);
            let next = wall.max(prev + 1);
            if self
                .last_issued
                .compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return next;
            }
        }
    }

    pub fn now(&self) -> Zookie {
        Zookie::encode(self.now_micros())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn encode_parse_roundtrip() {
        let zookie = Zookie::encode(1_722_000_000_123_456);
        assert_eq!(Zookie::parse(zookie.as_str()).unwrap(), 1_722_000_000_123_456);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Zookie::parse("not-base64!!!").is_err());
        // Valid base64, wrong payload.
        let bogus = URL_SAFE_NO_PAD.encode("v2:123");
        assert!(Zookie::parse(&bogus).is_err());
        let bogus = URL_SAFE_NO_PAD.encode("v1:abc");
        assert!(Zookie::parse(&bogus).is_err());
    }

    #[test]
    fn zookies_are_strictly_increasing() {
        let manager = ZookieManager::new();
        let mut prev = manager.now_micros();
        for _ in 0..10_000 {
            let next = manager.now_micros();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn zookies_are_strictly_increasing_across_threads() {
        let manager = Arc::new(ZookieManager::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            handles.push(std::thread::spawn(move || {
                (0..1_000).map(|_| manager.now_micros()).collect::<Vec<_>>()
            }));
        }

        let mut all: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("thread panicked"))
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
    }
}
