//! Scenario request types.
//!
//! Every request has two shapes:
//! - a wire shape (`*Params`) with every field optional, exactly as clients send it
//! - a validated shape whose only construction path applies the required-field
//!   checks and the numeric defaults
//!
//! The validated types deserialize through their wire shape (`try_from`) and
//! serialize back into it (`into`), so re-validating a validated request always
//! yields the same request.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ============================================================================
// DEFAULTS
// ============================================================================

pub const DEFAULT_INVALIDATION_AWAIT_MILLIS: u64 = 300;
pub const DEFAULT_REDIS_TTL_SECONDS: u64 = 5;
pub const DEFAULT_DRIFT_WAIT_MILLIS: u64 = 6_000;
pub const DEFAULT_HASH_AWAIT_MILLIS: u64 = 500;
pub const DEFAULT_WARMUP_TTL_SECONDS: u64 = 30;
pub const DEFAULT_EXPIRE_TTL_SECONDS: u64 = 5;
pub const DEFAULT_POLL_INTERVAL_MILLIS: u64 = 500;
pub const DEFAULT_MAX_WAIT_MILLIS: u64 = 10_000;
pub const DEFAULT_STORM_ITERATIONS: u32 = 50;
pub const DEFAULT_STORM_PAUSE_MILLIS: u64 = 0;
pub const DEFAULT_CHURN_PREFIX: &str = "load:key";
pub const DEFAULT_CHURN_KEY_COUNT: u32 = 500;
pub const DEFAULT_CHURN_ITERATIONS: u32 = 2_000;
pub const DEFAULT_CHURN_PAYLOAD_SIZE: u32 = 64;
pub const DEFAULT_CHURN_PAUSE_MILLIS: u64 = 0;

// ============================================================================
// FIELD HELPERS
// ============================================================================

fn require_non_blank(field: &str, value: Option<String>) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::missing(field)),
    }
}

fn require_present(field: &str, value: Option<String>) -> Result<String, ValidationError> {
    value.ok_or_else(|| ValidationError::missing(field))
}

/// Null or `<= 0` resolves to the default.
fn positive_or(value: Option<i64>, default: u64) -> u64 {
    match value {
        Some(v) if v > 0 => v as u64,
        _ => default,
    }
}

/// Null or `< 0` resolves to the default.
fn non_negative_or(value: Option<i64>, default: u64) -> u64 {
    match value {
        Some(v) if v >= 0 => v as u64,
        _ => default,
    }
}

fn positive_count_or(field: &str, value: Option<i64>, default: u32) -> Result<u32, ValidationError> {
    match value {
        Some(v) if v > 0 => u32::try_from(v)
            .map_err(|_| ValidationError::invalid(field, format!("must not exceed {}", u32::MAX))),
        _ => Ok(default),
    }
}

fn as_wire(value: u64) -> Option<i64> {
    Some(i64::try_from(value).unwrap_or(i64::MAX))
}

// ============================================================================
// INVALIDATION
// ============================================================================

/// Wire shape for the invalidation scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct InvalidationParams {
    pub key: Option<String>,
    pub initial_value: Option<String>,
    pub updated_value: Option<String>,
    pub await_millis: Option<i64>,
}

/// Validated invalidation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "InvalidationParams", into = "InvalidationParams")]
pub struct InvalidationRequest {
    key: String,
    initial_value: String,
    updated_value: String,
    await_millis: u64,
}

impl InvalidationRequest {
    pub fn new(
        key: Option<String>,
        initial_value: Option<String>,
        updated_value: Option<String>,
        await_millis: Option<i64>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            key: require_non_blank("key", key)?,
            initial_value: require_present("initialValue", initial_value)?,
            updated_value: require_present("updatedValue", updated_value)?,
            await_millis: non_negative_or(await_millis, DEFAULT_INVALIDATION_AWAIT_MILLIS),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn initial_value(&self) -> &str {
        &self.initial_value
    }

    pub fn updated_value(&self) -> &str {
        &self.updated_value
    }

    pub fn await_millis(&self) -> u64 {
        self.await_millis
    }
}

impl TryFrom<InvalidationParams> for InvalidationRequest {
    type Error = ValidationError;

    fn try_from(p: InvalidationParams) -> Result<Self, Self::Error> {
        Self::new(p.key, p.initial_value, p.updated_value, p.await_millis)
    }
}

impl From<InvalidationRequest> for InvalidationParams {
    fn from(r: InvalidationRequest) -> Self {
        Self {
            key: Some(r.key),
            initial_value: Some(r.initial_value),
            updated_value: Some(r.updated_value),
            await_millis: as_wire(r.await_millis),
        }
    }
}

// ============================================================================
// TTL DRIFT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TtlDriftParams {
    pub key: Option<String>,
    pub value: Option<String>,
    pub redis_ttl_seconds: Option<i64>,
    pub wait_millis: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TtlDriftParams", into = "TtlDriftParams")]
pub struct TtlDriftRequest {
    key: String,
    value: String,
    redis_ttl_seconds: u64,
    wait_millis: u64,
}

impl TtlDriftRequest {
    pub fn new(
        key: Option<String>,
        value: Option<String>,
        redis_ttl_seconds: Option<i64>,
        wait_millis: Option<i64>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            key: require_non_blank("key", key)?,
            value: require_present("value", value)?,
            redis_ttl_seconds: positive_or(redis_ttl_seconds, DEFAULT_REDIS_TTL_SECONDS),
            wait_millis: positive_or(wait_millis, DEFAULT_DRIFT_WAIT_MILLIS),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn redis_ttl_seconds(&self) -> u64 {
        self.redis_ttl_seconds
    }

    pub fn wait_millis(&self) -> u64 {
        self.wait_millis
    }
}

impl TryFrom<TtlDriftParams> for TtlDriftRequest {
    type Error = ValidationError;

    fn try_from(p: TtlDriftParams) -> Result<Self, Self::Error> {
        Self::new(p.key, p.value, p.redis_ttl_seconds, p.wait_millis)
    }
}

impl From<TtlDriftRequest> for TtlDriftParams {
    fn from(r: TtlDriftRequest) -> Self {
        Self {
            key: Some(r.key),
            value: Some(r.value),
            redis_ttl_seconds: as_wire(r.redis_ttl_seconds),
            wait_millis: as_wire(r.wait_millis),
        }
    }
}

// ============================================================================
// HASH INVALIDATION
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct HashInvalidationParams {
    pub key: Option<String>,
    pub field: Option<String>,
    pub initial_value: Option<String>,
    pub updated_value: Option<String>,
    pub await_millis: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HashInvalidationParams", into = "HashInvalidationParams")]
pub struct HashInvalidationRequest {
    key: String,
    field: String,
    initial_value: String,
    updated_value: String,
    await_millis: u64,
}

impl HashInvalidationRequest {
    pub fn new(
        key: Option<String>,
        field: Option<String>,
        initial_value: Option<String>,
        updated_value: Option<String>,
        await_millis: Option<i64>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            key: require_non_blank("key", key)?,
            field: require_non_blank("field", field)?,
            initial_value: require_present("initialValue", initial_value)?,
            updated_value: require_present("updatedValue", updated_value)?,
            await_millis: non_negative_or(await_millis, DEFAULT_HASH_AWAIT_MILLIS),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn initial_value(&self) -> &str {
        &self.initial_value
    }

    pub fn updated_value(&self) -> &str {
        &self.updated_value
    }

    pub fn await_millis(&self) -> u64 {
        self.await_millis
    }
}

impl TryFrom<HashInvalidationParams> for HashInvalidationRequest {
    type Error = ValidationError;

    fn try_from(p: HashInvalidationParams) -> Result<Self, Self::Error> {
        Self::new(p.key, p.field, p.initial_value, p.updated_value, p.await_millis)
    }
}

impl From<HashInvalidationRequest> for HashInvalidationParams {
    fn from(r: HashInvalidationRequest) -> Self {
        Self {
            key: Some(r.key),
            field: Some(r.field),
            initial_value: Some(r.initial_value),
            updated_value: Some(r.updated_value),
            await_millis: as_wire(r.await_millis),
        }
    }
}

// ============================================================================
// WARMUP
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct WarmupParams {
    #[serde(alias = "initialValue")]
    pub value: Option<String>,
    pub ttl_seconds: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WarmupParams", into = "WarmupParams")]
pub struct WarmupRequest {
    value: String,
    ttl_seconds: u64,
}

impl WarmupRequest {
    pub fn new(value: Option<String>, ttl_seconds: Option<i64>) -> Result<Self, ValidationError> {
        Ok(Self {
            value: require_non_blank("value", value)?,
            ttl_seconds: positive_or(ttl_seconds, DEFAULT_WARMUP_TTL_SECONDS),
        })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }
}

impl TryFrom<WarmupParams> for WarmupRequest {
    type Error = ValidationError;

    fn try_from(p: WarmupParams) -> Result<Self, Self::Error> {
        Self::new(p.value, p.ttl_seconds)
    }
}

impl From<WarmupRequest> for WarmupParams {
    fn from(r: WarmupRequest) -> Self {
        Self {
            value: Some(r.value),
            ttl_seconds: as_wire(r.ttl_seconds),
        }
    }
}

// ============================================================================
// EXPIRATION VERIFICATION
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ExpirationParams {
    pub key: Option<String>,
    pub value: Option<String>,
    pub ttl_seconds: Option<i64>,
    pub poll_interval_millis: Option<i64>,
    pub max_wait_millis: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ExpirationParams", into = "ExpirationParams")]
pub struct ExpirationRequest {
    key: String,
    value: String,
    ttl_seconds: u64,
    poll_interval_millis: u64,
    max_wait_millis: u64,
}

impl ExpirationRequest {
    pub fn new(
        key: Option<String>,
        value: Option<String>,
        ttl_seconds: Option<i64>,
        poll_interval_millis: Option<i64>,
        max_wait_millis: Option<i64>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            key: require_non_blank("key", key)?,
            value: require_present("value", value)?,
            ttl_seconds: positive_or(ttl_seconds, DEFAULT_EXPIRE_TTL_SECONDS),
            poll_interval_millis: positive_or(poll_interval_millis, DEFAULT_POLL_INTERVAL_MILLIS),
            max_wait_millis: positive_or(max_wait_millis, DEFAULT_MAX_WAIT_MILLIS),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    pub fn poll_interval_millis(&self) -> u64 {
        self.poll_interval_millis
    }

    pub fn max_wait_millis(&self) -> u64 {
        self.max_wait_millis
    }
}

impl TryFrom<ExpirationParams> for ExpirationRequest {
    type Error = ValidationError;

    fn try_from(p: ExpirationParams) -> Result<Self, Self::Error> {
        Self::new(
            p.key,
            p.value,
            p.ttl_seconds,
            p.poll_interval_millis,
            p.max_wait_millis,
        )
    }
}

impl From<ExpirationRequest> for ExpirationParams {
    fn from(r: ExpirationRequest) -> Self {
        Self {
            key: Some(r.key),
            value: Some(r.value),
            ttl_seconds: as_wire(r.ttl_seconds),
            poll_interval_millis: as_wire(r.poll_interval_millis),
            max_wait_millis: as_wire(r.max_wait_millis),
        }
    }
}

// ============================================================================
// EVENT STORM
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EventStormParams {
    pub key: Option<String>,
    pub initial_value: Option<String>,
    pub iterations: Option<i64>,
    pub pause_millis: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EventStormParams", into = "EventStormParams")]
pub struct EventStormRequest {
    key: String,
    initial_value: String,
    iterations: u32,
    pause_millis: u64,
}

impl EventStormRequest {
    pub fn new(
        key: Option<String>,
        initial_value: Option<String>,
        iterations: Option<i64>,
        pause_millis: Option<i64>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            key: require_non_blank("key", key)?,
            initial_value: require_present("initialValue", initial_value)?,
            iterations: positive_count_or("iterations", iterations, DEFAULT_STORM_ITERATIONS)?,
            pause_millis: non_negative_or(pause_millis, DEFAULT_STORM_PAUSE_MILLIS),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn initial_value(&self) -> &str {
        &self.initial_value
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn pause_millis(&self) -> u64 {
        self.pause_millis
    }
}

impl TryFrom<EventStormParams> for EventStormRequest {
    type Error = ValidationError;

    fn try_from(p: EventStormParams) -> Result<Self, Self::Error> {
        Self::new(p.key, p.initial_value, p.iterations, p.pause_millis)
    }
}

impl From<EventStormRequest> for EventStormParams {
    fn from(r: EventStormRequest) -> Self {
        Self {
            key: Some(r.key),
            initial_value: Some(r.initial_value),
            iterations: Some(i64::from(r.iterations)),
            pause_millis: as_wire(r.pause_millis),
        }
    }
}

// ============================================================================
// STRING CHURN
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StringChurnParams {
    pub prefix: Option<String>,
    pub key_count: Option<i64>,
    pub iterations: Option<i64>,
    pub payload_size: Option<i64>,
    pub pause_millis: Option<i64>,
}

/// Validated string churn request. Has no required fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StringChurnParams", into = "StringChurnParams")]
pub struct StringChurnRequest {
    prefix: String,
    key_count: u32,
    iterations: u32,
    payload_size: u32,
    pause_millis: u64,
}

impl StringChurnRequest {
    pub fn new(
        prefix: Option<String>,
        key_count: Option<i64>,
        iterations: Option<i64>,
        payload_size: Option<i64>,
        pause_millis: Option<i64>,
    ) -> Result<Self, ValidationError> {
        let prefix = match prefix {
            Some(p) if !p.trim().is_empty() => p,
            _ => DEFAULT_CHURN_PREFIX.to_string(),
        };
        Ok(Self {
            prefix,
            key_count: positive_count_or("keyCount", key_count, DEFAULT_CHURN_KEY_COUNT)?,
            iterations: positive_count_or("iterations", iterations, DEFAULT_CHURN_ITERATIONS)?,
            payload_size: positive_count_or("payloadSize", payload_size, DEFAULT_CHURN_PAYLOAD_SIZE)?,
            pause_millis: non_negative_or(pause_millis, DEFAULT_CHURN_PAUSE_MILLIS),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn key_count(&self) -> u32 {
        self.key_count
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn payload_size(&self) -> u32 {
        self.payload_size
    }

    pub fn pause_millis(&self) -> u64 {
        self.pause_millis
    }
}

impl Default for StringChurnRequest {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_CHURN_PREFIX.to_string(),
            key_count: DEFAULT_CHURN_KEY_COUNT,
            iterations: DEFAULT_CHURN_ITERATIONS,
            payload_size: DEFAULT_CHURN_PAYLOAD_SIZE,
            pause_millis: DEFAULT_CHURN_PAUSE_MILLIS,
        }
    }
}

impl TryFrom<StringChurnParams> for StringChurnRequest {
    type Error = ValidationError;

    fn try_from(p: StringChurnParams) -> Result<Self, Self::Error> {
        Self::new(p.prefix, p.key_count, p.iterations, p.payload_size, p.pause_millis)
    }
}

impl From<StringChurnRequest> for StringChurnParams {
    fn from(r: StringChurnRequest) -> Self {
        Self {
            prefix: Some(r.prefix),
            key_count: Some(i64::from(r.key_count)),
            iterations: Some(i64::from(r.iterations)),
            payload_size: Some(i64::from(r.payload_size)),
            pause_millis: as_wire(r.pause_millis),
        }
    }
}

// ============================================================================
// NEAR-CACHE STATUS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NearCacheStatusParams {
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NearCacheStatusParams", into = "NearCacheStatusParams")]
pub struct NearCacheStatusRequest {
    key: String,
}

impl NearCacheStatusRequest {
    pub fn new(key: Option<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            key: require_non_blank("key", key)?,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl TryFrom<NearCacheStatusParams> for NearCacheStatusRequest {
    type Error = ValidationError;

    fn try_from(p: NearCacheStatusParams) -> Result<Self, Self::Error> {
        Self::new(p.key)
    }
}

impl From<NearCacheStatusRequest> for NearCacheStatusParams {
    fn from(r: NearCacheStatusRequest) -> Self {
        Self { key: Some(r.key) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_invalidation_defaults_await() -> Result<(), ValidationError> {
        let req = InvalidationRequest::new(s("k1"), s("v1"), s("v2"), None)?;
        assert_eq!(req.await_millis(), DEFAULT_INVALIDATION_AWAIT_MILLIS);

        let req = InvalidationRequest::new(s("k1"), s("v1"), s("v2"), Some(-5))?;
        assert_eq!(req.await_millis(), DEFAULT_INVALIDATION_AWAIT_MILLIS);

        // Zero is a legal wait window here.
        let req = InvalidationRequest::new(s("k1"), s("v1"), s("v2"), Some(0))?;
        assert_eq!(req.await_millis(), 0);
        Ok(())
    }

    #[test]
    fn test_invalidation_rejects_blank_key() {
        let err = InvalidationRequest::new(s("   "), s("v1"), s("v2"), None);
        assert_eq!(err, Err(ValidationError::missing("key")));
    }

    #[test]
    fn test_invalidation_allows_empty_values_but_not_null() {
        assert!(InvalidationRequest::new(s("k"), s(""), s(""), None).is_ok());
        assert_eq!(
            InvalidationRequest::new(s("k"), None, s("v2"), None),
            Err(ValidationError::missing("initialValue"))
        );
        assert_eq!(
            InvalidationRequest::new(s("k"), s("v1"), None, None),
            Err(ValidationError::missing("updatedValue"))
        );
    }

    #[test]
    fn test_ttl_drift_defaults() -> Result<(), ValidationError> {
        let req = TtlDriftRequest::new(s("k"), s("v"), Some(0), Some(0))?;
        assert_eq!(req.redis_ttl_seconds(), DEFAULT_REDIS_TTL_SECONDS);
        assert_eq!(req.wait_millis(), DEFAULT_DRIFT_WAIT_MILLIS);

        let req = TtlDriftRequest::new(s("k"), s("v"), Some(2), Some(1_500))?;
        assert_eq!(req.redis_ttl_seconds(), 2);
        assert_eq!(req.wait_millis(), 1_500);
        Ok(())
    }

    #[test]
    fn test_hash_invalidation_requires_field() {
        assert_eq!(
            HashInvalidationRequest::new(s("k"), s(""), s("a"), s("b"), None),
            Err(ValidationError::missing("field"))
        );
    }

    #[test]
    fn test_warmup_accepts_initial_value_alias() -> Result<(), serde_json::Error> {
        let req: WarmupRequest = serde_json::from_str(r#"{"initialValue":"hot"}"#)?;
        assert_eq!(req.value(), "hot");
        assert_eq!(req.ttl_seconds(), DEFAULT_WARMUP_TTL_SECONDS);
        Ok(())
    }

    #[test]
    fn test_expiration_defaults() -> Result<(), ValidationError> {
        let req = ExpirationRequest::new(s("k"), s("v"), Some(-1), None, Some(0))?;
        assert_eq!(req.ttl_seconds(), DEFAULT_EXPIRE_TTL_SECONDS);
        assert_eq!(req.poll_interval_millis(), DEFAULT_POLL_INTERVAL_MILLIS);
        assert_eq!(req.max_wait_millis(), DEFAULT_MAX_WAIT_MILLIS);
        Ok(())
    }

    #[test]
    fn test_event_storm_rejects_oversized_iterations() {
        let err = EventStormRequest::new(s("k"), s("v"), Some(i64::MAX), None);
        assert!(matches!(err, Err(ValidationError::InvalidValue { .. })));
    }

    #[test]
    fn test_string_churn_all_defaults() -> Result<(), ValidationError> {
        let req = StringChurnRequest::new(Some("  ".to_string()), None, Some(0), None, Some(-1))?;
        assert_eq!(req, StringChurnRequest::default());
        Ok(())
    }

    #[test]
    fn test_serde_rejection_surfaces_validation_message() {
        let err = serde_json::from_str::<NearCacheStatusRequest>(r#"{"key":""}"#);
        let msg = err.map(|_| String::new()).unwrap_or_else(|e| e.to_string());
        assert!(msg.contains("Required field missing: key"));
    }
}
