//! services/api/src/web/params.rs
//!
//! Query and path parameter schemas for the replacement and click-through
//! endpoints. Each one is checked by `ValidatedQuery`/`ValidatedPath` before a
//! handler body runs.

use regex::Regex;
use serde::Deserialize;
use std::borrow::Cow;
use std::net::IpAddr;
use std::sync::LazyLock;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::{Validate, ValidationError};

static HEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]+$").unwrap());

static HOST_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").unwrap());

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

pub fn validate_hex(value: &str) -> Result<(), ValidationError> {
    if HEX.is_match(value) {
        Ok(())
    } else {
        Err(error("hex", "must only contain hexadecimal characters"))
    }
}

/// Accepts DNS names (optionally fully qualified) and IP literals.
pub fn validate_hostname(value: &str) -> Result<(), ValidationError> {
    if value.parse::<IpAddr>().is_ok() {
        return Ok(());
    }
    let name = value.strip_suffix('.').unwrap_or(value);
    if !name.is_empty() && name.len() <= 253 && name.split('.').all(|l| HOST_LABEL.is_match(l)) {
        Ok(())
    } else {
        Err(error("hostname", "must be a valid hostname"))
    }
}

fn check_dimension(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(error("dimensions", "width and height must be positive numbers"))
    }
}

fn validate_legacy_dimensions(query: &LegacyReplacementQuery) -> Result<(), ValidationError> {
    check_dimension(query.width)?;
    check_dimension(query.height)
}

fn validate_dimensions(query: &ReplacementQuery) -> Result<(), ValidationError> {
    check_dimension(query.width)?;
    check_dimension(query.height)
}

/// `GET /replacement`
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[into_params(parameter_in = Query)]
#[validate(schema(function = "validate_legacy_dimensions"))]
pub struct LegacyReplacementQuery {
    pub brave_user_id: Uuid,
    #[validate(custom(function = "validate_hostname"))]
    pub intent_host: String,
    #[validate(length(min = 1))]
    pub tag_name: String,
    pub width: f64,
    pub height: f64,
}

/// `GET /v1/users/{userId}/replacement`
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[into_params(parameter_in = Query)]
#[validate(schema(function = "validate_dimensions"))]
pub struct ReplacementQuery {
    /// the identity of the session
    pub session_id: Uuid,
    /// at present, always "IFRAME" (for the <iframe/> tag)
    #[validate(length(min = 1))]
    pub tag_name: String,
    /// the width in pixels of the replacement ad
    pub width: f64,
    /// the height in pixels of the replacement ad
    pub height: f64,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct UserPath {
    /// the identity of the user entry
    #[serde(rename = "userId")]
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct AdClickPath {
    /// ad replacement identifier
    #[serde(rename = "adUnitId")]
    #[validate(custom(function = "validate_hex"))]
    pub ad_unit_id: String,
}
