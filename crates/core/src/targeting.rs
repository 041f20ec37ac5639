//! Flight targeting rules and their data-entry validation.
//!
//! Rules are validated once, when a flight is saved. Decisions only ever see
//! the typed [`TargetingParameters`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::countries::is_country_code;
use crate::types::Geolocation;

/// How a flight treats mobile traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MobileTraffic {
    /// Never show on mobile devices.
    Exclude,
    /// Show on mobile devices only.
    Only,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetingParameters {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_countries: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_countries: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_state_provinces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_metro_codes: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_traffic: Option<MobileTraffic>,
}

impl TargetingParameters {
    pub fn show_to_geo(&self, geo: &Geolocation) -> bool {
        let country = geo.country_code.as_deref();

        if !self.include_countries.is_empty()
            && !country.is_some_and(|c| self.include_countries.iter().any(|i| i == c))
        {
            return false;
        }

        if !self.include_state_provinces.is_empty() {
            let region = geo.region_code.as_deref();
            if !region.is_some_and(|r| self.include_state_provinces.iter().any(|i| i == r)) {
                return false;
            }
        }

        if !self.include_metro_codes.is_empty()
            && !geo
                .metro_code
                .is_some_and(|m| self.include_metro_codes.contains(&m))
        {
            return false;
        }

        if let Some(country) = country {
            if self.exclude_countries.iter().any(|e| e == country) {
                return false;
            }
        }

        true
    }

    pub fn show_to_keywords(&self, keywords: &[String]) -> bool {
        if !self.include_keywords.is_empty()
            && !keywords.iter().any(|k| self.include_keywords.contains(k))
        {
            return false;
        }

        !keywords.iter().any(|k| self.exclude_keywords.contains(k))
    }

    pub fn show_to_mobile(&self, is_mobile: bool) -> bool {
        match self.mobile_traffic {
            Some(MobileTraffic::Exclude) => !is_mobile,
            Some(MobileTraffic::Only) => is_mobile,
            None => true,
        }
    }
}

// ─── Validation ─────────────────────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Value must be an object, not {0}")]
    InvalidType(&'static str),

    #[error("{0} is not a valid targeting parameter")]
    UnknownKey(String),

    #[error("{key} must be a list")]
    NotAList { key: String },

    #[error("{0} is not a valid country code")]
    CountryCode(String),

    #[error("{0} is not a valid state/province code")]
    StateProvinceCode(String),

    #[error("{0} is not a valid metro code")]
    MetroCode(String),

    #[error("{0} must be one of (\"exclude\", \"only\")")]
    MobileTraffic(String),

    #[error("{0} must be a string")]
    NotAString(String),
}

/// Validate a raw targeting document as entered by campaign staff and
/// convert it to typed parameters.
pub fn validate_targeting(value: &Value) -> Result<TargetingParameters, ValidationError> {
    let map = match value {
        Value::Object(map) => map,
        other => return Err(ValidationError::InvalidType(json_type_name(other))),
    };

    let mut params = TargetingParameters::default();

    for (key, value) in map {
        match key.as_str() {
            "include_countries" => params.include_countries = country_codes(key, value)?,
            "exclude_countries" => params.exclude_countries = country_codes(key, value)?,
            "include_state_provinces" => {
                params.include_state_provinces = list(key, value)?
                    .iter()
                    .map(|v| match v.as_str() {
                        Some(code) if code.chars().count() == 2 => Ok(code.to_string()),
                        _ => Err(ValidationError::StateProvinceCode(v.to_string())),
                    })
                    .collect::<Result<_, _>>()?;
            }
            "include_metro_codes" => {
                params.include_metro_codes = list(key, value)?
                    .iter()
                    .map(|v| {
                        v.as_u64()
                            .and_then(|code| u32::try_from(code).ok())
                            .ok_or_else(|| ValidationError::MetroCode(v.to_string()))
                    })
                    .collect::<Result<_, _>>()?;
            }
            "include_keywords" => params.include_keywords = strings(key, value)?,
            "exclude_keywords" => params.exclude_keywords = strings(key, value)?,
            "mobile_traffic" => {
                params.mobile_traffic = Some(match value.as_str() {
                    Some("exclude") => MobileTraffic::Exclude,
                    Some("only") => MobileTraffic::Only,
                    _ => return Err(ValidationError::MobileTraffic(value.to_string())),
                });
            }
            unknown => return Err(ValidationError::UnknownKey(unknown.to_string())),
        }
    }

    Ok(params)
}

fn list<'a>(key: &str, value: &'a Value) -> Result<&'a Vec<Value>, ValidationError> {
    value.as_array().ok_or_else(|| ValidationError::NotAList {
        key: key.to_string(),
    })
}

fn strings(key: &str, value: &Value) -> Result<Vec<String>, ValidationError> {
    list(key, value)?
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| ValidationError::NotAString(v.to_string()))
        })
        .collect()
}

fn country_codes(key: &str, value: &Value) -> Result<Vec<String>, ValidationError> {
    list(key, value)?
        .iter()
        .map(|v| match v.as_str() {
            Some(code) if is_country_code(code) => Ok(code.to_string()),
            _ => Err(ValidationError::CountryCode(v.to_string())),
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
