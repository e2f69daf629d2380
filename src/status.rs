//! # Status
//!
//! `Ready` condition reported for a mapping outcome. A failed mapping sets
//! the condition to `False` with the error reason; the surrounding
//! controller retries with backoff.

use crate::constants::{MAPPING_SUCCEEDED_REASON, READY_CONDITION};
use crate::translate::TranslateError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub r#type: String,
    pub status: String,
    #[serde(default)]
    pub last_transition_time: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `Ready` condition for the result of a translation
#[must_use]
pub fn ready_condition<T>(result: &Result<T, TranslateError>) -> Condition {
    let (status, reason, message) = match result {
        Ok(_) => (
            "True",
            MAPPING_SUCCEEDED_REASON.to_string(),
            "Resource mapped successfully".to_string(),
        ),
        Err(err) => ("False", err.reason().to_string(), err.to_string()),
    };
    Condition {
        r#type: READY_CONDITION.to_string(),
        status: status.to_string(),
        last_transition_time: Some(chrono::Utc::now().to_rfc3339()),
        reason: Some(reason),
        message: Some(message),
    }
}

/// Check if a failed translation is worth retrying unchanged
#[must_use]
pub fn should_retry<T>(result: &Result<T, TranslateError>) -> bool {
    result.as_ref().err().is_some_and(TranslateError::is_transient)
}
