//! Response envelopes returned by every remote call.
//!
//! On the wire a response is `{success: true, data}` or
//! `{success: false, code, message, data: null}`. In Rust it is an enum.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::StashError;

/// Message used when a fault carries no text of its own.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";

/// Messages the API uses to reject a credential, lowercased.
const AUTH_REJECTION_MESSAGES: &[&str] = &[
    "unauthorized",
    "invalid or expired token",
    "token expired",
    "malformed token",
];

/// A structured failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub code: u16,
    pub message: String,
}

impl Failure {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// A 500 failure; an empty message is replaced by a generic one.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::new(500, UNKNOWN_ERROR_MESSAGE)
        } else {
            Self::new(500, message)
        }
    }

    /// Whether the API rejected the credential (unauthenticated, expired, malformed).
    pub fn is_auth_rejection(&self) -> bool {
        if self.code == 401 {
            return true;
        }
        let message = self.message.trim().to_ascii_lowercase();
        AUTH_REJECTION_MESSAGES.contains(&message.as_str())
    }
}

impl From<StashError> for Failure {
    fn from(err: StashError) -> Self {
        Self::internal(err.to_string())
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

/// Either the success payload or a [`Failure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse<T> {
    Success(T),
    Failure(Failure),
}

impl<T> ApiResponse<T> {
    pub fn failure(code: u16, message: impl Into<String>) -> Self {
        Self::Failure(Failure::new(code, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn as_failure(&self) -> Option<&Failure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Self::Success(data) => Ok(data),
            Self::Failure(failure) => Err(failure),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    data: Option<T>,
}

impl<T: Serialize> Serialize for ApiResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let envelope = match self {
            Self::Success(data) => Envelope { success: true, code: None, message: None, data: Some(data) },
            Self::Failure(f) => Envelope {
                success: false,
                code: Some(f.code),
                message: Some(f.message.clone()),
                data: None,
            },
        };
        envelope.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ApiResponse<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let envelope = Envelope::<T>::deserialize(deserializer)?;
        if envelope.success {
            envelope
                .data
                .map(Self::Success)
                .ok_or_else(|| de::Error::missing_field("data"))
        } else {
            Ok(Self::Failure(Failure {
                code: envelope.code.unwrap_or(500),
                message: envelope.message.unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.into()),
            }))
        }
    }
}
