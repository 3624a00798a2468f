//! Request/reply frame types exchanged between peer client and storage server.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The operation a [`Request`] asks the storage server to perform.
///
/// Wire codes match §4.C of the protocol exactly: `GET = 1`, `PUT = 2`,
/// `HAS = 3`, `DELETE = 4`, `GETSIZE = 5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Action {
    Get,
    Put,
    Has,
    Delete,
    GetSize,
}

impl From<Action> for u8 {
    fn from(action: Action) -> Self {
        match action {
            Action::Get => 1,
            Action::Put => 2,
            Action::Has => 3,
            Action::Delete => 4,
            Action::GetSize => 5,
        }
    }
}

impl TryFrom<u8> for Action {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Action::Get),
            2 => Ok(Action::Put),
            3 => Ok(Action::Has),
            4 => Ok(Action::Delete),
            5 => Ok(Action::GetSize),
            other => Err(Error::ProtocolViolation {
                message: format!("unrecognized action code {other}"),
            }),
        }
    }
}

/// Status of a [`Reply`]. `OK` means success; any other code means only
/// `code` and `msg` are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ErrorCode {
    Ok,
    NotFound,
    /// Any failure other than `NotFound`. Unrecognized codes read off the
    /// wire are folded into this variant.
    Other,
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::Ok => 0,
            ErrorCode::NotFound => 1,
            ErrorCode::Other => 2,
        }
    }
}

impl TryFrom<u8> for ErrorCode {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ErrorCode::Ok),
            1 => Ok(ErrorCode::NotFound),
            _ => Ok(ErrorCode::Other),
        }
    }
}

/// A single request sent from a peer client to a storage server.
///
/// `value` is present only for `Put`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub action: Action,
    pub key: String,
    pub value: Option<Vec<u8>>,
}

impl Request {
    pub fn get(key: impl Into<String>) -> Self {
        Self {
            action: Action::Get,
            key: key.into(),
            value: None,
        }
    }

    pub fn put(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            action: Action::Put,
            key: key.into(),
            value: Some(value),
        }
    }

    pub fn has(key: impl Into<String>) -> Self {
        Self {
            action: Action::Has,
            key: key.into(),
            value: None,
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            action: Action::Delete,
            key: key.into(),
            value: None,
        }
    }

    pub fn get_size(key: impl Into<String>) -> Self {
        Self {
            action: Action::GetSize,
            key: key.into(),
            value: None,
        }
    }
}

/// A single reply sent from a storage server back to a peer client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub code: ErrorCode,
    pub msg: String,
    pub value: Option<Vec<u8>>,
    pub exists: Option<bool>,
    pub size: Option<i64>,
}

impl Reply {
    pub fn ok() -> Self {
        Self {
            code: ErrorCode::Ok,
            msg: String::new(),
            value: None,
            exists: None,
            size: None,
        }
    }

    pub fn ok_value(value: Vec<u8>) -> Self {
        Self {
            value: Some(value),
            ..Self::ok()
        }
    }

    pub fn ok_exists(exists: bool) -> Self {
        Self {
            exists: Some(exists),
            ..Self::ok()
        }
    }

    pub fn ok_size(size: i64) -> Self {
        Self {
            size: Some(size),
            ..Self::ok()
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::NotFound,
            msg: msg.into(),
            value: None,
            exists: None,
            size: None,
        }
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Other,
            msg: msg.into(),
            value: None,
            exists: None,
            size: None,
        }
    }
}
