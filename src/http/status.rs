//! Status code families.

use axum::http::StatusCode;

/// The class a status code belongs to, from its leading digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusFamily {
    /// 1xx
    Informational,
    /// 2xx
    Success,
    /// 3xx
    Redirect,
    /// 4xx
    ClientError,
    /// 5xx
    ServerError,
    /// 6xx-9xx; representable by `StatusCode` but outside the standard classes.
    Other,
}

impl StatusFamily {
    pub fn of(status: StatusCode) -> Self {
        match status.as_u16() / 100 {
            1 => Self::Informational,
            2 => Self::Success,
            3 => Self::Redirect,
            4 => Self::ClientError,
            5 => Self::ServerError,
            _ => Self::Other,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl From<StatusCode> for StatusFamily {
    fn from(status: StatusCode) -> Self {
        Self::of(status)
    }
}
