//! Mapping of reqwest errors onto `FailureKind`.

use bugscan_common::{FailureKind, ProbeError};
use std::error::Error as StdError;
use std::io::ErrorKind;

/// Classify a failed request.
///
/// A request that cannot be built (e.g. a host that does not form a valid
/// URL) never reaches the network and is a `ConnectionError`.
/// Connect failures (including connect timeouts) are `ConnectionError`.
/// Timeouts after the connection was up are `ReadTimeout`. An I/O error
/// anywhere in the chain means the peer dropped the connection, which is
/// also a `ConnectionError`; anything else is an unparsable response.
pub fn classify_error(err: &reqwest::Error) -> FailureKind {
    if err.is_builder() || err.is_connect() {
        return FailureKind::ConnectionError;
    }
    if err.is_timeout() {
        return FailureKind::ReadTimeout;
    }

    // Walk the error chain to find an IO error
    let mut current: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<std::io::Error>() {
            return match io_err.kind() {
                ErrorKind::TimedOut => FailureKind::ReadTimeout,
                _ => FailureKind::ConnectionError,
            };
        }
        current = e.source();
    }

    FailureKind::MalformedResponse
}

pub(crate) fn to_probe_error(err: reqwest::Error) -> ProbeError {
    let kind = classify_error(&err);
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(s) = source {
        message.push_str(": ");
        message.push_str(&s.to_string());
        source = s.source();
    }
    ProbeError::new(kind, message)
}
