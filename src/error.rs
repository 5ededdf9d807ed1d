#![cfg(windows)]
use std::io::Error as IoError;
use thiserror::Error;

/// Errors raised while logging a user on or switching the thread identity.
///
/// Failures from the caller's own unit of work are not represented here;
/// they travel through the work's return type unchanged.
#[derive(Error, Debug)]
pub enum Error {
    /// The username was empty or blank.  Detected before any native call
    /// is attempted.
    #[error("username must not be empty")]
    EmptyUsername,

    /// The native logon call rejected the credentials.  No token was
    /// produced and no unit of work was run.
    #[error("logon failed for user `{username}`: {source}")]
    Authentication { username: String, source: IoError },

    /// The logon succeeded but the identity switch could not be applied
    /// to the calling thread.
    #[error("failed to impersonate the logon token: {source}")]
    Impersonate { source: IoError },

    /// The effective username could not be queried.
    #[error("failed to query the effective username: {source}")]
    QueryUserName { source: IoError },
}

impl Error {
    /// The underlying win32 error code, when the OS reported one.
    ///
    /// For [`Error::Authentication`] this is the code set by `LogonUserW`,
    /// e.g. `ERROR_LOGON_FAILURE` (1326) for a wrong password.
    pub fn os_error_code(&self) -> Option<i32> {
        match self {
            Error::EmptyUsername => None,
            Error::Authentication { source, .. }
            | Error::Impersonate { source }
            | Error::QueryUserName { source } => source.raw_os_error(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn authentication_error_exposes_os_code() {
        // 1326 is ERROR_LOGON_FAILURE, the code for a bad password.
        let err = Error::Authentication {
            username: "svc_test".to_string(),
            source: IoError::from_raw_os_error(1326),
        };
        assert_eq!(err.os_error_code(), Some(1326));
        let text = err.to_string();
        assert!(text.starts_with("logon failed for user `svc_test`"));
    }

    #[test]
    fn validation_error_has_no_os_code() {
        assert_eq!(Error::EmptyUsername.os_error_code(), None);
    }
}
