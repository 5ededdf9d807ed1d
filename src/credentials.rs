#![cfg(windows)]
//! Credentials and the logon call that turns them into a token.

use std::ffi::OsStr;
use std::fmt;
use std::io::Error as IoError;
use std::ptr::{null, null_mut};

use winapi::um::winbase::LogonUserW;
use winapi::um::winnt::HANDLE;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::logon::{LogonProvider, LogonType};
use crate::token::Token;
use crate::{os_str_to_null_terminated_vec, win32_error_with_context, Error};

/// A password, held only long enough to perform the logon call.
///
/// The backing storage is zeroed when the value is dropped, and `Debug`
/// never prints the contents.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Password(String);

impl Password {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }
}

impl From<String> for Password {
    fn from(secret: String) -> Self {
        Self::new(secret)
    }
}

impl From<&str> for Password {
    fn from(secret: &str) -> Self {
        Self::new(secret)
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// The account to impersonate: a username, an optional domain and a
/// password.
///
/// The domain may be omitted for local accounts or when the username is
/// in UPN form (`user@domain`).  Credentials are only ever read during
/// [`UserCredentials::logon`]; they are never persisted or logged.
#[derive(Clone)]
pub struct UserCredentials {
    username: String,
    domain: Option<String>,
    password: Password,
}

impl UserCredentials {
    /// Credentials for a local account, or a username in UPN form.
    pub fn new(username: impl Into<String>, password: impl Into<Password>) -> Self {
        Self {
            username: username.into(),
            domain: None,
            password: password.into(),
        }
    }

    /// Credentials for a domain account.
    pub fn with_domain(
        domain: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<Password>,
    ) -> Self {
        Self {
            username: username.into(),
            domain: Some(domain.into()),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Exchange the credentials for a logon token, letting the system
    /// pick the authentication provider.
    ///
    /// On success the caller owns the token and it is closed when the
    /// returned [`Token`] drops.  On failure no token exists; the error
    /// carries the win32 code reported by `LogonUserW`.
    pub fn logon(&self, logon_type: LogonType) -> Result<Token, Error> {
        self.logon_with(logon_type, LogonProvider::Default)
    }

    /// Exchange the credentials for a logon token using an explicit
    /// authentication provider.
    pub fn logon_with(
        &self,
        logon_type: LogonType,
        provider: LogonProvider,
    ) -> Result<Token, Error> {
        if self.username.trim().is_empty() {
            return Err(Error::EmptyUsername);
        }

        let username = os_str_to_null_terminated_vec(OsStr::new(&self.username));
        let domain = self
            .domain
            .as_ref()
            .map(|d| os_str_to_null_terminated_vec(OsStr::new(d)));
        let mut password = os_str_to_null_terminated_vec(OsStr::new(&self.password.0));

        let mut handle: HANDLE = null_mut();
        let res = unsafe {
            LogonUserW(
                username.as_ptr(),
                domain.as_ref().map(|d| d.as_ptr()).unwrap_or(null()),
                password.as_ptr(),
                logon_type.as_dword(),
                provider.as_dword(),
                &mut handle,
            )
        };
        let result = if res == 0 {
            Err(Error::Authentication {
                username: self.username.clone(),
                source: win32_error_with_context("LogonUserW", IoError::last_os_error()),
            })
        } else {
            Ok(Token::from_raw(handle))
        };
        // The wide copy of the secret is done with; scrub it before the
        // buffer is returned to the allocator.
        password.zeroize();
        result
    }
}

impl fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredentials")
            .field("username", &self.username)
            .field("domain", &self.domain)
            .field("password", &self.password)
            .finish()
    }
}
