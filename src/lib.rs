//! Run code as another Windows user.
//!
//! This crate wires together the two native primitives involved in
//! impersonation: `LogonUserW`, which exchanges a username, domain and
//! password for a logon token, and `ImpersonateLoggedOnUser`, which binds
//! the calling thread's effective identity to such a token.  The token is
//! closed and the original identity restored on every exit path, whether
//! the unit of work returns, panics, or is cancelled.
//!
//! ```norun
//! use impersonate::{current_username, run_as_user, LogonType, UserCredentials};
//!
//! let credentials = UserCredentials::with_domain("CORP", "svc_batch", "hunter2");
//! let name = run_as_user(&credentials, LogonType::Network, || {
//!     current_username().expect("query username")
//! })?;
//! println!("ran as {:?}", name);
//! # Ok::<(), impersonate::Error>(())
//! ```
//!
//! For asynchronous work, [`run_as_user_async`] wraps the future so that
//! every poll of it runs impersonated and the thread identity is restored
//! before control returns to the executor.  The identity therefore follows
//! the logical task across worker threads and never leaks into unrelated
//! tasks scheduled on the same threads:
//!
//! ```norun
//! use impersonate::{run_as_user_async, LogonType, UserCredentials};
//!
//! # async fn demo() -> Result<(), impersonate::Error> {
//! let credentials = UserCredentials::new("svc_batch@corp.example", "hunter2");
//! let listing = run_as_user_async(&credentials, LogonType::Network, || async {
//!     tokio::fs::read_dir(r"\\fileserver\share").await
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```
//!
//! The free functions cover the common case; logging on and impersonating
//! are also exposed separately as [`UserCredentials::logon`] and
//! [`Token::impersonate`] for callers that need a non-default logon
//! provider or want to reuse one scope shape with several kinds of work.

mod credentials;
mod error;
mod future;
mod impersonate;
mod logon;
mod token;

#[cfg(windows)]
pub use crate::credentials::{Password, UserCredentials};
#[cfg(windows)]
pub use crate::error::Error;
#[cfg(windows)]
pub use crate::future::{run_as_user_async, run_as_user_with_token_async, Impersonated};
#[cfg(windows)]
pub use crate::impersonate::{
    current_username, run_as_user, run_as_user_with_token, ImpersonationGuard,
};
#[cfg(windows)]
pub use crate::logon::{LogonProvider, LogonType};
#[cfg(windows)]
pub use crate::token::{Token, TokenHandle};

#[cfg(windows)]
fn os_str_to_null_terminated_vec(s: &std::ffi::OsStr) -> Vec<u16> {
    use std::os::windows::ffi::OsStrExt;
    s.encode_wide().chain(std::iter::once(0)).collect()
}

#[cfg(windows)]
fn win32_error_with_context(context: &str, err: std::io::Error) -> std::io::Error {
    std::io::Error::new(err.kind(), format!("{}: {}", context, err))
}
