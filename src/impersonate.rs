#![cfg(windows)]
//! Switching the calling thread's identity to a logon token, and the
//! synchronous entry points built on top of it.

use std::ffi::OsString;
use std::io::Error as IoError;
use std::marker::PhantomData;
use std::os::windows::ffi::OsStringExt;
use std::ptr::null_mut;

use winapi::shared::minwindef::DWORD;
use winapi::shared::winerror::{ERROR_MORE_DATA, ERROR_NO_TOKEN};
use winapi::um::errhandlingapi::GetLastError;
use winapi::um::handleapi::CloseHandle;
use winapi::um::processthreadsapi::{GetCurrentThread, OpenThreadToken, SetThreadToken};
use winapi::um::secext::{GetUserNameExW, NameSamCompatible};
use winapi::um::securitybaseapi::{ImpersonateLoggedOnUser, RevertToSelf};
use winapi::um::winnt::{HANDLE, TOKEN_IMPERSONATE, TOKEN_QUERY};

use crate::logon::LogonType;
use crate::token::{Token, TokenHandle};
use crate::{win32_error_with_context, Error, UserCredentials};

impl Token {
    /// Switch the calling thread's effective identity to this token.
    ///
    /// The previous identity comes back when the returned guard drops.
    /// Scopes nest: the guard remembers the thread token that was active
    /// when it was created, so an inner scope overrides an outer one and
    /// the outer identity is restored on the inner guard's exit.
    pub fn impersonate(&self) -> Result<ImpersonationGuard<'_>, Error> {
        let previous = previous_thread_token()?;
        if unsafe { ImpersonateLoggedOnUser(self.handle) } == 0 {
            let source =
                win32_error_with_context("ImpersonateLoggedOnUser", IoError::last_os_error());
            if let Some(previous) = previous {
                unsafe { CloseHandle(previous) };
            }
            return Err(Error::Impersonate { source });
        }
        Ok(ImpersonationGuard {
            previous,
            _token: PhantomData,
            _not_send: PhantomData,
        })
    }

    /// Run `func` with the calling thread impersonating this token.
    ///
    /// The original identity is restored when `func` returns, and also
    /// when it panics, as the unwind drops the scope guard.
    pub fn run<R>(&self, func: impl FnOnce() -> R) -> Result<R, Error> {
        let guard = self.impersonate()?;
        let result = func();
        guard.revert();
        Ok(result)
    }
}

/// The impersonation token the calling thread already carries, if any.
/// The returned handle is owned by the caller.
fn previous_thread_token() -> Result<Option<HANDLE>, Error> {
    let mut handle: HANDLE = null_mut();
    let open_as_self = true;
    let res = unsafe {
        OpenThreadToken(
            GetCurrentThread(),
            TOKEN_QUERY | TOKEN_IMPERSONATE,
            open_as_self as _,
            &mut handle,
        )
    };
    if res != 0 {
        Ok(Some(handle))
    } else if unsafe { GetLastError() } == ERROR_NO_TOKEN {
        // The thread was running as the process identity.
        Ok(None)
    } else {
        Err(Error::Impersonate {
            source: win32_error_with_context("OpenThreadToken", IoError::last_os_error()),
        })
    }
}

/// Scope object for an active identity switch.  Dropping it puts the
/// thread back onto the identity that was in effect when the scope was
/// entered.
///
/// The guard is deliberately not `Send`: the switch is a property of the
/// thread that made it and must be undone on that same thread.
pub struct ImpersonationGuard<'a> {
    previous: Option<HANDLE>,
    _token: PhantomData<&'a Token>,
    _not_send: PhantomData<*const ()>,
}

impl ImpersonationGuard<'_> {
    /// Restore the previous identity now instead of at end of scope.
    pub fn revert(self) {}
}

impl Drop for ImpersonationGuard<'_> {
    fn drop(&mut self) {
        let restored = match self.previous {
            Some(previous) => unsafe { SetThreadToken(null_mut(), previous) },
            None => unsafe { RevertToSelf() },
        };
        let failure = if restored == 0 {
            Some(IoError::last_os_error())
        } else {
            None
        };
        if let Some(previous) = self.previous.take() {
            unsafe { CloseHandle(previous) };
        }
        // Panic on error here: a thread left running with the wrong
        // identity is a possible security breach.
        if let Some(err) = failure {
            panic!("failed to revert impersonation: {}", err);
        }
    }
}

/// Log the user on and run `func` under their identity, reverting and
/// releasing the token afterwards.
///
/// The three possible outcomes are kept distinct: an authentication
/// failure surfaces as [`Error::Authentication`] before `func` is ever
/// invoked; whatever `func` itself returns (including its own errors)
/// comes back in the `Ok` value untouched; and a panic in `func`
/// unwinds through the reverted scope.
pub fn run_as_user<R>(
    credentials: &UserCredentials,
    logon_type: LogonType,
    func: impl FnOnce() -> R,
) -> Result<R, Error> {
    let token = credentials.logon(logon_type)?;
    token.run(func)
}

/// Like [`run_as_user`], for work that needs the token handle itself,
/// e.g. to spawn a child process as that user.
pub fn run_as_user_with_token<R>(
    credentials: &UserCredentials,
    logon_type: LogonType,
    func: impl FnOnce(TokenHandle) -> R,
) -> Result<R, Error> {
    let token = credentials.logon(logon_type)?;
    let handle = token.as_token_handle();
    token.run(move || func(handle))
}

/// The effective identity of the calling thread, in SAM-compatible
/// `DOMAIN\user` form.
///
/// Inside an impersonation scope this reports the impersonated account;
/// outside one, the process identity.
pub fn current_username() -> Result<OsString, Error> {
    // Ask for the size first; the call is expected to fail with
    // ERROR_MORE_DATA and tell us how much room the name needs.
    let mut len: DWORD = 0;
    let err;
    unsafe {
        GetUserNameExW(NameSamCompatible, null_mut(), &mut len);
        err = GetLastError();
    }
    if err != ERROR_MORE_DATA {
        return Err(Error::QueryUserName {
            source: win32_error_with_context(
                "GetUserNameExW(probe)",
                IoError::from_raw_os_error(err as i32),
            ),
        });
    }

    let mut buf = vec![0u16; len as usize];
    if unsafe { GetUserNameExW(NameSamCompatible, buf.as_mut_ptr(), &mut len) } == 0 {
        return Err(Error::QueryUserName {
            source: win32_error_with_context("GetUserNameExW", IoError::last_os_error()),
        });
    }
    // On success `len` is the name length without the terminator.
    Ok(OsString::from_wide(&buf[..len as usize]))
}
