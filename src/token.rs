#![cfg(windows)]
//! Owning and borrowed views of a logon token handle.

use std::io::Error as IoError;

use winapi::um::handleapi::CloseHandle;
use winapi::um::winnt::HANDLE;

/// An owned logon token, as produced by [`UserCredentials::logon`].
///
/// The token represents the authenticated identity and is the one
/// resource this crate manages: it is closed exactly once, when this
/// value drops, and never before impersonated work has finished with it.
///
/// [`UserCredentials::logon`]: crate::UserCredentials::logon
pub struct Token {
    pub(crate) handle: HANDLE,
}

/// The compiler thinks it isn't send because HANDLE is a pointer
/// type.  We happen to know that moving the handle between threads
/// is totally fine, hence this impl.
unsafe impl Send for Token {}

impl Token {
    pub(crate) fn from_raw(handle: HANDLE) -> Self {
        Self { handle }
    }

    /// A non-owning view of this token, suitable for handing to a unit
    /// of work that wants to pass the identity onward.
    pub fn as_token_handle(&self) -> TokenHandle {
        TokenHandle(self.handle)
    }
}

impl Drop for Token {
    fn drop(&mut self) {
        if unsafe { CloseHandle(self.handle) } == 0 {
            // A failed release is a handle leak to report, not an error
            // to escalate: the caller's result already exists.
            log::warn!(
                "CloseHandle failed for logon token: {}",
                IoError::last_os_error()
            );
        }
    }
}

/// A non-owning, copyable view of a logon token handle.
///
/// This is what a unit of work receives when it asks for token
/// visibility.  It is valid for the duration of that unit of work only;
/// the owning [`Token`] outlives every scope it is used in and closes
/// the handle afterwards.
#[derive(Clone, Copy, Debug)]
pub struct TokenHandle(HANDLE);

/// See the note on [`Token`]: the handle is thread-movable.
unsafe impl Send for TokenHandle {}

impl TokenHandle {
    /// The raw handle value, for passing to other win32 calls such as
    /// `CreateProcessAsUserW`.
    pub fn as_raw(self) -> HANDLE {
        self.0
    }

    /// Whether the handle value is present.  Inside an impersonation
    /// scope this is always true; a null handle never escapes the logon
    /// call.
    pub fn is_valid(self) -> bool {
        !self.0.is_null()
    }
}
