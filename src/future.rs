#![cfg(windows)]
//! Impersonation for asynchronous units of work.
//!
//! Thread identity is per-OS-thread state, but an async task may hop
//! between the worker threads of a shared pool every time it suspends.
//! Setting the identity once and clearing it when the future completes
//! would therefore either revert too early or bleed the identity into
//! whatever unrelated task the worker picks up next.  [`Impersonated`]
//! instead applies the switch around every poll: the wrapped future only
//! ever observes the impersonated identity, and no thread stays switched
//! once control returns to the executor.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::logon::LogonType;
use crate::token::{Token, TokenHandle};
use crate::{Error, UserCredentials};

impl Token {
    /// Wrap a future so that every poll of it runs under this token's
    /// identity.
    ///
    /// The token moves into the wrapper and is closed when the wrapper
    /// drops, i.e. after the future has settled or been cancelled; the
    /// handle stays valid for the work's full logical duration.
    pub fn run_async<F: Future>(self, future: F) -> Impersonated<F> {
        Impersonated {
            token: self,
            inner: future,
        }
    }
}

/// A future that runs its inner future impersonated.  Created by
/// [`Token::run_async`].
///
/// Resolves to the inner future's output, or to [`Error::Impersonate`]
/// if the identity switch itself fails at some poll.
pub struct Impersonated<F> {
    token: Token,
    inner: F,
}

impl<F: Future> Future for Impersonated<F> {
    type Output = Result<F::Output, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Projection is safe: `inner` is never moved out of `this`, and
        // `token` is plain data.
        let this = unsafe { self.get_unchecked_mut() };
        let guard = match this.token.impersonate() {
            Ok(guard) => guard,
            Err(err) => return Poll::Ready(Err(err)),
        };
        let inner = unsafe { Pin::new_unchecked(&mut this.inner) };
        let polled = inner.poll(cx);
        // The worker thread hands control back to the executor after
        // this frame; it must not keep the impersonated identity.
        drop(guard);
        polled.map(Ok)
    }
}

/// Log the user on and run the asynchronous work produced by `func`
/// under their identity.
///
/// Every poll of the returned future happens impersonated, so the
/// identity follows the logical task even when it resumes on a
/// different worker thread, and concurrent tasks on the same threads
/// are unaffected.  The token is released once the work has settled.
pub async fn run_as_user_async<R, F, Fut>(
    credentials: &UserCredentials,
    logon_type: LogonType,
    func: F,
) -> Result<R, Error>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = R>,
{
    let token = credentials.logon(logon_type)?;
    token.run_async(func()).await
}

/// Like [`run_as_user_async`], for asynchronous work that needs the
/// token handle itself.
pub async fn run_as_user_with_token_async<R, F, Fut>(
    credentials: &UserCredentials,
    logon_type: LogonType,
    func: F,
) -> Result<R, Error>
where
    F: FnOnce(TokenHandle) -> Fut,
    Fut: Future<Output = R>,
{
    let token = credentials.logon(logon_type)?;
    let handle = token.as_token_handle();
    token.run_async(func(handle)).await
}
