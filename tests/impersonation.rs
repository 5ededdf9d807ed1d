#![cfg(windows)]
//! Integration tests for the impersonation scope.
//!
//! Tests that actually log a user on read the account from the
//! `IMPERSONATE_TEST_USERNAME`, `IMPERSONATE_TEST_PASSWORD` and
//! (optional) `IMPERSONATE_TEST_DOMAIN` environment variables, and skip
//! themselves when those are not set.  The account must be allowed to
//! log on on the machine running the tests.  The remaining tests run on
//! any Windows machine with no setup.

use std::ffi::OsString;
use std::sync::atomic::{AtomicUsize, Ordering};

use impersonate::{
    current_username, run_as_user, run_as_user_async, run_as_user_with_token,
    run_as_user_with_token_async, Error, LogonType, UserCredentials,
};

fn test_credentials() -> Option<UserCredentials> {
    let username = std::env::var("IMPERSONATE_TEST_USERNAME").ok()?;
    let password = std::env::var("IMPERSONATE_TEST_PASSWORD").ok()?;
    Some(match std::env::var("IMPERSONATE_TEST_DOMAIN") {
        Ok(domain) => UserCredentials::with_domain(domain, username, password),
        Err(_) => UserCredentials::new(username, password),
    })
}

/// The SAM-compatible name the test account should report, compared
/// case-insensitively because the OS canonicalizes the case.
fn expected_username() -> String {
    let username = std::env::var("IMPERSONATE_TEST_USERNAME").unwrap();
    let domain = std::env::var("IMPERSONATE_TEST_DOMAIN")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .expect("neither IMPERSONATE_TEST_DOMAIN nor COMPUTERNAME is set");
    format!("{}\\{}", domain, username).to_lowercase()
}

fn lowercase(name: &OsString) -> String {
    name.to_string_lossy().to_lowercase()
}

#[test]
fn wrong_password_fails_without_running_the_work() {
    let before = current_username().unwrap();
    let invocations = AtomicUsize::new(0);

    // Whether or not the account exists, this password is wrong, so the
    // logon must fail before the work runs.
    let credentials = UserCredentials::new(
        std::env::var("IMPERSONATE_TEST_USERNAME")
            .unwrap_or_else(|_| "impersonate_no_such_user".to_string()),
        "definitely-not-the-password",
    );
    let result = run_as_user(&credentials, LogonType::Interactive, || {
        invocations.fetch_add(1, Ordering::SeqCst);
    });

    match &result {
        Err(Error::Authentication { .. }) => {}
        other => panic!("expected an authentication error, got {:?}", other),
    }
    assert!(result.unwrap_err().os_error_code().is_some());
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
    assert_eq!(lowercase(&current_username().unwrap()), lowercase(&before));
}

#[test]
fn empty_username_fails_before_any_native_call() {
    let invocations = AtomicUsize::new(0);
    let credentials = UserCredentials::new("", "irrelevant");
    let result = run_as_user(&credentials, LogonType::Network, || {
        invocations.fetch_add(1, Ordering::SeqCst);
    });
    match result {
        Err(Error::EmptyUsername) => {}
        other => panic!("expected a validation error, got {:?}", other),
    }
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

#[test]
fn sync_work_runs_as_the_impersonated_user() {
    let credentials = match test_credentials() {
        Some(credentials) => credentials,
        None => {
            eprintln!("skipping: IMPERSONATE_TEST_USERNAME is not set");
            return;
        }
    };
    let before = current_username().unwrap();

    let during = run_as_user(&credentials, LogonType::Network, || {
        current_username().unwrap()
    })
    .unwrap();

    assert_eq!(lowercase(&during), expected_username());
    assert_eq!(lowercase(&current_username().unwrap()), lowercase(&before));
}

#[test]
fn token_handle_is_valid_during_the_work() {
    let credentials = match test_credentials() {
        Some(credentials) => credentials,
        None => {
            eprintln!("skipping: IMPERSONATE_TEST_USERNAME is not set");
            return;
        }
    };
    let valid = run_as_user_with_token(&credentials, LogonType::Interactive, |token| {
        token.is_valid()
    })
    .unwrap();
    assert!(valid);
}

#[test]
fn work_errors_propagate_unchanged() {
    let credentials = match test_credentials() {
        Some(credentials) => credentials,
        None => {
            eprintln!("skipping: IMPERSONATE_TEST_USERNAME is not set");
            return;
        }
    };
    let before = current_username().unwrap();

    let result: Result<Result<(), String>, Error> =
        run_as_user(&credentials, LogonType::Interactive, || {
            Err("the work itself failed".to_string())
        });

    // The scope must not swallow or rewrap the work's own error, only
    // revert around it.
    assert_eq!(result.unwrap(), Err("the work itself failed".to_string()));
    assert_eq!(lowercase(&current_username().unwrap()), lowercase(&before));
}

#[test]
fn panic_in_the_work_restores_identity() {
    let credentials = match test_credentials() {
        Some(credentials) => credentials,
        None => {
            eprintln!("skipping: IMPERSONATE_TEST_USERNAME is not set");
            return;
        }
    };
    let before = current_username().unwrap();
    let token = credentials.logon(LogonType::Interactive).unwrap();

    let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        token.run(|| -> () { panic!("the work panicked") }).unwrap();
    }));

    assert!(unwound.is_err());
    assert_eq!(lowercase(&current_username().unwrap()), lowercase(&before));
}

#[test]
fn nested_scopes_restore_the_outer_scope() {
    let credentials = match test_credentials() {
        Some(credentials) => credentials,
        None => {
            eprintln!("skipping: IMPERSONATE_TEST_USERNAME is not set");
            return;
        }
    };
    let before = current_username().unwrap();
    let outer_token = credentials.logon(LogonType::Interactive).unwrap();
    let inner_token = credentials.logon(LogonType::Network).unwrap();

    let outer = outer_token.impersonate().unwrap();
    {
        let inner = inner_token.impersonate().unwrap();
        assert_eq!(lowercase(&current_username().unwrap()), expected_username());
        inner.revert();
    }
    // A naive revert would fall all the way back to the process
    // identity here; the stacked guard restores the outer scope.
    assert_eq!(lowercase(&current_username().unwrap()), expected_username());
    outer.revert();

    assert_eq!(lowercase(&current_username().unwrap()), lowercase(&before));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn async_work_keeps_identity_across_suspension() {
    let credentials = match test_credentials() {
        Some(credentials) => credentials,
        None => {
            eprintln!("skipping: IMPERSONATE_TEST_USERNAME is not set");
            return;
        }
    };
    let before = current_username().unwrap();

    // Spawn so the work actually runs on the shared worker pool and can
    // resume on a different thread after the suspension points.
    let (first, second) = tokio::spawn(async move {
        run_as_user_async(&credentials, LogonType::Interactive, || async {
            let first = current_username().unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            tokio::task::yield_now().await;
            let second = current_username().unwrap();
            (first, second)
        })
        .await
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(lowercase(&first), expected_username());
    assert_eq!(lowercase(&second), expected_username());
    assert_eq!(lowercase(&current_username().unwrap()), lowercase(&before));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn async_token_handle_stays_valid_for_the_full_duration() {
    let credentials = match test_credentials() {
        Some(credentials) => credentials,
        None => {
            eprintln!("skipping: IMPERSONATE_TEST_USERNAME is not set");
            return;
        }
    };
    let (valid_before, valid_after) =
        run_as_user_with_token_async(&credentials, LogonType::Interactive, |token| async move {
            let valid_before = token.is_valid();
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            (valid_before, token.is_valid())
        })
        .await
        .unwrap();
    assert!(valid_before);
    assert!(valid_after);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn impersonation_does_not_leak_into_concurrent_tasks() {
    let credentials = match test_credentials() {
        Some(credentials) => credentials,
        None => {
            eprintln!("skipping: IMPERSONATE_TEST_USERNAME is not set");
            return;
        }
    };
    let process_identity = lowercase(&current_username().unwrap());
    let expected = expected_username();

    let impersonated = tokio::spawn(async move {
        run_as_user_async(&credentials, LogonType::Interactive, || async {
            for _ in 0..50 {
                assert_eq!(lowercase(&current_username().unwrap()), expected);
                tokio::task::yield_now().await;
            }
        })
        .await
    });
    let bystander = tokio::spawn(async move {
        // Shares the worker pool with the impersonated task but must
        // only ever see the process identity.
        for _ in 0..50 {
            assert_eq!(lowercase(&current_username().unwrap()), process_identity);
            tokio::task::yield_now().await;
        }
    });

    let (impersonated, bystander) = tokio::join!(impersonated, bystander);
    impersonated.unwrap().unwrap();
    bystander.unwrap();
}
