//! Logs on with the account given on the command line and prints the
//! effective identity before, during and after the impersonation scope,
//! for both the synchronous and the asynchronous entry points.
//!
//! Usage: `whoami <username> <password> [domain]`

#[cfg(windows)]
fn main() {
    use impersonate::{
        current_username, run_as_user, run_as_user_async, LogonType, UserCredentials,
    };

    const USAGE: &str = "usage: whoami <username> <password> [domain]";
    let mut args = std::env::args().skip(1);
    let username = args.next().expect(USAGE);
    let password = args.next().expect(USAGE);
    let credentials = match args.next() {
        Some(domain) => UserCredentials::with_domain(domain, username, password),
        None => UserCredentials::new(username, password),
    };

    println!("before:         {:?}", current_username().unwrap());

    let during = run_as_user(&credentials, LogonType::Interactive, || {
        current_username().unwrap()
    })
    .expect("failed to run as user");
    println!("during (sync):  {:?}", during);

    let runtime = tokio::runtime::Runtime::new().expect("failed to build runtime");
    let during = runtime
        .block_on(run_as_user_async(
            &credentials,
            LogonType::Interactive,
            || async {
                tokio::task::yield_now().await;
                current_username().unwrap()
            },
        ))
        .expect("failed to run as user");
    println!("during (async): {:?}", during);

    println!("after:          {:?}", current_username().unwrap());
}

#[cfg(not(windows))]
fn main() {
    eprintln!("this demo only runs on Windows");
}
