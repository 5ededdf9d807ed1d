#![cfg(windows)]
use winapi::shared::minwindef::DWORD;
use winapi::um::winbase::{
    LOGON32_LOGON_BATCH, LOGON32_LOGON_INTERACTIVE, LOGON32_LOGON_NETWORK,
    LOGON32_LOGON_NETWORK_CLEARTEXT, LOGON32_LOGON_NEW_CREDENTIALS, LOGON32_LOGON_SERVICE,
    LOGON32_LOGON_UNLOCK, LOGON32_PROVIDER_DEFAULT, LOGON32_PROVIDER_WINNT40,
    LOGON32_PROVIDER_WINNT50,
};

/// How the logon session is established.  This affects which rights the
/// account needs ("log on as a service", "log on as a batch job", ...)
/// and what the resulting token can be used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogonType {
    /// A logon for an account that will be used interactively, as if the
    /// user sat down at the machine.  Subject to interactive logon policy.
    Interactive,
    /// A fast, non-interactive logon intended for servers checking
    /// plaintext credentials.  The resulting token carries no credentials
    /// for outbound network hops.
    Network,
    /// A logon for batch servers and scheduled jobs.  The account needs
    /// the "log on as a batch job" right.
    Batch,
    /// A logon for services.  The account needs the "log on as a service"
    /// right.
    Service,
    /// A logon used to unlock a workstation.
    Unlock,
    /// Like [`LogonType::Network`], but the session keeps the plaintext
    /// credentials so it can authenticate to other servers.
    NetworkCleartext,
    /// Keeps the caller's local identity and uses the supplied
    /// credentials for outbound connections only (`runas /netonly`).
    /// Only valid with [`LogonProvider::WinNt50`] or the default provider.
    NewCredentials,
}

impl LogonType {
    pub(crate) fn as_dword(self) -> DWORD {
        match self {
            LogonType::Interactive => LOGON32_LOGON_INTERACTIVE,
            LogonType::Network => LOGON32_LOGON_NETWORK,
            LogonType::Batch => LOGON32_LOGON_BATCH,
            LogonType::Service => LOGON32_LOGON_SERVICE,
            LogonType::Unlock => LOGON32_LOGON_UNLOCK,
            LogonType::NetworkCleartext => LOGON32_LOGON_NETWORK_CLEARTEXT,
            LogonType::NewCredentials => LOGON32_LOGON_NEW_CREDENTIALS,
        }
    }
}

/// Which authentication package performs the logon.  Almost every caller
/// wants [`LogonProvider::Default`], which lets the system pick based on
/// the username format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogonProvider {
    /// Let the system choose the provider.
    Default,
    /// Force the NTLM protocol.
    WinNt40,
    /// Force the negotiate (Kerberos or NTLM) protocol.
    WinNt50,
}

impl LogonProvider {
    pub(crate) fn as_dword(self) -> DWORD {
        match self {
            LogonProvider::Default => LOGON32_PROVIDER_DEFAULT,
            LogonProvider::WinNt40 => LOGON32_PROVIDER_WINNT40,
            LogonProvider::WinNt50 => LOGON32_PROVIDER_WINNT50,
        }
    }
}

impl Default for LogonProvider {
    fn default() -> Self {
        LogonProvider::Default
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn logon_types_map_to_winbase_values() {
        // The numeric values are ABI, straight out of winbase.h.
        assert_eq!(LogonType::Interactive.as_dword(), 2);
        assert_eq!(LogonType::Network.as_dword(), 3);
        assert_eq!(LogonType::Batch.as_dword(), 4);
        assert_eq!(LogonType::Service.as_dword(), 5);
        assert_eq!(LogonType::Unlock.as_dword(), 7);
        assert_eq!(LogonType::NetworkCleartext.as_dword(), 8);
        assert_eq!(LogonType::NewCredentials.as_dword(), 9);
    }

    #[test]
    fn logon_providers_map_to_winbase_values() {
        assert_eq!(LogonProvider::Default.as_dword(), 0);
        assert_eq!(LogonProvider::WinNt40.as_dword(), 2);
        assert_eq!(LogonProvider::WinNt50.as_dword(), 3);
    }
}
