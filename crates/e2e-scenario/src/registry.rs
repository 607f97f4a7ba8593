//! Shared account registry
//!
//! Pre-provisioned accounts that many scenarios draw from. The registry is
//! assembled once through [`AccountRegistryBuilder`], installed globally, and
//! read-only from then on. Steps may read it during discovery as well as
//! during execution.

use crate::error::RegistryError;
use crate::state::Resource;
use once_cell::sync::OnceCell;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

static GLOBAL: OnceCell<AccountRegistry> = OnceCell::new();

/// Kind of storage account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccountKind {
    /// General purpose account
    Standard,
    /// Premium block blob account
    PremiumBlockBlob,
    /// Premium file share account
    PremiumFileShare,
    /// Account with hierarchical namespace enabled
    HierarchicalNamespace,
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Standard => "standard",
            Self::PremiumBlockBlob => "premium-block-blob",
            Self::PremiumFileShare => "premium-file-share",
            Self::HierarchicalNamespace => "hierarchical-namespace",
        };
        f.write_str(name)
    }
}

/// A shared account
///
/// Accounts are tracked like any other resource but are never deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    name: String,
    kind: AccountKind,
    properties: BTreeMap<String, String>,
}

impl Account {
    /// Create an account
    pub fn new(name: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            name: name.into(),
            kind,
            properties: BTreeMap::new(),
        }
    }

    /// With an extra property, such as an endpoint
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Account name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Account kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    /// Property by key
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

impl Resource for Account {
    fn canon(&self) -> String {
        self.name.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Named accounts, frozen after construction
#[derive(Debug, Clone, Default)]
pub struct AccountRegistry {
    accounts: BTreeMap<String, Arc<Account>>,
}

impl AccountRegistry {
    /// Start building a registry
    #[inline]
    #[must_use]
    pub fn builder() -> AccountRegistryBuilder {
        AccountRegistryBuilder::default()
    }

    /// Account by name
    ///
    /// # Errors
    /// Returns [`RegistryError::UnknownAccount`] if no such account exists
    pub fn get(&self, name: &str) -> Result<Arc<Account>, RegistryError> {
        self.accounts
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownAccount(name.to_string()))
    }

    /// First account of `kind`, by name order
    #[must_use]
    pub fn first_of_kind(&self, kind: AccountKind) -> Option<Arc<Account>> {
        self.accounts.values().find(|a| a.kind == kind).cloned()
    }

    /// Registered names in order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.accounts.keys().map(String::as_str).collect()
    }

    /// Number of accounts
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// True if no account is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Install as the process-wide registry
    ///
    /// # Errors
    /// Returns [`RegistryError::AlreadyInitialized`] on a second install
    pub fn install_global(self) -> Result<&'static AccountRegistry, RegistryError> {
        GLOBAL.set(self).map_err(|_| RegistryError::AlreadyInitialized)?;
        tracing::info!(accounts = global_len(), "account registry installed");
        GLOBAL.get().ok_or(RegistryError::NotInitialized)
    }

    /// The process-wide registry, installing the one `init` builds if none is
    /// installed yet
    ///
    /// `init` runs at most once per process even when called concurrently.
    ///
    /// # Errors
    /// Returns the error from `init`; nothing is installed in that case
    pub fn global_or_install<F>(init: F) -> Result<&'static AccountRegistry, RegistryError>
    where
        F: FnOnce() -> Result<AccountRegistry, RegistryError>,
    {
        GLOBAL.get_or_try_init(|| {
            let registry = init()?;
            tracing::info!(accounts = registry.len(), "account registry installed");
            Ok(registry)
        })
    }

    /// The process-wide registry, if installed
    #[inline]
    #[must_use]
    pub fn global() -> Option<&'static AccountRegistry> {
        GLOBAL.get()
    }

    /// Account by name from the process-wide registry
    ///
    /// # Errors
    /// Returns [`RegistryError::NotInitialized`] before installation, or
    /// [`RegistryError::UnknownAccount`]
    pub fn global_account(name: &str) -> Result<Arc<Account>, RegistryError> {
        GLOBAL.get().ok_or(RegistryError::NotInitialized)?.get(name)
    }
}

fn global_len() -> usize {
    GLOBAL.get().map_or(0, AccountRegistry::len)
}

/// Builder for [`AccountRegistry`]
#[derive(Debug, Default)]
pub struct AccountRegistryBuilder {
    accounts: Vec<Account>,
}

impl AccountRegistryBuilder {
    /// Add an account
    #[must_use]
    pub fn account(mut self, account: Account) -> Self {
        self.accounts.push(account);
        self
    }

    /// Freeze into a registry
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateAccount`] if a name was added twice
    pub fn build(self) -> Result<AccountRegistry, RegistryError> {
        let mut accounts = BTreeMap::new();
        for account in self.accounts {
            let name = account.name.clone();
            if accounts.insert(name.clone(), Arc::new(account)).is_some() {
                return Err(RegistryError::DuplicateAccount(name));
            }
        }
        Ok(AccountRegistry { accounts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> AccountRegistry {
        AccountRegistry::builder()
            .account(Account::new("standard", AccountKind::Standard).with_property("endpoint", "mem://standard"))
            .account(Account::new("hns", AccountKind::HierarchicalNamespace))
            .build()
            .unwrap()
    }

    #[test]
    fn lookup_by_name_and_kind() {
        let registry = registry();

        let account = registry.get("standard").unwrap();
        assert_eq!(account.kind(), AccountKind::Standard);
        assert_eq!(account.property("endpoint"), Some("mem://standard"));
        assert_eq!(account.canon(), "standard");

        assert_eq!(
            registry.first_of_kind(AccountKind::HierarchicalNamespace).map(|a| a.name().to_string()),
            Some("hns".to_string())
        );
        assert!(registry.first_of_kind(AccountKind::PremiumFileShare).is_none());
        assert_eq!(registry.names(), ["hns", "standard"]);
    }

    #[test]
    fn unknown_account() {
        let err = registry().get("premium").unwrap_err();
        assert_eq!(err, RegistryError::UnknownAccount("premium".to_string()));
    }

    #[test]
    fn duplicates_rejected() {
        let err = AccountRegistry::builder()
            .account(Account::new("a", AccountKind::Standard))
            .account(Account::new("a", AccountKind::PremiumBlockBlob))
            .build()
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateAccount("a".to_string()));
    }

    #[test]
    fn accounts_are_not_deletable() {
        let account = Account::new("standard", AccountKind::Standard);
        assert!(account.as_deletable().is_none());
    }

    #[test]
    fn global_installs_once() {
        let installed = registry().install_global().unwrap();
        assert_eq!(installed.len(), 2);
        assert!(AccountRegistry::global().is_some());
        assert_eq!(AccountRegistry::global_account("hns").unwrap().name(), "hns");

        let err = registry().install_global().unwrap_err();
        assert_eq!(err, RegistryError::AlreadyInitialized);
    }
}
