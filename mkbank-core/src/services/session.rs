//! Session store - the persisted token pair and cached account fields
//!
//! Every value lives under a fixed key in a `SessionStorage` backend. The
//! store does not track expiry; a rejected token is discovered by the next
//! API call.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::{AccountSnapshot, Session, TokenPair};
use crate::ports::SessionStorage;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USERNAME_KEY: &str = "username";
pub const ACCOUNT_NUMBER_KEY: &str = "account_number";
pub const BALANCE_KEY: &str = "balance";
pub const USER_ID_KEY: &str = "userId";

const ALL_KEYS: [&str; 6] = [
    ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    USERNAME_KEY,
    ACCOUNT_NUMBER_KEY,
    BALANCE_KEY,
    USER_ID_KEY,
];

/// Persisted session context shared by the auth and dashboard flows
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    /// Persist both tokens and every account field.
    ///
    /// A missing account id removes any stale `userId` from a previous user.
    pub fn save(&self, tokens: &TokenPair, account: &AccountSnapshot) -> Result<()> {
        let mut entries = vec![
            (ACCESS_TOKEN_KEY, tokens.access.clone()),
            (REFRESH_TOKEN_KEY, tokens.refresh.clone()),
        ];
        entries.extend(account_entries(account));
        self.storage.set_many(&entries)?;

        if account.id.is_none() {
            self.storage.remove_many(&[USER_ID_KEY])?;
        }
        Ok(())
    }

    /// Persist a freshly created session
    pub fn save_session(&self, session: &Session) -> Result<()> {
        self.save(&session.tokens, &session.account)
    }

    /// The stored access token; an empty value counts as absent
    pub fn read(&self) -> Result<Option<String>> {
        Ok(self
            .storage
            .get(ACCESS_TOKEN_KEY)?
            .filter(|token| !token.is_empty()))
    }

    /// Reassemble the full session, or `None` when no access token is stored
    pub fn load(&self) -> Result<Option<Session>> {
        let Some(access) = self.read()? else {
            return Ok(None);
        };

        let refresh = self.storage.get(REFRESH_TOKEN_KEY)?.unwrap_or_default();
        let username = self.storage.get(USERNAME_KEY)?.unwrap_or_default();
        let account_number = self.storage.get(ACCOUNT_NUMBER_KEY)?.unwrap_or_default();
        let id = self.storage.get(USER_ID_KEY)?.filter(|id| !id.is_empty());
        let balance = match self.storage.get(BALANCE_KEY)? {
            Some(raw) if !raw.trim().is_empty() => Decimal::from_str(raw.trim()).map_err(|e| {
                Error::storage(format!("Stored balance '{}' is not a decimal: {}", raw, e))
            })?,
            _ => Decimal::ZERO,
        };

        Ok(Some(Session::new(
            TokenPair::new(access, refresh),
            AccountSnapshot::new(id, username, account_number, balance),
        )))
    }

    /// Overwrite the cached account fields, keeping the tokens.
    ///
    /// Does nothing when no session is stored. The stored `userId` is kept
    /// when the snapshot has none (the dashboard endpoint never returns it).
    pub fn update_account(&self, account: &AccountSnapshot) -> Result<()> {
        if self.read()?.is_none() {
            return Ok(());
        }
        self.storage.set_many(&account_entries(account))
    }

    /// Remove every session key
    pub fn clear(&self) -> Result<()> {
        self.storage.remove_many(&ALL_KEYS)
    }
}

fn account_entries(account: &AccountSnapshot) -> Vec<(&'static str, String)> {
    let mut entries = vec![
        (USERNAME_KEY, account.username.clone()),
        (ACCOUNT_NUMBER_KEY, account.account_number.clone()),
        (BALANCE_KEY, account.balance.to_string()),
    ];
    if let Some(id) = &account.id {
        entries.push((USER_ID_KEY, id.clone()));
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_storage::MemoryStorage;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn store() -> (Arc<MemoryStorage>, SessionStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone());
        (storage, store)
    }

    fn alice() -> AccountSnapshot {
        AccountSnapshot::new(
            Some("7".to_string()),
            "alice",
            "1234567890123456",
            dec("500.00"),
        )
    }

    #[test]
    fn test_save_writes_every_key() {
        let (storage, store) = store();
        store.save(&TokenPair::new("acc", "ref"), &alice()).unwrap();

        assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap(), Some("acc".to_string()));
        assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap(), Some("ref".to_string()));
        assert_eq!(storage.get(USERNAME_KEY).unwrap(), Some("alice".to_string()));
        assert_eq!(
            storage.get(ACCOUNT_NUMBER_KEY).unwrap(),
            Some("1234567890123456".to_string())
        );
        assert_eq!(storage.get(BALANCE_KEY).unwrap(), Some("500.00".to_string()));
        assert_eq!(storage.get(USER_ID_KEY).unwrap(), Some("7".to_string()));
    }

    #[test]
    fn test_read_treats_empty_token_as_absent() {
        let (storage, store) = store();
        assert_eq!(store.read().unwrap(), None);

        storage.set_many(&[(ACCESS_TOKEN_KEY, String::new())]).unwrap();
        assert_eq!(store.read().unwrap(), None);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_load_reassembles_session() {
        let (_, store) = store();
        store.save(&TokenPair::new("acc", "ref"), &alice()).unwrap();

        let session = store.load().unwrap().unwrap();
        assert_eq!(session.access_token(), "acc");
        assert_eq!(session.tokens.refresh, "ref");
        assert_eq!(session.account, alice());
    }

    #[test]
    fn test_load_rejects_corrupt_balance() {
        let (storage, store) = store();
        store.save(&TokenPair::new("acc", "ref"), &alice()).unwrap();
        storage.set_many(&[(BALANCE_KEY, "lots".to_string())]).unwrap();

        assert!(matches!(store.load(), Err(Error::Storage(_))));
    }

    #[test]
    fn test_update_account_keeps_tokens_and_user_id() {
        let (_, store) = store();
        store.save(&TokenPair::new("acc", "ref"), &alice()).unwrap();

        let refreshed = AccountSnapshot::new(None, "alice", "1234567890123456", dec("650.25"));
        store.update_account(&refreshed).unwrap();

        let session = store.load().unwrap().unwrap();
        assert_eq!(session.access_token(), "acc");
        assert_eq!(session.account.balance, dec("650.25"));
        assert_eq!(session.account.id, Some("7".to_string()));
    }

    #[test]
    fn test_update_account_without_session_is_noop() {
        let (storage, store) = store();
        store.update_account(&alice()).unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_save_without_id_drops_previous_user_id() {
        let (storage, store) = store();
        store.save(&TokenPair::new("acc", "ref"), &alice()).unwrap();

        let bob = AccountSnapshot::new(None, "bob", "6543210987654321", dec("1"));
        store.save(&TokenPair::new("acc2", "ref2"), &bob).unwrap();

        assert_eq!(storage.get(USER_ID_KEY).unwrap(), None);
    }

    #[test]
    fn test_clear_removes_everything() {
        let (storage, store) = store();
        store.save(&TokenPair::new("acc", "ref"), &alice()).unwrap();

        store.clear().unwrap();
        assert!(storage.is_empty());
        assert_eq!(store.read().unwrap(), None);
    }
}
