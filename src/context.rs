//! Dashboard Context
//!
//! Everything one signed-in session needs: configuration, the API client
//! carrying the user's token, and one instance of each store. Views get the
//! context passed in; nothing here is global.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::session::{load_auth_user, AuthUser, KeyValueStore};
use crate::settings::SettingsStore;
use crate::store::{
    AccountStore, ContactStore, DealStore, EditScope, InventoryStore,
};

pub struct DashboardContext {
    config: Config,
    storage: Arc<dyn KeyValueStore>,
    user: AuthUser,
    api: ApiClient,
    pub inventory: Arc<InventoryStore>,
    pub contacts: Arc<ContactStore>,
    pub deals: Arc<DealStore>,
    pub accounts: Arc<AccountStore>,
    pub settings: SettingsStore,
}

impl DashboardContext {
    pub fn new(
        config: Config,
        storage: Arc<dyn KeyValueStore>,
        user: AuthUser,
        api: ApiClient,
    ) -> Self {
        Self {
            inventory: Arc::new(InventoryStore::new(api.clone())),
            contacts: Arc::new(ContactStore::new(api.clone())),
            deals: Arc::new(DealStore::new(api.clone())),
            accounts: Arc::new(AccountStore::new(api.clone())),
            settings: SettingsStore::new(api.clone(), user.useruid.clone()),
            config,
            storage,
            user,
            api,
        }
    }

    /// Context for the user persisted in `storage`, talking HTTP
    pub fn from_session(config: Config, storage: Arc<dyn KeyValueStore>) -> ApiResult<Self> {
        let user = load_auth_user(storage.as_ref()).ok_or(ApiError::Unauthenticated)?;
        let api = ApiClient::http(&config, Some(&user))?;
        log::info!("Session opened for {}", user.useruid);
        Ok(Self::new(config, storage, user, api))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &dyn KeyValueStore {
        self.storage.as_ref()
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    pub fn useruid(&self) -> &str {
        &self.user.useruid
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn edit_inventory(&self) -> EditScope<InventoryStore> {
        EditScope::open(self.inventory.clone())
    }

    pub fn edit_contact(&self) -> EditScope<ContactStore> {
        EditScope::open(self.contacts.clone())
    }

    pub fn edit_deal(&self) -> EditScope<DealStore> {
        EditScope::open(self.deals.clone())
    }

    pub fn edit_account(&self) -> EditScope<AccountStore> {
        EditScope::open(self.accounts.clone())
    }

    /// Drop every store's editing state, e.g. on sign-out
    pub fn clear_all(&self) {
        self.inventory.clear();
        self.contacts.clear();
        self.deals.clear();
        self.accounts.clear();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::Method;
    use crate::error::Outcome;
    use crate::session::{save_auth_user, MemoryStorage};
    use crate::testing::FakeBackend;

    fn user() -> AuthUser {
        AuthUser {
            useruid: "u-1".to_string(),
            token: "token".to_string(),
            username: String::new(),
            loginname: String::new(),
            companyname: String::new(),
        }
    }

    #[test]
    fn test_from_session_requires_user() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStorage::new());
        let result = DashboardContext::from_session(Config::default(), storage.clone());
        assert!(matches!(result, Err(ApiError::Unauthenticated)));

        save_auth_user(storage.as_ref(), &user()).unwrap();
        let ctx = DashboardContext::from_session(Config::default(), storage).unwrap();
        assert_eq!(ctx.useruid(), "u-1");
    }

    #[tokio::test]
    async fn test_contexts_do_not_share_stores() {
        let backend = FakeBackend::new();
        backend.on_json(Method::Get, "inventory/inv-1/info", json!({"itemuid": "inv-1"}));
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStorage::new());

        let first = DashboardContext::new(Config::default(), storage.clone(), user(), backend.client());
        let second = DashboardContext::new(Config::default(), storage, user(), backend.client());

        assert_eq!(first.inventory.load("inv-1").await, Outcome::Ok);
        assert_eq!(second.inventory.id(), None);

        {
            let scope = second.edit_inventory();
            scope.load("inv-1").await;
        }
        assert_eq!(second.inventory.id(), None);
        assert_eq!(first.inventory.id().as_deref(), Some("inv-1"));
    }
}
