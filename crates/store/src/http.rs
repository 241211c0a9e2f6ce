//! REST document store adapter.
//!
//! Paths, relative to the configured base URL:
//!
//! ```text
//! GET  /modules?role={role}
//! GET  /users/{id}/module-order        PUT  /users/{id}/module-order
//! GET  /users/{id}/modules             POST /users/{id}/modules
//! GET  /users/{id}/preferences/{type}  POST /users/{id}/preferences/{type}
//! GET  /collections/{type}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use dashbank_core::DashboardError;
use dashbank_core::aggregation::FinancialItem;
use dashbank_core::modules::{
    ModuleDescriptor, ModuleType, PreferredOrderEntry, Role, SelectionPreference,
};
use dashbank_core::ports::{CollectionSource, ModuleCatalog, PreferenceStore};
use dashbank_shared::config::StoreConfig;
use dashbank_shared::types::{ItemId, ModuleId, UserId};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;

/// Body of `GET/POST /users/{id}/modules`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModuleIdsPayload {
    module_ids: Vec<ModuleId>,
}

/// Body of `GET /users/{id}/preferences/{type}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectedIdsPayload {
    #[serde(default)]
    selected_ids: Vec<ItemId>,
}

/// JSON-over-HTTP client for the document store.
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    client: Client,
    base_url: Url,
}

impl HttpDocumentStore {
    /// Builds a client from the `store` config section.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidBaseUrl` if the base URL does not parse,
    /// or `StoreError::Http` if the client cannot be built.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Self::with_client(client, &config.base_url)
    }

    /// Uses an existing client.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidBaseUrl` if `base_url` cannot carry paths.
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, StoreError> {
        let base_url =
            Url::parse(base_url).map_err(|e| StoreError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self { client, base_url })
    }

    /// Joins percent-encoded path segments onto the base URL.
    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, StoreError> {
        debug!(url = %url, "GET");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        response.json().await.map_err(|e| StoreError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Like [`get_json`](Self::get_json) but a 404 means "nothing stored".
    async fn get_optional<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, StoreError> {
        match self.get_json(url).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn send_json<B: Serialize + Sync>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> Result<(), StoreError> {
        debug!(method = %method, url = %url, "Write");
        let response = self.client.request(method, url.clone()).json(body).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(StoreError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            })
        }
    }
}

/// Decodes a collection item by item, dropping the ones that do not parse.
///
/// Items without a `kind` take the kind of the collection they came from.
#[must_use]
pub fn decode_collection(collection: ModuleType, values: Vec<serde_json::Value>) -> Vec<FinancialItem> {
    let kind = collection.item_kind();
    values
        .into_iter()
        .map(|mut value| {
            if let Some(fields) = value.as_object_mut() {
                fields
                    .entry("kind")
                    .or_insert_with(|| serde_json::Value::from(kind.as_str()));
            }
            value
        })
        .filter_map(|value| match serde_json::from_value::<FinancialItem>(value) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!(collection = %collection, error = %err, "Skipping malformed item");
                None
            }
        })
        .collect()
}

#[async_trait]
impl ModuleCatalog for HttpDocumentStore {
    async fn fetch_module_catalog(&self, role: Role) -> Result<Vec<ModuleDescriptor>, DashboardError> {
        let mut url = self.url(&["modules"]).map_err(StoreError::into_fetch)?;
        url.query_pairs_mut().append_pair("role", role.as_str());
        self.get_json(url).await.map_err(StoreError::into_fetch)
    }
}

#[async_trait]
impl PreferenceStore for HttpDocumentStore {
    async fn get_preferred_order(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<PreferredOrderEntry>, DashboardError> {
        let url = self
            .url(&["users", user_id.as_str(), "module-order"])
            .map_err(StoreError::into_fetch)?;
        let entries = self.get_optional(url).await.map_err(StoreError::into_fetch)?;
        Ok(entries.unwrap_or_default())
    }

    async fn update_preferred_order(
        &self,
        user_id: &UserId,
        entries: &[PreferredOrderEntry],
    ) -> Result<(), DashboardError> {
        let url = self
            .url(&["users", user_id.as_str(), "module-order"])
            .map_err(StoreError::into_write)?;
        self.send_json(Method::PUT, url, &entries)
            .await
            .map_err(StoreError::into_write)
    }

    async fn get_preferred_modules(&self, user_id: &UserId) -> Result<Vec<ModuleId>, DashboardError> {
        let url = self
            .url(&["users", user_id.as_str(), "modules"])
            .map_err(StoreError::into_fetch)?;
        let payload: Option<ModuleIdsPayload> =
            self.get_optional(url).await.map_err(StoreError::into_fetch)?;
        Ok(payload.map(|p| p.module_ids).unwrap_or_default())
    }

    async fn post_preferred_modules(
        &self,
        user_id: &UserId,
        module_ids: &[ModuleId],
    ) -> Result<(), DashboardError> {
        let url = self
            .url(&["users", user_id.as_str(), "modules"])
            .map_err(StoreError::into_write)?;
        let body = ModuleIdsPayload {
            module_ids: module_ids.to_vec(),
        };
        self.send_json(Method::POST, url, &body)
            .await
            .map_err(StoreError::into_write)
    }

    async fn post_selection_preference(
        &self,
        preference: &SelectionPreference,
    ) -> Result<(), DashboardError> {
        let url = self
            .url(&[
                "users",
                preference.user_id.as_str(),
                "preferences",
                preference.module_type.as_str(),
            ])
            .map_err(StoreError::into_write)?;
        self.send_json(Method::POST, url, preference)
            .await
            .map_err(StoreError::into_write)
    }

    async fn get_selection_preference(
        &self,
        user_id: &UserId,
        module_type: ModuleType,
    ) -> Result<Vec<ItemId>, DashboardError> {
        let url = self
            .url(&["users", user_id.as_str(), "preferences", module_type.as_str()])
            .map_err(StoreError::into_fetch)?;
        let payload: Option<SelectedIdsPayload> =
            self.get_optional(url).await.map_err(StoreError::into_fetch)?;
        Ok(payload.map(|p| p.selected_ids).unwrap_or_default())
    }
}

#[async_trait]
impl CollectionSource for HttpDocumentStore {
    async fn fetch_collection(
        &self,
        collection: ModuleType,
    ) -> Result<Vec<FinancialItem>, DashboardError> {
        let url = self
            .url(&["collections", collection.as_str()])
            .map_err(StoreError::into_fetch)?;
        let values: Vec<serde_json::Value> =
            self.get_json(url).await.map_err(StoreError::into_fetch)?;
        Ok(decode_collection(collection, values))
    }
}
