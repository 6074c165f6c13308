//! Client for the Neat cloud folder/item API.
//!
//! The API is a small JSON-over-HTTP surface:
//!
//! - `POST token` exchanges username/password for a bearer token
//! - `GET account` resolves the account id
//! - `GET folders/root` lists the top-level folders
//! - `POST folders/<id>/subfolders` and `POST items` are paginated listings
//!
//! [`NeatClient::authenticate`] performs the first three calls and returns a
//! [`SessionContext`] that the listing calls take by reference.
//!
//! # Example
//!
//! ```no_run
//! use neat_mirror_core::api::{ClientTimeouts, Credentials, NeatClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = NeatClient::new("https://duge.neat.com/cloud/", ClientTimeouts::NONE)?;
//! let session = client
//!     .authenticate(&Credentials::new("me@example.com", "secret"))
//!     .await?;
//! for folder in session.top_level_folders() {
//!     let items = client.list_items(&session, &folder.id).await?;
//!     println!("{}: {} items", folder.name, items.len());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
pub(crate) mod http_client;
pub mod models;
pub mod pagination;
mod session;

use reqwest::header::{AUTHORIZATION, ORIGIN, REFERER};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

pub use error::ApiError;
pub use http_client::ClientTimeouts;
pub use models::{FolderNode, ItemRecord, Page, Pagination};
pub use pagination::{FOLDER_PAGE_SIZE, ITEM_PAGE_SIZE, collect_pages, page_count};
pub use session::{Credentials, SessionContext};

use crate::user_agent::API_USER_AGENT;

/// Production API base URL.
pub const DEFAULT_API_BASE: &str = "https://duge.neat.com/cloud/";

/// Header carrying the account id on every post-login call.
const ACCOUNT_HEADER: &str = "x-neat-account-id";

/// Origin of the web app the API expects requests from.
const WEB_APP_ORIGIN: &str = "https://app.neat.com";

/// Item type filter meaning "every item type".
const ALL_ITEM_TYPES: &str = "$all_item_types";

/// UTC offset the web app sends with item listings.
const ITEM_UTC_OFFSET: i32 = -4;

/// Client for the Neat API.
///
/// Holds a cookie store, so one client should live for exactly one attempt.
#[derive(Debug, Clone)]
pub struct NeatClient {
    client: Client,
    base: Url,
}

impl NeatClient {
    /// Creates a client against `base_url`.
    ///
    /// A missing trailing slash on the base path is added so endpoint paths
    /// join underneath it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidEndpoint`] for an unparseable base URL and
    /// [`ApiError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeouts: ClientTimeouts) -> Result<Self, ApiError> {
        let mut base =
            Url::parse(base_url).map_err(|_| ApiError::invalid_endpoint(base_url.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = http_client::build_guarded("api", timeouts, |builder| {
            builder.cookie_store(true).user_agent(API_USER_AGENT)
        })
        .map_err(ApiError::ClientBuild)?;

        Ok(Self { client, base })
    }

    /// The API base URL.
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Logs in, resolves the account and lists the root folder.
    ///
    /// # Errors
    ///
    /// Returns the first failing call's [`ApiError`].
    #[instrument(skip(self, credentials), fields(username = credentials.username()))]
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<SessionContext, ApiError> {
        let token = self.login(credentials).await?;
        let account = self.account(&token).await?;
        let root = self.root_folder(&token, &account.id).await?;
        debug!(
            account_id = %account.id,
            folders = root.folders.len(),
            "authenticated"
        );
        Ok(SessionContext::new(token, account.id, root.folders))
    }

    /// Exchanges credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status or decode failure. A 401/403
    /// answer satisfies [`ApiError::is_credentials_rejected`].
    pub async fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let endpoint = "token";
        let request = self
            .client
            .post(self.endpoint(endpoint)?)
            .header(ORIGIN, WEB_APP_ORIGIN)
            .header(REFERER, format!("{WEB_APP_ORIGIN}/login/"))
            .json(&json!({
                "username": credentials.username(),
                "password": credentials.password(),
            }));
        let response: models::TokenResponse = send_json(endpoint, request).await?;
        Ok(response.token)
    }

    /// Resolves the account behind `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status or decode failure.
    pub async fn account(&self, token: &str) -> Result<models::Account, ApiError> {
        let endpoint = "account";
        let request = self
            .client
            .get(self.endpoint(endpoint)?)
            .header(AUTHORIZATION, format!("OAuth {token}"))
            .header(REFERER, format!("{WEB_APP_ORIGIN}/accounts/"));
        send_json(endpoint, request).await
    }

    /// Lists the account's root folder.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status or decode failure.
    pub async fn root_folder(
        &self,
        token: &str,
        account_id: &str,
    ) -> Result<models::RootFolder, ApiError> {
        let endpoint = "folders/root";
        let request = self
            .client
            .get(self.endpoint(endpoint)?)
            .header(AUTHORIZATION, format!("OAuth {token}"))
            .header(ACCOUNT_HEADER, account_id)
            .header(
                REFERER,
                format!("{WEB_APP_ORIGIN}/dashboard/?account={account_id}"),
            );
        let response: models::RootResponse = send_json(endpoint, request).await?;
        Ok(response.root_folder)
    }

    /// Fetches one page of a folder's subfolders.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status or decode failure.
    pub async fn subfolders_page(
        &self,
        session: &SessionContext,
        folder_id: &str,
        page: u32,
    ) -> Result<Page<FolderNode>, ApiError> {
        let endpoint = format!("folders/{folder_id}/subfolders");
        let request = self
            .authorized(self.client.post(self.endpoint(&endpoint)?), session)
            .json(&json!({
                "page": page,
                "page_size": FOLDER_PAGE_SIZE,
            }));
        send_json(&endpoint, request).await
    }

    /// Fetches one page of a folder's items of every type.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status or decode failure.
    pub async fn items_page(
        &self,
        session: &SessionContext,
        folder_id: &str,
        page: u32,
    ) -> Result<Page<ItemRecord>, ApiError> {
        let endpoint = "items";
        let account_id = session.account_id();
        let request = self
            .authorized(self.client.post(self.endpoint(endpoint)?), session)
            .header(
                REFERER,
                format!("{WEB_APP_ORIGIN}/folders/{account_id}/?account={account_id}"),
            )
            .json(&json!({
                "filters": [{"parent_id": folder_id}, {"type": ALL_ITEM_TYPES}],
                "page": page,
                "page_size": ITEM_PAGE_SIZE,
                "utc_offset": ITEM_UTC_OFFSET,
            }));
        send_json(endpoint, request).await
    }

    /// Lists every subfolder of `folder_id` across all pages.
    ///
    /// # Errors
    ///
    /// Returns the first page's [`ApiError`]; partial listings are discarded.
    #[instrument(level = "debug", skip(self, session))]
    pub async fn list_subfolders(
        &self,
        session: &SessionContext,
        folder_id: &str,
    ) -> Result<Vec<FolderNode>, ApiError> {
        collect_pages(FOLDER_PAGE_SIZE, |page| {
            self.subfolders_page(session, folder_id, page)
        })
        .await
    }

    /// Lists every item of `folder_id` across all pages.
    ///
    /// # Errors
    ///
    /// Returns the first page's [`ApiError`]; partial listings are discarded.
    #[instrument(level = "debug", skip(self, session))]
    pub async fn list_items(
        &self,
        session: &SessionContext,
        folder_id: &str,
    ) -> Result<Vec<ItemRecord>, ApiError> {
        collect_pages(ITEM_PAGE_SIZE, |page| self.items_page(session, folder_id, page)).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|_| ApiError::invalid_endpoint(path.to_string()))
    }

    fn authorized(&self, request: RequestBuilder, session: &SessionContext) -> RequestBuilder {
        request
            .header(AUTHORIZATION, session.authorization())
            .header(ACCOUNT_HEADER, session.account_id())
    }
}

/// Sends `request`, checks the status and decodes the JSON body.
async fn send_json<T: DeserializeOwned>(
    endpoint: &str,
    request: RequestBuilder,
) -> Result<T, ApiError> {
    let response = request
        .send()
        .await
        .map_err(|e| ApiError::transport(endpoint, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::http_status(endpoint, status.as_u16()));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ApiError::transport(endpoint, e))?;
    serde_json::from_slice(&body).map_err(|e| ApiError::decode(endpoint, e))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_appends_trailing_slash_to_base() {
        let client = NeatClient::new("http://127.0.0.1:9/cloud", ClientTimeouts::NONE).unwrap();
        assert_eq!(client.base().as_str(), "http://127.0.0.1:9/cloud/");
        assert_eq!(
            client.endpoint("folders/root").unwrap().as_str(),
            "http://127.0.0.1:9/cloud/folders/root"
        );
    }

    #[test]
    fn test_new_rejects_unparseable_base() {
        let result = NeatClient::new("not a url", ClientTimeouts::NONE);
        assert!(matches!(result, Err(ApiError::InvalidEndpoint { .. })));
    }

    #[test]
    fn test_default_base_joins_listing_endpoints() {
        let client = NeatClient::new(DEFAULT_API_BASE, ClientTimeouts::NONE).unwrap();
        assert_eq!(
            client.endpoint("folders/abc/subfolders").unwrap().as_str(),
            "https://duge.neat.com/cloud/folders/abc/subfolders"
        );
    }
}
