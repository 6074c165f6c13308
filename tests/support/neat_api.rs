//! A wiremock stand-in for the Neat cloud API.
//!
//! Every endpoint lives under `/cloud/` so the base URL shape matches
//! production. Item payloads are served from `/files/<name>`.

#![allow(dead_code)]

use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "tok-123";
pub const ACCOUNT_ID: &str = "acct-1";

/// Fake Neat API backed by a wiremock server.
pub struct NeatApi {
    pub server: MockServer,
}

impl NeatApi {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// API base URL to hand to the client.
    pub fn base(&self) -> String {
        format!("{}/cloud/", self.server.uri())
    }

    /// URL of a payload served by [`NeatApi::mount_file`].
    pub fn file_url(&self, name: &str) -> String {
        format!("{}/files/{name}", self.server.uri())
    }

    /// Mounts a successful login, account lookup and root listing.
    pub async fn mount_auth(&self, folders: &[(&str, &str)]) {
        self.mount_login().await;
        self.mount_account().await;
        self.mount_root(folders).await;
    }

    pub async fn mount_login(&self) {
        Mock::given(method("POST"))
            .and(path("/cloud/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": TOKEN })))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_account(&self) {
        Mock::given(method("GET"))
            .and(path("/cloud/account"))
            .and(header("authorization", format!("OAuth {TOKEN}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": ACCOUNT_ID })))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_root(&self, folders: &[(&str, &str)]) {
        let folders: Vec<Value> = folders
            .iter()
            .map(|(id, name)| json!({ "webid": id, "name": name }))
            .collect();
        Mock::given(method("GET"))
            .and(path("/cloud/folders/root"))
            .and(header("x-neat-account-id", ACCOUNT_ID))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "rootFolder": { "folders": folders } })),
            )
            .mount(&self.server)
            .await;
    }

    /// Mounts one page of a folder's subfolder listing.
    pub async fn mount_subfolders_page(
        &self,
        folder_id: &str,
        page: u32,
        total: u64,
        folders: &[(&str, &str)],
    ) {
        let entities: Vec<Value> = folders
            .iter()
            .map(|(id, name)| json!({ "webid": id, "name": name }))
            .collect();
        Mock::given(method("POST"))
            .and(path(format!("/cloud/folders/{folder_id}/subfolders")))
            .and(header("authorization", format!("OAuth {TOKEN}").as_str()))
            .and(header("x-neat-account-id", ACCOUNT_ID))
            .and(body_partial_json(json!({ "page": page, "page_size": 100 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": entities,
                "pagination": { "total_records": total }
            })))
            .mount(&self.server)
            .await;
    }

    /// Mounts a single-page subfolder listing.
    pub async fn mount_subfolders(&self, folder_id: &str, folders: &[(&str, &str)]) {
        self.mount_subfolders_page(folder_id, 1, folders.len() as u64, folders)
            .await;
    }

    /// Mounts one page of a folder's item listing.
    pub async fn mount_items_page(&self, folder_id: &str, page: u32, total: u64, items: &[Value]) {
        Mock::given(method("POST"))
            .and(path("/cloud/items"))
            .and(header("x-neat-account-id", ACCOUNT_ID))
            .and(body_partial_json(json!({
                "filters": [{ "parent_id": folder_id }, { "type": "$all_item_types" }],
                "page": page,
                "page_size": 25,
                "utc_offset": -4
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": items,
                "pagination": { "total_records": total }
            })))
            .mount(&self.server)
            .await;
    }

    /// Mounts a single-page item listing.
    pub async fn mount_items(&self, folder_id: &str, items: &[Value]) {
        self.mount_items_page(folder_id, 1, items.len() as u64, items)
            .await;
    }

    /// Serves `body` at `/files/<name>`, expecting exactly `times` fetches.
    pub async fn mount_file(&self, name: &str, body: &[u8], times: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/files/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Answers `/files/<name>` with `status`.
    pub async fn mount_file_status(&self, name: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/files/{name}")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Item JSON whose payload is served at `/files/<id>`.
    pub fn item(&self, id: &str, name: &str, description: &str) -> Value {
        json!({
            "webid": id,
            "name": name,
            "description": description,
            "created_at": "2023-01-15T08:30:00Z",
            "updated_at": "2023-02-20T17:45:10Z",
            "download_url": self.file_url(id),
        })
    }
}
