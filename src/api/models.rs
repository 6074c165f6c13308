//! Wire types for the Neat cloud API.

use serde::{Deserialize, Serialize};

/// Response of the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer token used in the `Authorization: OAuth <token>` header.
    pub token: String,
}

/// Response of the account endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    /// Account identifier sent as `x-neat-account-id`.
    pub id: String,
}

/// Response of the root folder endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RootResponse {
    /// The account's root folder.
    #[serde(rename = "rootFolder")]
    pub root_folder: RootFolder,
}

/// The account root and its top-level folders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RootFolder {
    /// Top-level folders in listing order.
    #[serde(default)]
    pub folders: Vec<FolderNode>,
}

/// A remote folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    /// Stable remote identifier.
    #[serde(rename = "webid")]
    pub id: String,
    /// Display name (unsanitized).
    #[serde(default)]
    pub name: String,
}

/// A remote document item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Stable remote identifier, unique across the account.
    #[serde(rename = "webid")]
    pub id: String,
    /// Display name; empty for unnamed scans.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// Free-text description.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// Creation time, `%Y-%m-%dT%H:%M:%SZ`.
    pub created_at: String,
    /// Last update time, `%Y-%m-%dT%H:%M:%SZ`.
    pub updated_at: String,
    /// Direct download URL of the item's PDF.
    pub download_url: String,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    /// Records on this page.
    #[serde(default = "Vec::new")]
    pub entities: Vec<T>,
    /// Pagination metadata.
    pub pagination: Pagination,
}

/// Pagination metadata returned with each page.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    /// Total number of records across all pages.
    pub total_records: u64,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_record_null_name_and_description_become_empty() {
        let item: ItemRecord = serde_json::from_value(json!({
            "webid": "abc",
            "name": null,
            "created_at": "2023-04-01T10:00:00Z",
            "updated_at": "2023-04-02T10:00:00Z",
            "download_url": "https://files.example/abc.pdf"
        }))
        .unwrap();
        assert_eq!(item.id, "abc");
        assert_eq!(item.name, "");
        assert_eq!(item.description, "");
    }

    #[test]
    fn test_root_response_reads_nested_folders() {
        let root: RootResponse = serde_json::from_value(json!({
            "rootFolder": {
                "webid": "root",
                "folders": [{"webid": "f1", "name": "Invoices"}]
            }
        }))
        .unwrap();
        assert_eq!(
            root.root_folder.folders,
            vec![FolderNode {
                id: "f1".to_string(),
                name: "Invoices".to_string()
            }]
        );
    }

    #[test]
    fn test_page_missing_entities_defaults_to_empty() {
        let page: Page<FolderNode> =
            serde_json::from_value(json!({"pagination": {"total_records": 0}})).unwrap();
        assert!(page.entities.is_empty());
        assert_eq!(page.pagination.total_records, 0);
    }

    #[test]
    fn test_page_without_pagination_is_rejected() {
        let result: Result<Page<FolderNode>, _> = serde_json::from_value(json!({"entities": []}));
        assert!(result.is_err());
    }
}
