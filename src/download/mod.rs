//! Item downloads: naming, streaming fetch, timestamps and ledger commit.
//!
//! # Features
//!
//! - Streaming downloads into a `.part` file, renamed only once complete
//! - Short fixed connect/read timeouts (1s by default)
//! - Forbidden-character sanitizing of every local name
//! - Collision suffixes (`name (2).pdf`, `name (3).pdf`, ...), never overwriting
//! - Server creation/modification times restored on the written file
//!
//! # Example
//!
//! ```no_run
//! use neat_mirror_core::download::{HttpClient, ItemDownloader};
//! use neat_mirror_core::{Ledger, api::ItemRecord};
//! use std::path::Path;
//!
//! # async fn example(item: ItemRecord) -> Result<(), Box<dyn std::error::Error>> {
//! let mut ledger = Ledger::load(Path::new("./.neat-mirror/ledger.txt")).await?;
//! let downloader = ItemDownloader::new(HttpClient::new()?);
//! let outcome = downloader.process(&item, Path::new("./Invoices"), &mut ledger).await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
pub mod filename;
mod item;
pub mod times;

pub use client::{DOWNLOAD_CONNECT_TIMEOUT_SECS, DOWNLOAD_READ_TIMEOUT_SECS, HttpClient};
pub use error::DownloadError;
pub use filename::{folder_dir_name, item_file_stem, resolve_collision_free_path, sanitize};
pub use item::{ItemDownloader, ItemOutcome};
