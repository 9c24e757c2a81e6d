//! Signed Fileboost CDN URLs for stored image assets.
//!
//! An [`Asset`] handed over by the storage layer is resolved to a relative
//! path, its transformation options are normalized into the CDN's short-form
//! vocabulary, and the result is signed with HMAC-SHA256 so the CDN can reject
//! tampered URLs.

pub mod asset;
pub mod config;
pub mod helpers;
pub mod image_tag;
pub mod logging;
mod metrics;
pub mod url;

pub use asset::{ActiveStorageRoutes, Asset, Attachment, BlobPathResolver, BlobRef, VariantRef};
pub use config::{ErrorMode, FileboostConfig};
pub use url::builder::{UrlBuilder, UrlOptions};
pub use url::errors::UrlError;
pub use url::params::{ParamKey, ParamValue, ResizeOptions, TransformationParams};
pub use url::signature::SignatureGenerator;
pub use url::variant::{Operation, ResizeMode};
