//! Assets as handed over by the storage layer.
//!
//! The storage layer classifies its values once, at the boundary, into an
//! [`Asset`]. Past that point the pipeline only matches on this enum.

use crate::url::cdn;
use crate::url::errors::UrlError;
use crate::url::variant::Operation;

/// A stored blob, addressed by its signed id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobRef {
    pub signed_id: String,
    pub filename: String,
}

impl BlobRef {
    pub fn new(signed_id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            signed_id: signed_id.into(),
            filename: filename.into(),
        }
    }
}

/// A named attachment slot on a record. The slot may be empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub blob: Option<BlobRef>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, blob: Option<BlobRef>) -> Self {
        Self {
            name: name.into(),
            blob,
        }
    }
}

/// A blob plus the transformation pipeline declared for it.
#[derive(Clone, Debug, PartialEq)]
pub struct VariantRef {
    pub blob: BlobRef,
    pub operations: Vec<Operation>,
}

impl VariantRef {
    pub fn new(blob: BlobRef, operations: Vec<Operation>) -> Self {
        Self { blob, operations }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Asset {
    Blob(BlobRef),
    Attachment(Attachment),
    Variant(VariantRef),
    /// Anything the storage layer could not classify, named by its type.
    Unsupported(String),
}

impl Asset {
    pub fn unsupported(type_name: impl Into<String>) -> Self {
        Asset::Unsupported(type_name.into())
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Asset::Unsupported(_))
    }

    /// The blob whose path addresses this asset. Variants use their base
    /// blob so nothing has to be materialised by the storage layer.
    pub fn blob(&self) -> Result<&BlobRef, UrlError> {
        match self {
            Asset::Blob(blob) => Ok(blob),
            Asset::Attachment(attachment) => attachment.blob.as_ref().ok_or_else(|| {
                UrlError::AssetPathUnresolvable(format!(
                    "attachment \"{}\" has no blob",
                    attachment.name
                ))
            }),
            Asset::Variant(variant) => Ok(&variant.blob),
            Asset::Unsupported(type_name) => Err(UrlError::AssetPathUnresolvable(format!(
                "unsupported asset type: {type_name}"
            ))),
        }
    }
}

impl From<BlobRef> for Asset {
    fn from(blob: BlobRef) -> Self {
        Asset::Blob(blob)
    }
}

impl From<Attachment> for Asset {
    fn from(attachment: Attachment) -> Self {
        Asset::Attachment(attachment)
    }
}

impl From<VariantRef> for Asset {
    fn from(variant: VariantRef) -> Self {
        Asset::Variant(variant)
    }
}

/// Turns a blob into the relative path the CDN fetches it from.
pub trait BlobPathResolver {
    fn blob_path(&self, blob: &BlobRef) -> Option<String>;
}

/// Redirect routes in the `/rails/active_storage/blobs/redirect/...` form.
#[derive(Clone, Debug)]
pub struct ActiveStorageRoutes {
    prefix: String,
}

impl Default for ActiveStorageRoutes {
    fn default() -> Self {
        Self {
            prefix: cdn::BLOB_REDIRECT_ROUTE.to_string(),
        }
    }
}

impl ActiveStorageRoutes {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().trim_end_matches('/').to_string(),
        }
    }
}

impl BlobPathResolver for ActiveStorageRoutes {
    fn blob_path(&self, blob: &BlobRef) -> Option<String> {
        if blob.signed_id.is_empty() || blob.filename.is_empty() {
            return None;
        }
        Some(format!(
            "{prefix}/{signed_id}/{filename}",
            prefix = self.prefix,
            signed_id = blob.signed_id,
            filename = urlencoding::encode(&blob.filename),
        ))
    }
}

/// Resolves any supported asset to its relative path.
pub fn resolve_path<R: BlobPathResolver + ?Sized>(
    resolver: &R,
    asset: &Asset,
) -> Result<String, UrlError> {
    let blob = asset.blob()?;
    resolver
        .blob_path(blob)
        .filter(|path| !path.is_empty())
        .ok_or_else(|| {
            UrlError::AssetPathUnresolvable(format!(
                "no path for blob \"{}\"",
                blob.signed_id
            ))
        })
}
