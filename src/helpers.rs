//! Entry points for the rendering layer.

use std::collections::BTreeMap;

use crate::asset::{ActiveStorageRoutes, Asset, BlobPathResolver};
use crate::config::global;
use crate::url::builder::{UrlBuilder, UrlOptions};
use crate::url::errors::UrlError;
use crate::url::params::ResizeOptions;

/// One entry of a responsive set: its key in the result plus the options
/// that differ from the shared base.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResponsiveSize {
    pub suffix: String,
    pub resize: ResizeOptions,
}

impl ResponsiveSize {
    pub fn new(suffix: impl Into<String>, resize: ResizeOptions) -> Self {
        Self {
            suffix: suffix.into(),
            resize,
        }
    }
}

/// Builds a URL against the process-wide configuration with the default
/// blob routes.
pub fn url_for(asset: &Asset, options: &UrlOptions) -> Result<Option<String>, UrlError> {
    UrlBuilder::<ActiveStorageRoutes>::new(global::current()).url_for(asset, options)
}

/// One URL per size, keyed by suffix. Each size's options are laid over
/// `base.resize`; sizes that yield no URL are left out.
pub fn responsive_urls<R: BlobPathResolver>(
    builder: &UrlBuilder<R>,
    asset: &Asset,
    sizes: &[ResponsiveSize],
    base: &UrlOptions,
) -> Result<BTreeMap<String, String>, UrlError> {
    let mut urls = BTreeMap::new();
    for size in sizes {
        let options = UrlOptions {
            resize: base.resize.merged(&size.resize),
            disposition: base.disposition.clone(),
        };
        match builder.url_for(asset, &options)? {
            Some(url) if !url.is_empty() => {
                urls.insert(size.suffix.clone(), url);
            }
            _ => tracing::debug!(suffix = %size.suffix, "No URL for responsive size."),
        }
    }
    Ok(urls)
}
