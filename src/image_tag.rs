//! Image tags for the rendering layer.
//!
//! [`PatchedImageTag`] wraps the host's own image-tag renderer. With
//! `patch_image_tag` enabled it routes stored assets through Fileboost and
//! falls back to the wrapped renderer for everything else, including any
//! Fileboost failure.

use maud::html;

use crate::asset::{self, ActiveStorageRoutes, Asset, BlobPathResolver};
use crate::url::builder::{UrlBuilder, UrlOptions};
use crate::url::errors::UrlError;
use crate::url::params::ResizeOptions;

/// The host's default `<img>` renderer.
pub trait ImageTagRenderer {
    fn image_tag(&self, src: &str, attributes: &[(String, String)]) -> String;
}

/// Plain `<img>` markup with escaped attribute values.
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlImageTag;

impl ImageTagRenderer for HtmlImageTag {
    fn image_tag(&self, src: &str, attributes: &[(String, String)]) -> String {
        let mut tag = format!("<img src=\"{}\"", escape_attribute(src));
        for (name, value) in attributes {
            tag.push_str(&format!(" {name}=\"{}\"", escape_attribute(value)));
        }
        tag.push('>');
        tag
    }
}

fn escape_attribute(value: &str) -> String {
    html! { (value) }.into_string()
}

/// Resize options for the URL plus the remaining HTML attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageTagOptions {
    pub resize: ResizeOptions,
    pub attributes: Vec<(String, String)>,
}

impl ImageTagOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resize(mut self, resize: ResizeOptions) -> Self {
        self.resize = resize;
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ImageSource<'a> {
    Asset(&'a Asset),
    Path(&'a str),
}

/// Renders `asset` through `renderer` with a signed Fileboost URL.
///
/// `Ok(None)` when the builder is permissive and no URL could be built.
pub fn fileboost_image_tag<R: BlobPathResolver, T: ImageTagRenderer + ?Sized>(
    builder: &UrlBuilder<R>,
    renderer: &T,
    asset: &Asset,
    options: &ImageTagOptions,
) -> Result<Option<String>, UrlError> {
    let url = builder.url_for(asset, &UrlOptions::with_resize(options.resize.clone()))?;
    Ok(url.map(|url| renderer.image_tag(&url, &options.attributes)))
}

/// Decorates a host renderer with Fileboost URLs when the feature flag is on.
#[derive(Clone, Debug)]
pub struct PatchedImageTag<T, R = ActiveStorageRoutes> {
    renderer: T,
    builder: UrlBuilder<R>,
}

impl<T: ImageTagRenderer, R: BlobPathResolver> PatchedImageTag<T, R> {
    pub fn new(renderer: T, builder: UrlBuilder<R>) -> Self {
        Self { renderer, builder }
    }

    /// Renders `source`, preferring Fileboost for stored assets.
    ///
    /// Errors only when the fallback itself cannot address the asset.
    pub fn image_tag(
        &self,
        source: ImageSource<'_>,
        options: &ImageTagOptions,
    ) -> Result<String, UrlError> {
        match source {
            ImageSource::Path(path) => Ok(self.renderer.image_tag(path, &options.attributes)),
            ImageSource::Asset(asset) => {
                if self.intercepts(asset) {
                    match fileboost_image_tag(&self.builder, &self.renderer, asset, options) {
                        Ok(Some(tag)) => return Ok(tag),
                        Ok(None) => tracing::debug!("No Fileboost URL; using default image tag."),
                        Err(error) => tracing::warn!(
                            %error,
                            "Fileboost image tag failed; using default image tag."
                        ),
                    }
                }
                let path = asset::resolve_path(self.builder.resolver(), asset)?;
                Ok(self.renderer.image_tag(&path, &options.attributes))
            }
        }
    }

    fn intercepts(&self, asset: &Asset) -> bool {
        let config = self.builder.config();
        config.patch_image_tag && config.is_valid() && asset.is_supported()
    }
}
