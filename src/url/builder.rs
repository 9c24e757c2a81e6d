use itertools::Itertools;
use std::iter;
use std::sync::Arc;
use tracing::instrument;

use super::cdn;
use super::errors::UrlError;
use super::params::{self, ResizeOptions, TransformationParams};
use super::signature::SignatureGenerator;
use super::variant;
use crate::asset::{self, ActiveStorageRoutes, Asset, BlobPathResolver};
use crate::config::{ErrorMode, FileboostConfig};
use crate::metrics::consts as crate_metrics;

/// Caller-side options for a single URL.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UrlOptions {
    pub resize: ResizeOptions,
    /// Accepted for parity with blob URL helpers. The CDN has no disposition
    /// parameter, so it is neither signed nor emitted.
    pub disposition: Option<String>,
}

impl UrlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resize(resize: ResizeOptions) -> Self {
        Self {
            resize,
            disposition: None,
        }
    }

    pub fn disposition(mut self, disposition: impl Into<String>) -> Self {
        self.disposition = Some(disposition.into());
        self
    }
}

/// Turns assets plus options into signed CDN URLs.
#[derive(Clone, Debug)]
pub struct UrlBuilder<R = ActiveStorageRoutes> {
    config: Arc<FileboostConfig>,
    signer: SignatureGenerator,
    resolver: R,
}

impl UrlBuilder<ActiveStorageRoutes> {
    pub fn new(config: impl Into<Arc<FileboostConfig>>) -> Self {
        Self::with_resolver(config, ActiveStorageRoutes::default())
    }
}

impl<R: BlobPathResolver> UrlBuilder<R> {
    pub fn with_resolver(config: impl Into<Arc<FileboostConfig>>, resolver: R) -> Self {
        let config = config.into();
        let signer = SignatureGenerator::new(config.token.clone());
        Self {
            config,
            signer,
            resolver,
        }
    }

    pub fn config(&self) -> &FileboostConfig {
        &self.config
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn signer(&self) -> &SignatureGenerator {
        &self.signer
    }

    /// Builds a signed URL, returning every structural failure as an error.
    #[instrument(
        skip_all,
        err,
        level = tracing::Level::DEBUG,
        fields(disposition = ?options.disposition)
    )]
    pub fn build(&self, asset: &Asset, options: &UrlOptions) -> Result<String, UrlError> {
        let result = self.build_inner(asset, options);
        match &result {
            Ok(_) => metrics::counter!(crate_metrics::URLS_BUILT).increment(1),
            Err(error) => {
                metrics::counter!(crate_metrics::URL_BUILD_FAILURES, "reason" => error.reason())
                    .increment(1)
            }
        }
        result
    }

    /// Builds a signed URL according to the configured [`ErrorMode`]: strict
    /// returns the error, permissive logs it and yields `None`.
    pub fn url_for(&self, asset: &Asset, options: &UrlOptions) -> Result<Option<String>, UrlError> {
        match self.build(asset, options) {
            Ok(url) => Ok(Some(url)),
            Err(error) => match self.config.error_mode {
                ErrorMode::Strict => Err(error),
                ErrorMode::Permissive => {
                    tracing::error!(%error, "Couldn't build Fileboost URL.");
                    Ok(None)
                }
            },
        }
    }

    /// Variant-derived parameters with the normalized explicit options laid
    /// over them. Explicit values win on shared keys.
    pub fn transformation_params(
        &self,
        asset: &Asset,
        options: &UrlOptions,
    ) -> TransformationParams {
        let mut params = variant::transform_asset(asset);

        let explicit = params::normalize_with_report(&options.resize);
        for dropped in &explicit.dropped {
            tracing::debug!(
                key = %dropped.key,
                reason = dropped.reason.as_str(),
                "Dropped resize option."
            );
            metrics::counter!(crate_metrics::PARAMS_DROPPED, "reason" => dropped.reason.as_str())
                .increment(1);
        }

        params.merge(explicit.params);
        params
    }

    fn build_inner(&self, asset: &Asset, options: &UrlOptions) -> Result<String, UrlError> {
        self.config.validate()?;

        let asset_path = asset::resolve_path(&self.resolver, asset)?;
        let params = self.transformation_params(asset, options);
        let project_id = self.config.project_id.as_str();

        let signature = self
            .signer
            .generate(project_id, &asset_path, &params)
            .ok_or(UrlError::SignatureGenerationFailed)?;

        let query = params
            .sorted()
            .into_iter()
            .map(|(key, value)| (key.as_str(), value))
            .chain(iter::once((cdn::SIGNATURE_PARAM_KEY, signature.as_str())))
            .map(|(key, value)| {
                format!(
                    "{key}={value}",
                    key = urlencoding::encode(key),
                    value = urlencoding::encode(value)
                )
            })
            .join("&");

        let url = format!(
            "{base_url}/{project_id}{asset_path}?{query}",
            base_url = self.config.base_url(),
        );
        tracing::debug!(%url);
        Ok(url)
    }
}
