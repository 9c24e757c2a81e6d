use thiserror::Error;

/// Structural failures of the URL pipeline.
///
/// Bad transformation values are never errors: they are filtered out by the
/// normalizer. Only the conditions below stop a URL from being built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("invalid Fileboost configuration: {0}")]
    ConfigurationInvalid(String),

    #[error("unable to resolve asset path: {0}")]
    AssetPathUnresolvable(String),

    #[error("failed to generate signature")]
    SignatureGenerationFailed,
}

impl UrlError {
    /// Short label used for metrics and structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            UrlError::ConfigurationInvalid(_) => "configuration_invalid",
            UrlError::AssetPathUnresolvable(_) => "asset_path_unresolvable",
            UrlError::SignatureGenerationFailed => "signature_generation_failed",
        }
    }
}
