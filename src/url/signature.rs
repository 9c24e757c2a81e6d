use anyhow::Result;
use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use tracing::instrument;

use super::cdn;
use super::params::TransformationParams;
use crate::metrics::consts as crate_metrics;

/// The exact string the HMAC is computed over:
/// `project_id:asset_path:sorted_query`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningPayload<'a> {
    pub project_id: &'a str,
    pub asset_path: &'a str,
    pub query: String,
}

impl<'a> SigningPayload<'a> {
    pub fn new(project_id: &'a str, asset_path: &'a str, params: &TransformationParams) -> Self {
        Self {
            project_id,
            asset_path,
            query: params.canonical_query(),
        }
    }
}

impl fmt::Display for SigningPayload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{project_id}{sep}{asset_path}{sep}{query}",
            project_id = self.project_id,
            asset_path = self.asset_path,
            query = self.query,
            sep = cdn::SIGNING_STRING_SEPARATOR,
        )
    }
}

/// Signs and verifies asset URLs with the project's secret token.
#[derive(Clone)]
pub struct SignatureGenerator {
    token: String,
}

impl fmt::Debug for SignatureGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureGenerator")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl SignatureGenerator {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// URL-safe, unpadded base64 of the HMAC-SHA256 over the signing payload.
    ///
    /// `None` when the project id, asset path or token is empty.
    #[instrument(skip_all, level = tracing::Level::DEBUG)]
    pub fn generate(
        &self,
        project_id: &str,
        asset_path: &str,
        params: &TransformationParams,
    ) -> Option<String> {
        let digest = self.digest(project_id, asset_path, params)?;
        Some(BASE64_URL_SAFE_NO_PAD.encode(digest))
    }

    /// Recomputes the signature and compares it in constant time.
    #[instrument(skip_all, level = tracing::Level::DEBUG)]
    pub fn verify(
        &self,
        project_id: &str,
        asset_path: &str,
        params: &TransformationParams,
        signature: &str,
    ) -> bool {
        let verified = self.verify_inner(project_id, asset_path, params, signature);
        let outcome = if verified { "valid" } else { "invalid" };
        metrics::counter!(crate_metrics::SIGNATURE_VERIFICATIONS, "outcome" => outcome)
            .increment(1);
        verified
    }

    fn verify_inner(
        &self,
        project_id: &str,
        asset_path: &str,
        params: &TransformationParams,
        signature: &str,
    ) -> bool {
        if signature.is_empty() || !self.can_sign(project_id, asset_path) {
            return false;
        }
        let Ok(provided) = BASE64_URL_SAFE_NO_PAD.decode(signature) else {
            return false;
        };
        let payload = SigningPayload::new(project_id, asset_path, params).to_string();
        match hmac_sha256(self.token.as_bytes()) {
            Ok(mut mac) => {
                mac.update(payload.as_bytes());
                // verify_slice compares in constant time.
                mac.verify_slice(&provided).is_ok()
            }
            Err(_) => false,
        }
    }

    fn can_sign(&self, project_id: &str, asset_path: &str) -> bool {
        !project_id.is_empty() && !asset_path.is_empty() && !self.token.is_empty()
    }

    fn digest(
        &self,
        project_id: &str,
        asset_path: &str,
        params: &TransformationParams,
    ) -> Option<Vec<u8>> {
        if !self.can_sign(project_id, asset_path) {
            return None;
        }
        let payload = SigningPayload::new(project_id, asset_path, params).to_string();
        tracing::debug!(signing_string = %payload);

        let mut mac = hmac_sha256(self.token.as_bytes()).ok()?;
        mac.update(payload.as_bytes());
        Some(mac.finalize().into_bytes().to_vec())
    }
}

fn hmac_sha256(key: &[u8]) -> Result<Hmac<Sha256>> {
    Ok(Hmac::<Sha256>::new_from_slice(key)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::params::ParamKey;
    use anyhow::Context;

    const PROJECT_ID: &str = "test_project";
    const ASSET_PATH: &str = "/test/path.jpg";

    fn generator() -> SignatureGenerator {
        SignatureGenerator::new("test_token")
    }

    fn params(pairs: &[(ParamKey, &str)]) -> TransformationParams {
        pairs.iter().map(|(key, value)| (*key, *value)).collect()
    }

    #[test]
    fn signing_string_layout() {
        let payload = SigningPayload::new(
            PROJECT_ID,
            ASSET_PATH,
            &params(&[(ParamKey::Width, "300"), (ParamKey::Height, "200")]),
        );
        assert_eq!(payload.to_string(), "test_project:/test/path.jpg:h=200&w=300");

        let bare = SigningPayload::new(PROJECT_ID, ASSET_PATH, &TransformationParams::new());
        assert_eq!(bare.to_string(), "test_project:/test/path.jpg:");
    }

    #[test]
    fn known_signature() -> Result<()> {
        // HMAC-SHA256("test_token", "test_project:/test/path.jpg:h=200&w=300")
        let expected = {
            let mut mac = hmac_sha256(b"test_token")?;
            mac.update(b"test_project:/test/path.jpg:h=200&w=300");
            BASE64_URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
        };
        let signature = generator()
            .generate(
                PROJECT_ID,
                ASSET_PATH,
                &params(&[(ParamKey::Width, "300"), (ParamKey::Height, "200")]),
            )
            .context("signature")?;

        assert_eq!(signature, expected);
        assert_eq!(signature.len(), 43);
        assert!(!signature.contains('='));
        assert!(!signature.contains('+'));
        assert!(!signature.contains('/'));
        Ok(())
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let forward = params(&[(ParamKey::Width, "300"), (ParamKey::Height, "200")]);
        let backward = params(&[(ParamKey::Height, "200"), (ParamKey::Width, "300")]);

        assert_eq!(
            generator().generate(PROJECT_ID, ASSET_PATH, &forward),
            generator().generate(PROJECT_ID, ASSET_PATH, &backward)
        );
    }

    #[test]
    fn repeated_calls_are_identical() {
        let params = params(&[(ParamKey::Width, "300")]);
        assert_eq!(
            generator().generate(PROJECT_ID, ASSET_PATH, &params),
            generator().generate(PROJECT_ID, ASSET_PATH, &params)
        );
    }

    #[test]
    fn every_input_changes_the_signature() -> Result<()> {
        let base_params = params(&[(ParamKey::Width, "300"), (ParamKey::Fit, "cover")]);
        let base = generator()
            .generate(PROJECT_ID, ASSET_PATH, &base_params)
            .context("base")?;

        let variations = [
            generator().generate(PROJECT_ID, "/test/path.jpe", &base_params),
            generator().generate("test_projecu", ASSET_PATH, &base_params),
            generator().generate(
                PROJECT_ID,
                ASSET_PATH,
                &params(&[(ParamKey::Width, "301"), (ParamKey::Fit, "cover")]),
            ),
            generator().generate(
                PROJECT_ID,
                ASSET_PATH,
                &params(&[(ParamKey::Height, "300"), (ParamKey::Fit, "cover")]),
            ),
            SignatureGenerator::new("test_tokem").generate(PROJECT_ID, ASSET_PATH, &base_params),
        ];
        for variation in variations {
            let variation = variation.context("variation")?;
            assert_ne!(variation, base);
        }
        Ok(())
    }

    #[test]
    fn missing_inputs_yield_no_signature() {
        let params = params(&[(ParamKey::Width, "300")]);
        assert_eq!(generator().generate("", ASSET_PATH, &params), None);
        assert_eq!(generator().generate(PROJECT_ID, "", &params), None);
        assert_eq!(
            SignatureGenerator::new("").generate(PROJECT_ID, ASSET_PATH, &params),
            None
        );
    }

    #[test]
    fn verify_round_trip() -> Result<()> {
        let params = params(&[(ParamKey::Width, "300"), (ParamKey::Quality, "85")]);
        let signature = generator()
            .generate(PROJECT_ID, ASSET_PATH, &params)
            .context("signature")?;

        assert!(generator().verify(PROJECT_ID, ASSET_PATH, &params, &signature));
        assert!(!generator().verify(PROJECT_ID, ASSET_PATH, &params, "wrong-signature"));
        assert!(!generator().verify(PROJECT_ID, ASSET_PATH, &params, ""));
        assert!(!generator().verify(PROJECT_ID, "/other.jpg", &params, &signature));
        assert!(!SignatureGenerator::new("").verify(PROJECT_ID, ASSET_PATH, &params, &signature));
        Ok(())
    }

    #[test]
    fn debug_hides_token() {
        assert!(!format!("{:?}", generator()).contains("test_token"));
    }
}
