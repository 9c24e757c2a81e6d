pub(crate) const URLS_BUILT: &str = "fileboost_urls_built_total";
pub(crate) const URL_BUILD_FAILURES: &str = "fileboost_url_build_failures_total";
pub(crate) const PARAMS_DROPPED: &str = "fileboost_params_dropped_total";
pub(crate) const SIGNATURE_VERIFICATIONS: &str =
    "fileboost_signature_verifications_total";
