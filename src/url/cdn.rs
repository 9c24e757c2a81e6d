pub const BASE_URL: &str = "https://cdn.fileboost.dev";

pub const SIGNATURE_PARAM_KEY: &str = "sig";
pub const SIGNING_STRING_SEPARATOR: &str = ":";

pub const PROJECT_ID_ENV_KEY: &str = "FILEBOOST_PROJECT_ID";
pub const TOKEN_ENV_KEY: &str = "FILEBOOST_TOKEN";

pub const VALID_FORMATS: [&str; 6] = ["webp", "jpeg", "jpg", "png", "gif", "avif"];
pub const VALID_FITS: [&str; 6] = ["cover", "contain", "fill", "scale-down", "crop", "pad"];

pub const QUALITY_MIN: i64 = 1;
pub const QUALITY_MAX: i64 = 100;

// Default blob route of the storage collaborator; variants resolve here too so
// the storage layer never materialises them.
pub const BLOB_REDIRECT_ROUTE: &str = "/rails/active_storage/blobs/redirect";
