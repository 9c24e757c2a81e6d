// Kept in its own test binary: these tests mutate the process-wide snapshot.

use anyhow::{Context, Result};

use fileboost::config::global;
use fileboost::helpers;
use fileboost::{Asset, BlobRef, ErrorMode, FileboostConfig, ResizeOptions, UrlOptions};

#[test]
fn global_snapshot_lifecycle() -> Result<()> {
    std::env::remove_var("FILEBOOST_PROJECT_ID");
    std::env::remove_var("FILEBOOST_TOKEN");
    global::replace(FileboostConfig::default());
    let blob = Asset::Blob(BlobRef::new("abc123", "photo.jpg"));
    let options = UrlOptions::with_resize(ResizeOptions::new().with("w", 300));

    assert!(helpers::url_for(&blob, &options).is_err());

    let before = global::current();
    let updated = global::configure(|config| {
        config.project_id = "test_project".to_string();
        config.token = "test_token".to_string();
    });
    assert!(updated.is_valid());
    // Earlier snapshots are unaffected by later writes.
    assert!(!before.is_valid());

    let url = helpers::url_for(&blob, &options)?.context("url")?;
    assert!(url.starts_with("https://cdn.fileboost.dev/test_project/"));
    assert!(url.contains("w=300"));

    global::configure(|config| {
        config.token.clear();
        config.error_mode = ErrorMode::Permissive;
    });
    assert_eq!(helpers::url_for(&blob, &options)?, None);

    std::env::set_var("FILEBOOST_PROJECT_ID", "env_project");
    std::env::set_var("FILEBOOST_TOKEN", "env_token");
    global::reset();
    let rebuilt = global::current();
    assert_eq!(rebuilt.project_id, "env_project");
    assert_eq!(rebuilt.token, "env_token");
    assert_eq!(rebuilt.error_mode, ErrorMode::Strict);

    std::env::remove_var("FILEBOOST_PROJECT_ID");
    std::env::remove_var("FILEBOOST_TOKEN");
    global::reset();
    assert!(!global::current().is_valid());
    Ok(())
}
