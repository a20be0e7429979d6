//! Contract checks for the plugin repository client that need no network.

use extmirror_core::{ExtensionIdentity, ExtensionSource, VersionRecord};
use extmirror_jetbrains::{BuildNumber, DefaultPluginRepositoryClient, PluginRepositoryConfig, is_compatible};
use tokio_test::assert_ok;

#[test]
fn test_rejects_invalid_server_url() {
    let config = PluginRepositoryConfig::new().with_server_url("not a url");
    assert!(DefaultPluginRepositoryClient::new(&config).is_err());
}

#[test]
fn test_artifact_names_wait_for_the_server() {
    let client = assert_ok!(DefaultPluginRepositoryClient::new(&PluginRepositoryConfig::default()));
    let identity = ExtensionIdentity {
        display_name: "IdeaVim".into(),
        ..ExtensionIdentity::new("IdeaVIM")
    };
    let version = VersionRecord::new("2.10.2", "https://plugins.jetbrains.com/plugin/download")
        .with_build_range(Some("233.11799".into()), Some("241.*".into()));

    let name = client.artifact_file_name(&identity, &version);
    assert_eq!(name.known(), None);
    assert_eq!(
        name.resolve(Some("IdeaVim-2.10.2-signed.zip")).as_deref(),
        Some("ideavim_2.10.2_db8a8bca.zip")
    );
}

#[tokio::test]
async fn test_empty_batch_needs_no_request() {
    // Unroutable endpoint: any request would fail.
    let config = PluginRepositoryConfig::new().with_server_url("http://127.0.0.1:9");
    let client = assert_ok!(DefaultPluginRepositoryClient::new(&config));

    let records = assert_ok!(client.fetch_extensions(&[]).await);
    assert!(records.is_empty());
}

#[test]
fn test_build_window_is_public() {
    let build = BuildNumber::parse("IU-241.15989.150").unwrap();
    assert!(is_compatible(Some("241"), Some("241.*"), &build));
    assert!(!is_compatible(Some("242"), None, &build));
}
