#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use codal_watch::workflows::codal::client::{HttpSettings, HttpTransport};
use tokio::runtime::{Builder, Runtime};
use url::Url;
use wiremock::MockServer;

/// Runtime used only to drive the mock server setup; the gateways under test
/// bring their own.
pub fn mock_runtime() -> Runtime {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("mock runtime builds")
}

pub fn transport_for(server: &MockServer) -> Arc<HttpTransport> {
    let base = Url::parse(&format!("{}/", server.uri())).expect("mock base url");
    let settings = HttpSettings {
        api_url: base.join("api/search/v2/q").expect("api url"),
        base_url: base,
        user_agent: "codal-watch-tests".to_string(),
        timeout: Duration::from_secs(5),
    };
    Arc::new(HttpTransport::new(settings).expect("transport builds"))
}

pub fn detail_page(license: &str) -> String {
    format!(
        r#"<html><body><form id="form1">
             <span id="lblTitle">افزایش سرمایه</span>
             <span id="ucCapitalIncreaseLicense_lblLicenseCode">{license}</span>
           </form></body></html>"#
    )
}

/// Writes a stand-in for `pdftoppm` that emits a fixed "image".
#[cfg(unix)]
pub fn fake_pdftoppm(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("pdftoppm");
    std::fs::write(
        &path,
        "#!/bin/sh\nfor last; do :; done\nprintf 'fake-png' > \"$last.png\"\n",
    )
    .expect("write fake pdftoppm");
    let mut permissions = std::fs::metadata(&path).expect("metadata").permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).expect("chmod fake pdftoppm");
    path
}

/// base64 of `fake-png`.
pub const FAKE_PNG_BASE64: &str = "ZmFrZS1wbmc=";
