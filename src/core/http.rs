use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING};
use reqwest::Client;

use crate::core::state::LauncherSettings;

const APP_USER_AGENT: &str = "CatClient/0.1.0";

/// Shared HTTP client. Timeouts apply per request; nothing bounds a whole
/// pipeline run.
pub fn build_http_client(settings: &LauncherSettings) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
    default_headers.insert(ACCEPT, HeaderValue::from_static("application/json, */*"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .timeout(Duration::from_secs(settings.request_timeout_secs))
        .build()
}

/// GET a text document, treating any non-2xx status as a transport failure.
pub async fn get_text(client: &Client, url: &str) -> crate::core::error::LauncherResult<String> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(crate::core::error::LauncherError::DownloadFailed {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}
