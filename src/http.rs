use reqwest::Client;

const APP_USER_AGENT: &str = concat!("launcher-catalog/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client used by every provider.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder().user_agent(APP_USER_AGENT).build()
}
