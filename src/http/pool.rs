use reqwest::Client;
use std::time::Duration;

use crate::error::Result;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(20);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Builds the shared reqwest client. Only the connect timeout is fixed here;
/// the overall deadline is set per request by the transport.
pub fn create_http_client() -> Result<Client> {
    let client = Client::builder()
        .connect_timeout(CONNECTION_TIMEOUT)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .pool_max_idle_per_host(10)
        .build()?;

    Ok(client)
}
