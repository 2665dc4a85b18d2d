//! Test-harness construction. Not for production paths.

use crate::client::ApiClient;
use crate::error::ClientResult;

/// Build a client whose traffic goes through `transport`.
///
/// Verification is switched off and the protocol forced to `https`, so the
/// handle's base URL is always `https://{host}/...` regardless of what the
/// transport actually connects to.
pub fn test_client(
    transport: reqwest::Client,
    token: &str,
    host: &str,
    is_graphql: bool,
) -> ClientResult<ApiClient> {
    let mut client = ApiClient::new();
    client.set_protocol("https");
    client.override_transport(transport);
    client.connect(host, token, true, is_graphql)?;
    Ok(client)
}
