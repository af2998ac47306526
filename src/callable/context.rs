use http::{HeaderMap, header, request};
use std::net::SocketAddr;

const INSTANCE_ID_TOKEN: &str = "firebase-instance-id-token";
const APP_CHECK_TOKEN: &str = "x-firebase-appcheck";

/// Metadata the transport attaches to a callable invocation.
///
/// Tokens are carried as received; nothing here verifies them.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    /// Bearer token from the `Authorization` header
    pub auth: Option<String>,
    /// Messaging instance token, if the client sent one
    pub instance_id_token: Option<String>,
    /// App Check token, if the client sent one
    pub app_check_token: Option<String>,
    /// Peer address of the connection that carried the call
    pub remote_addr: Option<SocketAddr>,
    pub headers: HeaderMap,
}

impl InvocationContext {
    pub fn from_parts(parts: &request::Parts, remote_addr: Option<SocketAddr>) -> Self {
        let headers = &parts.headers;
        let auth = header_str(headers, header::AUTHORIZATION.as_str()).and_then(|value| {
            let (scheme, token) = value.split_once(' ')?;
            scheme
                .eq_ignore_ascii_case("bearer")
                .then(|| token.trim().to_string())
        });

        Self {
            auth,
            instance_id_token: header_str(headers, INSTANCE_ID_TOKEN).map(str::to_string),
            app_check_token: header_str(headers, APP_CHECK_TOKEN).map(str::to_string),
            remote_addr,
            headers: headers.clone(),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok().filter(|v| !v.is_empty())
}
