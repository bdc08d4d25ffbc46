//! HTTP core shared by the REST and GraphQL bindings.
//!
//! Owns the `reqwest` client, base-URL resolution, bearer-token
//! attachment and the one cross-cutting failure policy: any unauthorized
//! response invokes the handler injected at construction, then surfaces
//! as [`GatewayError::Unauthorized`]. Callers stay free of the redirect
//! concern.

use std::{sync::Arc, time::Duration};

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::warn;
use utils::{config::Config, session::SessionStore};

use crate::error::{GatewayError, map_reqwest_error};

/// Invoked whenever the backend answers with a 401-equivalent,
/// regardless of which workflow issued the request.
pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self);
}

#[derive(Clone)]
pub struct HttpGateway {
    http: Client,
    base_url: String,
    session: SessionStore,
    on_unauthorized: Arc<dyn UnauthorizedHandler>,
}

impl HttpGateway {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(
        config: &Config,
        session: SessionStore,
        on_unauthorized: Arc<dyn UnauthorizedHandler>,
    ) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("arradm/", env!("CARGO_PKG_VERSION")))
            // The GraphQL binding's session rides on cookies.
            .cookie_store(true)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            session,
            on_unauthorized,
        })
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Join a path onto the configured base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the stored bearer token, when one exists. The token is
    /// re-read per request so a fresh login takes effect immediately.
    pub fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match self.session.load() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Send a request and apply the unauthorized policy to the response.
    pub async fn send(&self, req: RequestBuilder) -> Result<Response, GatewayError> {
        let res = req.send().await.map_err(map_reqwest_error)?;
        if res.status() == StatusCode::UNAUTHORIZED {
            warn!(url = %res.url(), "unauthorized response, invoking session handler");
            self.on_unauthorized.on_unauthorized();
            return Err(GatewayError::Unauthorized);
        }
        Ok(res)
    }

    /// Apply the unauthorized policy for conditions reported inside an
    /// otherwise-successful response body (GraphQL error entries).
    pub fn raise_unauthorized(&self) -> GatewayError {
        self.on_unauthorized.on_unauthorized();
        GatewayError::Unauthorized
    }

    /// Decode a success body, or turn a non-success status into
    /// [`GatewayError::Http`].
    pub async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T, GatewayError> {
        let status = res.status();
        if status.is_success() {
            res.json::<T>()
                .await
                .map_err(|e| GatewayError::Serde(e.to_string()))
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(GatewayError::Http {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Like [`Self::read_json`], for endpoints whose body is irrelevant.
    pub async fn expect_success(res: Response) -> Result<(), GatewayError> {
        let status = res.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(GatewayError::Http {
                status: status.as_u16(),
                body,
            })
        }
    }
}
