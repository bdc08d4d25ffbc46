//! REST binding.
//!
//! Instance CRUD and auth go to the backend's REST surface; the
//! connectivity probe goes straight at the target system's
//! `/api/v3/system/status` endpoint with an `X-Api-Key` header, the same
//! check the backend itself performs.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{
    api::{AuthApi, InstanceApi},
    client::HttpGateway,
    error::{GatewayError, map_reqwest_error},
    models::{
        ConnectionTestResult, CreateInstanceResult, Credentials, Instance, LoginResult,
        NewInstance, ProbeStatus,
    },
};

const INSTANCES_PATH: &str = "/api/sonarr-instances";

#[derive(Clone)]
pub struct RestGateway {
    core: HttpGateway,
}

impl RestGateway {
    pub fn new(core: HttpGateway) -> Self {
        Self { core }
    }

    pub fn core(&self) -> &HttpGateway {
        &self.core
    }
}

/// Payload of the target system's status endpoint.
#[derive(Debug, Deserialize)]
struct SystemStatus {
    #[serde(default)]
    version: Option<String>,
    #[serde(alias = "appName", default)]
    app_name: Option<String>,
    #[serde(alias = "isProduction", default)]
    is_production: Option<bool>,
}

#[async_trait]
impl InstanceApi for RestGateway {
    async fn list_instances(&self) -> Result<Vec<Instance>, GatewayError> {
        let req = self
            .core
            .authorize(self.core.http().get(self.core.url(INSTANCES_PATH)));
        let res = self.core.send(req).await?;
        HttpGateway::read_json(res).await
    }

    async fn create_instance(
        &self,
        input: &NewInstance,
    ) -> Result<CreateInstanceResult, GatewayError> {
        let body = json!({
            "name": input.name,
            "url": input.url,
            "api_key": input.api_key.expose_secret(),
        });
        let req = self
            .core
            .authorize(self.core.http().post(self.core.url(INSTANCES_PATH)).json(&body));
        let res = self.core.send(req).await?;
        let instance: Instance = HttpGateway::read_json(res).await?;
        Ok(instance.into())
    }

    async fn delete_instance(&self, id: i64) -> Result<(), GatewayError> {
        let path = format!("{INSTANCES_PATH}/{id}");
        let req = self
            .core
            .authorize(self.core.http().delete(self.core.url(&path)));
        let res = self.core.send(req).await?;
        HttpGateway::expect_success(res).await
    }

    async fn check_instance(&self, id: i64) -> Result<Instance, GatewayError> {
        let path = format!("{INSTANCES_PATH}/{id}/check");
        let req = self
            .core
            .authorize(self.core.http().post(self.core.url(&path)));
        let res = self.core.send(req).await?;
        HttpGateway::read_json(res).await
    }

    async fn test_connection(
        &self,
        url: &str,
        api_key: &SecretString,
    ) -> Result<ConnectionTestResult, GatewayError> {
        let status_url = format!("{}/api/v3/system/status", url.trim_end_matches('/'));
        debug!(url = %status_url, "probing target system");

        // The probe talks to the target system, not our backend, so a
        // 401 here means a bad API key rather than an expired session
        // and must not trip the unauthorized handler.
        let res = self
            .core
            .http()
            .get(&status_url)
            .header("X-Api-Key", api_key.expose_secret())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !res.status().is_success() {
            return Ok(ConnectionTestResult::offline(format!(
                "target responded with http {}",
                res.status().as_u16()
            )));
        }

        let status: SystemStatus = res
            .json()
            .await
            .map_err(|e| GatewayError::Serde(e.to_string()))?;
        Ok(ConnectionTestResult {
            status: ProbeStatus::Online,
            version: status.version,
            app_name: status.app_name,
            is_production: status.is_production,
            error: None,
        })
    }
}

#[async_trait]
impl AuthApi for RestGateway {
    async fn login(&self, credentials: &Credentials) -> Result<String, GatewayError> {
        let body = json!({
            "email": credentials.email,
            "password": credentials.password.expose_secret(),
        });
        let req = self.core.http().post(self.core.url("/api/auth/login")).json(&body);
        let res = self.core.send(req).await?;
        let result: LoginResult = HttpGateway::read_json(res).await?;
        Ok(result.access_token)
    }

    async fn register(&self, credentials: &Credentials) -> Result<(), GatewayError> {
        let body = json!({
            "email": credentials.email,
            "password": credentials.password.expose_secret(),
        });
        let req = self
            .core
            .http()
            .post(self.core.url("/api/auth/register"))
            .json(&body);
        let res = self.core.send(req).await?;
        HttpGateway::expect_success(res).await
    }
}
