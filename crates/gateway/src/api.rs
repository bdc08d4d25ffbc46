//! Trait seams between the workflows and the backend bindings.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::{
    error::GatewayError,
    models::{ConnectionTestResult, CreateInstanceResult, Credentials, Instance, NewInstance},
};

/// Instance directory and onboarding operations.
#[async_trait]
pub trait InstanceApi: Send + Sync {
    /// Fetch all configured instances, in backend insertion order.
    async fn list_instances(&self) -> Result<Vec<Instance>, GatewayError>;

    async fn create_instance(
        &self,
        input: &NewInstance,
    ) -> Result<CreateInstanceResult, GatewayError>;

    async fn delete_instance(&self, id: i64) -> Result<(), GatewayError>;

    /// Re-check one instance's reachability and return the refreshed
    /// record.
    async fn check_instance(&self, id: i64) -> Result<Instance, GatewayError>;

    /// Probe connectivity for a candidate URL/key pair without
    /// persisting anything.
    async fn test_connection(
        &self,
        url: &str,
        api_key: &SecretString,
    ) -> Result<ConnectionTestResult, GatewayError>;
}

/// Credential exchange operations.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a bearer token.
    async fn login(&self, credentials: &Credentials) -> Result<String, GatewayError>;

    async fn register(&self, credentials: &Credentials) -> Result<(), GatewayError>;
}
