//! GraphQL binding.
//!
//! Operations are posted to `{api_url}/graphql` as a `{query, variables}`
//! envelope. Backend-reported `errors` entries map into the gateway
//! taxonomy; entries describing an unauthenticated condition trigger the
//! same policy as an HTTP 401.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};

use crate::{
    api::InstanceApi,
    client::HttpGateway,
    error::GatewayError,
    models::{ConnectionTestResult, CreateInstanceResult, Instance, NewInstance},
};

const GET_INSTANCES: &str = "\
query GetInstances {
  sonarrInstances {
    id
    name
    url
    isActive
    status
    lastChecked
    errorMessage
  }
}";

const CREATE_INSTANCE: &str = "\
mutation CreateInstance($input: SonarrInstanceInput!) {
  createSonarrInstance(input: $input) {
    id
    name
    url
    status
  }
}";

const DELETE_INSTANCE: &str = "\
mutation DeleteInstance($id: Int!) {
  deleteSonarrInstance(id: $id)
}";

const TEST_CONNECTION: &str = "\
mutation TestConnection($input: ConnectionTestInput!) {
  testConnection(input: $input) {
    status
    version
    appName
    isProduction
    error
  }
}";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    // An explicit default path keeps serde from requiring `T: Default`.
    #[serde(default = "Option::default")]
    data: Option<T>,
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    message: String,
}

fn is_unauthenticated(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("unauthorized")
        || message.contains("unauthenticated")
        || message.contains("not authenticated")
}

fn decode<T: DeserializeOwned>(envelope: Envelope<T>) -> Result<T, DecodedError> {
    if let Some(entry) = envelope.errors.into_iter().next() {
        if is_unauthenticated(&entry.message) {
            return Err(DecodedError::Unauthorized);
        }
        return Err(DecodedError::Api(entry.message));
    }
    envelope
        .data
        .ok_or_else(|| DecodedError::Api("empty GraphQL response".to_string()))
}

#[derive(Debug)]
enum DecodedError {
    Unauthorized,
    Api(String),
}

#[derive(Clone)]
pub struct GraphqlGateway {
    core: HttpGateway,
    endpoint: String,
}

impl GraphqlGateway {
    pub fn new(core: HttpGateway) -> Self {
        let endpoint = core.url("/graphql");
        Self { core, endpoint }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, GatewayError> {
        let body = json!({ "query": query, "variables": variables });
        let req = self
            .core
            .authorize(self.core.http().post(&self.endpoint).json(&body));
        let res = self.core.send(req).await?;
        let envelope: Envelope<T> = HttpGateway::read_json(res).await?;
        decode(envelope).map_err(|e| match e {
            DecodedError::Unauthorized => self.core.raise_unauthorized(),
            DecodedError::Api(message) => GatewayError::Api(message),
        })
    }
}

#[derive(Debug, Deserialize)]
struct InstancesData {
    #[serde(rename = "sonarrInstances")]
    sonarr_instances: Vec<Instance>,
}

#[derive(Debug, Deserialize)]
struct CreateData {
    #[serde(rename = "createSonarrInstance")]
    create_sonarr_instance: CreateInstanceResult,
}

#[derive(Debug, Deserialize)]
struct DeleteData {
    #[serde(rename = "deleteSonarrInstance")]
    delete_sonarr_instance: bool,
}

#[derive(Debug, Deserialize)]
struct TestData {
    #[serde(rename = "testConnection")]
    test_connection: ConnectionTestResult,
}

#[async_trait]
impl InstanceApi for GraphqlGateway {
    async fn list_instances(&self) -> Result<Vec<Instance>, GatewayError> {
        let data: InstancesData = self.execute(GET_INSTANCES, json!({})).await?;
        Ok(data.sonarr_instances)
    }

    async fn create_instance(
        &self,
        input: &NewInstance,
    ) -> Result<CreateInstanceResult, GatewayError> {
        let variables = json!({
            "input": {
                "name": input.name,
                "url": input.url,
                "api_key": input.api_key.expose_secret(),
            }
        });
        let data: CreateData = self.execute(CREATE_INSTANCE, variables).await?;
        Ok(data.create_sonarr_instance)
    }

    async fn delete_instance(&self, id: i64) -> Result<(), GatewayError> {
        let data: DeleteData = self.execute(DELETE_INSTANCE, json!({ "id": id })).await?;
        if data.delete_sonarr_instance {
            Ok(())
        } else {
            Err(GatewayError::Api(format!("instance {id} not found")))
        }
    }

    async fn check_instance(&self, id: i64) -> Result<Instance, GatewayError> {
        // The on-demand re-check only exists on the REST surface; the
        // backend exposes no GraphQL counterpart.
        let path = format!("/api/sonarr-instances/{id}/check");
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
        let variables = json!({
            "input": {
                "url": url,
                "apiKey": api_key.expose_secret(),
            }
        });
        let data: TestData = self.execute(TEST_CONNECTION, variables).await?;
        Ok(data.test_connection)
    }
}
