//! Remote Data Gateway: the sole component that performs outbound
//! network calls on behalf of the workflows.

pub mod api;
pub mod client;
pub mod error;
pub mod graphql;
pub mod models;
pub mod rest;

pub use api::{AuthApi, InstanceApi};
pub use client::{HttpGateway, UnauthorizedHandler};
pub use error::GatewayError;
pub use graphql::GraphqlGateway;
pub use rest::RestGateway;
