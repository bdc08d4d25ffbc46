//! Wire and domain types shared by both backend bindings.
//!
//! The GraphQL binding speaks camelCase and the REST binding snake_case;
//! response types carry serde aliases so one model covers both. API keys
//! and passwords are held as [`SecretString`] and never appear in
//! responses or in `Debug` output.

use chrono::{DateTime, Local, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Reachability of a configured instance, as last observed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InstanceStatus {
    #[default]
    Unknown,
    Online,
    Offline,
    Error,
}

/// A configured remote system record, as returned by the backend.
/// The API key is write-only and deliberately absent here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub id: i64,
    pub name: String,
    pub url: String,
    #[serde(alias = "isActive", default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub status: InstanceStatus,
    #[serde(alias = "lastChecked", default)]
    pub last_checked: Option<DateTime<Utc>>,
    #[serde(alias = "errorMessage", default)]
    pub error_message: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Instance {
    /// Last-checked timestamp rendered in the viewer's local time.
    pub fn last_checked_local(&self) -> Option<String> {
        self.last_checked
            .map(|ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

/// Candidate instance fields submitted by the onboarding workflow.
#[derive(Debug)]
pub struct NewInstance {
    pub name: String,
    pub url: String,
    pub api_key: SecretString,
}

/// Result of a `createSonarrInstance` / `POST /api/sonarr-instances`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInstanceResult {
    pub id: i64,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub status: InstanceStatus,
}

impl From<Instance> for CreateInstanceResult {
    fn from(instance: Instance) -> Self {
        Self {
            id: instance.id,
            name: instance.name,
            url: instance.url,
            status: instance.status,
        }
    }
}

/// Outcome of a single connectivity probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProbeStatus {
    Online,
    Offline,
}

/// Ephemeral result of one connectivity probe. Built per attempt,
/// replaced on re-test, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionTestResult {
    pub status: ProbeStatus,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(alias = "appName", default)]
    pub app_name: Option<String>,
    #[serde(alias = "isProduction", default)]
    pub is_production: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ConnectionTestResult {
    pub fn offline(error: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Offline,
            version: None,
            app_name: None,
            is_production: None,
            error: Some(error.into()),
        }
    }

    pub fn is_online(&self) -> bool {
        self.status == ProbeStatus::Online
    }
}

/// Login / registration credentials.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResult {
    pub access_token: String,
}
