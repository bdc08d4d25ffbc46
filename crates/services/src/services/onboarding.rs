//! Instance onboarding workflow: field validation, connectivity probe
//! and creation, with entered data preserved across failures.

use std::sync::Arc;

use gateway::{
    InstanceApi,
    models::{ConnectionTestResult, CreateInstanceResult, NewInstance},
};
use secrecy::SecretString;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;
use utils::msg::{Notification, Notifier};

/// Form field a validation error is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Url,
    ApiKey,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Instance Name",
            Field::Url => "Sonarr URL",
            Field::ApiKey => "API Key",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// One or more field-level failures. Purely local; produced before any
/// network call is attempted.
#[derive(Debug, Clone, Error)]
#[error("validation failed for {} field(s)", .0.len())]
pub struct ValidationError(pub Vec<FieldError>);

impl ValidationError {
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }
}

/// Candidate instance fields as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceDraft {
    pub name: String,
    pub url: String,
    pub api_key: String,
}

fn validate_url(url: &str, errors: &mut Vec<FieldError>) {
    if url.trim().is_empty() {
        errors.push(FieldError {
            field: Field::Url,
            message: "Please input the Sonarr URL!".to_string(),
        });
        return;
    }
    match Url::parse(url.trim()) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
        _ => errors.push(FieldError {
            field: Field::Url,
            message: "Please enter a valid URL!".to_string(),
        }),
    }
}

fn validate_api_key(api_key: &str, errors: &mut Vec<FieldError>) {
    if api_key.trim().is_empty() {
        errors.push(FieldError {
            field: Field::ApiKey,
            message: "Please input the API key!".to_string(),
        });
    }
}

/// Validate all three fields and produce the create payload.
pub fn validate_fields(draft: &InstanceDraft) -> Result<NewInstance, ValidationError> {
    let mut errors = Vec::new();
    if draft.name.trim().is_empty() {
        errors.push(FieldError {
            field: Field::Name,
            message: "Please input the instance name!".to_string(),
        });
    }
    validate_url(&draft.url, &mut errors);
    validate_api_key(&draft.api_key, &mut errors);

    if errors.is_empty() {
        Ok(NewInstance {
            name: draft.name.trim().to_string(),
            url: draft.url.trim().to_string(),
            api_key: SecretString::from(draft.api_key.trim().to_string()),
        })
    } else {
        Err(ValidationError(errors))
    }
}

/// Validate only the fields a probe needs (URL and key; the name may
/// still be blank at this point).
pub fn validate_probe_fields(draft: &InstanceDraft) -> Result<(), ValidationError> {
    let mut errors = Vec::new();
    validate_url(&draft.url, &mut errors);
    validate_api_key(&draft.api_key, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError(errors))
    }
}

/// Probe lifecycle. `Succeeded`/`Failed` retain the displayed result and
/// count as idle for the purpose of starting the next probe.
#[derive(Debug, Clone, Default)]
pub enum ProbeState {
    #[default]
    Idle,
    Testing,
    Succeeded(ConnectionTestResult),
    Failed(ConnectionTestResult),
}

impl ProbeState {
    pub fn is_testing(&self) -> bool {
        matches!(self, ProbeState::Testing)
    }

    /// The result to display, if any probe has completed.
    pub fn result(&self) -> Option<&ConnectionTestResult> {
        match self {
            ProbeState::Succeeded(result) | ProbeState::Failed(result) => Some(result),
            _ => None,
        }
    }
}

/// What a `test_connection` call did.
#[derive(Debug, Clone)]
pub enum ProbeOutcome {
    Completed(ConnectionTestResult),
    /// A probe was already in flight; no request was issued.
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerStyle {
    Success,
    Danger,
}

/// The replace-on-retest result banner under the form buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub style: BannerStyle,
    pub text: String,
}

impl Banner {
    fn from_result(result: &ConnectionTestResult) -> Self {
        let mut text = format!("Status: {}", result.status);
        if let Some(version) = &result.version {
            text.push_str(&format!(" | Version: {version}"));
        }
        if let Some(error) = &result.error {
            text.push_str(&format!(" | Error: {error}"));
        }
        Banner {
            style: if result.is_online() {
                BannerStyle::Success
            } else {
                BannerStyle::Danger
            },
            text,
        }
    }
}

/// One onboarding form instance. Holds the draft, the probe state and
/// the collaborators it reports through.
pub struct OnboardingForm<A: ?Sized> {
    api: Arc<A>,
    notifier: Arc<dyn Notifier>,
    draft: InstanceDraft,
    probe: ProbeState,
}

impl<A: InstanceApi + ?Sized> OnboardingForm<A> {
    pub fn new(api: Arc<A>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            draft: InstanceDraft::default(),
            probe: ProbeState::default(),
        }
    }

    pub fn draft(&self) -> &InstanceDraft {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: InstanceDraft) {
        self.draft = draft;
    }

    pub fn probe_state(&self) -> &ProbeState {
        &self.probe
    }

    pub fn banner(&self) -> Option<Banner> {
        self.probe.result().map(Banner::from_result)
    }

    /// Probe connectivity for the drafted URL/key pair.
    ///
    /// A second call while a probe is in flight issues no request.
    /// Gateway failures are downgraded into an offline result; they
    /// never escape this method.
    pub async fn test_connection(&mut self) -> Result<ProbeOutcome, ValidationError> {
        if self.probe.is_testing() {
            debug!("connection probe already in flight, ignoring");
            return Ok(ProbeOutcome::AlreadyRunning);
        }
        validate_probe_fields(&self.draft)?;

        self.probe = ProbeState::Testing;
        let api_key = SecretString::from(self.draft.api_key.trim().to_string());
        let result = match self
            .api
            .test_connection(self.draft.url.trim(), &api_key)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "connection probe failed");
                ConnectionTestResult::offline(e.to_string())
            }
        };

        if result.is_online() {
            self.notifier
                .notify(Notification::success("Connection successful!"));
            self.probe = ProbeState::Succeeded(result.clone());
        } else {
            let detail = result
                .error
                .clone()
                .unwrap_or_else(|| "unknown error".to_string());
            self.notifier
                .notify(Notification::error(format!("Connection failed: {detail}")));
            self.probe = ProbeState::Failed(result.clone());
        }
        Ok(ProbeOutcome::Completed(result))
    }

    /// Submit the draft for creation. On success the form clears and the
    /// created record is handed back exactly once, so the caller can
    /// refresh the directory. On failure the draft stays intact.
    pub async fn submit(&mut self) -> Result<Option<CreateInstanceResult>, ValidationError> {
        let input = validate_fields(&self.draft)?;
        match self.api.create_instance(&input).await {
            Ok(created) => {
                self.draft = InstanceDraft::default();
                self.probe = ProbeState::Idle;
                self.notifier
                    .notify(Notification::success("Instance created successfully"));
                Ok(Some(created))
            }
            Err(e) => {
                warn!(error = %e, "instance creation failed");
                // An unauthorized response already went through the session
                // handler; a local notification would double-report it.
                if !e.is_unauthorized() {
                    self.notifier
                        .notify(Notification::error("Failed to create instance"));
                }
                Ok(None)
            }
        }
    }

    #[cfg(test)]
    fn force_testing(&mut self) {
        self.probe = ProbeState::Testing;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use gateway::{
        GatewayError,
        models::{Instance, InstanceStatus, ProbeStatus},
    };
    use utils::msg::{RecordingNotifier, Severity};

    use super::*;

    #[derive(Default)]
    struct StubApi {
        probe_calls: AtomicUsize,
        create_calls: AtomicUsize,
        probe_response: Mutex<Option<Result<ConnectionTestResult, GatewayError>>>,
        create_response: Mutex<Option<Result<CreateInstanceResult, GatewayError>>>,
    }

    impl StubApi {
        fn with_probe(response: Result<ConnectionTestResult, GatewayError>) -> Self {
            let stub = Self::default();
            *stub.probe_response.lock().unwrap() = Some(response);
            stub
        }

        fn with_create(response: Result<CreateInstanceResult, GatewayError>) -> Self {
            let stub = Self::default();
            *stub.create_response.lock().unwrap() = Some(response);
            stub
        }
    }

    #[async_trait]
    impl InstanceApi for StubApi {
        async fn list_instances(&self) -> Result<Vec<Instance>, GatewayError> {
            Ok(Vec::new())
        }

        async fn create_instance(
            &self,
            _input: &NewInstance,
        ) -> Result<CreateInstanceResult, GatewayError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            self.create_response
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(GatewayError::Api("no create response staged".into())))
        }

        async fn delete_instance(&self, _id: i64) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn check_instance(&self, _id: i64) -> Result<Instance, GatewayError> {
            Err(GatewayError::Api("not staged".into()))
        }

        async fn test_connection(
            &self,
            _url: &str,
            _api_key: &SecretString,
        ) -> Result<ConnectionTestResult, GatewayError> {
            self.probe_calls.fetch_add(1, Ordering::SeqCst);
            self.probe_response
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(GatewayError::Api("no probe response staged".into())))
        }
    }

    fn online(version: &str) -> ConnectionTestResult {
        ConnectionTestResult {
            status: ProbeStatus::Online,
            version: Some(version.to_string()),
            app_name: Some("Sonarr".to_string()),
            is_production: Some(true),
            error: None,
        }
    }

    fn created() -> CreateInstanceResult {
        CreateInstanceResult {
            id: 1,
            name: "Main".to_string(),
            url: "http://x".to_string(),
            status: InstanceStatus::Unknown,
        }
    }

    fn draft() -> InstanceDraft {
        InstanceDraft {
            name: "Main".to_string(),
            url: "http://x".to_string(),
            api_key: "k".to_string(),
        }
    }

    #[test]
    fn validation_rejects_each_missing_field() {
        let missing_name = InstanceDraft {
            name: "".into(),
            url: "http://x".into(),
            api_key: "k".into(),
        };
        let err = validate_fields(&missing_name).unwrap_err();
        assert_eq!(err.fields().len(), 1);
        assert_eq!(err.fields()[0].field, Field::Name);

        let bad_url = InstanceDraft {
            name: "Main".into(),
            url: "not a url".into(),
            api_key: "k".into(),
        };
        let err = validate_fields(&bad_url).unwrap_err();
        assert_eq!(err.fields()[0].field, Field::Url);

        let missing_key = InstanceDraft {
            name: "Main".into(),
            url: "http://x".into(),
            api_key: "  ".into(),
        };
        let err = validate_fields(&missing_key).unwrap_err();
        assert_eq!(err.fields()[0].field, Field::ApiKey);
    }

    #[test]
    fn validation_rejects_non_http_schemes() {
        let draft = InstanceDraft {
            name: "Main".into(),
            url: "ftp://x".into(),
            api_key: "k".into(),
        };
        assert!(validate_fields(&draft).is_err());
    }

    #[test]
    fn validation_collects_all_failures_at_once() {
        let err = validate_fields(&InstanceDraft::default()).unwrap_err();
        assert_eq!(err.fields().len(), 3);
    }

    #[tokio::test]
    async fn probe_is_blocked_by_validation_with_zero_requests() {
        let api = Arc::new(StubApi::default());
        let notifier = Arc::new(RecordingNotifier::new());
        let mut form = OnboardingForm::new(api.clone(), notifier.clone());
        form.set_draft(InstanceDraft {
            url: "nope".into(),
            ..InstanceDraft::default()
        });

        assert!(form.test_connection().await.is_err());
        assert_eq!(api.probe_calls.load(Ordering::SeqCst), 0);
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn probe_in_flight_ignores_second_request() {
        let api = Arc::new(StubApi::with_probe(Ok(online("3.0.0"))));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut form = OnboardingForm::new(api.clone(), notifier);
        form.set_draft(draft());
        form.force_testing();

        let outcome = form.test_connection().await.unwrap();
        assert!(matches!(outcome, ProbeOutcome::AlreadyRunning));
        assert_eq!(api.probe_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_probe_renders_success_banner() {
        let api = Arc::new(StubApi::with_probe(Ok(online("3.0.0"))));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut form = OnboardingForm::new(api.clone(), notifier.clone());
        form.set_draft(draft());

        form.test_connection().await.unwrap();

        assert_eq!(api.probe_calls.load(Ordering::SeqCst), 1);
        let banner = form.banner().unwrap();
        assert_eq!(banner.style, BannerStyle::Success);
        assert!(banner.text.contains("online"));
        assert!(banner.text.contains("3.0.0"));

        let seen = notifier.taken();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].severity, Severity::Success);
    }

    #[tokio::test]
    async fn gateway_failure_downgrades_to_offline_banner() {
        let api = Arc::new(StubApi::with_probe(Err(GatewayError::Timeout)));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut form = OnboardingForm::new(api, notifier.clone());
        form.set_draft(draft());

        let outcome = form.test_connection().await.unwrap();
        let result = match outcome {
            ProbeOutcome::Completed(result) => result,
            ProbeOutcome::AlreadyRunning => panic!("expected a completed probe"),
        };
        assert!(!result.is_online());

        let banner = form.banner().unwrap();
        assert_eq!(banner.style, BannerStyle::Danger);
        assert!(banner.text.contains("offline"));
        assert!(banner.text.contains("timeout"));
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn banner_is_replaced_on_retest() {
        let api = Arc::new(StubApi::with_probe(Err(GatewayError::Timeout)));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut form = OnboardingForm::new(api.clone(), notifier);
        form.set_draft(draft());

        form.test_connection().await.unwrap();
        assert_eq!(form.banner().unwrap().style, BannerStyle::Danger);

        *api.probe_response.lock().unwrap() = Some(Ok(online("4.0.0")));
        form.test_connection().await.unwrap();
        let banner = form.banner().unwrap();
        assert_eq!(banner.style, BannerStyle::Success);
        assert!(banner.text.contains("4.0.0"));
        assert!(!banner.text.contains("timeout"));
    }

    #[tokio::test]
    async fn successful_submit_clears_fields_and_reports_once() {
        let api = Arc::new(StubApi::with_create(Ok(created())));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut form = OnboardingForm::new(api.clone(), notifier.clone());
        form.set_draft(draft());

        let created = form.submit().await.unwrap();
        assert!(created.is_some());
        assert_eq!(form.draft(), &InstanceDraft::default());
        assert_eq!(api.create_calls.load(Ordering::SeqCst), 1);

        let seen = notifier.taken();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].severity, Severity::Success);
    }

    #[tokio::test]
    async fn failed_submit_keeps_fields_and_notifies_once() {
        let api = Arc::new(StubApi::with_create(Err(GatewayError::Http {
            status: 500,
            body: "boom".into(),
        })));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut form = OnboardingForm::new(api, notifier.clone());
        form.set_draft(draft());

        let created = form.submit().await.unwrap();
        assert!(created.is_none());
        assert_eq!(form.draft(), &draft());

        let seen = notifier.taken();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].severity, Severity::Error);
    }

    #[tokio::test]
    async fn unauthorized_submit_emits_no_local_notification() {
        let api = Arc::new(StubApi::with_create(Err(GatewayError::Unauthorized)));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut form = OnboardingForm::new(api, notifier.clone());
        form.set_draft(draft());

        let created = form.submit().await.unwrap();
        assert!(created.is_none());
        assert_eq!(form.draft(), &draft());
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn invalid_submit_never_reaches_the_gateway() {
        let api = Arc::new(StubApi::default());
        let notifier = Arc::new(RecordingNotifier::new());
        let mut form = OnboardingForm::new(api.clone(), notifier.clone());

        assert!(form.submit().await.is_err());
        assert_eq!(api.create_calls.load(Ordering::SeqCst), 0);
        assert_eq!(notifier.count(), 0);
    }
}
