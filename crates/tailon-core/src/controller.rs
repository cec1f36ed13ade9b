// ── Controller facade ──
//
// Async entry point the host uses for every remote interaction: snapshot
// fetches, actions, identity, and (as the production `StreamSource`) log
// streams. Stateless beyond the HTTP client, so it is cloned freely into
// host tasks.

use tracing::{debug, info};
use url::Url;

use tailon_api::transport::{TlsMode, TransportConfig};
use tailon_api::{ApiClient, LogStreamHandle, ReconnectConfig};

use crate::action::AppAction;
use crate::config::{RemoteConfig, TlsVerification};
use crate::convert;
use crate::error::CoreError;
use crate::log_stream::StreamSource;
use crate::model::{Actor, ApplicationState, Snapshot};

#[derive(Clone)]
pub struct Controller {
    client: ApiClient,
    reconnect: ReconnectConfig,
}

impl Controller {
    pub fn new(config: &RemoteConfig) -> Result<Self, CoreError> {
        let tls = match config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(ref path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        let transport = TransportConfig {
            tls,
            timeout: config.timeout,
        };
        let client = ApiClient::new(config.url.as_str(), &transport)?;
        info!(url = %client.base_url(), "controller ready");
        Ok(Self::from_client(client))
    }

    /// Wrap a prebuilt client (tests, custom transports).
    pub fn from_client(client: ApiClient) -> Self {
        Self {
            client,
            reconnect: ReconnectConfig::default(),
        }
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn base_url(&self) -> &Url {
        self.client.base_url()
    }

    /// Fetch and convert the full application snapshot.
    pub async fn fetch_snapshot(&self) -> Result<Snapshot, CoreError> {
        let raw = self.client.list_applications().await?;
        debug!(count = raw.len(), "snapshot fetched");
        Ok(convert::snapshot(raw))
    }

    pub async fn fetch_application(&self, name: &str) -> Result<ApplicationState, CoreError> {
        let raw = self.client.get_application(name).await?;
        Ok(convert::application(name.to_owned(), raw))
    }

    /// Run `action` on `name`. Failures name both.
    pub async fn execute(&self, name: &str, action: AppAction) -> Result<(), CoreError> {
        let result = match action {
            AppAction::Start => self.client.start_application(name).await,
            AppAction::Stop => self.client.stop_application(name, false).await,
            AppAction::ForceStop => self.client.stop_application(name, true).await,
            AppAction::Restart => self.client.restart_application(name).await,
        };

        match result {
            Ok(resp) => {
                info!(app = %name, %action, status = %resp.status, "action accepted");
                Ok(())
            }
            Err(e) => Err(CoreError::action(action, name, &e)),
        }
    }

    /// Identity the server resolves for this client.
    pub async fn whoami(&self) -> Result<Actor, CoreError> {
        Ok(self.client.whoami().await?.into())
    }
}

impl StreamSource for Controller {
    fn open(&self, app: &str) -> Result<LogStreamHandle, CoreError> {
        self.client
            .open_log_stream(app, self.reconnect.clone())
            .map_err(|e| CoreError::Stream {
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::model::Lifecycle;

    async fn setup() -> (MockServer, Controller) {
        let server = MockServer::start().await;
        let url = Url::parse(&server.uri()).unwrap();
        let controller = Controller::new(&RemoteConfig::new(url)).unwrap();
        (server, controller)
    }

    #[tokio::test]
    async fn fetch_snapshot_converts_entries() {
        let (server, controller) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/apps"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "web": {
                    "config": { "path": "/srv/web" },
                    "state": "running",
                    "pid": 12,
                    "state_changed_by": { "id": "u1", "display_name": "Ada" }
                }
            })))
            .mount(&server)
            .await;

        let snapshot = controller.fetch_snapshot().await.unwrap();

        let web = &snapshot["web"];
        assert_eq!(web.lifecycle, Lifecycle::Running { pid: Some(12) });
        // No timestamp, so the actor is dropped.
        assert!(web.state_change.is_none());
    }

    #[tokio::test]
    async fn fetch_failure_is_a_fetch_error() {
        let (server, controller) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/apps"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = controller.fetch_snapshot().await.unwrap_err();
        assert!(matches!(err, CoreError::Fetch { status: Some(503), .. }));
    }

    #[tokio::test]
    async fn force_stop_uses_the_force_flag() {
        let (server, controller) = setup().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/apps/web/stop"))
            .and(query_param("force", "true"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "status": "force_stopped" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        controller.execute("web", AppAction::ForceStop).await.unwrap();
    }

    #[tokio::test]
    async fn action_failure_names_action_and_app() {
        let (server, controller) = setup().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/apps/web/start"))
            .respond_with(ResponseTemplate::new(500).set_body_string("spawn failed"))
            .mount(&server)
            .await;

        let err = controller.execute("web", AppAction::Start).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to start web: spawn failed");
    }

    #[tokio::test]
    async fn whoami_maps_to_actor() {
        let (server, controller) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/whoami"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u9",
                "login_name": "grace@example.com",
                "is_anonymous": false
            })))
            .mount(&server)
            .await;

        let actor = controller.whoami().await.unwrap();
        assert_eq!(actor.name(), "grace@example.com");
    }
}
