//! Dashboard client: fetch, sort, probe, gate and submit.

pub mod client;
pub mod form;
pub mod gate;
pub mod icons;
pub mod probe;
pub mod render;

pub use client::DashboardClient;
pub use form::AddServiceForm;
pub use gate::{ClickOutcome, Gate, SubmitOutcome};
pub use probe::{Prober, Status, StatusUpdate};

use crate::config::DashboardConfig;
use crate::error::{AppError, Result};
use crate::store::{Service, sort_for_display};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;

/// One dashboard session
///
/// Status and unlock state live only as long as this value; a refresh keeps
/// unlocked passwords but restarts every probe.
pub struct Dashboard {
    client: DashboardClient,
    prober: Prober,
    services: Vec<Service>,
    statuses: HashMap<String, StatusUpdate>,
    updates: Option<mpsc::UnboundedReceiver<StatusUpdate>>,
    gate: Gate,
}

impl Dashboard {
    pub fn new(client: DashboardClient, prober: Prober) -> Self {
        Self {
            client,
            prober,
            services: Vec::new(),
            statuses: HashMap::new(),
            updates: None,
            gate: Gate::new(),
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        let client = DashboardClient::new(config)?;
        let prober = Prober::new(Duration::from_secs(config.probe_timeout_seconds))?;
        Ok(Self::new(client, prober))
    }

    /// Fetch the collection and order it for display, without checking
    /// reachability
    ///
    /// # Errors
    ///
    /// Returns error if the list cannot be fetched; the previous list is kept
    pub async fn load(&mut self) -> Result<()> {
        let mut services = self.client.list_services().await.map_err(|e| {
            tracing::error!("Error fetching services: {}", e);
            e
        })?;
        sort_for_display(&mut services);

        // Dropping the old receiver discards results of stale probes
        self.statuses.clear();
        self.updates = None;
        self.services = services;

        tracing::debug!("Loaded {} services", self.services.len());
        Ok(())
    }

    /// Load the collection and start one reachability check per service
    ///
    /// # Errors
    ///
    /// Returns error if the list cannot be fetched; the previous list is kept
    pub async fn refresh(&mut self) -> Result<()> {
        self.load().await?;
        self.updates = Some(self.prober.spawn_all(&self.services));
        Ok(())
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn status(&self, name: &str) -> Status {
        self.statuses
            .get(name)
            .map(|update| update.status)
            .unwrap_or(Status::Checking)
    }

    pub fn checked_at(&self, name: &str) -> Option<DateTime<Utc>> {
        self.statuses.get(name).map(|update| update.checked_at)
    }

    /// Wait until every probe of the current load has reported
    pub async fn wait_for_probes(&mut self) {
        let Some(mut updates) = self.updates.take() else {
            return;
        };

        while let Some(update) = updates.recv().await {
            self.apply(update);
        }
    }

    fn apply(&mut self, update: StatusUpdate) {
        tracing::debug!("Service '{}' is {}", update.name, update.status);
        self.statuses.insert(update.name.clone(), update);
    }

    pub fn click(&mut self, name: &str) -> Result<ClickOutcome> {
        let service = self
            .services
            .iter()
            .find(|service| service.name == name)
            .ok_or_else(|| AppError::ServiceNotFound(name.to_string()))?;

        Ok(self.gate.click(service))
    }

    /// The service whose password prompt is open
    pub fn prompt(&self) -> Option<&Service> {
        self.gate.prompt()
    }

    pub fn submit_password(&mut self, candidate: &str) -> SubmitOutcome {
        self.gate.submit(candidate)
    }

    pub fn cancel_prompt(&mut self) {
        self.gate.cancel();
    }

    /// Submit the form; on success clear it and reload the collection
    ///
    /// # Errors
    ///
    /// Returns error if the form is invalid, the API rejects the service or
    /// the reload fails. The form keeps its contents unless the API accepted
    /// the service.
    pub async fn add_service(&mut self, form: &mut AddServiceForm) -> Result<()> {
        form.validate()?;

        self.client
            .add_service(&form.to_service())
            .await
            .map_err(|e| {
                tracing::error!("Error adding service: {}", e);
                e
            })?;

        tracing::info!("Service '{}' added", form.name);
        form.clear();
        self.refresh().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::{AppState, build_router};
    use std::net::SocketAddr;
    use std::path::Path;
    use std::sync::Arc;

    async fn spawn_backend(store_path: &Path) -> String {
        let mut config = Config::default();
        config.store.path = store_path.to_path_buf();
        let app = build_router(Arc::new(AppState::new(config)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        format!("http://{}", addr)
    }

    fn dashboard_for(backend_url: String) -> Dashboard {
        let config = DashboardConfig {
            backend_url,
            probe_timeout_seconds: 1,
            ..DashboardConfig::default()
        };
        Dashboard::from_config(&config).unwrap()
    }

    /// Port with nothing listening, so probes fail fast
    fn dead_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}/", listener.local_addr().unwrap())
    }

    #[tokio::test]
    async fn test_refresh_sorts_and_probes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        let dead = dead_url();
        let backend = spawn_backend(&path).await;
        let services = serde_json::json!([
            { "name": "Vault", "url": dead, "password": "x" },
            { "name": "Api", "url": format!("{}/health", backend) },
            { "name": "Dead", "url": dead }
        ]);
        std::fs::write(&path, services.to_string()).unwrap();

        let mut dashboard = dashboard_for(backend);
        dashboard.refresh().await.unwrap();

        let names: Vec<_> = dashboard.services().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Api", "Dead", "Vault"]);

        dashboard.wait_for_probes().await;
        assert_eq!(dashboard.status("Api"), Status::Online);
        assert_eq!(dashboard.status("Dead"), Status::Offline);
        assert_eq!(dashboard.status("Vault"), Status::Offline);
        assert!(dashboard.checked_at("Api").is_some());
        assert_eq!(dashboard.status("Unknown"), Status::Checking);
    }

    #[tokio::test]
    async fn test_records_that_are_not_services_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        let records = serde_json::json!([
            { "name": "NoUrl" },
            { "name": "Numeric", "url": "https://numeric.example", "password": 1234 },
            {},
            { "name": "A", "url": "https://a.example", "description": null }
        ]);
        std::fs::write(&path, records.to_string()).unwrap();

        let mut dashboard = dashboard_for(spawn_backend(&path).await);
        dashboard.load().await.unwrap();

        let names: Vec<_> = dashboard.services().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A"]);
        assert_eq!(dashboard.services()[0].description, None);
    }

    #[tokio::test]
    async fn test_load_does_not_start_status_checks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        let services = serde_json::json!([{ "name": "Dead", "url": dead_url() }]);
        std::fs::write(&path, services.to_string()).unwrap();

        let mut dashboard = dashboard_for(spawn_backend(&path).await);
        dashboard.load().await.unwrap();

        // Nothing to wait for, so this returns at once
        dashboard.wait_for_probes().await;
        assert_eq!(dashboard.status("Dead"), Status::Checking);
        assert_eq!(dashboard.services().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_store_renders_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        std::fs::write(&path, "[]").unwrap();

        let mut dashboard = dashboard_for(spawn_backend(&path).await);
        dashboard.refresh().await.unwrap();
        dashboard.wait_for_probes().await;

        assert!(dashboard.services().is_empty());
        assert_eq!(
            render::render(&dashboard, "placeholder"),
            format!("{}\n", render::EMPTY_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_render_marks_status_and_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        let dead = dead_url();
        let services = serde_json::json!([
            { "name": "Vault", "url": dead, "password": "x", "description": "Secrets" },
            { "name": "Dead", "url": dead, "imageUrl": "/icons/dead.ico" }
        ]);
        std::fs::write(&path, services.to_string()).unwrap();

        let mut dashboard = dashboard_for(spawn_backend(&path).await);
        dashboard.refresh().await.unwrap();

        let before = render::render(&dashboard, "placeholder.png");
        assert!(before.contains("[checking] Dead"));

        dashboard.wait_for_probes().await;
        let after = render::render(&dashboard, "placeholder.png");

        assert!(after.contains("[offline ] Dead\n"));
        assert!(after.contains("[offline ] Vault [locked]"));
        assert!(after.contains("Secrets"));
        assert!(after.contains("icon: /icons/dead.ico"));
        assert!(after.contains("icon: placeholder.png"));
        assert!(after.find("Dead").unwrap() < after.find("Vault").unwrap());
    }

    #[tokio::test]
    async fn test_click_gating_through_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        let dead = dead_url();
        let services = serde_json::json!([
            { "name": "Vault", "url": dead, "clickUrl": "https://vault.example", "password": "x" },
            { "name": "Open", "url": "https://open.example" }
        ]);
        std::fs::write(&path, services.to_string()).unwrap();

        let mut dashboard = dashboard_for(spawn_backend(&path).await);
        dashboard.refresh().await.unwrap();

        assert_eq!(
            dashboard.click("Open").unwrap(),
            ClickOutcome::Navigate("https://open.example".to_string())
        );
        assert!(matches!(
            dashboard.click("Missing"),
            Err(AppError::ServiceNotFound(_))
        ));

        assert_eq!(dashboard.click("Vault").unwrap(), ClickOutcome::PromptOpened);
        assert_eq!(dashboard.submit_password("y"), SubmitOutcome::Incorrect);
        assert_eq!(dashboard.prompt().map(|s| s.name.as_str()), Some("Vault"));
        assert_eq!(
            dashboard.submit_password("x"),
            SubmitOutcome::Unlocked {
                target: "https://vault.example".to_string()
            }
        );

        // Unlocks survive a reload within the session
        dashboard.refresh().await.unwrap();
        assert_eq!(
            dashboard.click("Vault").unwrap(),
            ClickOutcome::Navigate("https://vault.example".to_string())
        );
    }

    #[tokio::test]
    async fn test_add_service_clears_form_and_refetches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        std::fs::write(&path, "[]").unwrap();

        let mut dashboard = dashboard_for(spawn_backend(&path).await);
        dashboard.refresh().await.unwrap();

        let mut form = AddServiceForm {
            name: "Foo".to_string(),
            url: dead_url(),
            description: "Foo service".to_string(),
            ..Default::default()
        };
        dashboard.add_service(&mut form).await.unwrap();

        assert_eq!(form, AddServiceForm::default());
        assert_eq!(dashboard.services().len(), 1);
        assert_eq!(dashboard.services()[0].name, "Foo");
        assert_eq!(
            dashboard.services()[0].description.as_deref(),
            Some("Foo service")
        );
    }

    #[tokio::test]
    async fn test_failed_add_keeps_form() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        std::fs::write(&path, "[]").unwrap();

        let mut dashboard = dashboard_for(spawn_backend(&path).await);

        // Break the store after startup
        std::fs::write(&path, "garbage").unwrap();

        let mut form = AddServiceForm {
            name: "Foo".to_string(),
            url: "https://foo.example".to_string(),
            ..Default::default()
        };
        let err = dashboard.add_service(&mut form).await.unwrap_err();

        assert!(matches!(err, AppError::Api(ref msg) if msg.contains("Service store unavailable")));
        assert_eq!(form.name, "Foo");

        // Invalid forms never reach the API
        let mut empty = AddServiceForm::default();
        assert!(matches!(
            dashboard.add_service(&mut empty).await,
            Err(AppError::InvalidService(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_failure_surfaces_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut dashboard = dashboard_for(spawn_backend(&dir.path().join("missing.json")).await);

        assert!(matches!(dashboard.refresh().await, Err(AppError::Api(_))));
        assert!(dashboard.services().is_empty());
    }
}
