//! Terminal front-end for the dashboard client.

use crate::config::Config;
use crate::dashboard::{AddServiceForm, ClickOutcome, Dashboard, SubmitOutcome, icons, render};
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Load the dashboard, wait for every probe and print the cards
pub async fn list(config: &Config) -> anyhow::Result<()> {
    let mut dashboard = Dashboard::from_config(&config.dashboard)?;
    dashboard.refresh().await?;
    dashboard.wait_for_probes().await;

    print!(
        "{}",
        render::render(&dashboard, &config.dashboard.placeholder_image_url)
    );
    Ok(())
}

pub async fn add(config: &Config, mut form: AddServiceForm) -> anyhow::Result<()> {
    let mut dashboard = Dashboard::from_config(&config.dashboard)?;
    dashboard.add_service(&mut form).await?;

    println!("Service added successfully!");
    Ok(())
}

/// Click a service and print where it leads; protected ones prompt on stdin
pub async fn open(config: &Config, name: &str) -> anyhow::Result<()> {
    let mut dashboard = Dashboard::from_config(&config.dashboard)?;
    dashboard.load().await?;

    let target = match dashboard.click(name)? {
        ClickOutcome::Navigate(target) => target,
        ClickOutcome::PromptOpened => {
            prompt_until_unlocked(&mut dashboard, BufReader::new(tokio::io::stdin())).await?
        }
    };

    println!("{}", target);
    Ok(())
}

/// Read passwords line by line until the open prompt unlocks
///
/// An empty line or end of input cancels the prompt.
async fn prompt_until_unlocked<R>(dashboard: &mut Dashboard, input: R) -> anyhow::Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(service) = dashboard.prompt() {
        eprint!("Password for {}: ", service.name);

        let candidate = lines.next_line().await?.unwrap_or_default();
        if candidate.is_empty() {
            dashboard.cancel_prompt();
            anyhow::bail!("Cancelled");
        }

        match dashboard.submit_password(&candidate) {
            SubmitOutcome::Unlocked { target } => return Ok(target),
            SubmitOutcome::Incorrect => eprintln!("Incorrect password"),
            SubmitOutcome::NoPrompt => break,
        }
    }

    anyhow::bail!("No password prompt is open")
}

/// Download a favicon for every service into `dir`
pub async fn icons(config: &Config, dir: &Path) -> anyhow::Result<()> {
    let mut dashboard = Dashboard::from_config(&config.dashboard)?;
    dashboard.load().await?;

    let fetcher = icons::IconFetcher::new(&config.dashboard)?;
    let summary = fetcher.download_all(dashboard.services(), dir).await?;

    println!(
        "Icons: {} downloaded, {} already present, {} not found",
        summary.downloaded, summary.skipped, summary.missing
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::{AppState, build_router};
    use std::net::SocketAddr;
    use std::sync::Arc;

    async fn dashboard_with(services: serde_json::Value) -> (tempfile::TempDir, Dashboard) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        std::fs::write(&path, services.to_string()).unwrap();

        let mut config = Config::default();
        config.store.path = path;
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

        let mut dashboard = Dashboard::from_config(&DashboardConfig {
            backend_url: format!("http://{}", addr),
            ..DashboardConfig::default()
        })
        .unwrap();
        dashboard.load().await.unwrap();
        (dir, dashboard)
    }

    fn vault() -> serde_json::Value {
        serde_json::json!([{
            "name": "Vault",
            "url": "https://vault.example",
            "clickUrl": "https://vault.example/ui",
            "password": "hunter2"
        }])
    }

    #[tokio::test]
    async fn test_prompt_retries_until_correct_password() {
        let (_dir, mut dashboard) = dashboard_with(vault()).await;
        assert_eq!(dashboard.click("Vault").unwrap(), ClickOutcome::PromptOpened);

        let input: &[u8] = b"wrong\nhunter\nhunter2\nextra\n";
        let target = prompt_until_unlocked(&mut dashboard, input).await.unwrap();

        assert_eq!(target, "https://vault.example/ui");
        assert!(dashboard.prompt().is_none());
        assert_eq!(
            dashboard.click("Vault").unwrap(),
            ClickOutcome::Navigate("https://vault.example/ui".to_string())
        );
    }

    #[tokio::test]
    async fn test_prompt_cancels_on_empty_line_or_end_of_input() {
        let (_dir, mut dashboard) = dashboard_with(vault()).await;

        for input in [&b"wrong\n\nhunter2\n"[..], &b"wrong\n"[..]] {
            dashboard.click("Vault").unwrap();
            let err = prompt_until_unlocked(&mut dashboard, input)
                .await
                .unwrap_err();

            assert_eq!(err.to_string(), "Cancelled");
            assert!(dashboard.prompt().is_none());
            // Still locked
            assert_eq!(dashboard.click("Vault").unwrap(), ClickOutcome::PromptOpened);
            dashboard.cancel_prompt();
        }
    }
}
