use crate::dashboard::Dashboard;
use std::fmt::Write;

pub const EMPTY_MESSAGE: &str = "No services found.";

/// Render the dashboard as a plain-text card list
pub fn render(dashboard: &Dashboard, placeholder_image_url: &str) -> String {
    if dashboard.services().is_empty() {
        return format!("{}\n", EMPTY_MESSAGE);
    }

    let mut out = String::new();
    for service in dashboard.services() {
        let status = dashboard.status(&service.name);
        let lock = if service.is_protected() { " [locked]" } else { "" };

        let _ = writeln!(out, "[{:<8}] {}{}", status.as_str(), service.name, lock);
        if let Some(description) = service.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(out, "           {}", description);
        }
        let _ = writeln!(out, "           -> {}", service.target_url());
        let _ = writeln!(
            out,
            "           icon: {}",
            service.image_or(placeholder_image_url)
        );
        if let Some(checked_at) = dashboard.checked_at(&service.name) {
            let _ = writeln!(out, "           checked {}", checked_at.format("%H:%M:%S"));
        }
    }

    out
}
