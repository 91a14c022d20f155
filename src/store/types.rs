use crate::config::validate_url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A dashboard entry in the shape the API accepts and the dashboard reads
///
/// The store itself keeps raw JSON records; this schema is applied to POST
/// bodies and to records the dashboard fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Navigation target overriding `url` on click
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_url: Option<String>,
    /// Plaintext; a non-empty value makes the service protected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Keys this version does not know about, kept so rewrites are lossless
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Service {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            description: None,
            image_url: None,
            click_url: None,
            password: None,
            extra: Map::new(),
        }
    }

    pub fn is_protected(&self) -> bool {
        non_empty(&self.password).is_some()
    }

    /// Where a click on this service navigates to
    pub fn target_url(&self) -> &str {
        non_empty(&self.click_url).unwrap_or(&self.url)
    }

    pub fn image_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        non_empty(&self.image_url).unwrap_or(placeholder)
    }

    /// Structural checks applied before a service is persisted
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Service name cannot be empty".to_string());
        }

        validate_url(&self.url, &format!("Service '{}'", self.name))?;

        if let Some(click_url) = non_empty(&self.click_url) {
            validate_url(click_url, &format!("Service '{}' click", self.name))?;
        }

        Ok(())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Order services for display: unprotected first, fetch order kept otherwise
pub fn sort_for_display(services: &mut [Service]) {
    // sort_by_key is stable, false < true
    services.sort_by_key(Service::is_protected);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn protected(name: &str, password: &str) -> Service {
        Service {
            password: Some(password.to_string()),
            ..Service::new(name, format!("https://{}.example", name))
        }
    }

    #[test]
    fn test_empty_password_is_not_protected() {
        let mut service = Service::new("Grafana", "https://grafana.example");
        assert!(!service.is_protected());

        service.password = Some(String::new());
        assert!(!service.is_protected());

        service.password = Some("x".to_string());
        assert!(service.is_protected());
    }

    #[test]
    fn test_target_url_prefers_click_url() {
        let mut service = Service::new("Jellyfin", "http://jellyfin:8096");
        assert_eq!(service.target_url(), "http://jellyfin:8096");

        service.click_url = Some(String::new());
        assert_eq!(service.target_url(), "http://jellyfin:8096");

        service.click_url = Some("https://media.example".to_string());
        assert_eq!(service.target_url(), "https://media.example");
    }

    #[test]
    fn test_image_falls_back_to_placeholder() {
        let mut service = Service::new("Sonarr", "http://sonarr:8989");
        assert_eq!(service.image_or("placeholder.png"), "placeholder.png");

        service.image_url = Some("/icons/sonarr.ico".to_string());
        assert_eq!(service.image_or("placeholder.png"), "/icons/sonarr.ico");
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = json!({
            "name": "Foo",
            "url": "https://foo.example",
            "category": "media",
            "order": 3
        });

        let service: Service = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(service.extra.get("category"), Some(&json!("media")));
        assert_eq!(serde_json::to_value(&service).unwrap(), raw);
    }

    #[test]
    fn test_camel_case_keys() {
        let raw = json!({
            "name": "Foo",
            "url": "https://foo.example",
            "imageUrl": "https://foo.example/icon.png",
            "clickUrl": "https://foo.example/login"
        });

        let service: Service = serde_json::from_value(raw).unwrap();
        assert_eq!(
            service.image_url.as_deref(),
            Some("https://foo.example/icon.png")
        );
        assert_eq!(service.target_url(), "https://foo.example/login");
        assert!(service.extra.is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(Service::new("Foo", "https://foo.example").validate().is_ok());
        assert!(Service::new("  ", "https://foo.example").validate().is_err());
        assert!(Service::new("Foo", "foo.example").validate().is_err());

        let mut service = Service::new("Foo", "https://foo.example");
        service.click_url = Some("not a url".to_string());
        assert!(service.validate().is_err());

        service.click_url = Some(String::new());
        assert!(service.validate().is_ok());
    }

    #[test]
    fn test_sort_puts_protected_last_and_is_stable() {
        let mut services = vec![
            protected("a", "x"),
            Service::new("b", "https://b.example"),
            protected("c", "y"),
            Service::new("d", "https://d.example"),
            Service {
                password: Some(String::new()),
                ..Service::new("e", "https://e.example")
            },
        ];

        sort_for_display(&mut services);

        let names: Vec<_> = services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "e", "a", "c"]);

        let first_protected = services.iter().position(Service::is_protected).unwrap();
        assert!(services[first_protected..].iter().all(Service::is_protected));
    }
}
