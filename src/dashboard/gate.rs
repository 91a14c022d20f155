//! Click gating for password-protected services.
//!
//! The comparison happens against the plaintext password delivered with the
//! service list, so this only keeps honest visitors out.

use crate::store::Service;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Locked,
    PromptOpen,
    Unlocked,
}

/// What a click on a service card leads to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Open the target in a new browser context
    Navigate(String),
    /// Navigation suppressed, password prompt shown
    PromptOpened,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Correct password; the prompt closed and the target should open
    Unlocked { target: String },
    /// Wrong password; the prompt stays open for another attempt
    Incorrect,
    /// Nothing was waiting for a password
    NoPrompt,
}

/// Session-scoped gate state: unlocked passwords plus the open prompt, if any
#[derive(Debug, Default)]
pub struct Gate {
    unlocked: HashMap<String, String>,
    prompt: Option<Service>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, service: &Service) -> GateState {
        if !service.is_protected() || self.unlocked.contains_key(&service.name) {
            return GateState::Unlocked;
        }

        match &self.prompt {
            Some(prompted) if prompted.name == service.name => GateState::PromptOpen,
            _ => GateState::Locked,
        }
    }

    pub fn click(&mut self, service: &Service) -> ClickOutcome {
        match self.state(service) {
            GateState::Unlocked => ClickOutcome::Navigate(service.target_url().to_string()),
            GateState::Locked | GateState::PromptOpen => {
                self.prompt = Some(service.clone());
                ClickOutcome::PromptOpened
            }
        }
    }

    /// The service whose password prompt is open
    pub fn prompt(&self) -> Option<&Service> {
        self.prompt.as_ref()
    }

    pub fn submit(&mut self, candidate: &str) -> SubmitOutcome {
        let Some(service) = &self.prompt else {
            return SubmitOutcome::NoPrompt;
        };

        if service.password.as_deref() != Some(candidate) {
            tracing::debug!("Incorrect password for '{}'", service.name);
            return SubmitOutcome::Incorrect;
        }

        let target = service.target_url().to_string();
        self.unlocked
            .insert(service.name.clone(), candidate.to_string());
        self.prompt = None;

        SubmitOutcome::Unlocked { target }
    }

    pub fn cancel(&mut self) {
        self.prompt = None;
    }
}
