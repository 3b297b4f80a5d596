//! Health checks for the `doctor` command.
//!
//! Reports whether a provider credential is configured, which endpoint and
//! model will be used, and whether the provider is reachable with that
//! credential.

use crate::llm::{GroqClient, GroqClientBuilder, LlmError};

// ANSI color codes for terminal output
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Health status for a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Component is healthy
    Ok,
    /// Component has a warning but is functional
    Warning(String),
    /// Component is not functional
    Error(String),
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, HealthStatus::Ok)
    }
}

/// Provider connectivity information.
#[derive(Debug)]
pub struct ProviderHealth {
    pub credential: HealthStatus,
    pub connection: HealthStatus,
    pub base_url: String,
    pub model: String,
    pub models: Vec<String>,
}

impl ProviderHealth {
    /// True when a run could be started with this configuration.
    pub fn is_healthy(&self) -> bool {
        self.credential.is_ok() && !matches!(self.connection, HealthStatus::Error(_))
    }
}

/// Checks the provider configured by `builder`.
///
/// Never fails: problems are reported in the returned statuses.
pub fn check_provider(builder: GroqClientBuilder) -> ProviderHealth {
    match builder.build() {
        Ok(client) => check_connection(&client),
        Err(e) => ProviderHealth {
            credential: credential_status(&e),
            connection: HealthStatus::Error("Not attempted".to_string()),
            base_url: String::new(),
            model: String::new(),
            models: Vec::new(),
        },
    }
}

fn credential_status(error: &LlmError) -> HealthStatus {
    match error {
        LlmError::MissingApiKey => HealthStatus::Error("GROQ_API_KEY is not set".to_string()),
        other => HealthStatus::Error(format!("Failed to build client: {}", other)),
    }
}

fn check_connection(client: &GroqClient) -> ProviderHealth {
    let base_url = client.base_url().to_string();
    let model = client.model().to_string();

    let (connection, models) = match client.list_models() {
        Ok(models) => (model_status(&model, &models), models),
        Err(e) => (
            HealthStatus::Error(format!("Connection failed: {}", e)),
            Vec::new(),
        ),
    };

    ProviderHealth {
        credential: HealthStatus::Ok,
        connection,
        base_url,
        model,
        models,
    }
}

/// Warns when the provider does not offer the configured model.
fn model_status(model: &str, available: &[String]) -> HealthStatus {
    if available.is_empty() {
        HealthStatus::Warning("Provider listed no models".to_string())
    } else if available.iter().any(|m| m == model) {
        HealthStatus::Ok
    } else {
        HealthStatus::Warning(format!("Model '{}' is not offered by the provider", model))
    }
}

// ============================================================================
// Pretty Printing
// ============================================================================

fn status_symbol(status: &HealthStatus) -> &'static str {
    match status {
        HealthStatus::Ok => "\u{2713}",
        HealthStatus::Warning(_) => "!",
        HealthStatus::Error(_) => "\u{2717}",
    }
}

fn status_color(status: &HealthStatus) -> &'static str {
    match status {
        HealthStatus::Ok => GREEN,
        HealthStatus::Warning(_) => YELLOW,
        HealthStatus::Error(_) => RED,
    }
}

fn status_text(status: &HealthStatus, ok_text: &str) -> String {
    match status {
        HealthStatus::Ok => ok_text.to_string(),
        HealthStatus::Warning(w) => w.clone(),
        HealthStatus::Error(e) => e.clone(),
    }
}

/// Prints the health report to stdout.
pub fn print_health_report(health: &ProviderHealth) {
    println!("{}postags doctor{}", BOLD, RESET);
    println!();

    println!("{}Provider{}", BOLD, RESET);
    println!(
        "  {}{}{} Credential: {}",
        status_color(&health.credential),
        status_symbol(&health.credential),
        RESET,
        status_text(&health.credential, "Configured")
    );
    println!(
        "  {}{}{} Connection: {}",
        status_color(&health.connection),
        status_symbol(&health.connection),
        RESET,
        status_text(&health.connection, "Connected")
    );
    if !health.base_url.is_empty() {
        println!("    {}URL: {}{}", DIM, health.base_url, RESET);
    }
    if !health.model.is_empty() {
        println!("    {}Model: {}{}", DIM, health.model, RESET);
    }
    if !health.models.is_empty() {
        let models_display = if health.models.len() > 3 {
            format!(
                "{}, ... ({} more)",
                health.models[..3].join(", "),
                health.models.len() - 3
            )
        } else {
            health.models.join(", ")
        };
        println!("    {}Available: {}{}", DIM, models_display, RESET);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn configured_model_in_list_is_ok() {
        let status = model_status(
            "llama-3.3-70b-versatile",
            &models(&["gemma2-9b-it", "llama-3.3-70b-versatile"]),
        );
        assert!(status.is_ok());
    }

    #[test]
    fn missing_model_is_a_warning() {
        let status = model_status("llama-3.3-70b-versatile", &models(&["gemma2-9b-it"]));
        assert!(matches!(&status, HealthStatus::Warning(w) if w.contains("llama-3.3-70b-versatile")));
    }

    #[test]
    fn empty_model_list_is_a_warning() {
        assert!(matches!(model_status("m", &[]), HealthStatus::Warning(_)));
    }

    #[test]
    fn missing_key_is_reported_without_connecting() {
        let health = ProviderHealth {
            credential: credential_status(&LlmError::MissingApiKey),
            connection: HealthStatus::Error("Not attempted".to_string()),
            base_url: String::new(),
            model: String::new(),
            models: Vec::new(),
        };
        assert_eq!(
            health.credential,
            HealthStatus::Error("GROQ_API_KEY is not set".to_string())
        );
        assert!(!health.is_healthy());
    }

    #[test]
    fn invalid_url_is_reported_by_check_provider() {
        let health = check_provider(
            GroqClientBuilder::new()
                .api_key("gsk_test")
                .base_url("not-a-valid-url"),
        );
        assert!(matches!(&health.credential, HealthStatus::Error(e) if e.contains("Invalid URL")));
        assert!(!health.is_healthy());
    }

    #[test]
    fn symbols_follow_status() {
        assert_eq!(status_symbol(&HealthStatus::Ok), "\u{2713}");
        assert_eq!(status_symbol(&HealthStatus::Warning(String::new())), "!");
        assert_eq!(status_symbol(&HealthStatus::Error(String::new())), "\u{2717}");
    }
}
