use serde::{Deserialize, Serialize};

/// Configuration for the daily_quests module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DailyQuestsConfig {
    /// Public origin of the web app; links and redirects are built from it.
    #[serde(default = "default_app_base_url")]
    pub app_base_url: String,
    /// HMAC key for one-click completion links.
    #[serde(default)]
    pub confirm_secret: Option<String>,
    /// Bearer token required on cron endpoints. Unset leaves them open.
    #[serde(default)]
    pub cron_secret: Option<String>,
    /// IANA zone that defines the quest day.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_send_interval_ms")]
    pub send_interval_ms: u64,
    #[serde(default = "default_recent_exclusion_days")]
    pub recent_exclusion_days: u32,
    #[serde(default = "default_fallback_exclusion_days")]
    pub fallback_exclusion_days: u32,
    #[serde(default = "default_completion_path")]
    pub completion_path: String,
    #[serde(default = "default_result_path")]
    pub result_path: String,
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default)]
    pub resend_api_key: Option<String>,
    #[serde(default = "default_resend_base_url")]
    pub resend_base_url: String,
}

impl Default for DailyQuestsConfig {
    fn default() -> Self {
        Self {
            app_base_url: default_app_base_url(),
            confirm_secret: None,
            cron_secret: None,
            timezone: default_timezone(),
            send_interval_ms: default_send_interval_ms(),
            recent_exclusion_days: default_recent_exclusion_days(),
            fallback_exclusion_days: default_fallback_exclusion_days(),
            completion_path: default_completion_path(),
            result_path: default_result_path(),
            email: EmailConfig::default(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from: default_from(),
            resend_api_key: None,
            resend_base_url: default_resend_base_url(),
        }
    }
}

fn default_app_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

fn default_send_interval_ms() -> u64 {
    600
}

fn default_recent_exclusion_days() -> u32 {
    14
}

fn default_fallback_exclusion_days() -> u32 {
    7
}

fn default_completion_path() -> String {
    "/api/quests/confirm".to_string()
}

fn default_result_path() -> String {
    "/quest-complete".to_string()
}

fn default_from() -> String {
    "Questline <quests@questline.app>".to_string()
}

fn default_resend_base_url() -> String {
    crate::infra::mail::RESEND_DEFAULT_BASE_URL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let cfg: DailyQuestsConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(cfg.timezone, "America/New_York");
        assert_eq!(cfg.send_interval_ms, 600);
        assert_eq!(cfg.recent_exclusion_days, 14);
        assert_eq!(cfg.fallback_exclusion_days, 7);
        assert_eq!(cfg.completion_path, "/api/quests/confirm");
        assert!(cfg.confirm_secret.is_none());
        assert_eq!(cfg.email.resend_base_url, "https://api.resend.com");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res: Result<DailyQuestsConfig, _> =
            serde_json::from_value(serde_json::json!({ "confirm_secert": "typo" }));
        assert!(res.is_err());
    }
}
