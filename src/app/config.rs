use crate::app::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: String,
    pub http_bind: String,
    pub sim_autostart: bool,
    pub sim_seed: Option<u64>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            db_path: lookup("DB_PATH")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "/var/lib/chargenet/chargenet.db".to_string()),
            http_bind: lookup("HTTP_BIND")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            sim_autostart: parse_or_default(&lookup, "SIM_AUTOSTART", true)?,
            sim_seed: parse_optional(&lookup, "SIM_SEED")?,
        })
    }
}

fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{key} has an invalid value"))),
        None => Ok(default),
    }
}

fn parse_optional<T, F>(lookup: &F, key: &str) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::config(format!("{key} has an invalid value"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;

    #[test]
    fn applies_defaults_when_environment_is_empty() {
        let config = AppConfig::from_lookup(|_| None).expect("config should be valid");

        assert_eq!(config.db_path, "/var/lib/chargenet/chargenet.db");
        assert_eq!(config.http_bind, "0.0.0.0:8080");
        assert!(config.sim_autostart);
        assert_eq!(config.sim_seed, None);
    }

    #[test]
    fn reads_overrides_from_lookup() {
        let config = AppConfig::from_lookup(|key| match key {
            "DB_PATH" => Some("./data/chargenet.db".to_string()),
            "HTTP_BIND" => Some("127.0.0.1:9090".to_string()),
            "SIM_AUTOSTART" => Some("false".to_string()),
            "SIM_SEED" => Some("42".to_string()),
            _ => None,
        })
        .expect("config should be valid");

        assert_eq!(config.db_path, "./data/chargenet.db");
        assert_eq!(config.http_bind, "127.0.0.1:9090");
        assert!(!config.sim_autostart);
        assert_eq!(config.sim_seed, Some(42));
    }

    #[test]
    fn rejects_invalid_autostart_flag() {
        let result = AppConfig::from_lookup(|key| match key {
            "SIM_AUTOSTART" => Some("maybe".to_string()),
            _ => None,
        });

        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "invalid configuration: SIM_AUTOSTART has an invalid value"
        );
    }

    #[test]
    fn rejects_invalid_seed() {
        let result = AppConfig::from_lookup(|key| match key {
            "SIM_SEED" => Some("not-a-number".to_string()),
            _ => None,
        });

        assert!(result.is_err());
    }

    #[test]
    fn treats_blank_seed_as_absent() {
        let config = AppConfig::from_lookup(|key| match key {
            "SIM_SEED" => Some("   ".to_string()),
            _ => None,
        })
        .expect("config should be valid");

        assert_eq!(config.sim_seed, None);
    }
}
