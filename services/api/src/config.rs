use docent_core::tts::DEFAULT_VOICE;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
///
/// The chat credential is optional by design: without it the process still
/// starts and the relay reports the problem on every utterance instead.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub gemini_api_key: Option<String>,
    pub chat_model: String,
    pub tts_voice: String,
    pub exhibition_data_path: PathBuf,
    pub static_dir: PathBuf,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();

        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gemini-2.5-flash-lite".to_string());

        let tts_voice = std::env::var("TTS_VOICE").unwrap_or_else(|_| DEFAULT_VOICE.to_string());

        let exhibition_data_path = std::env::var("EXHIBITION_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./exhibition_data.txt"));

        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./static"));

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            gemini_api_key,
            chat_model,
            tts_voice,
            exhibition_data_path,
            static_dir,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("BIND_ADDRESS");
            env::remove_var("GEMINI_API_KEY");
            env::remove_var("CHAT_MODEL");
            env::remove_var("TTS_VOICE");
            env::remove_var("EXHIBITION_DATA_PATH");
            env::remove_var("STATIC_DIR");
            env::remove_var("RUST_LOG");
        }
    }

    #[test]
    fn test_config_error_display() {
        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear_env_vars();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert_eq!(config.gemini_api_key, None);
        assert_eq!(config.chat_model, "gemini-2.5-flash-lite");
        assert_eq!(config.tts_voice, "en-US-AriaNeural");
        assert_eq!(
            config.exhibition_data_path,
            PathBuf::from("./exhibition_data.txt")
        );
        assert_eq!(config.static_dir, PathBuf::from("./static"));
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    #[serial]
    fn test_config_missing_credential_is_not_fatal() {
        clear_env_vars();

        let config = Config::from_env().expect("Config should load without a credential");
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "127.0.0.1:8080");
            env::set_var("GEMINI_API_KEY", "test-gemini-key");
            env::set_var("CHAT_MODEL", "gemini-2.0-flash");
            env::set_var("TTS_VOICE", "en-GB-SoniaNeural");
            env::set_var("EXHIBITION_DATA_PATH", "/data/exhibits.txt");
            env::set_var("STATIC_DIR", "/srv/static");
            env::set_var("RUST_LOG", "debug");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.gemini_api_key, Some("test-gemini-key".to_string()));
        assert_eq!(config.chat_model, "gemini-2.0-flash");
        assert_eq!(config.tts_voice, "en-GB-SoniaNeural");
        assert_eq!(
            config.exhibition_data_path,
            PathBuf::from("/data/exhibits.txt")
        );
        assert_eq!(config.static_dir, PathBuf::from("/srv/static"));
        assert_eq!(config.log_level, Level::DEBUG);

        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_invalid_bind_address() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "not-a-valid-address");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "BIND_ADDRESS"),
        }

        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
        }

        clear_env_vars();
    }
}
