use crate::camera::FacingMode;
use coin_classifier::config::ModelConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub camera: CameraConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Maps facing modes onto local capture devices.
#[derive(Clone, Deserialize, Debug)]
pub struct CameraConfig {
    #[serde(default = "default_facing_mode")]
    pub facing_mode: FacingMode,
    #[serde(default = "default_environment_index")]
    pub environment_index: Option<i32>,
    #[serde(default)]
    pub user_index: Option<i32>,
    #[serde(default)]
    pub fallback_index: i32,
}

fn default_facing_mode() -> FacingMode {
    FacingMode::Environment
}

fn default_environment_index() -> Option<i32> {
    Some(0)
}

impl CameraConfig {
    pub fn index_for(&self, facing_mode: FacingMode) -> Option<i32> {
        match facing_mode {
            FacingMode::Environment => self.environment_index,
            FacingMode::User => self.user_index,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            facing_mode: default_facing_mode(),
            environment_index: default_environment_index(),
            user_index: None,
            fallback_index: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            other => Err(format!(
                "{} is not a supported minimum log level. Use either `debug` or `info`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("no current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let config = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(
            config::File::from(
                configuration_directory.join(format!("{}.yaml", environment.as_str())),
            )
            .required(false),
        )
        .add_source(
            config::Environment::with_prefix("COIN")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    config.try_deserialize::<Config>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    const BASE: &str = r#"
server:
  host: 0.0.0.0
  port: 8000
log_level: Debug
camera:
  facing_mode: user
  user_index: 2
"#;

    #[test]
    fn test_parse_yaml_with_defaults() -> Result<(), config::ConfigError> {
        let config: Config = config::Config::builder()
            .add_source(File::from_str(BASE, FileFormat::Yaml))
            .build()?
            .try_deserialize()?;

        assert_eq!(config.server.get_address(), "0.0.0.0:8000");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.camera.facing_mode, FacingMode::User);
        assert_eq!(config.camera.index_for(FacingMode::User), Some(2));
        assert_eq!(config.camera.index_for(FacingMode::Environment), Some(0));
        assert_eq!(
            config.model.get_path(),
            std::path::PathBuf::from("heads_tails_model/model.onnx")
        );
        Ok(())
    }

    #[test]
    fn test_unknown_environment_is_rejected() {
        let environment: Result<Environment, String> = "staging".to_string().try_into();
        assert!(environment.is_err());
    }

    #[test]
    fn test_log_level_is_case_insensitive() {
        let level: LogLevel = "INFO".to_string().try_into().unwrap();
        assert_eq!(level.as_str(), "info");
    }
}
