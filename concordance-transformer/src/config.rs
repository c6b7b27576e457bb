//! Command-line arguments and resolved service settings

use clap::Parser;
use concordance_common::config::{require_setting, resolve_setting, TomlConfig};
use concordance_common::logging::LogFormat;
use concordance_common::Result;
use std::path::PathBuf;
use std::time::Duration;

pub const APP_DESCRIPTION: &str = "Service which listens to the concept stream for concordance updates, \
transforms smartlogic concordance json and sends updates to the concordance writer";

const DEFAULT_SYSTEM_CODE: &str = "smartlogic-concordance-transformer";
const DEFAULT_APP_NAME: &str = "Smartlogic Concordance Transformer";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_TOPIC: &str = "SmartlogicConcept";
const DEFAULT_GROUP_NAME: &str = "SmartlogicConcordanceTransformer";
const DEFAULT_WRITER_TIMEOUT_SECS: u64 = 30;

/// Command-line arguments for concordance-transformer
///
/// Every option can also be set through its environment variable or the
/// TOML config file, in that order of precedence.
#[derive(Parser, Debug, Default)]
#[command(name = "concordance-transformer")]
#[command(about = APP_DESCRIPTION)]
#[command(version)]
pub struct Args {
    /// System code of the application
    #[arg(long, env = "APP_SYSTEM_CODE")]
    pub app_system_code: Option<String>,

    /// Application name
    #[arg(long, env = "APP_NAME")]
    pub app_name: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "APP_PORT")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log format (json or pretty)
    #[arg(long, env = "LOG_FORMAT")]
    pub log_format: Option<String>,

    /// Redis URL of the stream broker, e.g. redis://host:6379
    #[arg(long, env = "BROKER_CONNECTION_STRING")]
    pub broker_connection_string: Option<String>,

    /// Stream the consumer subscribes to
    #[arg(long, env = "KAFKA_TOPIC")]
    pub topic: Option<String>,

    /// Consumer group name
    #[arg(long, env = "GROUP_NAME")]
    pub group_name: Option<String>,

    /// Concordance writer address for routing requests
    #[arg(long, env = "WRITER_ADDRESS")]
    pub writer_address: Option<String>,

    /// Timeout of writer requests in seconds
    #[arg(long, env = "WRITER_TIMEOUT_SECS")]
    pub writer_timeout_secs: Option<u64>,

    /// TOML config file
    #[arg(short, long, env = "CONCORDANCE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub app_system_code: String,
    pub app_name: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub broker_connection_string: String,
    pub topic: String,
    pub group_name: String,
    pub writer_address: String,
    pub writer_timeout: Duration,
}

impl Settings {
    /// Load the config file (if any) and resolve every setting
    pub fn load(args: Args) -> Result<Self> {
        let file = TomlConfig::load_optional(args.config.as_deref())?;
        Self::resolve(args, file)
    }

    /// Merge arguments over config file values over compiled defaults
    pub fn resolve(args: Args, file: TomlConfig) -> Result<Self> {
        let log_format = resolve_setting(args.log_format, file.log_format, || "json".to_string());

        Ok(Self {
            app_system_code: resolve_setting(args.app_system_code, file.app_system_code, || {
                DEFAULT_SYSTEM_CODE.to_string()
            }),
            app_name: resolve_setting(args.app_name, file.app_name, || DEFAULT_APP_NAME.to_string()),
            port: resolve_setting(args.port, file.port, || DEFAULT_PORT),
            log_level: resolve_setting(args.log_level, file.log_level, || DEFAULT_LOG_LEVEL.to_string()),
            log_format: log_format.parse()?,
            broker_connection_string: require_setting(
                "broker-connection-string",
                args.broker_connection_string,
                file.broker_connection_string,
            )?,
            topic: resolve_setting(args.topic, file.topic, || DEFAULT_TOPIC.to_string()),
            group_name: resolve_setting(args.group_name, file.group_name, || DEFAULT_GROUP_NAME.to_string()),
            writer_address: require_setting("writer-address", args.writer_address, file.writer_address)?,
            writer_timeout: Duration::from_secs(resolve_setting(
                args.writer_timeout_secs,
                file.writer_timeout_secs,
                || DEFAULT_WRITER_TIMEOUT_SECS,
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concordance_common::Error;

    fn required_args() -> Args {
        Args {
            broker_connection_string: Some("redis://localhost:6379".to_string()),
            writer_address: Some("http://localhost:8080/__concordance-rw/".to_string()),
            ..Args::default()
        }
    }

    #[test]
    fn applies_compiled_defaults() {
        let settings = Settings::resolve(required_args(), TomlConfig::default()).unwrap();

        assert_eq!(settings.app_system_code, "smartlogic-concordance-transformer");
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(settings.topic, "SmartlogicConcept");
        assert_eq!(settings.group_name, "SmartlogicConcordanceTransformer");
        assert_eq!(settings.writer_timeout, Duration::from_secs(30));
    }

    #[test]
    fn arguments_override_config_file() {
        let args = Args {
            port: Some(9999),
            ..required_args()
        };
        let file = TomlConfig {
            port: Some(7000),
            topic: Some("FileTopic".to_string()),
            ..TomlConfig::default()
        };

        let settings = Settings::resolve(args, file).unwrap();

        assert_eq!(settings.port, 9999);
        assert_eq!(settings.topic, "FileTopic");
    }

    #[test]
    fn writer_address_is_required() {
        let args = Args {
            writer_address: None,
            ..required_args()
        };

        match Settings::resolve(args, TomlConfig::default()) {
            Err(Error::Config(msg)) => assert!(msg.contains("writer-address")),
            other => panic!("Expected config error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_log_format() {
        let args = Args {
            log_format: Some("xml".to_string()),
            ..required_args()
        };

        assert!(Settings::resolve(args, TomlConfig::default()).is_err());
    }

    #[test]
    fn parses_command_line_flags() {
        let args = Args::try_parse_from([
            "concordance-transformer",
            "--port",
            "9090",
            "--writer-address",
            "http://writer/",
            "--topic",
            "CliTopic",
        ])
        .unwrap();

        assert_eq!(args.port, Some(9090));
        assert_eq!(args.writer_address.as_deref(), Some("http://writer/"));
        assert_eq!(args.topic.as_deref(), Some("CliTopic"));
    }
}
