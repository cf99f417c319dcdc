use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use rdkafka::config::ClientConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub kafka: KafkaConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Token lifetime: bare seconds or `<n>s|m|h|d|w`.
    pub expire_in: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    /// Comma separated `host:port` list.
    pub brokers: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_group_id")]
    pub group_id: String,
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub consumer: KafkaConsumerConfig,
    pub sasl: Option<KafkaSaslConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConsumerConfig {
    pub min_bytes: u32,
    pub max_bytes: u32,
    pub max_wait_time_ms: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaSaslConfig {
    pub mechanism: String,
    pub username: String,
    pub password: String,
}

fn default_max_connections() -> u32 {
    5
}

fn default_client_id() -> String {
    "identity-client".to_string()
}

fn default_group_id() -> String {
    "identity-consumer".to_string()
}

fn default_connection_timeout_ms() -> u64 {
    3000
}

fn default_request_timeout_ms() -> u64 {
    30000
}

impl Default for KafkaConsumerConfig {
    fn default() -> Self {
        Self {
            min_bytes: 1,
            max_bytes: 52_428_800,
            max_wait_time_ms: 500,
        }
    }
}

impl KafkaConfig {
    /// Base librdkafka settings shared by every producer and consumer.
    ///
    /// Enables `SASL_SSL` when a `sasl` block is configured.
    pub fn client_config(&self) -> ClientConfig {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &self.brokers)
            .set("client.id", &self.client_id)
            .set(
                "socket.connection.setup.timeout.ms",
                self.connection_timeout_ms.to_string(),
            );

        if let Some(sasl) = &self.sasl {
            client_config
                .set("security.protocol", "SASL_SSL")
                .set("sasl.mechanism", &sasl.mechanism)
                .set("sasl.username", &sasl.username)
                .set("sasl.password", &sasl.password);
        }

        client_config
    }

    /// Settings for a consumer joining `group_id`.
    pub fn consumer_config(&self, group_id: &str) -> ClientConfig {
        let mut client_config = self.client_config();
        client_config
            .set("group.id", group_id)
            .set("fetch.min.bytes", self.consumer.min_bytes.to_string())
            .set("fetch.max.bytes", self.consumer.max_bytes.to_string())
            .set("fetch.wait.max.ms", self.consumer.max_wait_time_ms.to_string())
            .set("enable.auto.commit", "true")
            .set("auto.commit.interval.ms", "5000")
            .set("session.timeout.ms", "30000")
            .set("enable.partition.eof", "false");
        client_config
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, KAFKA__BROKERS, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__EXPIRE_IN=12h overrides jwt.expire_in
            .add_source(Environment::default().separator("__"))
            .build()?;

        configuration.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kafka_config(sasl: Option<KafkaSaslConfig>) -> KafkaConfig {
        KafkaConfig {
            brokers: "localhost:9092,localhost:9093".to_string(),
            client_id: default_client_id(),
            group_id: default_group_id(),
            connection_timeout_ms: 3000,
            request_timeout_ms: 30000,
            consumer: KafkaConsumerConfig::default(),
            sasl,
        }
    }

    #[test]
    fn test_client_config_without_sasl() {
        let client_config = kafka_config(None).client_config();

        assert_eq!(
            client_config.get("bootstrap.servers"),
            Some("localhost:9092,localhost:9093")
        );
        assert_eq!(
            client_config.get("socket.connection.setup.timeout.ms"),
            Some("3000")
        );
        assert_eq!(client_config.get("security.protocol"), None);
    }

    #[test]
    fn test_client_config_with_sasl() {
        let client_config = kafka_config(Some(KafkaSaslConfig {
            mechanism: "SCRAM-SHA-512".to_string(),
            username: "identity".to_string(),
            password: "secret".to_string(),
        }))
        .client_config();

        assert_eq!(client_config.get("security.protocol"), Some("SASL_SSL"));
        assert_eq!(client_config.get("sasl.mechanism"), Some("SCRAM-SHA-512"));
        assert_eq!(client_config.get("sasl.username"), Some("identity"));
    }

    #[test]
    fn test_load_applies_environment_overrides() {
        env::set_var("JWT__SECRET", "secret-from-environment-at-least-32-bytes");
        env::set_var("KAFKA__BROKERS", "kafka-1:9092,kafka-2:9092");

        let config = Config::load();

        env::remove_var("JWT__SECRET");
        env::remove_var("KAFKA__BROKERS");

        let config = config.unwrap();
        assert_eq!(config.jwt.secret, "secret-from-environment-at-least-32-bytes");
        assert_eq!(config.kafka.brokers, "kafka-1:9092,kafka-2:9092");
        assert_eq!(config.jwt.expire_in, "1d");
    }

    #[test]
    fn test_consumer_config_sets_group_and_fetch_limits() {
        let client_config = kafka_config(None).consumer_config("identity-consumer");

        assert_eq!(client_config.get("group.id"), Some("identity-consumer"));
        assert_eq!(client_config.get("fetch.min.bytes"), Some("1"));
        assert_eq!(client_config.get("fetch.wait.max.ms"), Some("500"));
    }
}
