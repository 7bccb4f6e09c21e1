//! Host metadata lookup against the KV store REST API

use crate::{
    error::{AppError, Result},
    logging::Logger,
    models::{Config, HostRecord},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

/// Resolves host names to their stored metadata
#[async_trait]
pub trait HostDirectory: Send + Sync {
    /// Return the first record whose `name` matches, or `None`
    async fn find_host(&self, name: &str) -> Result<Option<HostRecord>>;
}

/// KV store client for the hosts collection
pub struct KvStoreClient {
    client: Client,
    collection_url: Url,
    session_key: String,
    logger: Logger,
}

impl KvStoreClient {
    /// Build a client from configuration; a session key is mandatory
    pub fn from_config(config: &Config, logger: &Logger) -> Result<Self> {
        let session_key = config
            .session_key
            .clone()
            .ok_or_else(|| AppError::config("A session key is required to look up hosts (use --session-key or SPLUNK_SESSION_KEY)"))?;

        let client = Client::builder()
            .timeout(config.http_timeout())
            .danger_accept_invalid_certs(config.kvstore_insecure)
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {}", e)))?;

        let collection_url = Self::collection_url(&config.kvstore_url, &config.kvstore_app, &config.kvstore_collection)?;

        Ok(Self {
            client,
            collection_url,
            session_key,
            logger: logger.named("KVSTORE"),
        })
    }

    /// `{base}/servicesNS/nobody/{app}/storage/collections/data/{collection}`
    pub fn collection_url(base_url: &str, app: &str, collection: &str) -> Result<Url> {
        let url = format!(
            "{}/servicesNS/nobody/{}/storage/collections/data/{}",
            base_url.trim_end_matches('/'),
            app,
            collection
        );
        Ok(Url::parse(&url)?)
    }
}

#[async_trait]
impl HostDirectory for KvStoreClient {
    async fn find_host(&self, name: &str) -> Result<Option<HostRecord>> {
        let query = serde_json::json!({ "name": name }).to_string();

        self.logger.debug("Querying hosts collection")
            .field("url", self.collection_url.as_str())
            .field("host", name)
            .log()
            .await;

        let response = self
            .client
            .get(self.collection_url.clone())
            .query(&[("output_mode", "json"), ("query", query.as_str())])
            .header(reqwest::header::AUTHORIZATION, format!("Splunk {}", self.session_key))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AppError::auth(format!("KV store rejected the session key ({})", status)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(AppError::http_request(format!("KV store returned {}: {}", status, snippet)));
        }

        let records: Vec<HostRecord> = response.json().await?;

        match records.into_iter().next() {
            Some(record) => {
                self.logger.info("Successfully found an entry in the table of hosts")
                    .field("host", name)
                    .log()
                    .await;
                Ok(Some(record))
            }
            None => {
                self.logger.warn("Failed to find an entry in the table of hosts")
                    .field("host", name)
                    .log()
                    .await;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    const COLLECTION_PATH: &str = "/servicesNS/nobody/network_tools/storage/collections/data/network_hosts";

    fn config_for(server: &MockServer) -> Config {
        Config {
            kvstore_url: server.uri(),
            session_key: Some("abc123".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_collection_url() {
        let url = KvStoreClient::collection_url("https://127.0.0.1:8089/", "network_tools", "network_hosts").unwrap();
        assert_eq!(url.as_str(), format!("https://127.0.0.1:8089{}", COLLECTION_PATH));
    }

    #[test]
    fn test_session_key_required() {
        let config = Config::default();
        let err = KvStoreClient::from_config(&config, &Logger::new("TEST")).err().unwrap();
        assert_eq!(err.category(), "CONFIG");
    }

    #[tokio::test]
    async fn test_find_host_returns_first_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(COLLECTION_PATH))
            .and(query_param("output_mode", "json"))
            .and(query_param("query", r#"{"name":"nas"}"#))
            .and(header("authorization", "Splunk abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"_key": "1", "name": "nas", "mac_address": "00:11:22:33:44:55", "ip_address": "10.0.0.5", "port": "9"},
                {"_key": "2", "name": "nas", "mac_address": "00:11:22:33:44:66"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = KvStoreClient::from_config(&config_for(&server), &Logger::new("TEST")).unwrap();
        let record = client.find_host("nas").await.unwrap().unwrap();

        assert_eq!(record.mac_address.as_deref(), Some("00:11:22:33:44:55"));
        assert_eq!(record.ip_address.as_deref(), Some("10.0.0.5"));
        assert_eq!(record.port, Some(9));
    }

    #[tokio::test]
    async fn test_find_host_escapes_name_in_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(COLLECTION_PATH))
            .and(query_param("query", r#"{"name":"we\"ird"}"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = KvStoreClient::from_config(&config_for(&server), &Logger::new("TEST")).unwrap();
        assert!(client.find_host("we\"ird").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_result_is_none_and_logged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(COLLECTION_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let (logger, lines) = Logger::capturing("TEST");
        let client = KvStoreClient::from_config(&config_for(&server), &logger).unwrap();

        assert!(client.find_host("ghost").await.unwrap().is_none());
        let lines = lines.lock().unwrap();
        assert!(lines.iter().any(|l| l.contains("Failed to find an entry in the table of hosts")));
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(COLLECTION_PATH))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = KvStoreClient::from_config(&config_for(&server), &Logger::new("TEST")).unwrap();
        let err = client.find_host("nas").await.unwrap_err();
        assert_eq!(err.category(), "AUTH");
    }

    #[tokio::test]
    async fn test_server_error_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(COLLECTION_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = KvStoreClient::from_config(&config_for(&server), &Logger::new("TEST")).unwrap();
        let err = client.find_host("nas").await.unwrap_err();
        assert_eq!(err.category(), "HTTP");
        assert!(err.to_string().contains("boom"));
    }
}
