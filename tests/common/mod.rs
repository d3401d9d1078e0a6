// Common test utilities and fixtures used across integration tests
#![allow(dead_code)]

use keystore_sql::{RepositoryConfig, XmlDocument, XmlRepository};
use sqlx::Connection;
use std::future::Future;
use std::time::Duration;
use testcontainers::{clients::Cli, images::postgres::Postgres};

// Nothing listens on port 1; any attempt to connect fails fast
pub const UNREACHABLE_URL: &str = "postgres://keys@127.0.0.1:1/keys";

// Points the tests at an existing database instead of starting a container
pub const DATABASE_URL_ENV: &str = "KEYSTORE_TEST_DATABASE_URL";

pub const KEY_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!-- created by the key manager -->
<key id="80732141-ec8f-4b80-af9c-c4d2d1ff8901" version="1" xmlns:d="urn:example:descriptor">
  <creationDate>2024-03-01T12:00:00Z</creationDate>
  <activationDate>2024-03-01T12:00:00Z</activationDate>
  <expirationDate>2024-05-30T12:00:00Z</expirationDate>
  <d:descriptor deserializerType="Example.Deserializer">
    <d:encryption algorithm="AES_256_CBC" />
    <d:masterKey d:requiresEncryption="true">
      <!-- Warning: the key below is in an unencrypted form. -->
      <value>q3xYq/2Yjzh9Hf6kQ3E7pA==</value>
    </d:masterKey>
  </d:descriptor>
</key>"#;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn key_document(version: usize) -> XmlDocument {
    XmlDocument::parse(format!("<key version=\"{}\"><value>{}</value></key>", version, version))
        .expect("Invalid test document")
}

// Unique schema per test so tests can share one database
pub fn fresh_config(url: &str) -> RepositoryConfig {
    RepositoryConfig::new(url)
        .with_schema(format!("ks_{}", uuid::Uuid::new_v4().simple()))
        .with_table("Keys")
        .with_max_connections(20)
}

// Runs `test` against KEYSTORE_TEST_DATABASE_URL, or a throwaway container
pub async fn with_database<F, Fut>(test: F)
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = ()>,
{
    init_logging();

    if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
        test(url).await;
        return;
    }

    let docker = Cli::default();
    let node = docker.run(Postgres::default());
    let url = format!(
        "postgres://postgres@127.0.0.1:{}/postgres",
        node.get_host_port_ipv4(5432)
    );

    wait_until_ready(&url).await;
    test(url).await;
}

async fn wait_until_ready(url: &str) {
    for _ in 0..60 {
        if let Ok(conn) = sqlx::PgConnection::connect(url).await {
            let _ = conn.close().await;
            return;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    panic!("PostgreSQL did not become ready");
}

// Caller-side retry policy for contention failures
pub async fn upsert_with_retry(
    repository: &dyn XmlRepository,
    name: &str,
    payload: &XmlDocument,
) -> keystore_sql::Result<usize> {
    let mut attempts = 0;
    loop {
        attempts += 1;
        match repository.upsert_record(name, payload).await {
            Ok(()) => return Ok(attempts),
            Err(err) if err.is_transient() && attempts < 100 => {
                tokio::time::sleep(Duration::from_millis(5 * attempts as u64)).await;
            }
            Err(err) => return Err(err),
        }
    }
}
