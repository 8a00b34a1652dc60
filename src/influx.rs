use anyhow::{Context as _, Result};
use reqwest::{Client, RequestBuilder};

/// Thin client for an InfluxDB v1 HTTP endpoint.
pub struct InfluxDb {
    client: Client,
    base_url: String,
    database: String,
}

impl InfluxDb {
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            database: database.into(),
        }
    }

    /// Creates the target database. Succeeds if it already exists.
    pub async fn create_database(&self) -> Result<()> {
        let response = self
            .create_database_request()
            .send()
            .await
            .context("failed to send database creation request")?;

        response
            .error_for_status()
            .context("database creation request rejected")?;

        Ok(())
    }

    /// Writes one encoded line-protocol point.
    pub async fn write_line(&self, line: &str) -> Result<()> {
        let response = self
            .write_request(line)
            .send()
            .await
            .context("failed to send write request")?;

        response
            .error_for_status()
            .context("write request rejected")?;

        Ok(())
    }

    // The /query endpoint reads `q` as a form parameter, so the body must be
    // form-encoded with the matching Content-Type.
    fn create_database_request(&self) -> RequestBuilder {
        self.client
            .post(format!("{}/query", self.base_url))
            .form(&[("q", format!("CREATE DATABASE {}", self.database))])
    }

    fn write_request(&self, line: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/write", self.base_url))
            .query(&[("db", &self.database)])
            .body(line.to_owned())
    }
}
