//! HTTP-backed table sources (requires the Cargo feature `http`).
//!
//! - [`HttpSource`] downloads one CSV/JSON object. `s3://bucket/key` addresses are fetched
//!   from the bucket's public HTTPS endpoint.
//! - [`StoreApiSource`] asks a store API how many stores exist, then fetches each store
//!   record by index.
//!
//! Non-success responses are errors. Nothing is retried.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, Response};

use crate::error::{EtlError, EtlResult};
use crate::types::{DataSet, Schema};

use super::json::ingest_json_values;
use super::source::TableSource;
use super::unified::{infer_format_from_path, ingest_from_str, IngestionFormat};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Key of the store count in the count endpoint's response body.
pub const NUMBER_STORES_KEY: &str = "number_stores";

fn build_client() -> EtlResult<Client> {
    Ok(Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

fn get(client: &Client, url: &str, headers: &BTreeMap<String, String>) -> EtlResult<Response> {
    let mut req = client.get(url);
    for (name, value) in headers {
        req = req.header(name.as_str(), value.as_str());
    }
    let response = req.send()?;
    if !response.status().is_success() {
        return Err(EtlError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }
    Ok(response)
}

/// Map an `s3://bucket/key` address to its virtual-hosted HTTPS URL.
///
/// Any other address is returned unchanged.
pub fn object_url(address: &str) -> String {
    match address.strip_prefix("s3://").and_then(|rest| rest.split_once('/')) {
        Some((bucket, key)) => format!("https://{bucket}.s3.amazonaws.com/{key}"),
        None => address.to_string(),
    }
}

/// Downloads a single CSV or JSON object.
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    format: Option<IngestionFormat>,
    headers: BTreeMap<String, String>,
}

impl HttpSource {
    /// `url` may be `http(s)://...` or `s3://bucket/key`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: None,
            headers: BTreeMap::new(),
        }
    }

    /// Force a format instead of inferring it from the URL's extension.
    pub fn with_format(mut self, format: IngestionFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    fn format(&self) -> EtlResult<IngestionFormat> {
        match self.format {
            Some(f) => Ok(f),
            None => {
                let without_query = self.url.split(['?', '#']).next().unwrap_or_default();
                infer_format_from_path(Path::new(without_query))
            }
        }
    }
}

impl TableSource for HttpSource {
    fn fetch(&self, _logical_name: &str, schema: &Schema) -> EtlResult<DataSet> {
        let format = self.format()?;
        let client = build_client()?;
        let body = get(&client, &object_url(&self.url), &self.headers)?.text()?;
        ingest_from_str(&body, format, schema)
    }
}

/// Reads store records from a paged-by-index store API.
#[derive(Debug, Clone)]
pub struct StoreApiSource {
    number_stores_url: String,
    store_url: String,
    headers: BTreeMap<String, String>,
}

impl StoreApiSource {
    /// `store_url` is a prefix; the store index is appended to it (`{store_url}{i}`).
    pub fn new(number_stores_url: impl Into<String>, store_url: impl Into<String>) -> Self {
        Self {
            number_stores_url: number_stores_url.into(),
            store_url: store_url.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    fn store_record_url(&self, index: u64) -> String {
        format!("{}{index}", self.store_url)
    }

    fn number_of_stores(&self, client: &Client) -> EtlResult<u64> {
        let body: serde_json::Value = get(client, &self.number_stores_url, &self.headers)?.json()?;
        parse_number_stores(&body)
    }
}

fn parse_number_stores(body: &serde_json::Value) -> EtlResult<u64> {
    body.get(NUMBER_STORES_KEY)
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| EtlError::SchemaMismatch {
            message: format!("store count response has no integer '{NUMBER_STORES_KEY}'"),
        })
}

impl TableSource for StoreApiSource {
    fn fetch(&self, _logical_name: &str, schema: &Schema) -> EtlResult<DataSet> {
        let client = build_client()?;
        let count = self.number_of_stores(&client)?;

        let mut records = Vec::new();
        for i in 0..count {
            let record: serde_json::Value =
                get(&client, &self.store_record_url(i), &self.headers)?.json()?;
            records.push(record);
        }
        ingest_json_values(&records, schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn s3_addresses_map_to_public_https() {
        assert_eq!(
            object_url("s3://data-handling-public/products.csv"),
            "https://data-handling-public.s3.amazonaws.com/products.csv"
        );
        assert_eq!(
            object_url("https://example.com/date_details.json"),
            "https://example.com/date_details.json"
        );
        assert_eq!(object_url("s3://bucket-only"), "s3://bucket-only");
    }

    #[test]
    fn format_is_inferred_from_url_path() {
        let src = HttpSource::new("https://example.com/date_details.json?x=1");
        assert_eq!(src.format().unwrap(), IngestionFormat::Json);
        let forced = HttpSource::new("https://example.com/export").with_format(IngestionFormat::Csv);
        assert_eq!(forced.format().unwrap(), IngestionFormat::Csv);
        assert!(HttpSource::new("https://example.com/export").format().is_err());
    }

    #[test]
    fn store_urls_append_the_index() {
        let src = StoreApiSource::new("https://api/number_stores", "https://api/store_details/");
        assert_eq!(src.store_record_url(7), "https://api/store_details/7");
    }

    #[test]
    fn number_stores_must_be_an_integer() {
        assert_eq!(parse_number_stores(&json!({"statusCode": 200, "number_stores": 451})).unwrap(), 451);
        assert!(parse_number_stores(&json!({"number_stores": "451"})).is_err());
        assert!(parse_number_stores(&json!({})).is_err());
    }
}
