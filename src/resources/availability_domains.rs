//! `oci_identity_availability_domains` data source.

use crate::client::IdentityClient;
use crate::error::{ProviderError, ProviderResult};
use crate::resource_data::ResourceData;
use crate::schema::{AVAILABILITY_DOMAINS_SCHEMA, ResourceSchema};
use log::debug;
use serde_json::{Value, json};

const TYPE_NAME: &str = AVAILABILITY_DOMAINS_SCHEMA.type_name;

/// Lists the availability domains visible to a compartment.
///
/// The result keeps the service's order and carries an `id` derived from
/// the listing, so two reads of an unchanged listing yield the same `id`.
/// Every region has at least one domain; an empty listing is an error.
pub struct AvailabilityDomainsDataSource<'a, C> {
    client: &'a C,
}

impl<'a, C: IdentityClient> AvailabilityDomainsDataSource<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    pub fn schema(&self) -> &'static ResourceSchema {
        &AVAILABILITY_DOMAINS_SCHEMA
    }

    pub async fn read(&self, config: &ResourceData) -> ProviderResult<ResourceData> {
        AVAILABILITY_DOMAINS_SCHEMA.validate(config)?;
        let compartment_id = config.require_str(TYPE_NAME, "compartment_id")?;

        let domains = self
            .client
            .list_availability_domains(compartment_id)
            .await
            .map_err(|error| ProviderError::rejected(TYPE_NAME, "list", error))?;

        let malformed = |message: String| ProviderError::RemoteRejected {
            resource_type: TYPE_NAME.to_string(),
            operation: "list".to_string(),
            message,
            source: None,
        };
        if domains.is_empty() {
            return Err(malformed(format!(
                "no availability domains visible to '{}'",
                compartment_id
            )));
        }
        if let Some(index) = domains.iter().position(|ad| ad.name.trim().is_empty()) {
            return Err(malformed(format!(
                "availability domain #{} has no name",
                index
            )));
        }
        debug!(
            "{} availability domains in '{}'",
            domains.len(),
            compartment_id
        );

        let blocks: Vec<Value> = domains
            .iter()
            .map(|ad| json!({ "name": ad.name, "compartment_id": ad.compartment_id }))
            .collect();
        let mut data = ResourceData::new()
            .with("compartment_id", compartment_id)
            .with("availability_domains", Value::Array(blocks));
        let id = data.fingerprint();
        data.set("id", id.to_string());
        Ok(data)
    }
}
