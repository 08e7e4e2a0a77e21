// ABOUTME: Compute Engine REST calls: aggregated instance listing, guest attributes, setMetadata.
// ABOUTME: Wire types are decoded here and converted into the provider-neutral hostca-core model.

use crate::client::GcpClient;
use async_trait::async_trait;
use hostca_core::{
    AccessConfig, CloudError, Compute, Instance, InstanceId, Metadata, NetworkInterface,
};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregatedInstanceList {
    #[serde(default)]
    items: BTreeMap<String, InstancesScopedList>,
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct InstancesScopedList {
    #[serde(default)]
    instances: Vec<WireInstance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireInstance {
    id: String,
    name: String,
    zone: String,
    #[serde(default)]
    network_interfaces: Vec<WireNetworkInterface>,
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireNetworkInterface {
    #[serde(rename = "networkIP")]
    network_ip: Option<String>,
    #[serde(default)]
    access_configs: Vec<WireAccessConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAccessConfig {
    #[serde(rename = "natIP")]
    nat_ip: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuestAttributes {
    query_value: Option<GuestAttributesValue>,
}

#[derive(Debug, Deserialize)]
struct GuestAttributesValue {
    #[serde(default)]
    items: Vec<GuestAttributesEntry>,
}

#[derive(Debug, Deserialize)]
struct GuestAttributesEntry {
    value: Option<String>,
}

/// Only checked for decodability; the operation is not awaited.
#[derive(Debug, Deserialize)]
struct Operation {
    #[serde(default)]
    name: String,
}

/// Last path segment of a zone URL (`.../zones/us-central1-a` -> `us-central1-a`).
pub fn zone_name(zone: &str) -> &str {
    zone.rsplit('/').next().unwrap_or(zone)
}

impl From<WireInstance> for Instance {
    fn from(wire: WireInstance) -> Self {
        Instance {
            id: InstanceId::from(wire.id),
            zone: zone_name(&wire.zone).to_string(),
            name: wire.name,
            network_interfaces: wire
                .network_interfaces
                .into_iter()
                .map(|nic| NetworkInterface {
                    internal_ip: nic.network_ip,
                    access_configs: nic
                        .access_configs
                        .into_iter()
                        .map(|ac| AccessConfig {
                            external_ip: ac.nat_ip,
                        })
                        .collect(),
                })
                .collect(),
            metadata: wire.metadata,
        }
    }
}

impl AggregatedInstanceList {
    fn into_instances(self) -> impl Iterator<Item = Instance> {
        self.items
            .into_values()
            .flat_map(|scoped| scoped.instances)
            .map(Instance::from)
    }
}

impl GuestAttributes {
    /// First value under the queried path; `None` when nothing is published.
    fn first_value(self) -> Option<String> {
        self.query_value?
            .items
            .into_iter()
            .next()
            .and_then(|entry| entry.value)
            .filter(|value| !value.is_empty())
    }
}

#[async_trait]
impl Compute for GcpClient {
    async fn list_instances(&self, project_id: &str) -> Result<Vec<Instance>, CloudError> {
        let url = format!(
            "{}/projects/{}/aggregated/instances",
            self.endpoints.compute, project_id
        );
        let mut instances = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.get(&url);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let page: AggregatedInstanceList =
                self.send_json("instances.aggregatedList", request).await?;
            page_token = page.next_page_token.clone().filter(|t| !t.is_empty());
            instances.extend(page.into_instances());
            if page_token.is_none() {
                break;
            }
        }

        tracing::debug!(project = %project_id, count = instances.len(), "listed instances");
        Ok(instances)
    }

    async fn read_guest_attribute(
        &self,
        project_id: &str,
        zone: &str,
        instance: &str,
        query_path: &str,
    ) -> Result<Option<String>, CloudError> {
        let url = format!(
            "{}/projects/{}/zones/{}/instances/{}/getGuestAttributes",
            self.endpoints.compute, project_id, zone, instance
        );
        let request = self.get(&url).query(&[("queryPath", query_path)]);

        match self
            .send_json::<GuestAttributes>("instances.getGuestAttributes", request)
            .await
        {
            Ok(attributes) => Ok(attributes.first_value()),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn set_metadata(
        &self,
        project_id: &str,
        zone: &str,
        instance: &str,
        metadata: &Metadata,
    ) -> Result<(), CloudError> {
        let url = format!(
            "{}/projects/{}/zones/{}/instances/{}/setMetadata",
            self.endpoints.compute, project_id, zone, instance
        );
        let request = self.post(&url).json(metadata);
        let operation: Operation = self.send_json("instances.setMetadata", request).await?;
        tracing::debug!(
            project = %project_id,
            instance = %instance,
            operation = %operation.name,
            "setMetadata accepted"
        );
        Ok(())
    }
}
