// Policy definition endpoints
//
// Definitions have no global listing; each type has its own collection
// under `template/policy/definition/{type}`.

use serde_json::Value;
use tracing::debug;

use crate::client::VmanageClient;
use crate::error::Error;
use crate::lists::update_response;
use crate::models::UpdateResponse;

/// Definition types the controller exposes, in listing order.
///
/// Older controllers lack some of them and answer 404.
pub const DEFINITION_TYPES: &[&str] = &[
    "data",
    "qosmap",
    "rewriterule",
    "acl",
    "aclv6",
    "vpnmembershipgroup",
    "control",
    "hubandspoke",
    "mesh",
    "approute",
    "cflowd",
    "zonebasedfw",
    "intrusionprevention",
    "urlfiltering",
    "advancedMalwareProtection",
    "dnssecurity",
    "vedgeroute",
    "deviceaccesspolicy",
    "deviceaccesspolicyv6",
];

fn definition_path(definition_type: &str) -> String {
    format!("template/policy/definition/{}", definition_type.to_lowercase())
}

impl VmanageClient {
    /// `GET template/policy/definition/{type}`
    pub async fn list_policy_definitions(
        &self,
        definition_type: &str,
    ) -> Result<Vec<Value>, Error> {
        debug!(definition_type, "listing policy definitions");
        self.get_data(&definition_path(definition_type)).await
    }

    /// `GET template/policy/definition/{type}/{id}`
    pub async fn get_policy_definition(
        &self,
        definition_type: &str,
        id: &str,
    ) -> Result<Value, Error> {
        self.get_json(&format!("{}/{id}", definition_path(definition_type)))
            .await
    }

    /// `POST template/policy/definition/{type}`
    pub async fn create_policy_definition(
        &self,
        definition_type: &str,
        body: &Value,
    ) -> Result<Value, Error> {
        debug!(definition_type, "creating policy definition");
        self.post_json(&definition_path(definition_type), body).await
    }

    /// `PUT template/policy/definition/{type}/{id}`
    pub async fn update_policy_definition(
        &self,
        definition_type: &str,
        id: &str,
        body: &Value,
    ) -> Result<UpdateResponse, Error> {
        debug!(definition_type, id, "updating policy definition");
        let resp = self
            .put_json(&format!("{}/{id}", definition_path(definition_type)), body)
            .await?;
        update_response(&resp)
    }
}
