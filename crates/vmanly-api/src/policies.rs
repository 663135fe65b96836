// Central, local and security policy endpoints

use serde_json::{Value, json};
use tracing::debug;

use crate::client::{VmanageClient, decode};
use crate::error::Error;
use crate::lists::update_response;
use crate::models::{ActionHandle, UpdateResponse};

/// Which policy collection an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyScope {
    /// Centralized (vSmart) policies.
    Central,
    /// Localized (vEdge) policies.
    Local,
    /// Security policies.
    Security,
}

impl PolicyScope {
    /// Path segment under `template/policy/`.
    pub fn segment(self) -> &'static str {
        match self {
            Self::Central => "vsmart",
            Self::Local => "vedge",
            Self::Security => "security",
        }
    }
}

impl VmanageClient {
    /// `GET template/policy/{vsmart,vedge,security}`
    pub async fn list_policies(&self, scope: PolicyScope) -> Result<Vec<Value>, Error> {
        debug!(scope = scope.segment(), "listing policies");
        self.get_data(&format!("template/policy/{}", scope.segment()))
            .await
    }

    /// `GET template/policy/{scope}/definition/{id}`: the full body,
    /// including `policyDefinition`.
    pub async fn get_policy(&self, scope: PolicyScope, id: &str) -> Result<Value, Error> {
        self.get_json(&format!("template/policy/{}/definition/{id}", scope.segment()))
            .await
    }

    /// `POST template/policy/{scope}`
    pub async fn create_policy(&self, scope: PolicyScope, body: &Value) -> Result<Value, Error> {
        debug!(scope = scope.segment(), "creating policy");
        self.post_json(&format!("template/policy/{}", scope.segment()), body)
            .await
    }

    /// `PUT template/policy/{scope}/{id}`
    pub async fn update_policy(
        &self,
        scope: PolicyScope,
        id: &str,
        body: &Value,
    ) -> Result<UpdateResponse, Error> {
        debug!(scope = scope.segment(), id, "updating policy");
        let resp = self
            .put_json(&format!("template/policy/{}/{id}", scope.segment()), body)
            .await?;
        update_response(&resp)
    }

    /// `POST template/policy/vsmart/activate/{id}?confirm=true`
    pub async fn activate_central_policy(&self, id: &str) -> Result<ActionHandle, Error> {
        debug!(id, "activating central policy");
        let resp = self
            .post_json(
                &format!("template/policy/vsmart/activate/{id}?confirm=true"),
                &json!({}),
            )
            .await?;
        decode(&resp)
    }
}
