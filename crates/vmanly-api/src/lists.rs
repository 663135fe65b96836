// Policy list endpoints
//
// Lists are typed (`site`, `vpn`, `prefix`, ...). The listing is global;
// writes are scoped by the list's type. Updating a list that is in use
// by attached templates locks them until the lock is released.

use serde_json::Value;
use tracing::debug;

use crate::client::{VmanageClient, decode};
use crate::error::Error;
use crate::models::UpdateResponse;

impl VmanageClient {
    /// `GET template/policy/list`: every list of every type.
    pub async fn list_policy_lists(&self) -> Result<Vec<Value>, Error> {
        debug!("listing policy lists");
        self.get_data("template/policy/list").await
    }

    /// `POST template/policy/list/{type}`
    pub async fn create_policy_list(&self, list_type: &str, body: &Value) -> Result<Value, Error> {
        debug!(list_type, "creating policy list");
        self.post_json(&format!("template/policy/list/{}", list_type.to_lowercase()), body)
            .await
    }

    /// `PUT template/policy/list/{type}/{id}`
    pub async fn update_policy_list(
        &self,
        list_type: &str,
        id: &str,
        body: &Value,
    ) -> Result<UpdateResponse, Error> {
        debug!(list_type, id, "updating policy list");
        let resp = self
            .put_json(
                &format!("template/policy/list/{}/{id}", list_type.to_lowercase()),
                body,
            )
            .await?;
        update_response(&resp)
    }

    /// `DELETE template/lock/{processId}`: release the edit lock taken by
    /// a list update.
    pub async fn release_template_lock(&self, process_id: &str) -> Result<(), Error> {
        debug!(process_id, "releasing template lock");
        self.delete(&format!("template/lock/{process_id}")).await?;
        Ok(())
    }
}

/// Updates may answer with an empty body.
pub(crate) fn update_response(body: &Value) -> Result<UpdateResponse, Error> {
    if body.is_null() {
        Ok(UpdateResponse::default())
    } else {
        decode(body)
    }
}
