// Asynchronous device action status

use crate::client::{VmanageClient, decode};
use crate::error::Error;
use crate::models::ActionStatus;

impl VmanageClient {
    /// `GET device/action/status/{id}`
    pub async fn get_action_status(&self, action_id: &str) -> Result<ActionStatus, Error> {
        let resp = self
            .get_json(&format!("device/action/status/{action_id}"))
            .await?;
        decode(&resp)
    }
}
