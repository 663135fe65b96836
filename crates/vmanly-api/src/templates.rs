// Feature and device template endpoints, plus device attachment

use serde_json::{Map, Value};
use tracing::debug;

use crate::client::{VmanageClient, decode};
use crate::error::Error;
use crate::lists::update_response;
use crate::models::{
    ActionHandle, AttachRequest, AttachedDevice, DeviceTemplateAttachment, TemplateInput,
    TemplateInputRequest, UpdateResponse,
};

impl VmanageClient {
    // ── Feature templates ────────────────────────────────────────────

    /// `GET template/feature`
    pub async fn list_feature_templates(&self) -> Result<Vec<Value>, Error> {
        debug!("listing feature templates");
        self.get_data("template/feature").await
    }

    /// `GET template/feature/object/{id}`
    pub async fn get_feature_template(&self, id: &str) -> Result<Value, Error> {
        self.get_json(&format!("template/feature/object/{id}")).await
    }

    /// `POST template/feature`
    pub async fn create_feature_template(&self, body: &Value) -> Result<Value, Error> {
        debug!("creating feature template");
        self.post_json("template/feature", body).await
    }

    /// `PUT template/feature/{id}`
    pub async fn update_feature_template(
        &self,
        id: &str,
        body: &Value,
    ) -> Result<UpdateResponse, Error> {
        debug!(id, "updating feature template");
        let resp = self.put_json(&format!("template/feature/{id}"), body).await?;
        update_response(&resp)
    }

    // ── Device templates ─────────────────────────────────────────────

    /// `GET template/device`
    pub async fn list_device_templates(&self) -> Result<Vec<Value>, Error> {
        debug!("listing device templates");
        self.get_data("template/device").await
    }

    /// `GET template/device/object/{id}`
    pub async fn get_device_template(&self, id: &str) -> Result<Value, Error> {
        self.get_json(&format!("template/device/object/{id}")).await
    }

    /// `POST template/device/feature`, or `template/device/cli` for
    /// CLI templates (`configType == "file"`).
    pub async fn create_device_template(&self, body: &Value) -> Result<Value, Error> {
        let endpoint = if body.get("configType").and_then(Value::as_str) == Some("file") {
            "template/device/cli"
        } else {
            "template/device/feature"
        };
        debug!(endpoint, "creating device template");
        self.post_json(endpoint, body).await
    }

    /// `PUT template/device/{id}`
    pub async fn update_device_template(
        &self,
        id: &str,
        body: &Value,
    ) -> Result<UpdateResponse, Error> {
        debug!(id, "updating device template");
        let resp = self.put_json(&format!("template/device/{id}"), body).await?;
        update_response(&resp)
    }

    // ── Attachment ───────────────────────────────────────────────────

    /// `GET template/device/config/attached/{id}`
    pub async fn list_attached_devices(
        &self,
        template_id: &str,
    ) -> Result<Vec<AttachedDevice>, Error> {
        self.get_data(&format!("template/device/config/attached/{template_id}"))
            .await
    }

    /// `POST template/device/config/input`: current variable values of the
    /// given devices for a template.
    pub async fn get_template_input(
        &self,
        template_id: &str,
        device_ids: &[String],
    ) -> Result<TemplateInput, Error> {
        let request = TemplateInputRequest {
            template_id: template_id.to_owned(),
            device_ids: device_ids.to_vec(),
            is_edited: true,
            is_master_edited: false,
        };
        let resp = self
            .post_json("template/device/config/input", &request)
            .await?;
        decode(&resp)
    }

    /// `POST template/device/config/attachfeature`
    pub async fn attach_device_template(
        &self,
        template_id: &str,
        devices: Vec<Map<String, Value>>,
    ) -> Result<ActionHandle, Error> {
        debug!(template_id, devices = devices.len(), "attaching device template");
        let request = AttachRequest {
            device_template_list: vec![DeviceTemplateAttachment {
                template_id: template_id.to_owned(),
                device: devices,
                is_edited: true,
                is_master_edited: false,
            }],
        };
        let resp = self
            .post_json("template/device/config/attachfeature", &request)
            .await?;
        decode(&resp)
    }
}
