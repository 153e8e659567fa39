use crate::{ComputeProvider, Result};
#[cfg(test)]
use crate::DEFAULT_COMPUTE_ENDPOINT;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, info};
use ycprov_common::{
    CreationRequest, OperationHandle, ProvisioningError, ResolvedImage, Step,
};

/// Yandex Cloud Compute REST client (IAM token auth).
pub struct YandexProvider {
    client: Client,
    endpoint: String,
    headers: HeaderMap,
}

/// Error envelope returned by the Compute API on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OperationResponse {
    id: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    metadata: Option<OperationMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationMetadata {
    #[serde(default)]
    instance_id: Option<String>,
}

impl YandexProvider {
    pub fn new(token: &str, endpoint: &str) -> Result<Self> {
        // Transport-level limits only; the provisioning flow itself never times out.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProvisioningError::configuration(format!("http client: {}", e)))?;

        let token = token.trim();
        if token.is_empty() {
            return Err(ProvisioningError::configuration("IAM token is empty"));
        }

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            ProvisioningError::configuration("IAM token contains characters not allowed in a header")
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            client,
            endpoint: endpoint.trim().trim_end_matches('/').to_string(),
            headers,
        })
    }
}

/// camelCase body for `POST /instances`. int64 fields go out as strings.
pub(crate) fn creation_body(req: &CreationRequest) -> serde_json::Value {
    let mut nic = json!({ "subnetId": req.network_interface.subnet_id });
    if req.network_interface.assign_public_ipv4 {
        nic["primaryV4AddressSpec"] = json!({
            "oneToOneNatSpec": { "ipVersion": "IPV4" }
        });
    } else {
        nic["primaryV4AddressSpec"] = json!({});
    }

    json!({
        "folderId": req.folder_id,
        "name": req.name,
        "zoneId": req.zone_id,
        "platformId": req.platform_id,
        "labels": req.labels,
        "metadata": req.metadata,
        "resourcesSpec": {
            "memory": req.resources_spec.memory.to_string(),
            "cores": req.resources_spec.cores.to_string(),
        },
        "bootDiskSpec": {
            "autoDelete": req.boot_disk.auto_delete,
            "diskSpec": {
                "typeId": req.boot_disk.type_id,
                "size": req.boot_disk.size.to_string(),
                "imageId": req.boot_disk.image_id,
            },
        },
        "networkInterfaceSpecs": [nic],
    })
}

fn api_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiError>(body) {
        Ok(ApiError {
            code,
            message: Some(message),
        }) => match code {
            Some(code) => format!("status={} code={} {}", status.as_u16(), code, message),
            None => format!("status={} {}", status.as_u16(), message),
        },
        _ => format!("status={} body={}", status.as_u16(), body),
    }
}

/// Maps non-2xx statuses. Image lookup turns its non-auth 4xx into not-found before calling this.
fn status_error(step: Step, status: StatusCode, body: &str) -> ProvisioningError {
    let message = api_message(status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProvisioningError::Authorization { step, message }
        }
        s if s.is_client_error() => ProvisioningError::RequestRejected { step, message },
        _ => ProvisioningError::Transport { step, message },
    }
}

fn send_error(step: Step, url: &str, e: reqwest::Error) -> ProvisioningError {
    let kind = if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else {
        "request"
    };
    ProvisioningError::transport(step, format!("{} {} failed: {}", kind, url, e))
}

#[async_trait]
impl ComputeProvider for YandexProvider {
    async fn latest_image_by_family(
        &self,
        family: &str,
        folder_id: &str,
    ) -> Result<ResolvedImage> {
        let step = Step::ResolveImage;
        let url = format!("{}/images:latestByFamily", self.endpoint);
        info!(
            "🔵 [Yandex API] GET {} - Resolving image: family={}, folder={}",
            url, family, folder_id
        );

        let resp = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .query(&[("folderId", folder_id), ("family", family)])
            .send()
            .await
            .map_err(|e| send_error(step, &url, e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            error!(
                "❌ [Yandex API] GET {} failed: status={}, response={}",
                url,
                status.as_u16(),
                text
            );
            // Lookup can only fail as not-found, auth or transport: a 4xx other
            // than 401/403 (unknown family, malformed family name) means no image.
            let auth_failure = matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN);
            if status.is_client_error() && !auth_failure {
                return Err(ProvisioningError::ImageNotFound {
                    family: family.to_string(),
                    folder_id: folder_id.to_string(),
                    message: api_message(status, &text),
                });
            }
            return Err(status_error(step, status, &text));
        }

        let image: ImageResponse = resp.json().await.map_err(|e| {
            ProvisioningError::transport(step, format!("undecodable image response: {}", e))
        })?;
        if image.id.trim().is_empty() {
            return Err(ProvisioningError::ImageNotFound {
                family: family.to_string(),
                folder_id: folder_id.to_string(),
                message: "empty image id in response".to_string(),
            });
        }

        info!(
            "✅ [Yandex API] Image resolved: id={}, name={}",
            image.id,
            image.name.as_deref().unwrap_or("unknown")
        );
        Ok(ResolvedImage {
            id: image.id,
            name: image.name,
        })
    }

    async fn create_instance(&self, request: &CreationRequest) -> Result<OperationHandle> {
        let step = Step::Submit;
        let url = format!("{}/instances", self.endpoint);
        let body = creation_body(request);

        info!(
            "🔵 [Yandex API] POST {} - Creating instance: name={}, zone={}, platform={}, image={}",
            url, request.name, request.zone_id, request.platform_id, request.boot_disk.image_id
        );
        // Metadata values carry key material; only the keys are logged.
        debug!(
            "🔵 [Yandex API] metadata keys={:?}, labels={:?}",
            request.metadata.keys().collect::<Vec<_>>(),
            request.labels
        );

        let resp = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(step, &url, e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            error!(
                "❌ [Yandex API] POST {} failed: status={}, response={}",
                url,
                status.as_u16(),
                text
            );
            return Err(status_error(step, status, &text));
        }

        let op: OperationResponse = resp.json().await.map_err(|e| {
            ProvisioningError::transport(step, format!("undecodable operation response: {}", e))
        })?;

        info!(
            "✅ [Yandex API] POST {} accepted: operation={}, done={}",
            url, op.id, op.done
        );
        Ok(OperationHandle {
            id: op.id,
            description: op.description,
            done: op.done,
            instance_id: op.metadata.and_then(|m| m.instance_id),
        })
    }

    fn name(&self) -> &'static str {
        "yandex"
    }
}
