use crate::{ComputeProvider, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;
use ycprov_common::{
    CreationRequest, OperationHandle, ProvisioningError, ResolvedImage, Step,
};

/// Outcome the mock returns for `create_instance`.
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Accept(String),
    Reject(String),
    Unauthorized,
    Unreachable,
}

/// Failure the mock returns for `latest_image_by_family`, ahead of the family table.
#[derive(Debug, Clone)]
pub enum LookupFailure {
    Unauthorized,
    Unreachable,
}

/// In-memory provider. Serves images from a family table and records every call.
pub struct MockProvider {
    images: HashMap<String, String>,
    fallback_image: Option<String>,
    image_failure: Option<LookupFailure>,
    create_outcome: CreateOutcome,
    image_lookups: Mutex<Vec<(String, String)>>,
    create_calls: Mutex<Vec<CreationRequest>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
            fallback_image: None,
            image_failure: None,
            create_outcome: CreateOutcome::Accept("op-mock".to_string()),
            image_lookups: Mutex::new(Vec::new()),
            create_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_image(mut self, family: &str, image_id: &str) -> Self {
        self.images.insert(family.to_string(), image_id.to_string());
        self
    }

    /// Resolve every family not in the table to `image_id`.
    pub fn with_any_image(mut self, image_id: &str) -> Self {
        self.fallback_image = Some(image_id.to_string());
        self
    }

    pub fn with_image_failure(mut self, failure: LookupFailure) -> Self {
        self.image_failure = Some(failure);
        self
    }

    pub fn with_create_outcome(mut self, outcome: CreateOutcome) -> Self {
        self.create_outcome = outcome;
        self
    }

    /// (family, folder_id) pairs in call order.
    pub fn image_lookups(&self) -> Vec<(String, String)> {
        self.image_lookups
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    pub fn create_calls(&self) -> Vec<CreationRequest> {
        self.create_calls
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComputeProvider for MockProvider {
    async fn latest_image_by_family(
        &self,
        family: &str,
        folder_id: &str,
    ) -> Result<ResolvedImage> {
        if let Ok(mut calls) = self.image_lookups.lock() {
            calls.push((family.to_string(), folder_id.to_string()));
        }

        match &self.image_failure {
            Some(LookupFailure::Unauthorized) => {
                return Err(ProvisioningError::Authorization {
                    step: Step::ResolveImage,
                    message: "mock token rejected".to_string(),
                })
            }
            Some(LookupFailure::Unreachable) => {
                return Err(ProvisioningError::transport(
                    Step::ResolveImage,
                    "mock endpoint unreachable",
                ))
            }
            None => {}
        }

        match self.images.get(family).or(self.fallback_image.as_ref()) {
            Some(id) => Ok(ResolvedImage {
                id: id.clone(),
                name: Some(format!("{}-mock", family)),
            }),
            None => Err(ProvisioningError::ImageNotFound {
                family: family.to_string(),
                folder_id: folder_id.to_string(),
                message: "mock catalog has no such family".to_string(),
            }),
        }
    }

    async fn create_instance(&self, request: &CreationRequest) -> Result<OperationHandle> {
        if let Ok(mut calls) = self.create_calls.lock() {
            calls.push(request.clone());
        }
        info!(
            "🧪 [Mock] create_instance name={}, image={}, outcome={:?}",
            request.name, request.boot_disk.image_id, self.create_outcome
        );

        match &self.create_outcome {
            CreateOutcome::Accept(op_id) => Ok(OperationHandle {
                id: op_id.clone(),
                description: Some("Create instance".to_string()),
                done: false,
                instance_id: Some(format!("mock-{}", request.name)),
            }),
            CreateOutcome::Reject(message) => Err(ProvisioningError::RequestRejected {
                step: Step::Submit,
                message: message.clone(),
            }),
            CreateOutcome::Unauthorized => Err(ProvisioningError::Authorization {
                step: Step::Submit,
                message: "mock token rejected".to_string(),
            }),
            CreateOutcome::Unreachable => Err(ProvisioningError::transport(
                Step::Submit,
                "mock endpoint unreachable",
            )),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
