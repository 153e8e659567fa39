use async_trait::async_trait;
use ycprov_common::{CreationRequest, OperationHandle, ProvisioningError, ResolvedImage};

/// Public Yandex Cloud Compute REST endpoint.
pub const DEFAULT_COMPUTE_ENDPOINT: &str = "https://compute.api.cloud.yandex.net/compute/v1";

pub type Result<T> = std::result::Result<T, ProvisioningError>;

/// The two remote capabilities a provisioning run needs from a compute cloud.
///
/// Implementations must not retry: every failure is surfaced to the caller as-is.
#[async_trait]
pub trait ComputeProvider: Send + Sync {
    /// Latest published image of `family` owned by `folder_id`.
    async fn latest_image_by_family(&self, family: &str, folder_id: &str)
        -> Result<ResolvedImage>;

    /// Submit the create request. Returns as soon as the provider accepts it;
    /// the returned operation is not awaited.
    async fn create_instance(&self, request: &CreationRequest) -> Result<OperationHandle>;

    // Used in logs only.
    fn name(&self) -> &'static str;
}

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "yandex")]
pub mod yandex;
