use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{error, info};
use ycprov_common::{
    BootDiskRequest, CreationRequest, Credentials, NetworkInterfaceSpec, OperationHandle,
    ProvisioningConfig, ProvisioningError, ResolvedImage,
};
use ycprov_providers::ComputeProvider;

pub const USERNAME_TOKEN: &str = "USERNAME";
pub const SSH_PUBLIC_KEY_TOKEN: &str = "SSH_PUBLIC_KEY";

/// Substitute placeholders in every metadata value.
///
/// Plain sequential replace: `USERNAME` first, then `SSH_PUBLIC_KEY`, every occurrence,
/// no escaping. A username containing `SSH_PUBLIC_KEY` gets rewritten by the second pass.
pub fn render_metadata(
    template: &BTreeMap<String, String>,
    username: &str,
    public_key: &str,
) -> BTreeMap<String, String> {
    template
        .iter()
        .map(|(key, value)| {
            let rendered = value
                .replace(USERNAME_TOKEN, username)
                .replace(SSH_PUBLIC_KEY_TOKEN, public_key);
            (key.clone(), rendered)
        })
        .collect()
}

/// Build the creation payload from the descriptor, rendered metadata and resolved image.
pub fn assemble_request(
    config: &ProvisioningConfig,
    metadata: BTreeMap<String, String>,
    image: &ResolvedImage,
) -> CreationRequest {
    let res = &config.resources;
    CreationRequest {
        folder_id: config.folder_id.clone(),
        name: res.name.clone(),
        zone_id: res.zone_id.clone(),
        platform_id: res.platform_id.clone(),
        labels: config.labels.clone(),
        metadata,
        resources_spec: res.resources_spec,
        boot_disk: BootDiskRequest {
            auto_delete: res.boot_disk_spec.auto_delete,
            type_id: res.boot_disk_spec.disk_spec.type_id.clone(),
            size: res.boot_disk_spec.disk_spec.size,
            image_id: image.id.clone(),
        },
        network_interface: NetworkInterfaceSpec {
            subnet_id: res.subnet_id.clone(),
            assign_public_ipv4: res.assign_public_ipv4,
        },
    }
}

/// One provisioning run: resolve image, render metadata, assemble, submit.
///
/// Strictly sequential, no retries. Any failure aborts the run; nothing has been
/// created at that point, so there is nothing to roll back.
pub async fn provision(
    provider: &dyn ComputeProvider,
    config: &ProvisioningConfig,
    credentials: &Credentials,
) -> Result<OperationHandle, ProvisioningError> {
    let started = Instant::now();
    let image_sel = &config.resources.image;
    info!(
        "🚀 [Provisioning] Starting run: instance={}, folder={}, zone={}, provider={}",
        config.resources.name,
        config.folder_id,
        config.resources.zone_id,
        provider.name()
    );

    let image = provider
        .latest_image_by_family(&image_sel.family, &image_sel.folder_family_id)
        .await
        .map_err(|e| {
            error!("❌ [Provisioning] Image resolution failed: {}", e);
            e
        })?;
    info!(
        "🔍 [Provisioning] Family {} resolved to image {}",
        image_sel.family, image.id
    );

    let metadata = render_metadata(
        &config.metadata,
        &config.username,
        &credentials.public_key_text(),
    );
    let request = assemble_request(config, metadata, &image);

    let op = provider.create_instance(&request).await.map_err(|e| {
        error!("❌ [Provisioning] Instance creation failed: {}", e);
        e
    })?;

    info!(
        "✅ [Provisioning] Create accepted: operation={}, instance_id={}, elapsed_ms={}",
        op.id,
        op.instance_id.as_deref().unwrap_or("pending"),
        started.elapsed().as_millis()
    );
    Ok(op)
}
