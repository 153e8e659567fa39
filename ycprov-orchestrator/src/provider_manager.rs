use ycprov_common::{Credentials, ProvisioningError};
use ycprov_providers::ComputeProvider;

use crate::settings::Settings;

pub struct ProviderManager;

impl ProviderManager {
    /// Build the provider named by `YC_PROVIDER` (default `yandex`).
    /// The provider authenticates with the token carried by `credentials`.
    pub fn get_provider(
        settings: &Settings,
        credentials: &Credentials,
    ) -> Result<Box<dyn ComputeProvider>, ProvisioningError> {
        match settings.provider.as_str() {
            #[cfg(feature = "provider-yandex")]
            "yandex" => {
                let provider = ycprov_providers::yandex::YandexProvider::new(
                    &credentials.token,
                    &settings.compute_endpoint,
                )?;
                Ok(Box::new(provider))
            }
            // Dry run: no network, every family resolves.
            #[cfg(feature = "provider-mock")]
            "mock" => Ok(Box::new(
                ycprov_providers::mock::MockProvider::new().with_any_image("img-dry-run"),
            )),
            other => Err(ProvisioningError::configuration(format!(
                "unknown or disabled provider '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str, endpoint: &str) -> Settings {
        Settings {
            auth_token: "settings-token".to_string(),
            ssh_public_key_path: "/tmp/k.pub".into(),
            config_path: "config.json".into(),
            compute_endpoint: endpoint.to_string(),
            provider: provider.to_string(),
        }
    }

    fn credentials(token: &str) -> Credentials {
        Credentials::new(token, b"ssh-rsa AAAA".to_vec())
    }

    #[test]
    fn unknown_provider_is_configuration_error() {
        let err = ProviderManager::get_provider(
            &settings("aws", "http://127.0.0.1:9/compute/v1"),
            &credentials("t1.token"),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ProvisioningError::Configuration(ref m) if m.contains("aws")));
    }

    #[cfg(feature = "provider-yandex")]
    #[test]
    fn yandex_is_built_without_network() {
        let provider = ProviderManager::get_provider(
            &settings("yandex", "http://127.0.0.1:9/compute/v1"),
            &credentials("t1.token"),
        )
        .unwrap();
        assert_eq!(provider.name(), "yandex");
    }

    #[cfg(feature = "provider-yandex")]
    #[test]
    fn yandex_rejects_empty_credential_token() {
        let err = ProviderManager::get_provider(
            &settings("yandex", "http://127.0.0.1:9/compute/v1"),
            &credentials("   "),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ProvisioningError::Configuration(_)));
    }

    #[cfg(feature = "provider-yandex")]
    #[tokio::test]
    async fn yandex_sends_the_credentials_token() {
        use wiremock::matchers::{header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/compute/v1/images:latestByFamily"))
            .and(header("authorization", "Bearer creds-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "id": "img-1", "name": "ubuntu" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = ProviderManager::get_provider(
            &settings("yandex", &format!("{}/compute/v1", server.uri())),
            &credentials("creds-token"),
        )
        .unwrap();
        let image = provider
            .latest_image_by_family("ubuntu-2204", "standard-images")
            .await
            .unwrap();
        assert_eq!(image.id, "img-1");

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        let auth = received[0]
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok());
        assert_eq!(auth, Some("Bearer creds-token"));
    }
}
