use azure_security_keyvault::prelude::KeyvaultClient;

/// Fetches the URL signing secret from Azure Key Vault using the ambient Azure credential.
pub async fn signing_key(keyvault_url: &str, secret_name: &str) -> azure_core::Result<String> {
    let keyvault_client = KeyvaultClient::new(keyvault_url, azure_identity::create_credential()?)?;

    let secret = keyvault_client.secret_client().get(secret_name).await?;

    log::info!("Loaded signing key {} from key vault", secret_name);
    Ok(secret.value)
}
