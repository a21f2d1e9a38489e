use std::path::Path;

use inference_harness::vendors::azure_inference::AzureInferenceConfig;
use inference_harness::{HarnessError, ImageInput};

use crate::cli::Cli;

/// Loads `.env` from the working directory, if present.
pub fn init() {
    dotenvy::dotenv().ok();
}

/// Provider settings from the environment (`GITHUB_TOKEN`) and CLI overrides.
pub fn provider_config(cli: &Cli) -> Result<AzureInferenceConfig, HarnessError> {
    let mut config = AzureInferenceConfig::from_env()?.endpoint(cli.endpoint.clone());
    if let Some(timeout) = cli.timeout() {
        config = config.timeout(timeout);
    }
    Ok(config)
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

/// Reads the sketch as opaque bytes. A missing, unreadable, or empty file is a config error.
pub async fn read_image(path: &Path) -> Result<ImageInput, HarnessError> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| HarnessError::Config(format!("failed to read image {}: {e}", path.display())))?;
    if data.is_empty() {
        return Err(HarnessError::Config(format!(
            "image {} is empty",
            path.display()
        )));
    }
    Ok(ImageInput::new(mime_for(path), data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_image_bytes_with_mime_from_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sketch.PNG");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).expect("write");
        let image = read_image(&path).await.expect("image");
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data.len(), 4);
    }

    #[tokio::test]
    async fn jpeg_is_the_fallback_type() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("contoso_layout_sketch.jpg");
        std::fs::write(&path, [0xff, 0xd8]).expect("write");
        let image = read_image(&path).await.expect("image");
        assert_eq!(image.data_uri(), "data:image/jpeg;base64,/9g=");
    }

    #[tokio::test]
    async fn missing_or_empty_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = read_image(&dir.path().join("nope.jpg")).await;
        assert!(matches!(missing, Err(HarnessError::Config(msg)) if msg.contains("failed to read image")));

        let empty_path = dir.path().join("empty.jpg");
        std::fs::write(&empty_path, b"").expect("write");
        let empty = read_image(&empty_path).await;
        assert!(matches!(empty, Err(HarnessError::Config(msg)) if msg.contains("is empty")));
    }
}
