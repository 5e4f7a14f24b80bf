use anyhow::Context;
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use crate::application::ports::ModelCatalogPort;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::{ModelDescriptor, ModelResources};

/// Checks that the model descriptor and weights exist, then parses the descriptor.
pub struct OnnxModelCatalog;

impl OnnxModelCatalog {
    pub fn new() -> Self { Self }
}

impl Default for OnnxModelCatalog {
    fn default() -> Self { Self::new() }
}

fn require(kind: &'static str, path: &Path) -> DomainResult<()> {
    if path.as_os_str().is_empty() || !path.is_file() {
        return Err(DomainError::MissingResource { kind, path: path.to_path_buf() });
    }
    Ok(())
}

#[async_trait]
impl ModelCatalogPort for OnnxModelCatalog {
    async fn validate_resources(&self, resources: &ModelResources) -> DomainResult<ModelDescriptor> {
        require("model config", &resources.config_path)?;
        require("model weights", &resources.weights_path)?;

        let raw = tokio::fs::read_to_string(&resources.config_path)
            .await
            .with_context(|| format!("reading {}", resources.config_path.display()))
            .map_err(|e| DomainError::OperationFailed(format!("{e:#}")))?;
        let descriptor: ModelDescriptor = toml::from_str(&raw).map_err(|e| {
            DomainError::InvalidInput(format!("{}: {e}", resources.config_path.display()))
        })?;

        info!(
            "Model resources OK: config={}, weights={}",
            resources.config_path.display(),
            resources.weights_path.display()
        );
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn resources(dir: &Path) -> ModelResources {
        ModelResources {
            config_path: dir.join("config.toml"),
            weights_path: dir.join("model").join("model_final.onnx"),
        }
    }

    #[tokio::test]
    async fn missing_config_names_its_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let res = resources(dir.path());
        let err = OnnxModelCatalog::new().validate_resources(&res).await.unwrap_err();

        assert!(matches!(err, DomainError::MissingResource { kind: "model config", .. }));
        assert!(err.to_string().contains(&res.config_path.display().to_string()));
    }

    #[tokio::test]
    async fn missing_weights_names_its_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let res = resources(dir.path());
        fs::write(&res.config_path, "").unwrap();
        let err = OnnxModelCatalog::new().validate_resources(&res).await.unwrap_err();

        assert!(matches!(err, DomainError::MissingResource { kind: "model weights", .. }));
        assert!(err.to_string().contains("model_final.onnx"));
    }

    #[tokio::test]
    async fn parses_descriptor_when_both_exist() {
        let dir = tempfile::TempDir::new().unwrap();
        let res = resources(dir.path());
        fs::create_dir_all(res.weights_path.parent().unwrap()).unwrap();
        fs::write(&res.weights_path, b"onnx").unwrap();
        fs::write(&res.config_path, "[model]\nmin_size = 512\nclass_names = [\"glioma\"]\n").unwrap();

        let d = OnnxModelCatalog::new().validate_resources(&res).await.unwrap();
        assert_eq!(d.model.min_size, 512);
        assert_eq!(d.primary_class(), "glioma");
    }

    #[tokio::test]
    async fn malformed_descriptor_is_invalid_input() {
        let dir = tempfile::TempDir::new().unwrap();
        let res = resources(dir.path());
        fs::create_dir_all(res.weights_path.parent().unwrap()).unwrap();
        fs::write(&res.weights_path, b"onnx").unwrap();
        fs::write(&res.config_path, "[model\nmin_size = ").unwrap();

        let err = OnnxModelCatalog::new().validate_resources(&res).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }
}
