use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::domain::model::ModelResources;

/// Brain MRI tumor detection demo server.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Args {
    /// Model configuration descriptor (TOML).
    #[arg(long, env = "TUMOR_CONFIG", default_value = "config.toml")]
    pub config: PathBuf,

    /// ONNX model weights.
    #[arg(long, env = "TUMOR_WEIGHTS", default_value = "model/model_final.onnx")]
    pub weights: PathBuf,

    #[arg(long, env = "TUMOR_BIND", default_value = "0.0.0.0:8090")]
    pub bind: SocketAddr,

    /// Directory with the single-page front end.
    #[arg(long, env = "TUMOR_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Number of analyses kept in memory for threshold changes.
    #[arg(long, env = "TUMOR_CACHE_CAPACITY", default_value_t = 32)]
    pub cache_capacity: usize,

    #[arg(long, env = "TUMOR_MAX_UPLOAD_MB", default_value_t = 25)]
    pub max_upload_mb: usize,
}

impl Args {
    pub fn resources(&self) -> ModelResources {
        ModelResources { config_path: self.config.clone(), weights_path: self.weights.clone() }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_app_layout() {
        let args = Args::try_parse_from(["tumor-detector"]).unwrap();
        assert_eq!(args.config, PathBuf::from("config.toml"));
        assert_eq!(args.weights, PathBuf::from("model/model_final.onnx"));
        assert_eq!(args.bind.port(), 8090);
        assert_eq!(args.max_upload_bytes(), 25 * 1024 * 1024);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "tumor-detector",
            "--config", "/srv/cfg.toml",
            "--weights", "/srv/w.onnx",
            "--bind", "127.0.0.1:9000",
            "--cache-capacity", "4",
        ])
        .unwrap();
        let res = args.resources();
        assert_eq!(res.config_path, PathBuf::from("/srv/cfg.toml"));
        assert_eq!(res.weights_path, PathBuf::from("/srv/w.onnx"));
        assert_eq!(args.cache_capacity, 4);
    }
}
