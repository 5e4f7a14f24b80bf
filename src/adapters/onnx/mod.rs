pub mod detector;
pub mod model_catalog;
