//! Built-in detector backends.
//!
//! Real model backends (ONNX, TFLite, ...) plug in through the
//! [`Detector`](crate::detect::Detector) trait from their own crates; this
//! module only ships the weight-free backends the pipeline itself needs.

mod scripted;
mod stub;

use std::path::Path;

use anyhow::{anyhow, Result};

use crate::detect::backend::Detector;
pub use scripted::ScriptedDetector;
pub use stub::StubDetector;

/// Open a detector for a model path given on the command line.
///
/// The path must exist; a missing model is a configuration error reported
/// before any source opens. `.json` files load as detection scripts, anything
/// else needs an external backend.
pub fn open_model(path: &Path) -> Result<Box<dyn Detector>> {
    if !path.exists() {
        return Err(anyhow!(
            "model path '{}' is invalid or model was not found",
            path.display()
        ));
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Box::new(ScriptedDetector::from_file(path)?)),
        other => Err(anyhow!(
            "no built-in backend for model format '{}'; external backends attach via the Detector trait",
            other.unwrap_or("")
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_path_is_rejected() {
        let err = open_model(Path::new("/nonexistent/best.pt"))
            .map(|_| ())
            .unwrap_err();
        assert!(err.to_string().contains("invalid or model was not found"));
    }

    #[test]
    fn existing_non_script_model_needs_an_external_backend() {
        let model = tempfile::NamedTempFile::with_suffix(".pt").expect("temp model");
        let err = open_model(model.path()).map(|_| ()).unwrap_err();
        assert!(err.to_string().contains("no built-in backend"));
    }
}
