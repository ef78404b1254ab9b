//! Job-script template loading and placeholder interpolation

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

use super::variables::VariableBundle;
use crate::{Error, Result};

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Renders sbatch scripts from a template with `{name}` placeholders.
///
/// The template is loaded once and its placeholder set captured at
/// construction, so each render only checks coverage and substitutes.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    content: String,
    placeholders: BTreeSet<String>,
}

impl TemplateRenderer {
    /// Load a template file. A missing or unreadable file is a fatal
    /// configuration error.
    pub fn from_file(path: &Path) -> Result<Self> {
        if path.as_os_str().is_empty() {
            return Err(Error::config("template path is required"));
        }

        if !path.is_file() {
            return Err(Error::config(format!(
                "Template file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to load template {}: {}", path.display(), e)))?;

        debug!("Template loaded successfully from: {}", path.display());
        Ok(Self::from_content(content))
    }

    fn from_content(content: String) -> Self {
        let placeholders = PLACEHOLDER_RE
            .captures_iter(&content)
            .map(|c| c[1].to_string())
            .collect();
        Self {
            content,
            placeholders,
        }
    }

    /// Placeholder names the template references.
    pub fn placeholders(&self) -> &BTreeSet<String> {
        &self.placeholders
    }

    /// Interpolate a variable bundle into the template.
    ///
    /// Every placeholder must be covered by the bundle; rendering is
    /// deterministic, so the same bundle always yields identical output.
    pub fn render(&self, bundle: &dyn VariableBundle) -> Result<String> {
        let variables = bundle.variables();

        let missing: Vec<&String> = self
            .placeholders
            .iter()
            .filter(|name| !variables.contains_key(*name))
            .collect();

        if !missing.is_empty() {
            return Err(Error::template(format!(
                "missing template variables: {:?}",
                missing
            )));
        }

        let rendered = PLACEHOLDER_RE.replace_all(&self.content, |caps: &regex::Captures| {
            variables[&caps[1]].clone()
        });

        Ok(rendered.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::variables::TrainingTemplateVariables;
    use std::io::Write;

    const TRAIN_TEMPLATE: &str = "#!/bin/bash\n\
        #SBATCH --job-name={model_name}_fold{fold_index}\n\
        nnUNet_train 3d_fullres Task{task_number} {fold_index} -o {model_path}/{timestamp}\n";

    fn renderer() -> TemplateRenderer {
        TemplateRenderer::from_content(TRAIN_TEMPLATE.to_string())
    }

    fn bundle() -> TrainingTemplateVariables {
        TrainingTemplateVariables::new("seg-A", "/data/models/seg-A", 1, 130, 1_726_000_000)
            .unwrap()
    }

    #[test]
    fn test_placeholder_set_captured_at_construction() {
        let r = renderer();
        let names: Vec<&str> = r.placeholders().iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            vec!["fold_index", "model_name", "model_path", "task_number", "timestamp"]
        );
    }

    #[test]
    fn test_render_substitutes_all_placeholders() {
        let rendered = renderer().render(&bundle()).unwrap();
        assert!(rendered.contains("--job-name=seg-A_fold1"));
        assert!(rendered.contains("Task130 1"));
        assert!(rendered.contains("/data/models/seg-A/1726000000"));
        assert!(!rendered.contains('{'));
    }

    #[test]
    fn test_render_is_deterministic() {
        let r = renderer();
        let b = bundle();
        assert_eq!(r.render(&b).unwrap(), r.render(&b).unwrap());
    }

    #[test]
    fn test_missing_variable_reported_by_name() {
        let r = TemplateRenderer::from_content(
            "#SBATCH --job-name={model_name}\nrun --extra {undeclared_knob}\n".to_string(),
        );
        let err = r.render(&bundle()).unwrap_err();
        assert!(matches!(err, Error::Template(_)));
        assert!(err.to_string().contains("undeclared_knob"));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = TemplateRenderer::from_file(Path::new("/nonexistent/train.sbatch")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_empty_path_is_config_error() {
        let err = TemplateRenderer::from_file(Path::new("")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TRAIN_TEMPLATE.as_bytes()).unwrap();
        file.flush().unwrap();

        let r = TemplateRenderer::from_file(file.path()).unwrap();
        assert_eq!(r.placeholders().len(), 5);
        assert!(r.render(&bundle()).is_ok());
    }
}
