//! Typed variable bundles for job-script template interpolation

use std::collections::HashMap;

use crate::models::EvalConfiguration;
use crate::{Error, Result};

/// A validated set of named values a template can draw from
pub trait VariableBundle {
    /// Placeholder name → substitution value.
    fn variables(&self) -> HashMap<String, String>;
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::validation(format!(
            "{} must be a non-empty string",
            field
        )))
    } else {
        Ok(())
    }
}

/// Variables for the training sbatch template
#[derive(Debug, Clone)]
pub struct TrainingTemplateVariables {
    pub model_name: String,
    pub model_path: String,
    pub fold_index: i32,
    pub task_number: i32,
    pub timestamp: i64,
}

impl TrainingTemplateVariables {
    pub fn new(
        model_name: impl Into<String>,
        model_path: impl Into<String>,
        fold_index: i32,
        task_number: i32,
        timestamp: i64,
    ) -> Result<Self> {
        let bundle = Self {
            model_name: model_name.into(),
            model_path: model_path.into(),
            fold_index,
            task_number,
            timestamp,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    fn validate(&self) -> Result<()> {
        require_non_empty("model_name", &self.model_name)?;
        require_non_empty("model_path", &self.model_path)?;
        if self.fold_index < 0 {
            return Err(Error::validation("fold_index must be non-negative"));
        }
        if self.task_number <= 0 {
            return Err(Error::validation("task_number must be positive"));
        }
        Ok(())
    }
}

impl VariableBundle for TrainingTemplateVariables {
    fn variables(&self) -> HashMap<String, String> {
        HashMap::from([
            ("model_name".to_string(), self.model_name.clone()),
            ("model_path".to_string(), self.model_path.clone()),
            ("fold_index".to_string(), self.fold_index.to_string()),
            ("task_number".to_string(), self.task_number.to_string()),
            ("timestamp".to_string(), self.timestamp.to_string()),
        ])
    }
}

/// Variables for the prediction sbatch template
#[derive(Debug, Clone)]
pub struct PredictionTemplateVariables {
    pub model_name: String,
    pub model_path: String,
    pub output_path: String,
    pub fold_index: i32,
    pub timestamp: i64,
}

impl PredictionTemplateVariables {
    pub fn new(
        model_name: impl Into<String>,
        model_path: impl Into<String>,
        output_path: impl Into<String>,
        fold_index: i32,
        timestamp: i64,
    ) -> Result<Self> {
        let bundle = Self {
            model_name: model_name.into(),
            model_path: model_path.into(),
            output_path: output_path.into(),
            fold_index,
            timestamp,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    fn validate(&self) -> Result<()> {
        require_non_empty("model_name", &self.model_name)?;
        require_non_empty("model_path", &self.model_path)?;
        require_non_empty("output_path", &self.output_path)?;
        if self.fold_index < 0 {
            return Err(Error::validation("fold_index must be non-negative"));
        }
        Ok(())
    }
}

impl VariableBundle for PredictionTemplateVariables {
    fn variables(&self) -> HashMap<String, String> {
        HashMap::from([
            ("model_name".to_string(), self.model_name.clone()),
            ("model_path".to_string(), self.model_path.clone()),
            ("output_path".to_string(), self.output_path.clone()),
            ("fold_index".to_string(), self.fold_index.to_string()),
            ("timestamp".to_string(), self.timestamp.to_string()),
        ])
    }
}

/// Variables for the evaluation sbatch template
#[derive(Debug, Clone)]
pub struct EvaluationTemplateVariables {
    pub model_name: String,
    pub model_path: String,
    pub evaluation_path: String,
    pub configurations: Vec<EvalConfiguration>,
    pub output_path: String,
}

impl EvaluationTemplateVariables {
    pub fn new(
        model_name: impl Into<String>,
        model_path: impl Into<String>,
        evaluation_path: impl Into<String>,
        configurations: Vec<EvalConfiguration>,
        output_path: impl Into<String>,
    ) -> Result<Self> {
        let bundle = Self {
            model_name: model_name.into(),
            model_path: model_path.into(),
            evaluation_path: evaluation_path.into(),
            configurations,
            output_path: output_path.into(),
        };
        bundle.validate()?;
        Ok(bundle)
    }

    fn validate(&self) -> Result<()> {
        require_non_empty("model_name", &self.model_name)?;
        require_non_empty("model_path", &self.model_path)?;
        require_non_empty("evaluation_path", &self.evaluation_path)?;
        require_non_empty("output_path", &self.output_path)?;
        if self.configurations.is_empty() {
            return Err(Error::validation(
                "configurations must contain at least one entry",
            ));
        }
        Ok(())
    }

    fn configurations_arg(&self) -> String {
        self.configurations
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl VariableBundle for EvaluationTemplateVariables {
    fn variables(&self) -> HashMap<String, String> {
        HashMap::from([
            ("model_name".to_string(), self.model_name.clone()),
            ("model_path".to_string(), self.model_path.clone()),
            ("evaluation_path".to_string(), self.evaluation_path.clone()),
            ("configurations".to_string(), self.configurations_arg()),
            ("output_path".to_string(), self.output_path.clone()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_bundle_valid() {
        let bundle =
            TrainingTemplateVariables::new("seg-A", "/data/models/seg-A", 1, 130, 1_726_000_000)
                .unwrap();
        let vars = bundle.variables();
        assert_eq!(vars.get("model_name").unwrap(), "seg-A");
        assert_eq!(vars.get("fold_index").unwrap(), "1");
        assert_eq!(vars.get("task_number").unwrap(), "130");
    }

    #[test]
    fn test_training_bundle_rejects_empty_name() {
        assert!(TrainingTemplateVariables::new("", "/data", 0, 130, 0).is_err());
        assert!(TrainingTemplateVariables::new("  ", "/data", 0, 130, 0).is_err());
    }

    #[test]
    fn test_training_bundle_rejects_negative_fold() {
        assert!(TrainingTemplateVariables::new("seg-A", "/data", -1, 130, 0).is_err());
    }

    #[test]
    fn test_training_bundle_rejects_zero_task() {
        assert!(TrainingTemplateVariables::new("seg-A", "/data", 0, 0, 0).is_err());
    }

    #[test]
    fn test_prediction_bundle_fold_zero_is_valid() {
        let bundle =
            PredictionTemplateVariables::new("seg-A", "/data/models/seg-A", "/out", 0, 0).unwrap();
        assert_eq!(bundle.variables().get("fold_index").unwrap(), "0");
    }

    #[test]
    fn test_evaluation_bundle_joins_configurations() {
        let bundle = EvaluationTemplateVariables::new(
            "seg-A",
            "/data/models/seg-A",
            "/data/eval",
            vec![EvalConfiguration::TwoD, EvalConfiguration::ThreeDFullres],
            "/out",
        )
        .unwrap();
        assert_eq!(
            bundle.variables().get("configurations").unwrap(),
            "2d 3d_fullres"
        );
    }

    #[test]
    fn test_evaluation_bundle_requires_configurations() {
        assert!(
            EvaluationTemplateVariables::new("seg-A", "/m", "/e", vec![], "/out").is_err()
        );
    }
}
