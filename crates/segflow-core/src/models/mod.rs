use serde::{Deserialize, Serialize};

pub mod evaluation;
pub mod inference;
pub mod job;
pub mod model;
pub mod training;

// Re-export common models
pub use evaluation::*;
pub use inference::*;
pub use job::*;
pub use model::*;
pub use training::*;

/// Implement sqlx text-column mapping for a status enum.
///
/// The store keeps these as VARCHAR columns guarded by CHECK constraints, so
/// the enums encode/decode through their string form rather than a Postgres
/// enum type.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(concat!("Unknown ", stringify!($name), ": {}"), other)),
                }
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <&str as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> std::result::Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
                let text = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                text.parse().map_err(Into::into)
            }
        }
    };
}

/// Kind of work a batch job performs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobKind {
    Training,
    Inference,
    Evaluation,
}

text_enum!(JobKind {
    Training => "TRAINING",
    Inference => "INFERENCE",
    Evaluation => "EVALUATION",
});

/// Internal job status driven by the reconciliation state machine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

text_enum!(JobStatus {
    Pending => "PENDING",
    Running => "RUNNING",
    Completed => "COMPLETED",
    Failed => "FAILED",
});

impl JobStatus {
    /// Terminal rows are immutable and never polled again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Training lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrainingStatus {
    Training,
    Trained,
    Failed,
}

text_enum!(TrainingStatus {
    Training => "TRAINING",
    Trained => "TRAINED",
    Failed => "FAILED",
});

/// Inference lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InferenceStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

text_enum!(InferenceStatus {
    Pending => "PENDING",
    Processing => "PROCESSING",
    Completed => "COMPLETED",
    Failed => "FAILED",
});

/// Evaluation lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationStatus {
    Pending,
    Evaluating,
    Completed,
    Failed,
}

text_enum!(EvaluationStatus {
    Pending => "PENDING",
    Evaluating => "EVALUATING",
    Completed => "COMPLETED",
    Failed => "FAILED",
});

/// nnU-Net style evaluation configurations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EvalConfiguration {
    #[serde(rename = "2d")]
    TwoD,
    #[serde(rename = "3d_fullres")]
    ThreeDFullres,
    #[serde(rename = "3d_lowres")]
    ThreeDLowres,
    #[serde(rename = "3d_cascade_lowres")]
    ThreeDCascadeLowres,
}

text_enum!(EvalConfiguration {
    TwoD => "2d",
    ThreeDFullres => "3d_fullres",
    ThreeDLowres => "3d_lowres",
    ThreeDCascadeLowres => "3d_cascade_lowres",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_round_trip() {
        for status in [
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!("UNKNOWN".parse::<JobStatus>().is_err());
        assert!("pending".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_eval_configuration_strings() {
        assert_eq!(EvalConfiguration::TwoD.as_str(), "2d");
        assert_eq!(
            "3d_cascade_lowres".parse::<EvalConfiguration>().unwrap(),
            EvalConfiguration::ThreeDCascadeLowres
        );
        assert!("4d".parse::<EvalConfiguration>().is_err());
    }

    #[test]
    fn test_kind_serde_form() {
        let json = serde_json::to_string(&JobKind::Inference).unwrap();
        assert_eq!(json, "\"INFERENCE\"");
    }
}
