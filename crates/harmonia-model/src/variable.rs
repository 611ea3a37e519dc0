use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Declared storage type of a collected variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VariableType {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    Date,
}

impl VariableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::String => "STRING",
            VariableType::Integer => "INTEGER",
            VariableType::Number => "NUMBER",
            VariableType::Boolean => "BOOLEAN",
            VariableType::Date => "DATE",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, VariableType::Integer | VariableType::Number)
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VariableType {
    type Err = ModelError;

    /// Case-insensitive; accepts the common aliases found in questionnaire metadata.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "STRING" | "TEXT" => Ok(VariableType::String),
            "INTEGER" | "INT" => Ok(VariableType::Integer),
            "NUMBER" | "NUMERIC" | "DECIMAL" => Ok(VariableType::Number),
            "BOOLEAN" | "BOOL" => Ok(VariableType::Boolean),
            "DATE" => Ok(VariableType::Date),
            _ => Err(ModelError::UnknownVariableType(s.to_string())),
        }
    }
}

/// One answer option of a single-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modality {
    pub value: String,
    #[serde(default)]
    pub label: String,
    /// Indicator variable carrying this modality in paper data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_name: Option<String>,
}

impl Modality {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            variable_name: None,
        }
    }

    pub fn with_variable(mut self, variable_name: impl Into<String>) -> Self {
        self.variable_name = Some(variable_name.into());
        self
    }
}

/// What kind of question a variable encodes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VariableKind {
    #[default]
    Plain,
    /// Single-choice question with its ordered modalities.
    Ucq {
        #[serde(default)]
        modalities: Vec<Modality>,
    },
    /// One modality of a multiple-choice question.
    Mcq {
        question_name: String,
        #[serde(default)]
        label: String,
    },
    /// Paper-only boolean indicator for one modality of a single-choice question.
    PaperUcq {
        ucq_name: String,
        modality_value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub group_name: String,
    #[serde(default, rename = "type")]
    pub variable_type: VariableType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_name: Option<String>,
    #[serde(default)]
    pub in_question_grid: bool,
    #[serde(default)]
    pub kind: VariableKind,
}

impl Variable {
    pub fn new(
        name: impl Into<String>,
        group_name: impl Into<String>,
        variable_type: VariableType,
    ) -> Self {
        Self {
            name: name.into(),
            group_name: group_name.into(),
            variable_type,
            length: None,
            format: None,
            question_name: None,
            in_question_grid: false,
            kind: VariableKind::Plain,
        }
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_question(mut self, question_name: impl Into<String>) -> Self {
        self.question_name = Some(question_name.into());
        self
    }

    pub fn with_kind(mut self, kind: VariableKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_paper_ucq(&self) -> bool {
        matches!(self.kind, VariableKind::PaperUcq { .. })
    }

    /// Modalities of a single-choice question, empty for every other kind.
    pub fn modalities(&self) -> &[Modality] {
        match &self.kind {
            VariableKind::Ucq { modalities } => modalities,
            _ => &[],
        }
    }

    /// Adds a modality to a single-choice question.
    ///
    /// Returns false when the variable is not a UCQ or when a modality with the
    /// same value and indicator variable is already present.
    pub fn add_modality(&mut self, modality: Modality) -> bool {
        let VariableKind::Ucq { modalities } = &mut self.kind else {
            return false;
        };
        let duplicate = modalities.iter().any(|existing| {
            existing.value == modality.value && existing.variable_name == modality.variable_name
        });
        if duplicate {
            return false;
        }
        modalities.push(modality);
        true
    }
}
