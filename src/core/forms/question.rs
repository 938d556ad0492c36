//! Polymorphic question model.
//!
//! A question is discriminated by its `kind`; each kind carries a distinct
//! options shape. Questions are embedded in the form row as a JSONB array,
//! so the serde representation doubles as the persistence format: a document
//! with an unknown or missing `kind` fails to deserialize and is therefore
//! rejected before it ever reaches the database.

use async_graphql::{Enum, SimpleObject, Union};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single question inside a form.
///
/// The wire/persistence shape is `{ id, title, description, required, kind,
/// options }` with `options` keyed by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub options: QuestionOptions,
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        self.options.kind()
    }
}

/// The registered question kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum QuestionKind {
    Paragraph,
    ShortAnswer,
    MultipleChoice,
    DropDown,
    CheckBoxList,
    FileUpload,
    LinearScale,
}

/// Kind-specific question options.
///
/// Serialized adjacently tagged, so the JSON carries `"kind": "Paragraph"`
/// next to an `"options"` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Union)]
#[serde(tag = "kind", content = "options")]
pub enum QuestionOptions {
    Paragraph(ParagraphOptions),
    ShortAnswer(ShortAnswerOptions),
    MultipleChoice(MultipleChoiceOptions),
    DropDown(DropDownOptions),
    CheckBoxList(CheckBoxListOptions),
    FileUpload(FileUploadOptions),
    LinearScale(LinearScaleOptions),
}

impl QuestionOptions {
    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionOptions::Paragraph(_) => QuestionKind::Paragraph,
            QuestionOptions::ShortAnswer(_) => QuestionKind::ShortAnswer,
            QuestionOptions::MultipleChoice(_) => QuestionKind::MultipleChoice,
            QuestionOptions::DropDown(_) => QuestionKind::DropDown,
            QuestionOptions::CheckBoxList(_) => QuestionKind::CheckBoxList,
            QuestionOptions::FileUpload(_) => QuestionKind::FileUpload,
            QuestionOptions::LinearScale(_) => QuestionKind::LinearScale,
        }
    }
}

/// Free-text validation rule for paragraph and short-answer questions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct TextValidation {
    pub kind: Option<TextValidationKind>,
    pub operation: Option<String>,
    pub argument: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
#[serde(rename_all = "lowercase")]
pub enum TextValidationKind {
    Number,
    Text,
    Length,
    Regex,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphOptions {
    pub validation: Option<TextValidation>,
}

/// Short answer extends the paragraph options with an input mask.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct ShortAnswerOptions {
    pub validation: Option<TextValidation>,
    pub mask: Option<String>,
}

/// One selectable item in a choice-style question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceItem {
    pub value: String,
    #[serde(default)]
    pub is_other: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceOptions {
    #[serde(default)]
    pub items: Vec<ChoiceItem>,
    pub shuffle_order: Option<bool>,
}

/// Same shape as multiple choice, under its own discriminator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct DropDownOptions {
    #[serde(default)]
    pub items: Vec<ChoiceItem>,
    pub shuffle_order: Option<bool>,
}

/// Checked-count validation rule for check box lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct CountValidation {
    pub kind: Option<CountValidationKind>,
    pub argument: Option<i32>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
#[serde(rename_all = "camelCase")]
pub enum CountValidationKind {
    AtLeast,
    AtMost,
    Exactly,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct CheckBoxListOptions {
    #[serde(default)]
    pub items: Vec<ChoiceItem>,
    pub shuffle_order: Option<bool>,
    pub validation: Option<CountValidation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadOptions {
    pub validation: Option<FileConstraints>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct FileConstraints {
    #[serde(default)]
    pub allowed_file_extensions: Vec<String>,
    pub maximum_number_of_files: Option<i32>,
    pub maximum_file_size: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct LinearScaleOptions {
    #[serde(default = "default_lower_scale_limit")]
    pub lower_scale_limit: i32,
    pub lower_scale_label: Option<String>,
    #[serde(default = "default_upper_scale_limit")]
    pub upper_scale_limit: i32,
    pub upper_scale_label: Option<String>,
}

fn default_lower_scale_limit() -> i32 {
    0
}

fn default_upper_scale_limit() -> i32 {
    5
}

impl Default for LinearScaleOptions {
    fn default() -> Self {
        Self {
            lower_scale_limit: default_lower_scale_limit(),
            lower_scale_label: None,
            upper_scale_limit: default_upper_scale_limit(),
            upper_scale_label: None,
        }
    }
}
