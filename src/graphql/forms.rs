//! Form GraphQL resolvers, output wrappers and input types.
//!
//! Input question options mirror the domain options as a oneof object, so a
//! submitted question carries exactly one kind-specific options shape and the
//! discriminated domain enum is built before anything touches the store.

use async_graphql::{
    Context, ErrorExtensions, InputObject, Object, OneofObject, Result, SimpleObject,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::db::models::{Form, FormPage, FormUpdate, NewForm};
use crate::core::db::repositories::form::FormQuery;
use crate::core::forms::question::{
    CheckBoxListOptions, ChoiceItem, CountValidation, CountValidationKind, DropDownOptions,
    FileConstraints, FileUploadOptions, LinearScaleOptions, MultipleChoiceOptions,
    ParagraphOptions, Question, QuestionKind, QuestionOptions, ShortAnswerOptions, TextValidation,
    TextValidationKind,
};
use crate::core::forms::{FormError, FormService};
use crate::graphql::context::current_user;

// ============================================================================
// Output types
// ============================================================================

#[Object(name = "Form")]
impl Form {
    async fn id(&self) -> Uuid {
        self.id
    }

    async fn title(&self) -> &str {
        &self.title
    }

    async fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    async fn user_id(&self) -> Uuid {
        self.user_id
    }

    async fn enabled(&self) -> bool {
        self.enabled
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    async fn questions(&self) -> &[Question] {
        &self.questions.0
    }
}

#[Object(name = "Question")]
impl Question {
    async fn id(&self) -> Uuid {
        self.id
    }

    async fn title(&self) -> &str {
        &self.title
    }

    async fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    async fn required(&self) -> bool {
        self.required
    }

    #[graphql(name = "kind")]
    async fn question_kind(&self) -> QuestionKind {
        self.kind()
    }

    async fn options(&self) -> &QuestionOptions {
        &self.options
    }
}

#[Object(name = "FormPage")]
impl FormPage {
    async fn total_count(&self) -> i64 {
        self.total_count
    }

    async fn forms(&self) -> &[Form] {
        &self.forms
    }
}

/// Result of a delete mutation.
#[derive(SimpleObject)]
pub struct DeleteFormPayload {
    pub success: bool,
    pub form_id: Uuid,
}

// ============================================================================
// Input types
// ============================================================================

#[derive(InputObject)]
pub struct TextValidationInput {
    pub kind: Option<TextValidationKind>,
    pub operation: Option<String>,
    pub argument: Option<String>,
    pub error_message: Option<String>,
}

impl From<TextValidationInput> for TextValidation {
    fn from(input: TextValidationInput) -> Self {
        Self {
            kind: input.kind,
            operation: input.operation,
            argument: input.argument,
            error_message: input.error_message,
        }
    }
}

#[derive(InputObject)]
pub struct CountValidationInput {
    pub kind: Option<CountValidationKind>,
    pub argument: Option<i32>,
    pub error_message: Option<String>,
}

impl From<CountValidationInput> for CountValidation {
    fn from(input: CountValidationInput) -> Self {
        Self {
            kind: input.kind,
            argument: input.argument,
            error_message: input.error_message,
        }
    }
}

#[derive(InputObject)]
pub struct ChoiceItemInput {
    pub value: String,
    #[graphql(default)]
    pub is_other: bool,
}

impl From<ChoiceItemInput> for ChoiceItem {
    fn from(input: ChoiceItemInput) -> Self {
        Self {
            value: input.value,
            is_other: input.is_other,
        }
    }
}

#[derive(InputObject)]
pub struct ParagraphOptionsInput {
    pub validation: Option<TextValidationInput>,
}

#[derive(InputObject)]
pub struct ShortAnswerOptionsInput {
    pub validation: Option<TextValidationInput>,
    pub mask: Option<String>,
}

#[derive(InputObject)]
pub struct MultipleChoiceOptionsInput {
    #[graphql(default)]
    pub items: Vec<ChoiceItemInput>,
    pub shuffle_order: Option<bool>,
}

#[derive(InputObject)]
pub struct DropDownOptionsInput {
    #[graphql(default)]
    pub items: Vec<ChoiceItemInput>,
    pub shuffle_order: Option<bool>,
}

#[derive(InputObject)]
pub struct CheckBoxListOptionsInput {
    #[graphql(default)]
    pub items: Vec<ChoiceItemInput>,
    pub shuffle_order: Option<bool>,
    pub validation: Option<CountValidationInput>,
}

#[derive(InputObject)]
pub struct FileConstraintsInput {
    #[graphql(default)]
    pub allowed_file_extensions: Vec<String>,
    pub maximum_number_of_files: Option<i32>,
    pub maximum_file_size: Option<i64>,
}

#[derive(InputObject)]
pub struct FileUploadOptionsInput {
    pub validation: Option<FileConstraintsInput>,
}

#[derive(InputObject)]
pub struct LinearScaleOptionsInput {
    #[graphql(default = 0)]
    pub lower_scale_limit: i32,
    pub lower_scale_label: Option<String>,
    #[graphql(default = 5)]
    pub upper_scale_limit: i32,
    pub upper_scale_label: Option<String>,
}

/// Exactly one kind-specific options shape per question.
#[derive(OneofObject)]
pub enum QuestionOptionsInput {
    Paragraph(ParagraphOptionsInput),
    ShortAnswer(ShortAnswerOptionsInput),
    MultipleChoice(MultipleChoiceOptionsInput),
    DropDown(DropDownOptionsInput),
    CheckBoxList(CheckBoxListOptionsInput),
    FileUpload(FileUploadOptionsInput),
    LinearScale(LinearScaleOptionsInput),
}

impl From<QuestionOptionsInput> for QuestionOptions {
    fn from(input: QuestionOptionsInput) -> Self {
        match input {
            QuestionOptionsInput::Paragraph(o) => QuestionOptions::Paragraph(ParagraphOptions {
                validation: o.validation.map(Into::into),
            }),
            QuestionOptionsInput::ShortAnswer(o) => {
                QuestionOptions::ShortAnswer(ShortAnswerOptions {
                    validation: o.validation.map(Into::into),
                    mask: o.mask,
                })
            }
            QuestionOptionsInput::MultipleChoice(o) => {
                QuestionOptions::MultipleChoice(MultipleChoiceOptions {
                    items: o.items.into_iter().map(Into::into).collect(),
                    shuffle_order: o.shuffle_order,
                })
            }
            QuestionOptionsInput::DropDown(o) => QuestionOptions::DropDown(DropDownOptions {
                items: o.items.into_iter().map(Into::into).collect(),
                shuffle_order: o.shuffle_order,
            }),
            QuestionOptionsInput::CheckBoxList(o) => {
                QuestionOptions::CheckBoxList(CheckBoxListOptions {
                    items: o.items.into_iter().map(Into::into).collect(),
                    shuffle_order: o.shuffle_order,
                    validation: o.validation.map(Into::into),
                })
            }
            QuestionOptionsInput::FileUpload(o) => QuestionOptions::FileUpload(FileUploadOptions {
                validation: o.validation.map(|v| FileConstraints {
                    allowed_file_extensions: v.allowed_file_extensions,
                    maximum_number_of_files: v.maximum_number_of_files,
                    maximum_file_size: v.maximum_file_size,
                }),
            }),
            QuestionOptionsInput::LinearScale(o) => {
                QuestionOptions::LinearScale(LinearScaleOptions {
                    lower_scale_limit: o.lower_scale_limit,
                    lower_scale_label: o.lower_scale_label,
                    upper_scale_limit: o.upper_scale_limit,
                    upper_scale_label: o.upper_scale_label,
                })
            }
        }
    }
}

#[derive(InputObject)]
pub struct QuestionInput {
    pub id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    #[graphql(default)]
    pub required: bool,
    pub options: QuestionOptionsInput,
}

impl From<QuestionInput> for Question {
    fn from(input: QuestionInput) -> Self {
        Self {
            id: input.id.unwrap_or_else(Uuid::new_v4),
            title: input.title,
            description: input.description,
            required: input.required,
            options: input.options.into(),
        }
    }
}

#[derive(InputObject)]
pub struct CreateFormInput {
    pub title: String,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    #[graphql(default)]
    pub questions: Vec<QuestionInput>,
}

#[derive(InputObject)]
pub struct UpdateFormInput {
    pub form_id: String,
    pub title: String,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub questions: Option<Vec<QuestionInput>>,
}

#[derive(InputObject)]
pub struct FindFormsInput {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
}

const MAX_PAGE_SIZE: i64 = 100;

impl From<FindFormsInput> for FormQuery {
    fn from(input: FindFormsInput) -> Self {
        let defaults = FormQuery::default();
        Self {
            // negative paging from the client is nonsense, not an error
            page: input.page.unwrap_or(defaults.page).max(0),
            page_size: input
                .page_size
                .unwrap_or(defaults.page_size)
                .clamp(1, MAX_PAGE_SIZE),
            search: input.search,
        }
    }
}

/// Mutation ids must parse; anything else is the invalid-object-id error.
fn parse_form_id(form_id: &str) -> Result<Uuid> {
    Uuid::parse_str(form_id).map_err(|_| FormError::InvalidObjectId.extend())
}

// ============================================================================
// Resolvers
// ============================================================================

#[derive(Default)]
pub struct FormQueryRoot;

#[Object]
impl FormQueryRoot {
    /// A single form owned by the signed-in user. An unknown or malformed
    /// id resolves to null.
    async fn form(&self, ctx: &Context<'_>, form_id: String) -> Result<Option<Form>> {
        let Ok(id) = Uuid::parse_str(&form_id) else {
            return Ok(None);
        };

        self.service(ctx)
            .find_by_id(current_user(ctx), id)
            .await
            .map_err(|e| e.extend())
    }

    /// The signed-in user's forms, newest first.
    async fn forms(&self, ctx: &Context<'_>, input: Option<FindFormsInput>) -> Result<FormPage> {
        let query = input.map(FormQuery::from).unwrap_or_default();

        self.service(ctx)
            .find(current_user(ctx), query)
            .await
            .map_err(|e| e.extend())
    }
}

impl FormQueryRoot {
    fn service<'a>(&self, ctx: &Context<'a>) -> &'a FormService {
        ctx.data_unchecked::<FormService>()
    }
}

#[derive(Default)]
pub struct FormMutationRoot;

#[Object]
impl FormMutationRoot {
    /// Create a form owned by the signed-in user.
    async fn create_form(&self, ctx: &Context<'_>, input: CreateFormInput) -> Result<Form> {
        let new_form = NewForm {
            title: input.title,
            description: input.description,
            enabled: input.enabled,
            questions: input.questions.into_iter().map(Into::into).collect(),
        };

        ctx.data_unchecked::<FormService>()
            .create(current_user(ctx), new_form)
            .await
            .map_err(|e| e.extend())
    }

    /// Update a form the signed-in user owns.
    async fn update_form(&self, ctx: &Context<'_>, input: UpdateFormInput) -> Result<Form> {
        let update = FormUpdate {
            id: parse_form_id(&input.form_id)?,
            title: input.title,
            description: input.description,
            enabled: input.enabled,
            questions: input
                .questions
                .map(|qs| qs.into_iter().map(Into::into).collect()),
        };

        ctx.data_unchecked::<FormService>()
            .update(current_user(ctx), update)
            .await
            .map_err(|e| e.extend())
    }

    /// Soft-delete a form the signed-in user owns.
    async fn delete_form(&self, ctx: &Context<'_>, form_id: String) -> Result<DeleteFormPayload> {
        let id = parse_form_id(&form_id)?;

        ctx.data_unchecked::<FormService>()
            .delete(current_user(ctx), id)
            .await
            .map_err(|e| e.extend())?;

        Ok(DeleteFormPayload {
            success: true,
            form_id: id,
        })
    }
}
