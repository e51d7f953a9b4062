//! Multipart form reading shared by the analyze and chat handlers.

use std::collections::HashMap;

use axum::extract::Multipart;
use serde::de::DeserializeOwned;

use crate::document::ResumeDocument;
use crate::errors::AppError;

/// Name of the multipart field carrying the resume file.
pub const RESUME_FIELD: &str = "resume";

#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub resume: Option<ResumeDocument>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == RESUME_FIELD {
                let file_name = field.file_name().map(String::from);
                let content_type = field.content_type().map(String::from);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read resume upload: {e}")))?;
                form.resume = ResumeDocument::from_upload(bytes, file_name, content_type);
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read field '{name}': {e}")))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Text value of a field, empty string when absent.
    pub fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    /// Parses a snake_case enum field. Absent or blank means `None`.
    pub fn choice<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, AppError> {
        match self.fields.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
            None => Ok(None),
            Some(value) => serde_json::from_value(serde_json::Value::String(value.to_string()))
                .map(Some)
                .map_err(|_| AppError::Validation(format!("Unknown value '{value}' for field '{name}'"))),
        }
    }

    /// Parses a field holding a JSON document.
    pub fn json<T: DeserializeOwned>(&self, name: &str) -> Result<T, AppError> {
        let raw = self
            .fields
            .get(name)
            .ok_or_else(|| AppError::Validation(format!("Missing field '{name}'")))?;
        serde_json::from_str(raw)
            .map_err(|e| AppError::Validation(format!("Field '{name}' is not valid JSON: {e}")))
    }
}
