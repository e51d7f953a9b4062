//! Prompt Builder: fixed templates filled by placeholder substitution.

use serde::{Deserialize, Serialize};

use crate::document::ResumeContent;
use crate::llm_client::{Prompt, PromptPart};

/// Instructions for the narrative fit review.
pub const GENERAL_REVIEW_INSTRUCTIONS: &str = "\
You are an experienced Technical Human Resource Manager. \
Your task is to review the provided resume against the job description. \
Please share your professional evaluation on whether the candidate's profile aligns with the role. \
Highlight the strengths and weaknesses of the applicant in relation to the specified job requirements.";

/// Instructions for the percentage match. The requested shape is never parsed.
pub const PERCENTAGE_MATCH_INSTRUCTIONS: &str = r#"You are a skilled ATS (Applicant Tracking System) scanner with a deep understanding of data science and ATS functionality.
Your task is to evaluate the resume against the provided job description.
Give me the percentage of match if the resume matches the job description.
First, the output should come as a percentage, then list keywords missing, and finally provide final thoughts.
Reply in this shape:
{"JD Match": "<percentage>%", "MissingKeywords": ["<keyword>"], "Profile Summary": "<final thoughts>"}"#;

/// Instructions for a chat turn that carries a resume.
pub const CHAT_WITH_RESUME_INSTRUCTIONS: &str = "\
You are a helpful career assistant specialised in resumes and ATS screening. \
Answer the user's message using the resume provided below. Be concise and specific.";

/// Resume text part. Replace `{resume_text}`.
pub const RESUME_TEXT_TEMPLATE: &str = "Resume:\n{resume_text}";

/// Job description part. Replace `{job_description}`.
pub const JOB_DESCRIPTION_TEMPLATE: &str = "Job Description:\n{job_description}";

/// User message part for chat turns with a resume. Replace `{message}`.
pub const CHAT_MESSAGE_TEMPLATE: &str = "User message:\n{message}";

const FALLBACK_VIDEO_QUERY: &str = "resume tips";
const MAX_DERIVED_QUERY_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptTemplate {
    #[default]
    GeneralReview,
    PercentageMatch,
    /// Free-form completion. Without a resume the input is sent as a direct query.
    Chat,
}

impl PromptTemplate {
    pub fn requires_resume(self) -> bool {
        !matches!(self, PromptTemplate::Chat)
    }

    /// Fixed video query for the template; `None` means derive it from the reply.
    pub fn fixed_video_query(self) -> Option<&'static str> {
        match self {
            PromptTemplate::GeneralReview => Some("how to improve resume for ATS"),
            PromptTemplate::PercentageMatch => Some("ATS resume optimization tips"),
            PromptTemplate::Chat => None,
        }
    }

    pub fn video_query(self, reply: &str) -> String {
        self.fixed_video_query()
            .map(String::from)
            .unwrap_or_else(|| derive_video_query(reply))
    }
}

/// Builds the ordered prompt parts: instructions, resume, then the job description or message.
pub fn build_prompt(
    template: PromptTemplate,
    job_description: &str,
    resume: Option<&ResumeContent>,
) -> Prompt {
    let mut parts = Vec::with_capacity(3);

    match (template, resume) {
        (PromptTemplate::Chat, None) => {
            parts.push(PromptPart::Text(job_description.to_string()));
        }
        (PromptTemplate::Chat, Some(resume)) => {
            parts.push(PromptPart::Text(CHAT_WITH_RESUME_INSTRUCTIONS.to_string()));
            parts.push(resume_part(resume));
            parts.push(PromptPart::Text(
                CHAT_MESSAGE_TEMPLATE.replace("{message}", job_description),
            ));
        }
        (template, resume) => {
            let instructions = match template {
                PromptTemplate::PercentageMatch => PERCENTAGE_MATCH_INSTRUCTIONS,
                _ => GENERAL_REVIEW_INSTRUCTIONS,
            };
            parts.push(PromptPart::Text(instructions.to_string()));
            if let Some(resume) = resume {
                parts.push(resume_part(resume));
            }
            parts.push(PromptPart::Text(
                JOB_DESCRIPTION_TEMPLATE.replace("{job_description}", job_description),
            ));
        }
    }

    Prompt { parts }
}

fn resume_part(resume: &ResumeContent) -> PromptPart {
    match resume {
        ResumeContent::Text { text } => {
            PromptPart::Text(RESUME_TEXT_TEMPLATE.replace("{resume_text}", text))
        }
        ResumeContent::Image(image) => PromptPart::InlineImage(image.clone()),
    }
}

/// First non-empty line of the reply, stripped of markdown markers and capped in length.
fn derive_video_query(reply: &str) -> String {
    let line = reply
        .lines()
        .map(|l| l.trim_matches(|c: char| c.is_whitespace() || matches!(c, '#' | '*' | '-' | '>' | '_' | '`')))
        .find(|l| !l.is_empty());

    match line {
        Some(line) => line.chars().take(MAX_DERIVED_QUERY_CHARS).collect::<String>().trim().to_string(),
        None => FALLBACK_VIDEO_QUERY.to_string(),
    }
}
