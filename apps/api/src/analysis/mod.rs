//! Single-shot analysis: resume + job description in, model verdict and video suggestions out.
//!
//! Flow: require resume → extract → build prompt → generate → video lookup.
//! The resume check happens before any outbound call.

use std::sync::Arc;

use anyhow::anyhow;
use serde::Serialize;
use tracing::info;

use crate::document::{
    self, ExtractionError, ExtractionStrategy, PageRasterizer, ResumeContent, ResumeDocument,
};
use crate::errors::AppError;
use crate::llm_client::TextGenerator;
use crate::videos::{lookup_or_degrade, VideoLookup, VideoSearch};

pub mod handlers;
pub mod prompts;

use prompts::{build_prompt, PromptTemplate};

/// The outbound collaborators one analysis needs. Cheap to clone.
#[derive(Clone)]
pub struct Pipeline {
    pub llm: Arc<dyn TextGenerator>,
    pub videos: Arc<dyn VideoSearch>,
    pub rasterizer: Arc<dyn PageRasterizer>,
    pub max_video_results: u32,
}

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub template: PromptTemplate,
    pub job_description: String,
    pub resume: Option<ResumeDocument>,
    pub strategy: ExtractionStrategy,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub template: PromptTemplate,
    /// Displayed verbatim. Never parsed, even for templates that ask for structured output.
    pub reply: String,
    pub videos: VideoLookup,
}

/// Model reply plus the suggestions that accompany it.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub reply: String,
    pub videos: VideoLookup,
}

impl Pipeline {
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisReport, AppError> {
        let resume = ResumeDocument::require(request.resume)?;
        let content = self.extract(&resume, request.strategy).await?;

        let evaluation = self
            .evaluate(request.template, &request.job_description, Some(&content))
            .await?;

        info!(
            "Analysis complete: template={:?}, reply_chars={}, videos={}, videos_degraded={}",
            request.template,
            evaluation.reply.len(),
            evaluation.videos.videos().len(),
            evaluation.videos.is_degraded()
        );

        Ok(AnalysisReport {
            template: request.template,
            reply: evaluation.reply,
            videos: evaluation.videos,
        })
    }

    pub async fn extract(
        &self,
        resume: &ResumeDocument,
        strategy: ExtractionStrategy,
    ) -> Result<ResumeContent, AppError> {
        document::extract(resume, strategy, self.rasterizer.clone())
            .await
            .map_err(|e| match e {
                // A crashed worker says nothing about the upload.
                ExtractionError::Task(reason) => {
                    AppError::Internal(anyhow!("resume extraction task failed: {reason}"))
                }
                other => AppError::Extraction(other),
            })
    }

    /// Prompt → model → video lookup. Model failures are fatal; video failures degrade.
    pub async fn evaluate(
        &self,
        template: PromptTemplate,
        input: &str,
        resume: Option<&ResumeContent>,
    ) -> Result<Evaluation, AppError> {
        let prompt = build_prompt(template, input, resume);

        let reply = self
            .llm
            .generate(&prompt)
            .await
            .map_err(|e| AppError::Llm(format!("Resume evaluation failed: {e}")))?;

        let query = template.video_query(&reply);
        let videos = lookup_or_degrade(self.videos.as_ref(), &query, self.max_video_results).await;

        Ok(Evaluation { reply, videos })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::llm_client::PromptPart;
    use crate::test_support::{FakeGenerator, FakeServices, FakeVideoSearch};

    const JD: &str = "Backend engineer, Go, Kubernetes";

    fn pdf_upload() -> Option<ResumeDocument> {
        ResumeDocument::from_upload(
            Bytes::from_static(b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n"),
            Some("resume.pdf".to_string()),
            Some("application/pdf".to_string()),
        )
    }

    fn request(template: PromptTemplate, resume: Option<ResumeDocument>) -> AnalysisRequest {
        AnalysisRequest {
            template,
            job_description: JD.to_string(),
            resume,
            strategy: ExtractionStrategy::Image,
        }
    }

    #[tokio::test]
    async fn test_missing_resume_makes_no_outbound_calls() {
        let services = FakeServices::new(
            FakeGenerator::replying("unused"),
            FakeVideoSearch::with_videos(&["unused"]),
        );

        let err = services
            .pipeline()
            .analyze(request(PromptTemplate::PercentageMatch, None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MissingInput(_)));
        assert_eq!(services.outbound_calls(), 0);
    }

    #[tokio::test]
    async fn test_image_strategy_sends_single_page_attachment() {
        let services = FakeServices::new(
            FakeGenerator::replying("Strong Go background; limited Kubernetes depth."),
            FakeVideoSearch::with_videos(&["ATS tips"]),
        );

        let report = services
            .pipeline()
            .analyze(request(PromptTemplate::GeneralReview, pdf_upload()))
            .await
            .unwrap();

        assert_eq!(report.reply, "Strong Go background; limited Kubernetes depth.");
        assert_eq!(report.videos.videos().len(), 1);
        assert_eq!(services.rasterizer.calls(), 1);

        let prompt = services.llm.last_prompt().unwrap();
        assert_eq!(prompt.image_count(), 1);
        match &prompt.parts[1] {
            PromptPart::InlineImage(image) => assert_eq!(image.mime_type, "image/jpeg"),
            other => panic!("expected inline image, got {other:?}"),
        }
        assert_eq!(services.videos.queries(), vec!["how to improve resume for ATS"]);
    }

    #[tokio::test]
    async fn test_percentage_match_reply_is_opaque_text() {
        let reply = "JD Match: 72%\nMissingKeywords: Helm, Terraform\nProfile Summary: solid Go.";
        let services = FakeServices::new(
            FakeGenerator::replying(reply),
            FakeVideoSearch::with_videos(&["A", "B"]),
        );

        let report = services
            .pipeline()
            .analyze(request(PromptTemplate::PercentageMatch, pdf_upload()))
            .await
            .unwrap();

        assert_eq!(report.reply, reply);
        assert!(report.reply.contains('%'));
        assert_eq!(services.videos.queries(), vec!["ATS resume optimization tips"]);
    }

    #[tokio::test]
    async fn test_degraded_videos_keep_analysis_text() {
        let services = FakeServices::new(
            FakeGenerator::replying("Good fit overall."),
            FakeVideoSearch::with_lookup(VideoLookup::Degraded {
                reason: "search API returned 500 Internal Server Error".to_string(),
            }),
        );

        let report = services
            .pipeline()
            .analyze(request(PromptTemplate::GeneralReview, pdf_upload()))
            .await
            .unwrap();

        assert_eq!(report.reply, "Good fit overall.");
        assert!(report.videos.videos().is_empty());
        assert!(report.videos.is_degraded());
    }

    #[tokio::test]
    async fn test_empty_video_results_keep_analysis_text() {
        let services = FakeServices::new(
            FakeGenerator::replying("Good fit overall."),
            FakeVideoSearch::with_videos(&[]),
        );

        let report = services
            .pipeline()
            .analyze(request(PromptTemplate::GeneralReview, pdf_upload()))
            .await
            .unwrap();

        assert_eq!(report.reply, "Good fit overall.");
        assert_eq!(report.videos, VideoLookup::Found { videos: vec![] });
    }

    #[tokio::test]
    async fn test_llm_failure_is_fatal_and_skips_videos() {
        let services = FakeServices::new(
            FakeGenerator::failing(503, "model overloaded"),
            FakeVideoSearch::with_videos(&["unused"]),
        );

        let err = services
            .pipeline()
            .analyze(request(PromptTemplate::GeneralReview, pdf_upload()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Llm(_)));
        assert_eq!(services.llm.calls(), 1);
        assert_eq!(services.videos.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_pdf_upload_is_extraction_error() {
        let services = FakeServices::new(
            FakeGenerator::replying("unused"),
            FakeVideoSearch::with_videos(&[]),
        );
        let upload = ResumeDocument::from_upload(Bytes::from_static(b"plain text"), None, None);

        let err = services
            .pipeline()
            .analyze(request(PromptTemplate::GeneralReview, upload))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Extraction(_)));
        assert_eq!(services.llm.calls(), 0);
    }

    struct CrashingRasterizer;

    impl PageRasterizer for CrashingRasterizer {
        fn render_first_page(&self, _pdf: &[u8]) -> Result<image::DynamicImage, ExtractionError> {
            panic!("renderer crashed");
        }
    }

    #[tokio::test]
    async fn test_crashed_extraction_worker_is_internal_error() {
        let services = FakeServices::new(
            FakeGenerator::replying("unused"),
            FakeVideoSearch::with_videos(&[]),
        );
        let pipeline = Pipeline {
            rasterizer: Arc::new(CrashingRasterizer),
            ..services.pipeline()
        };

        let err = pipeline
            .analyze(request(PromptTemplate::GeneralReview, pdf_upload()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(services.llm.calls(), 0);
        assert_eq!(services.videos.calls(), 0);
    }

    #[tokio::test]
    async fn test_scenario_percentage_match_with_text_resume() {
        let services = FakeServices::new(
            FakeGenerator::replying(
                r#"{"JD Match": "78%", "MissingKeywords": ["Helm"], "Profile Summary": "Strong Go."}"#,
            ),
            FakeVideoSearch::with_videos(&["ATS optimization"]),
        );
        let resume = ResumeContent::Text {
            text: "5 years Go microservices, some Kubernetes".to_string(),
        };

        let evaluation = services
            .pipeline()
            .evaluate(PromptTemplate::PercentageMatch, JD, Some(&resume))
            .await
            .unwrap();

        assert!(!evaluation.reply.is_empty());
        assert!(evaluation.reply.contains('%'));
        let prompt = services.llm.last_prompt().unwrap();
        let texts: Vec<_> = prompt.text_parts().collect();
        assert!(texts[1].contains("5 years Go microservices, some Kubernetes"));
        assert!(texts[2].contains("Backend engineer, Go, Kubernetes"));
    }
}
