use tracing::debug;

use super::ExtractionError;

/// Text layer of a PDF, one entry per page in page order.
///
/// Pages without a text layer (scanned images) are kept as empty segments so
/// the page count always matches the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub pages: Vec<String>,
}

impl ExtractedText {
    pub fn from_pages(pages: Vec<String>) -> Self {
        Self {
            pages: pages.into_iter().map(|p| p.trim().to_string()).collect(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All pages concatenated in order, newline-separated.
    pub fn joined(&self) -> String {
        self.pages.join("\n")
    }
}

/// Extracts the text layer of every page. Fails only if the document itself cannot be parsed.
pub fn extract_text(bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractionError::Parse(e.to_string()))?;
    let extracted = ExtractedText::from_pages(pages);
    debug!("Extracted text layer from {} pages", extracted.page_count());
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    use super::*;

    /// Builds a PDF with one page per entry; an empty entry gives a page with no text.
    fn pdf_with_pages(texts: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in texts {
            let operations = if text.is_empty() {
                Vec::new()
            } else {
                vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ]
            };
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_real_pdf_yields_one_segment_per_page() {
        let pdf = pdf_with_pages(&["Alpha", "", "Gamma"]);

        let extracted = extract_text(&pdf).unwrap();

        assert_eq!(extracted.pages, vec!["Alpha", "", "Gamma"]);
        assert_eq!(extracted.joined(), "Alpha\n\nGamma");
    }

    #[test]
    fn test_pages_map_one_to_one() {
        let extracted = ExtractedText::from_pages(vec![
            "5 years Go microservices".to_string(),
            "some Kubernetes".to_string(),
        ]);
        assert_eq!(extracted.page_count(), 2);
        assert_eq!(extracted.joined(), "5 years Go microservices\nsome Kubernetes");
    }

    #[test]
    fn test_image_only_page_keeps_empty_segment() {
        let extracted = ExtractedText::from_pages(vec![
            "Summary".to_string(),
            "  \n\t".to_string(),
            "Experience".to_string(),
        ]);
        assert_eq!(extracted.page_count(), 3);
        assert_eq!(extracted.pages[1], "");
        assert_eq!(extracted.joined(), "Summary\n\nExperience");
    }

    #[test]
    fn test_garbage_bytes_are_a_parse_error() {
        let err = extract_text(b"not a pdf at all").unwrap_err();
        assert!(matches!(err, ExtractionError::Parse(_)));
    }
}
