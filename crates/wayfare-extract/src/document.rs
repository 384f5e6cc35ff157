//! Media dispatch: plain text, PDF, and image documents all funnel into the
//! same indexer text path.

use serde_json::json;
use tracing::warn;

use crate::indexer::{truncate_chars, BookingIndexer, IndexReport};

/// A document handed to the core by the (external) storage layer.
#[derive(Debug, Clone)]
pub struct IncomingDocument {
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// Title or filename hint from the sender.
    pub title: String,
    pub tags: String,
    /// Stable id assigned by the storage layer.
    pub source_id: String,
    /// Public reference for image documents, used by the vision extractor.
    pub image_ref: Option<String>,
}

impl BookingIndexer {
    /// Dispatch a document by content type and index it.
    ///
    /// PDFs have text extracted page by page up to the configured page cap.
    /// Images go through the vision extractor first; its JSON result is
    /// serialized back to text and fed through the same text path, so the
    /// merge policy applies uniformly.
    pub async fn index_document(&self, waid: &str, doc: &IncomingDocument) -> IndexReport {
        let content_type = doc.content_type.to_ascii_lowercase();

        if content_type.starts_with("text/") {
            let text = String::from_utf8_lossy(&doc.bytes).into_owned();
            let excerpt = doc_excerpt(doc, &text);
            return self
                .index_text(waid, &text, Some(&doc.source_id), &excerpt)
                .await;
        }

        if content_type == "application/pdf" || doc.title.to_ascii_lowercase().ends_with(".pdf") {
            let text = match pdf_extract::extract_text_from_mem(&doc.bytes) {
                Ok(text) => text,
                Err(e) => {
                    warn!("PDF text extraction failed for {}: {}", doc.source_id, e);
                    return IndexReport::default();
                }
            };
            // pdf-extract separates pages with form feeds
            let capped: Vec<&str> = text.split('\u{0c}').take(self.pdf_page_cap()).collect();
            let text = capped.join("\n");
            let excerpt = doc_excerpt(doc, &text);
            return self
                .index_text(waid, &text, Some(&doc.source_id), &excerpt)
                .await;
        }

        if content_type.starts_with("image/") {
            let image_ref = match doc.image_ref.as_deref() {
                Some(url) => url,
                None => {
                    warn!("Image document {} has no reference to read", doc.source_id);
                    return IndexReport::default();
                }
            };
            let hint = format!("File name: {}", doc.title);
            let (candidates, _reason) = self
                .extractor()
                .extract_image(image_ref, &hint)
                .await
                .into_parts();
            // Re-serialize the vision result and reuse the text path
            let text = json!(candidates).to_string();
            let excerpt = format!("vision:{}", doc.title);
            return self
                .index_text(waid, &text, Some(&doc.source_id), &excerpt)
                .await;
        }

        warn!(
            "Unsupported content type {} for document {}",
            doc.content_type, doc.source_id
        );
        IndexReport::default()
    }
}

fn doc_excerpt(doc: &IncomingDocument, text: &str) -> String {
    format!("{}\n{}\n{}", doc.title, doc.tags, truncate_chars(text, 4000))
}
