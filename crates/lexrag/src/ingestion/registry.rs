//! Format tag to extractor dispatch

use std::collections::HashMap;
use std::sync::Arc;

use super::parser::{CsvExtractor, DocxExtractor, Extractor, PdfExtractor, PptxExtractor, XlsxExtractor};
use crate::error::{Error, Result};
use crate::types::FileType;

/// Maps each supported format to the extractor that reads it
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<FileType, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with an extractor for every supported format
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfExtractor));
        registry.register(Arc::new(DocxExtractor));
        registry.register(Arc::new(PptxExtractor));
        registry.register(Arc::new(XlsxExtractor));
        registry.register(Arc::new(CsvExtractor));
        registry
    }

    /// Add or replace the extractor for its format
    pub fn register(&mut self, extractor: Arc<dyn Extractor>) {
        self.extractors.insert(extractor.file_type(), extractor);
    }

    pub fn get(&self, file_type: FileType) -> Option<&Arc<dyn Extractor>> {
        self.extractors.get(&file_type)
    }

    pub fn supports(&self, file_type: FileType) -> bool {
        self.extractors.contains_key(&file_type)
    }

    /// Resolve the upload's format and extract its text
    pub fn extract(
        &self,
        declared_mime: Option<&str>,
        filename: &str,
        data: &[u8],
    ) -> Result<(FileType, String)> {
        let file_type = FileType::detect(declared_mime, filename).ok_or_else(|| {
            Error::UnsupportedFormat(
                declared_mime
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or(filename)
                    .to_string(),
            )
        })?;

        let extractor = self
            .get(file_type)
            .ok_or_else(|| Error::UnsupportedFormat(file_type.mime_type().to_string()))?;

        let text = extractor.extract(filename, data)?;
        Ok((file_type, text))
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut formats: Vec<_> = self.extractors.keys().map(FileType::display_name).collect();
        formats.sort_unstable();
        f.debug_struct("ExtractorRegistry")
            .field("formats", &formats)
            .finish()
    }
}
