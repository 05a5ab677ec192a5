//! Wire protocol: one JSON request line in, JSON chunk lines out.

use crate::analysis::{AnalysisError, Stage};
use crate::knowledge::CompanyContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Analyze a stored company by id, or an inline company profile.
    Analyze {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        company_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        company: Option<CompanyContext>,
    },
    IngestCompany {
        company_id: String,
    },
    RemoveCompany {
        company_id: String,
    },
    Populate,
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    Progress,
    Done,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    /// Generated text that failed to parse, for inspection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl StreamChunk {
    fn new(chunk_type: ChunkType, message: impl Into<String>) -> Self {
        Self {
            chunk_type,
            message: message.into(),
            data: None,
            stage: None,
            raw: None,
        }
    }

    pub fn progress(message: impl Into<String>) -> Self {
        Self::new(ChunkType::Progress, message)
    }

    pub fn done(message: impl Into<String>) -> Self {
        Self::new(ChunkType::Done, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ChunkType::Error, message)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_final(&self) -> bool {
        self.chunk_type != ChunkType::Progress
    }
}

impl From<&AnalysisError> for StreamChunk {
    fn from(err: &AnalysisError) -> Self {
        let mut chunk = StreamChunk::error(format!("Failed to analyze: {err}"));
        chunk.stage = err.stage();
        chunk.raw = err.raw_text().map(str::to_string);
        chunk
    }
}
