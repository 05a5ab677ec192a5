use super::types::{Request, StreamChunk};
use crate::analysis::AnalysisResult;
use crate::engine::Advisor;
use crate::knowledge::CompanyContext;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub type ChunkSender = mpsc::UnboundedSender<StreamChunk>;

fn to_data(value: &impl Serialize) -> Option<Value> {
    serde_json::to_value(value).ok()
}

/// Routes requests to the advisor and streams the outcome back.
///
/// Every request ends with exactly one `done` or `error` chunk.
pub struct RequestHandler {
    advisor: Arc<Advisor>,
}

impl RequestHandler {
    pub fn new(advisor: Arc<Advisor>) -> Self {
        Self { advisor }
    }

    pub async fn handle(&self, request: Request, sender: ChunkSender) {
        match request {
            Request::Analyze { company_id, company } => self.handle_analyze(company_id, company, sender).await,
            Request::IngestCompany { company_id } => self.handle_ingest(&company_id, sender).await,
            Request::RemoveCompany { company_id } => self.handle_remove(&company_id, sender).await,
            Request::Populate => self.handle_populate(sender).await,
            Request::Stats => self.handle_stats(sender).await,
        }
    }

    async fn handle_analyze(&self, company_id: Option<String>, company: Option<CompanyContext>, sender: ChunkSender) {
        let result = match (company, company_id) {
            (Some(company), _) => {
                let _ = sender.send(StreamChunk::progress(format!("Analyzing {}", company.name)));
                self.advisor.generate_analysis(&company).await
            }
            (None, Some(id)) => {
                let _ = sender.send(StreamChunk::progress(format!("Analyzing company {id}")));
                self.advisor.analyze_company(&id).await
            }
            (None, None) => {
                let _ = sender.send(StreamChunk::error("Analyze requires company_id or company"));
                return;
            }
        };

        match result {
            Ok(analysis) => {
                let _ = sender.send(analysis_chunk(&analysis));
            }
            Err(e) => {
                warn!(error = %e, stage = ?e.stage(), "Analysis request failed");
                let _ = sender.send(StreamChunk::from(&e));
            }
        }
    }

    async fn handle_ingest(&self, company_id: &str, sender: ChunkSender) {
        match self.advisor.ingest_company(company_id).await {
            Ok(chunks) => {
                let chunk = StreamChunk::done(format!("Indexed {chunks} chunks for company {company_id}"))
                    .with_data(serde_json::json!({ "chunks": chunks }));
                let _ = sender.send(chunk);
            }
            Err(e) => {
                let _ = sender.send(StreamChunk::error(format!("Failed to ingest: {e}")));
            }
        }
    }

    async fn handle_remove(&self, company_id: &str, sender: ChunkSender) {
        match self.advisor.remove_company(company_id).await {
            Ok(removed) => {
                let chunk = StreamChunk::done(format!("Removed {removed} chunks for company {company_id}"))
                    .with_data(serde_json::json!({ "removed": removed }));
                let _ = sender.send(chunk);
            }
            Err(e) => {
                let _ = sender.send(StreamChunk::error(format!("Failed to remove: {e}")));
            }
        }
    }

    async fn handle_populate(&self, sender: ChunkSender) {
        let _ = sender.send(StreamChunk::progress("Populating knowledge base"));
        match self.advisor.populate().await {
            Ok(report) => {
                info!(?report, "Populated knowledge base over socket");
                let mut chunk = StreamChunk::done("Knowledge base populated");
                chunk.data = to_data(&report);
                let _ = sender.send(chunk);
            }
            Err(e) => {
                let _ = sender.send(StreamChunk::error(format!("Failed to populate: {e}")));
            }
        }
    }

    async fn handle_stats(&self, sender: ChunkSender) {
        match self.advisor.stats().await {
            Ok(stats) => {
                let mut chunk = StreamChunk::done(format!("Knowledge base is {}", stats.lifecycle));
                chunk.data = to_data(&stats);
                let _ = sender.send(chunk);
            }
            Err(e) => {
                let _ = sender.send(StreamChunk::error(format!("Failed to get stats: {e}")));
            }
        }
    }
}

fn analysis_chunk(analysis: &AnalysisResult) -> StreamChunk {
    let mut chunk = StreamChunk::done(format!(
        "{}: {} fit ({:.2}), {} solutions",
        analysis.company_name,
        analysis.overall_fit,
        analysis.fit_score,
        analysis.recommended_solutions.len()
    ));
    chunk.data = to_data(analysis);
    chunk
}
