//! advisor - Retrieval-grounded solution advisory engine
//!
//! This is the convenience wrapper crate that re-exports `advisor-core`.
//!
//! # Quick Start
//!
//! ```no_run
//! use advisor::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::load_or_default();
//! let provider = create_provider(&config.llm)?;
//! let source = Arc::new(DatasetSource::load("dataset.yaml")?);
//! let advisor = Advisor::from_config(&config, provider, source)?;
//!
//! advisor.populate().await?;
//! let analysis = advisor.analyze_company("42").await?;
//! for solution in &analysis.recommended_solutions {
//!     println!("{}. {} ({:.0})", solution.priority, solution.module, solution.fit_score);
//! }
//! # Ok(())
//! # }
//! ```

pub use advisor_core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use advisor_core::analysis::{AnalysisError, AnalysisResult, OverallFit, RecommendedSolution, Stage};
    pub use advisor_core::knowledge::{CompanyContext, Dataset, DatasetSource, KnowledgeBase, KnowledgeSource};
    pub use advisor_core::provider::{create_provider, Provider};
    pub use advisor_core::{Advisor, Config, Server};
}
