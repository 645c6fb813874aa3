pub mod cli;
pub mod config;
pub mod document;
pub mod evaluator;
pub mod executor;
pub mod formatter;
pub mod selection;
pub mod session;

pub use config::{ConfigError, ConfigLoader, CsspathConfig, OutputConfig};
pub use document::{Document, DocumentError, NodeId, NodeKind};
pub use evaluator::{Functions, PseudoEvaluator};
pub use executor::{QueryError, QueryExecutor};
pub use formatter::{MatchSummary, OutputFormat, format_matches};
pub use selection::Selection;
pub use session::{Session, SessionError};
