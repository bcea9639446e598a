pub mod agent;
pub mod diff;
pub mod finding;
mod markdown;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod report;

pub use agent::{AgentSettings, Analyzer, PromptAgent};
pub use finding::{Category, Finding, Severity};
pub use orchestrator::{AgentRegistry, Orchestrator};
pub use report::{AgentResult, AgentStatus, PrIdentifier, Recommendation, ReviewReport};
