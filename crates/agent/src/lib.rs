//! Claims query agent.
//!
//! Routes a natural-language question to one of three paths and produces a
//! final answer:
//! - `nl2sql`: generate SQL over the loaded tables, execute, repair on error
//! - `rag`: search ingested plan documents and answer with citations
//! - `clarify`: ask the user to narrow the question
//!
//! [`Orchestrator`] drives the stages over an explicit [`AgentState`] and
//! either returns an [`AgentResponse`] or streams [`AgentEvent`]s.

pub mod conversation;
pub mod events;
pub mod orchestrator;
pub mod output;
pub mod response;
pub mod retrieval;
pub mod router;
pub mod services;
pub mod sql;
pub mod state;
pub mod synthesis;

#[cfg(test)]
mod tests;

pub use conversation::{render_history, ConversationTurn, Role};
pub use events::{AgentEvent, Node, TraceEntry, TraceStatus};
pub use orchestrator::{answer_slices, next_node, Orchestrator, ANSWER_SLICE_CHARS};
pub use output::{extract_json_object, extract_sql};
pub use response::AgentResponse;
pub use services::AgentServices;
pub use state::{AgentState, ChartType, Citation, Intent, Metadata, MetadataValue, StateUpdate};
