//! Answer sources for the operations assistant
//!
//! - **Knowledge base**: static bank catalogue with templated answers
//! - **Data queries**: filtered, paginated listings over injected records
//! - **Casual chat**: small-talk replies
//! - **Problem solver**: scripted fixes for common problems

pub mod chat;
pub mod knowledge;
pub mod problems;
pub mod query;

pub use chat::{CasualChat, ChatCategory};
pub use knowledge::{
    BankEntry, BankTopic, KnowledgeBase, KnowledgeError, SupportContacts, TransferLimits,
};
pub use problems::{ProblemCategory, ProblemSolver, Solution, Urgency};
pub use query::{DataQueryService, QueryResult, NO_DATA_MESSAGE};
