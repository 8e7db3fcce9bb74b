//! Classification of rendered pages: status-code table, content heuristics,
//! and the phrase tables behind them.

pub mod content;
pub mod phrases;
pub mod response;

pub use content::{
    ContentVerdict, PageSignals, broken_verdict, classify_content, is_substantial, parked_phrase,
};
pub use response::{ResponseVerdict, classify_response};
