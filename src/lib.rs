#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod error;
pub mod protocol;
pub mod sdk;
pub mod tools;
pub mod transport;

pub use config::AssistantConfig;
pub use error::{Error, Result};
pub use protocol::client_events::ClientEvent;
pub use protocol::models::{Item, Modality, SessionUpdate, Tool, Voice};
pub use protocol::server_events::ServerEvent;
pub use sdk::{
    Assistant, AssistantBuilder, DispatchOutcome, EventSender, IntoToolResult, Session,
    SessionContext, SessionState, ToolCall, ToolDescriptor, ToolDispatcher, ToolRegistry,
    ToolResult, UnknownToolPolicy,
};

pub(crate) const TRACE_LOG_MAX_BYTES: usize = 1024;
const TRACE_TRUNCATE_SUFFIX: &str = "... (truncated)";

pub(crate) fn safe_truncate(s: &str, max_bytes: usize) -> std::borrow::Cow<'_, str> {
    if s.len() <= max_bytes {
        return std::borrow::Cow::Borrowed(s);
    }

    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    std::borrow::Cow::Owned(format!(
        "{} {} {} bytes",
        &s[..end],
        TRACE_TRUNCATE_SUFFIX,
        s.len() - end
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "é".repeat(10);
        let truncated = safe_truncate(&text, 5);
        assert!(truncated.starts_with("éé "));
        assert!(truncated.ends_with("16 bytes"));
        assert_eq!(safe_truncate("short", 10), "short");
    }
}
