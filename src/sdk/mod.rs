//! Assistant core: tool catalogue, call dispatch and session lifecycle.
//!
//! Collaborators that only exist in a browser (peer connection, microphone,
//! page, robot hand) come in through the traits in `crate::transport::peer`
//! and `crate::tools`, so the whole flow runs against in-memory doubles.

mod builder;
mod context;
mod dispatcher;
mod session;
mod tools;
mod transport;

pub use builder::AssistantBuilder;
pub use context::SessionContext;
pub use dispatcher::{DispatchOutcome, ToolDispatcher, UnknownToolPolicy};
pub use session::{Assistant, Session, SessionState};
pub use tools::{
    BoxFuture, IntoToolResult, ToolCall, ToolDescriptor, ToolHandler, ToolRegistry, ToolResult,
};
pub use transport::EventSender;
