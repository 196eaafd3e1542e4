pub mod common;
pub mod items;
pub mod session;
pub mod tools;

pub use common::{ArbitraryJson, JsonSchema, Modality, Voice};
pub use items::Item;
pub use session::SessionUpdate;
pub use tools::Tool;
