use crate::sdk::{ToolRegistry, ToolResult};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// The page hosting the assistant.
#[async_trait]
pub trait PageSurface: Send + Sync {
    async fn set_background_color(&self, color: &str) -> crate::Result<()>;

    async fn set_text_color(&self, color: &str) -> crate::Result<()>;

    async fn outer_html(&self) -> crate::Result<String>;
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ColorArgs {
    /// A hex value of the color
    pub color: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NoArgs {}

/// Register `changeBackgroundColor`, `changeTextColor` and `getPageHTML`.
///
/// # Errors
/// Returns an error if any of the names is already bound.
#[allow(clippy::result_large_err)]
pub fn register(registry: &mut ToolRegistry, page: Arc<dyn PageSurface>) -> crate::Result<()> {
    let surface = Arc::clone(&page);
    registry.tool(
        "changeBackgroundColor",
        "Changes the background color of a web page",
        move |args: ColorArgs| {
            let surface = Arc::clone(&surface);
            async move {
                match surface.set_background_color(&args.color).await {
                    Ok(()) => ToolResult::with_data("color", Value::String(args.color)),
                    Err(err) => ToolResult::failure(err.to_string()),
                }
            }
        },
    )?;

    let surface = Arc::clone(&page);
    registry.tool(
        "changeTextColor",
        "Changes the text color of a web page",
        move |args: ColorArgs| {
            let surface = Arc::clone(&surface);
            async move {
                match surface.set_text_color(&args.color).await {
                    Ok(()) => ToolResult::with_data("color", Value::String(args.color)),
                    Err(err) => ToolResult::failure(err.to_string()),
                }
            }
        },
    )?;

    registry.tool("getPageHTML", "Gets the HTML for the current page", move |_: NoArgs| {
        let surface = Arc::clone(&page);
        async move {
            match surface.outer_html().await {
                Ok(html) => ToolResult::with_data("html", Value::String(html)),
                Err(err) => ToolResult::failure(err.to_string()),
            }
        }
    })
}
