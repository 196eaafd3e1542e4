use crate::sdk::{ToolDescriptor, ToolRegistry, ToolResult};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::ops::RangeInclusive;
use std::sync::Arc;

pub const FINGER_RANGE: RangeInclusive<u8> = 1..=5;

/// A robot hand that can hold up a number of fingers.
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn send_finger_count(&self, count: u8) -> crate::Result<()>;
}

fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        "showFingers",
        "Controls a robot hand to show a specific number of fingers",
        json!({
            "type": "object",
            "properties": {
                "numberOfFingers": {
                    "type": "integer",
                    "enum": [1, 2, 3, 4, 5],
                    "description": "Values 1 through 5 of the number of fingers to hold up"
                }
            },
            "required": ["numberOfFingers"]
        }),
    )
}

fn finger_count(args: &Value) -> Option<u8> {
    args.get("numberOfFingers")
        .and_then(Value::as_u64)
        .and_then(|n| u8::try_from(n).ok())
        .filter(|n| FINGER_RANGE.contains(n))
}

/// Register `showFingers`.
///
/// # Errors
/// Returns an error if the name is already bound.
#[allow(clippy::result_large_err)]
pub fn register(registry: &mut ToolRegistry, actuator: Arc<dyn Actuator>) -> crate::Result<()> {
    registry.register(descriptor(), move |args: Value| {
        let actuator = Arc::clone(&actuator);
        async move {
            let Some(count) = finger_count(&args) else {
                return ToolResult::failure(format!(
                    "numberOfFingers must be an integer from 1 to 5, got {}",
                    args.get("numberOfFingers").unwrap_or(&Value::Null)
                ));
            };
            match actuator.send_finger_count(count).await {
                Ok(()) => ToolResult::with_data("numberOfFingers", json!(count)),
                Err(err) => {
                    tracing::warn!(count, "Actuator rejected finger count: {err}");
                    ToolResult::failure(err.to_string())
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::ToolCall;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHand {
        sent: Mutex<Vec<u8>>,
    }

    #[async_trait]
    impl Actuator for RecordingHand {
        async fn send_finger_count(&self, count: u8) -> crate::Result<()> {
            self.sent.lock().unwrap().push(count);
            Ok(())
        }
    }

    async fn show(registry: &ToolRegistry, arguments: Value) -> ToolResult {
        let call = ToolCall { name: "showFingers".into(), call_id: "c".into(), arguments };
        registry.invoke(call).await.unwrap()
    }

    #[tokio::test]
    async fn valid_count_reaches_actuator() {
        let hand = Arc::new(RecordingHand::default());
        let mut registry = ToolRegistry::new();
        register(&mut registry, hand.clone()).unwrap();

        let result = show(&registry, json!({ "numberOfFingers": 3 })).await;
        assert_eq!(result.to_output().unwrap(), r#"{"success":true,"numberOfFingers":3}"#);
        assert_eq!(*hand.sent.lock().unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn out_of_range_count_is_rejected_locally() {
        let hand = Arc::new(RecordingHand::default());
        let mut registry = ToolRegistry::new();
        register(&mut registry, hand.clone()).unwrap();

        for arguments in [json!({ "numberOfFingers": 0 }), json!({ "numberOfFingers": 6 }), json!({})] {
            assert!(!show(&registry, arguments).await.is_success());
        }
        assert!(hand.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn schema_lists_allowed_counts() {
        let params = descriptor().parameters;
        assert_eq!(params["properties"]["numberOfFingers"]["enum"], json!([1, 2, 3, 4, 5]));
        assert_eq!(params["required"], json!(["numberOfFingers"]));
    }
}
