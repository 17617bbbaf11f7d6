//! Trigger firing: seeds the run's output store with the trigger payload.

use agentflow_types::{TriggerInput, WorkflowStep};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map as JsonMap, Value, json};

/// Payload recorded for the trigger: the supplied test input when it covers this trigger,
/// otherwise a synthesized default.
pub fn trigger_payload(trigger: &WorkflowStep, supplied: Option<&TriggerInput>) -> JsonMap<String, Value> {
    supplied
        .and_then(|input| input.get(&trigger.id))
        .cloned()
        .unwrap_or_else(|| default_payload(&trigger.integration_id))
}

/// Synthesized payload for a trigger fired without test input.
///
/// Gmail triggers receive a sales enquiry email; every other integration receives a generic
/// webhook body stamped with the current time.
pub fn default_payload(integration_id: &str) -> JsonMap<String, Value> {
    let payload = match integration_id {
        "gmail" => json!({
            "from": "test-sender@example.com",
            "subject": "Important: Sales Enquiry",
            "body": "Hello, I am interested in your product catalog. Can you send me more information? Thanks!",
        }),
        _ => json!({
            "data": { "message": "This is a test webhook payload" },
            "receivedAt": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }),
    };
    match payload {
        Value::Object(map) => map,
        _ => JsonMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn gmail_trigger_gets_sales_enquiry() {
        let payload = default_payload("gmail");
        assert_eq!(payload["from"], json!("test-sender@example.com"));
        assert_eq!(payload["subject"], json!("Important: Sales Enquiry"));
        assert!(payload["body"].as_str().unwrap().contains("product catalog"));
    }

    #[test]
    fn other_triggers_get_webhook_payload() {
        let payload = default_payload("webhook");
        assert_eq!(payload["data"]["message"], json!("This is a test webhook payload"));
        let received_at = payload["receivedAt"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(received_at).is_ok());
        assert!(received_at.ends_with('Z'));
    }

    #[test]
    fn supplied_input_wins_only_for_matching_trigger() {
        let trigger = WorkflowStep::trigger("inbox", "gmail", "onNewEmail");
        let mut supplied = TriggerInput::new();
        supplied.insert("other".into(), JsonMap::new());
        assert_eq!(trigger_payload(&trigger, Some(&supplied))["from"], json!("test-sender@example.com"));

        let mut custom = JsonMap::new();
        custom.insert("body".into(), json!("Need a quote"));
        supplied.insert("inbox".into(), custom.clone());
        assert_eq!(trigger_payload(&trigger, Some(&supplied)), custom);
    }
}
