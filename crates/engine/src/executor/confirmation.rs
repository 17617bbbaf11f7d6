//! Confirmation messages for operations whose external effect is modeled rather than performed.

use indexmap::IndexMap;
use serde_json::Value;

/// Builds the success message for an unmodeled `(integration, operation)` pair.
///
/// Known pairs mention the parameters a reader would look for (recipient, channel, title);
/// everything else falls back to a generic confirmation.
pub fn confirmation_message(integration_id: &str, operation_id: &str, parameters: &IndexMap<String, Value>) -> String {
    let text = |keys: &[&str]| first_text(parameters, keys);

    match (integration_id, operation_id) {
        ("gmail", "sendEmail") => match text(&["to", "recipient"]) {
            Some(recipient) => format!("Email sent to {recipient}."),
            None => "Email sent.".to_string(),
        },
        ("slack", "sendMessage") => match text(&["channel"]) {
            Some(channel) => format!("Message posted to {channel}."),
            None => "Message posted to Slack.".to_string(),
        },
        ("google_calendar", "createEvent") => match text(&["title", "summary"]) {
            Some(title) => format!("Calendar event '{title}' created."),
            None => "Calendar event created.".to_string(),
        },
        ("hubspot", "createContact") => match text(&["email", "name"]) {
            Some(contact) => format!("HubSpot contact '{contact}' created."),
            None => "HubSpot contact created.".to_string(),
        },
        ("salesforce", "updateRecord") => match text(&["recordId", "id"]) {
            Some(record) => format!("Salesforce record '{record}' updated."),
            None => "Salesforce record updated.".to_string(),
        },
        ("google_drive", "uploadFile") => match text(&["fileName", "name"]) {
            Some(file_name) => format!("File '{file_name}' uploaded to Google Drive."),
            None => "File uploaded to Google Drive.".to_string(),
        },
        (_, operation) => format!("Executed '{operation}'."),
    }
}

fn first_text(parameters: &IndexMap<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| parameters.get(*key))
        .find_map(|value| match value {
            Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;
    use serde_json::json;

    #[test]
    fn mentions_known_parameters() {
        let parameters = indexmap! { "to".to_string() => json!("lead@example.com") };
        assert_eq!(confirmation_message("gmail", "sendEmail", &parameters), "Email sent to lead@example.com.");

        let parameters = indexmap! { "channel".to_string() => json!("#triage") };
        assert_eq!(confirmation_message("slack", "sendMessage", &parameters), "Message posted to #triage.");
    }

    #[test]
    fn falls_back_when_parameters_are_blank() {
        let parameters = indexmap! { "fileName".to_string() => json!("  ") };
        assert_eq!(
            confirmation_message("google_drive", "uploadFile", &parameters),
            "File uploaded to Google Drive."
        );
    }

    #[test]
    fn unknown_pairs_get_generic_confirmation() {
        assert_eq!(confirmation_message("webhook", "postJson", &IndexMap::new()), "Executed 'postJson'.");
    }
}
