use serde::Deserialize;

/// Start or end of an event. Timed events carry `date_time`, all-day events only `date`.
#[derive(Debug, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct Timepoint {
    pub date_time: Option<String>,
    pub date: Option<String>,
}

impl Timepoint {
    /// The timestamp as sent by the API, preferring `dateTime` over `date`.
    pub fn as_str(&self) -> &str {
        self.date_time
            .as_deref()
            .or(self.date.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct Event {
    pub summary: Option<String>,
    pub start: Option<Timepoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct Events {
    #[serde(default)]
    pub items: Vec<Event>,
    pub next_page_token: Option<String>,
}

/// Error body returned by Google APIs for non-success responses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetails {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_events() {
        let events: Events = serde_json::from_str(
            r#"{
                "kind": "calendar#events",
                "etag": "\"p33c9v3tqbfgo20o\"",
                "summary": "someone@example.com",
                "timeZone": "Europe/Berlin",
                "accessRole": "owner",
                "defaultReminders": [{"method": "popup", "minutes": 10}],
                "nextPageToken": "CigKGjRx",
                "items": [
                    {
                        "kind": "calendar#event",
                        "id": "4q7b",
                        "status": "confirmed",
                        "summary": "Standup",
                        "creator": {"email": "someone@example.com", "self": true},
                        "organizer": {"email": "someone@example.com", "self": true},
                        "start": {"dateTime": "2024-05-02T09:00:00+02:00", "timeZone": "Europe/Berlin"},
                        "end": {"dateTime": "2024-05-02T09:15:00+02:00", "timeZone": "Europe/Berlin"},
                        "iCalUID": "4q7b@google.com",
                        "sequence": 0,
                        "eventType": "default"
                    },
                    {
                        "id": "h0l1",
                        "start": {"date": "2024-05-01"},
                        "end": {"date": "2024-05-02"}
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(events.items.len(), 2);
        assert_eq!(events.next_page_token.as_deref(), Some("CigKGjRx"));

        let standup = &events.items[0];
        assert_eq!(standup.summary.as_deref(), Some("Standup"));
        assert_eq!(
            standup.start.as_ref().unwrap().as_str(),
            "2024-05-02T09:00:00+02:00"
        );

        let holiday = &events.items[1];
        assert_eq!(holiday.summary, None);
        assert_eq!(holiday.start.as_ref().unwrap().as_str(), "2024-05-01");
    }

    #[test]
    fn deserialize_empty_events() {
        let events: Events = serde_json::from_str(r#"{"kind": "calendar#events"}"#).unwrap();
        assert!(events.items.is_empty());
        assert!(events.next_page_token.is_none());
    }

    #[test]
    fn timepoint_without_values() {
        let timepoint: Timepoint = serde_json::from_str("{}").unwrap();
        assert_eq!(timepoint.as_str(), "");
    }

    #[test]
    fn deserialize_error_response() {
        let error: ErrorResponse = serde_json::from_str(
            r#"{
                "error": {
                    "errors": [{"domain": "global", "reason": "authError", "message": "Invalid Credentials"}],
                    "code": 401,
                    "message": "Invalid Credentials",
                    "status": "UNAUTHENTICATED"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(error.error.message, "Invalid Credentials");
    }
}
