//! Reminder email composition.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use lexalert_entity::job::ReminderPayload;
use lexalert_entity::user::UserContact;

use super::ReminderMessage;

/// Subject line for a reminder about `title`.
pub fn reminder_subject(title: &str) -> String {
    format!("Legal Alert Reminder: {title}")
}

fn format_due(due_date: DateTime<Utc>) -> String {
    due_date.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Minimal escaping for text placed into the HTML body.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Compose the reminder for `payload` addressed to `contact`.
pub fn compose_reminder(
    payload: &ReminderPayload,
    contact: &UserContact,
    job_id: Uuid,
) -> ReminderMessage {
    let due = format_due(payload.due_date);
    let text = format!(
        "Legal Alert Reminder\n\n\
         This is a reminder for your upcoming legal deadline:\n\n\
         {title}\n\
         Due date: {due}\n\n\
         Please sign in to take the necessary action.\n",
        title = payload.title,
    );
    let html = format!(
        "<h2>Legal Alert Reminder</h2>\
         <p>This is a reminder for your upcoming legal deadline:</p>\
         <p><strong>{title}</strong></p>\
         <p>Due date: {due}</p>\
         <p>Please sign in to take the necessary action.</p>",
        title = escape_html(&payload.title),
    );

    ReminderMessage {
        to: contact.email.clone(),
        to_name: contact.name.clone(),
        subject: reminder_subject(&payload.title),
        text,
        html,
        idempotency_key: job_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payload(title: &str) -> ReminderPayload {
        ReminderPayload {
            alert_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: title.into(),
            due_date: Utc.with_ymd_and_hms(2026, 3, 14, 17, 0, 0).unwrap(),
        }
    }

    fn contact() -> UserContact {
        UserContact {
            user_id: Uuid::new_v4(),
            email: "counsel@firm.test".into(),
            name: "Dana Counsel".into(),
        }
    }

    #[test]
    fn test_compose_reminder() {
        let job_id = Uuid::new_v4();
        let message = compose_reminder(&payload("File appeal"), &contact(), job_id);

        assert_eq!(message.subject, "Legal Alert Reminder: File appeal");
        assert_eq!(message.to, "counsel@firm.test");
        assert_eq!(message.idempotency_key, job_id);
        assert!(message.text.contains("Due date: 2026-03-14 17:00 UTC"));
        assert!(message.html.contains("<strong>File appeal</strong>"));
    }

    #[test]
    fn test_html_body_escapes_title() {
        let message = compose_reminder(&payload("A <b> & B"), &contact(), Uuid::nil());
        assert!(message.html.contains("A &lt;b&gt; &amp; B"));
        assert_eq!(message.subject, "Legal Alert Reminder: A <b> & B");
    }
}
