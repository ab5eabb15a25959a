//! Message bodies for acceptance and rejection mail.

use eventdesk_core::mail::{personalize, Envelope, MailKind, Recipient};

/// Placeholder replaced with the QR image URL in acceptance mail.
pub const QR_PLACEHOLDER: &str = "$qrCodeUrl";

/// A plain-text and HTML body pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailTemplate {
    /// Plain-text body.
    pub text: String,
    /// HTML body.
    pub html: String,
}

impl MailTemplate {
    /// Render both bodies for one recipient.
    ///
    /// `qr_url` replaces [`QR_PLACEHOLDER`] when given; `$username` is
    /// always replaced. Both values are HTML-escaped in the HTML body.
    #[must_use]
    pub fn render(&self, username: &str, qr_url: Option<&str>) -> (String, String) {
        let fill = |body: &str, username: &str, qr_url: Option<&str>| {
            let body = personalize(body, username);
            match qr_url {
                Some(url) => body.replace(QR_PLACEHOLDER, url),
                None => body,
            }
        };
        let html_url = qr_url.map(escape_html);
        (
            fill(&self.text, username, qr_url),
            fill(&self.html, &escape_html(username), html_url.as_deref()),
        )
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// The two templates the dashboard sends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailTemplates {
    /// Acceptance mail, carrying the QR code.
    pub selected: MailTemplate,
    /// Rejection mail.
    pub rejected: MailTemplate,
}

impl MailTemplates {
    /// Built-in wording for `event_name`.
    #[must_use]
    pub fn for_event(event_name: &str) -> Self {
        let html_event = escape_html(event_name);
        let selected = MailTemplate {
            text: format!(
                "Hi $username,\n\n\
                 Congratulations! You have been selected to attend {event_name}.\n\n\
                 Please bring the QR code below to the registration desk on the day; \
                 it is your entry pass:\n{QR_PLACEHOLDER}\n\n\
                 See you there,\nThe {event_name} team\n"
            ),
            html: format!(
                r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{html_event}</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2 style="color: #16a34a;">You're in, $username!</h2>
        <p>Congratulations! You have been selected to attend <strong>{html_event}</strong>.</p>
        <p>Please bring this QR code to the registration desk on the day. It is your entry pass.</p>
        <p style="margin: 30px 0; text-align: center;">
            <img src="{QR_PLACEHOLDER}" alt="Your entry QR code" width="260" height="260">
        </p>
        <p style="color: #666; font-size: 14px;">See you there,<br>The {html_event} team</p>
    </div>
</body>
</html>
"#
            ),
        };

        let rejected = MailTemplate {
            text: format!(
                "Hi $username,\n\n\
                 Thank you for applying to {event_name}. We received many strong \
                 applications and, unfortunately, we are unable to offer you a place \
                 this time.\n\n\
                 We hope to see you at a future event.\nThe {event_name} team\n"
            ),
            html: format!(
                r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{html_event}</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2>Hi $username,</h2>
        <p>Thank you for applying to <strong>{html_event}</strong>. We received many strong
        applications and, unfortunately, we are unable to offer you a place this time.</p>
        <p style="color: #666; font-size: 14px;">We hope to see you at a future event.<br>The {html_event} team</p>
    </div>
</body>
</html>
"#
            ),
        };

        Self { selected, rejected }
    }

    /// Template for `kind`.
    #[must_use]
    pub const fn get(&self, kind: MailKind) -> &MailTemplate {
        match kind {
            MailKind::Selected => &self.selected,
            MailKind::Rejected => &self.rejected,
        }
    }

    /// Build the envelope for one recipient.
    #[must_use]
    pub fn envelope(
        &self,
        kind: MailKind,
        recipient: &Recipient,
        subject: &str,
        qr_url: Option<&str>,
    ) -> Envelope {
        let (text, html) = self.get(kind).render(&recipient.username, qr_url);
        Envelope {
            to: recipient.email.clone(),
            subject: subject.to_string(),
            text,
            html,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventdesk_core::mail::USERNAME_PLACEHOLDER;
    use proptest::prelude::*;

    #[test]
    fn test_selected_mail_embeds_qr_and_name() {
        let templates = MailTemplates::for_event("RustConf");
        let (text, html) = templates
            .selected
            .render("Ada", Some("https://qr.local/?data=1"));

        assert!(text.starts_with("Hi Ada,"));
        assert!(html.contains(r#"<img src="https://qr.local/?data=1""#));
        assert!(html.contains("You're in, Ada!"));
        assert!(!html.contains(QR_PLACEHOLDER));
        assert!(!html.contains(USERNAME_PLACEHOLDER));
    }

    #[test]
    fn test_name_is_escaped_in_html_only() {
        let templates = MailTemplates::for_event("Rust & Friends");
        let (text, html) = templates
            .selected
            .render("<b>Ada</b>", Some("https://qr.local/?data=1&size=2"));

        assert!(text.starts_with("Hi <b>Ada</b>,"));
        assert!(html.contains("You're in, &lt;b&gt;Ada&lt;/b&gt;!"));
        assert!(!html.contains("<b>Ada"));
        assert!(html.contains(r#"<img src="https://qr.local/?data=1&amp;size=2""#));
        assert!(html.contains("<strong>Rust &amp; Friends</strong>"));
        assert!(text.contains("https://qr.local/?data=1&size=2"));
    }

    #[test]
    fn test_rejected_mail_has_no_qr() {
        let templates = MailTemplates::for_event("RustConf");
        let (text, html) = templates.rejected.render("Alan", None);

        assert!(text.contains("Hi Alan,"));
        assert!(text.contains("RustConf"));
        assert!(!html.contains("<img"));
    }

    proptest! {
        #[test]
        fn rendered_selected_mail_has_no_placeholders(
            name in "[A-Za-z][A-Za-z .'-]{0,30}",
            id in "[a-z0-9-]{1,12}",
        ) {
            let templates = MailTemplates::for_event("RustConf");
            let url = format!("https://qr.local/?data={id}");
            let (text, html) = templates.selected.render(&name, Some(&url));

            for body in [&text, &html] {
                prop_assert!(!body.contains(USERNAME_PLACEHOLDER));
                prop_assert!(!body.contains(QR_PLACEHOLDER));
                prop_assert!(body.contains(url.as_str()));
            }
        }
    }
}
