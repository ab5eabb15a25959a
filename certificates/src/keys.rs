//! Asset store keys.

use eventdesk_core::Participant;
use std::collections::{HashMap, HashSet};

/// The uploaded certificate template.
pub const TEMPLATE_KEY: &str = "templates/certificate.png";

/// The uploaded font, whichever of TTF or OTF was sent last.
pub const FONT_KEY: &str = "fonts/certificate";

/// The most recent sample certificate.
pub const SAMPLE_KEY: &str = "certificates/sample.png";

/// Key of a participant's certificate.
///
/// Letters, digits, `-` and `_` are kept, whitespace runs become a single
/// `_`, everything else is dropped.
#[must_use]
pub fn certificate_key(name: &str) -> String {
    format!("certificates/{}.png", file_stem(name))
}

/// Keys for a batch, in input order.
///
/// Names that sanitize to the same stem get the participant id appended, so
/// no certificate overwrites another. `None` marks a participant whose key
/// is still taken after that, e.g. a repeated id.
#[must_use]
pub fn certificate_keys(participants: &[Participant]) -> Vec<Option<String>> {
    let mut stems: HashMap<String, usize> = HashMap::new();
    for participant in participants {
        *stems.entry(file_stem(&participant.name)).or_default() += 1;
    }

    let mut taken = HashSet::new();
    participants
        .iter()
        .map(|participant| {
            let stem = file_stem(&participant.name);
            let key = if stems.get(&stem).copied().unwrap_or_default() > 1 {
                format!("certificates/{stem}-{}.png", file_stem(participant.id.as_str()))
            } else {
                certificate_key(&participant.name)
            };
            taken.insert(key.clone()).then_some(key)
        })
        .collect()
}

fn file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            stem.push(c);
        } else if c.is_whitespace() && !stem.ends_with('_') {
            stem.push('_');
        }
    }

    if stem.is_empty() {
        stem.push_str("participant");
    }
    stem
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventdesk_testing::fixtures;

    #[test]
    fn test_certificate_key() {
        assert_eq!(certificate_key("Ada Lovelace"), "certificates/Ada_Lovelace.png");
        assert_eq!(certificate_key("  José  O'Neil "), "certificates/José_ONeil.png");
        assert_eq!(certificate_key("../../etc"), "certificates/etc.png");
        assert_eq!(certificate_key("???"), "certificates/participant.png");
    }

    #[test]
    fn test_shared_names_get_distinct_keys() {
        let participants = [
            fixtures::attendee("p-001", "Ada Lovelace"),
            fixtures::attendee("p-002", "Grace Hopper"),
            fixtures::attendee("p-003", "Ada  Lovelace"),
        ];

        assert_eq!(
            certificate_keys(&participants),
            vec![
                Some("certificates/Ada_Lovelace-p-001.png".to_string()),
                Some("certificates/Grace_Hopper.png".to_string()),
                Some("certificates/Ada_Lovelace-p-003.png".to_string()),
            ]
        );
    }

    #[test]
    fn test_repeated_participant_has_no_key() {
        let ada = fixtures::attendee("p-001", "Ada Lovelace");
        let keys = certificate_keys(&[ada.clone(), ada]);
        assert_eq!(keys[0].as_deref(), Some("certificates/Ada_Lovelace-p-001.png"));
        assert_eq!(keys[1], None);
    }
}
