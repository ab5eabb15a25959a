//! Participant fixtures.

use eventdesk_core::{Participant, ParticipantId};

/// A registrant with survey answers filled in.
#[must_use]
pub fn participant(id: &str, name: &str) -> Participant {
    let email = format!(
        "{}@example.com",
        name.to_lowercase().replace(char::is_whitespace, ".")
    );
    let mut participant = Participant::new(ParticipantId::new(id), name, email);
    participant.degree = "B.Tech".into();
    participant.department = "Computer Science".into();
    participant.experience_response = "Organised a hackathon".into();
    participant.resilience_response = "Rebuilt a failed project".into();
    participant.goals_response = "Meet the speakers".into();
    participant
}

/// Three fresh registrants: `p-001` Ada Lovelace, `p-002` Grace Hopper,
/// `p-003` Alan Turing. None selected, none attended.
#[must_use]
pub fn roster() -> Vec<Participant> {
    vec![
        participant("p-001", "Ada Lovelace"),
        participant("p-002", "Grace Hopper"),
        participant("p-003", "Alan Turing"),
    ]
}

/// A participant who was selected and checked in, eligible for a certificate.
#[must_use]
pub fn attendee(id: &str, name: &str) -> Participant {
    let mut participant = participant(id, name);
    participant.selected = true;
    participant.attend = true;
    participant.timestamp = Some("2025-03-01T09:00:00Z".into());
    participant.marked_by = Some("Door Team".into());
    participant
}
