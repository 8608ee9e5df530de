//! Demo data: forty guests and one unstarted ten-table mixer.

use crate::domain::{Event, TableId};
use crate::error::SchedulerError;

use super::SchedulerService;

/// Name of the seeded demo event.
pub const DEMO_EVENT_NAME: &str = "Klikkmentes December 2025";

const DEMO_TABLES: u64 = 10;

const GUESTS: [(&str, &str); 40] = [
    ("Alice", "Anderson"),
    ("Bob", "Brown"),
    ("Charlie", "Clark"),
    ("Diana", "Davis"),
    ("Eva", "Evans"),
    ("Frank", "Fischer"),
    ("Grace", "Garcia"),
    ("Henry", "Harris"),
    ("Iris", "Ivanov"),
    ("Jack", "Johnson"),
    ("Kate", "Kim"),
    ("Leo", "Lee"),
    ("Mia", "Martinez"),
    ("Noah", "Nguyen"),
    ("Olivia", "O'Brien"),
    ("Peter", "Patel"),
    ("Quinn", "Quinn"),
    ("Rachel", "Rodriguez"),
    ("Sam", "Smith"),
    ("Tina", "Taylor"),
    ("Uma", "Ueda"),
    ("Victor", "Vargas"),
    ("Wendy", "Wilson"),
    ("Xavier", "Xu"),
    ("Yara", "Yang"),
    ("Zack", "Zhang"),
    ("Amy", "Abbott"),
    ("Ben", "Barnes"),
    ("Claire", "Cooper"),
    ("Dan", "Diaz"),
    ("Emma", "Edwards"),
    ("Felix", "Foster"),
    ("Gina", "Green"),
    ("Hugo", "Hill"),
    ("Ivy", "Ibrahim"),
    ("James", "Jones"),
    ("Kylie", "Khan"),
    ("Liam", "Lopez"),
    ("Maya", "Miller"),
    ("Nick", "Nelson"),
];

/// Registers the demo guests and creates the demo event, unless an event
/// with [`DEMO_EVENT_NAME`] already exists.
///
/// Returns the created event, or `None` when it was already present.
///
/// # Errors
///
/// Propagates store failures.
pub async fn seed_demo(service: &SchedulerService) -> Result<Option<Event>, SchedulerError> {
    let existing = service.list_events().await?;
    if existing.iter().any(|e| e.name == DEMO_EVENT_NAME) {
        tracing::debug!("demo event already present");
        return Ok(None);
    }

    let mut participants = Vec::with_capacity(GUESTS.len());
    for (first, last) in GUESTS {
        let user = service.register_user(&format!("{first} {last}")).await?;
        participants.push(user.id);
    }
    let tables = (1..=DEMO_TABLES).map(TableId::new).collect();
    let event = service
        .create_event(DEMO_EVENT_NAME, participants, tables)
        .await?;
    tracing::info!(event_id = %event.id, "demo data seeded");
    Ok(Some(event))
}
