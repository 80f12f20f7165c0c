//! Record builders for tests and demos.

use pickup_core::{PickupLine, Style};

/// An unrated, unused record created on 2024-05-01.
pub fn record(id: &str, person_description: &str, pickup_line: &str) -> PickupLine {
    PickupLine {
        id: id.to_string(),
        person_description: person_description.to_string(),
        pickup_line: pickup_line.to_string(),
        dirtiness_level: 5,
        style: Style::Playful,
        model_used: Some(pickup_core::DEFAULT_MODEL.to_string()),
        rating: None,
        used: false,
        success: None,
        notes: None,
        created_at: "2024-05-01T12:00:00".to_string(),
    }
}

/// `count` records with ids `r1..=rN`, newest (highest id) first.
pub fn records(count: usize) -> Vec<PickupLine> {
    (1..=count)
        .rev()
        .map(|n| {
            record(
                &format!("r{}", n),
                &format!("person number {}", n),
                &format!("pickup line number {}", n),
            )
        })
        .collect()
}
