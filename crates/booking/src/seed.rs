//! Demo catalog for local runs.

use chrono::{TimeZone, Utc};
use common::Money;

use crate::catalog::{Event, InventoryItem};
use crate::error::Result;
use crate::store::BookingStore;

struct DemoEvent {
    name: &'static str,
    description: &'static str,
    date: (i32, u32, u32, u32),
    vip: (i64, u32),
    regular: (i64, u32),
}

const DEMO_EVENTS: &[DemoEvent] = &[
    DemoEvent {
        name: "Rock Concert 2025",
        description: "An amazing rock concert featuring top bands from around the world",
        date: (2025, 3, 15, 19),
        vip: (150, 100),
        regular: (75, 500),
    },
    DemoEvent {
        name: "Tech Conference 2025",
        description: "Annual technology conference with keynote speakers and workshops",
        date: (2025, 4, 20, 9),
        vip: (200, 50),
        regular: (100, 300),
    },
    DemoEvent {
        name: "Jazz Festival",
        description: "Three-day jazz festival featuring international and local artists",
        date: (2025, 5, 10, 18),
        vip: (180, 80),
        regular: (90, 400),
    },
    DemoEvent {
        name: "Food & Wine Expo",
        description: "Culinary experience with renowned chefs and wine tasting",
        date: (2025, 6, 5, 12),
        vip: (120, 60),
        regular: (60, 250),
    },
    DemoEvent {
        name: "Summer Music Festival",
        description: "Outdoor music festival with multiple stages and diverse genres",
        date: (2025, 7, 25, 15),
        vip: (250, 150),
        regular: (100, 1000),
    },
];

/// Seeds demo events with VIP and Regular categories.
///
/// Does nothing if the store already holds any event. Returns the number of
/// events inserted.
pub async fn seed_demo_catalog<S: BookingStore>(store: &S) -> Result<usize> {
    if !store.list_events().await?.is_empty() {
        tracing::info!("catalog already present, skipping demo seed");
        return Ok(0);
    }

    for demo in DEMO_EVENTS {
        let (year, month, day, hour) = demo.date;
        let date = Utc
            .with_ymd_and_hms(year, month, day, hour, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);

        let event = Event::new(demo.name, demo.description, date);
        store.insert_event(&event).await?;

        for (category, (price, quota)) in [("VIP", demo.vip), ("Regular", demo.regular)] {
            let item = InventoryItem::new(event.id, category, Money::from_major(price), quota);
            store.insert_ticket(&item).await?;
        }
    }

    tracing::info!(events = DEMO_EVENTS.len(), "demo catalog seeded");
    Ok(DEMO_EVENTS.len())
}
