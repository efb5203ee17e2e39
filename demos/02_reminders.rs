/// which reminders are due, what they say, and sending one
use arrangement_engine::chrono::{NaiveDate, TimeZone, Utc};
use arrangement_engine::reminders::templates::preview;
use arrangement_engine::{
    AgentProfile, ArrangementService, EngineConfig, InMemoryStore, NewArrangement, Outbox,
    RecordingLedger, ReminderSettings, SafeTimeProvider, TimeSource,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arrangement_engine=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = InMemoryStore::new();
    let accounting = RecordingLedger::new();
    let outbox = Outbox::new();
    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2025, 1, 13, 8, 0, 0).unwrap()));

    let mut settings = ReminderSettings::default();
    settings.customizable_schedule.day_of_reminder = false;
    settings.agent_profile = AgentProfile {
        name: "Sam Carter".to_string(),
        title: "Enforcement Agent".to_string(),
        signature: "Sam Carter\nEnforcement Agent".to_string(),
        contact_info: Some("01632 960000".to_string()),
    };

    let mut service =
        ArrangementService::new(EngineConfig::default(), &accounting, &store, &store, &outbox);

    let arrangement = service.create(
        &NewArrangement {
            address: "12 High Street".to_string(),
            customer_name: Some("Mr John Smith".to_string()),
            phone_number: Some("07700900123".to_string()),
            case_reference: Some("LO-2231".to_string()),
            scheduled_date: NaiveDate::from_ymd_opt(2025, 1, 15),
            scheduled_time: Some("10:00".to_string()),
            amount: "125".to_string(),
            ..Default::default()
        },
        &time,
    )?;

    let pending = service.pending_reminders(&store.arrangements(), &store.notifications(), &settings, &time)?;
    for reminder in &pending {
        println!(
            "{} days before {}: fires {} overdue={}",
            reminder.offset_days, reminder.due_date, reminder.fire_date, reminder.is_overdue
        );
    }

    if let Some(reminder) = pending.first() {
        let sent = service.send_reminder(&arrangement, reminder, &settings, &time)?;
        println!("--- to {} ---\n{}", sent.message.phone_number, sent.message.body);
    }

    let stats = service.reminder_stats(&store.arrangements(), &store.notifications(), &settings, &time)?;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    // a template with a typo
    let mut draft = settings.message_templates.active();
    draft.template = "{greeting}Please pay £{ammount} by {date}.".to_string();
    let checked = preview(&draft, &settings.agent_profile);
    println!("{}\nunknown: {:?}", checked.body, checked.unknown_placeholders);

    Ok(())
}
