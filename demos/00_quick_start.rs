/// quick start - one arrangement, one payment
use arrangement_engine::chrono::NaiveDate;
use arrangement_engine::{
    ArrangementService, EngineConfig, InMemoryStore, NewArrangement, Outbox, PaymentAction,
    RecordingLedger, SafeTimeProvider, TimeSource,
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
    let time = SafeTimeProvider::new(TimeSource::System);

    let mut service =
        ArrangementService::new(EngineConfig::default(), &accounting, &store, &store, &outbox);

    // £50 to be paid next friday
    let arrangement = service.create(
        &NewArrangement {
            address: "12 High Street".to_string(),
            customer_name: Some("Mr John Smith".to_string()),
            phone_number: Some("07700900123".to_string()),
            scheduled_date: NaiveDate::from_ymd_opt(2025, 1, 17),
            amount: "50".to_string(),
            ..Default::default()
        },
        &time,
    )?;

    // debtor paid
    let result = service.apply_action(&arrangement, PaymentAction::Continue { amount: None }, &time)?;

    println!("status:  {:?}", result.arrangement.status);
    println!("outcome: {}", serde_json::to_string_pretty(&result.outcome)?);

    Ok(())
}
