/// a monthly plan paid partly by instalment, then settled in full
use arrangement_engine::chrono::{Duration, NaiveDate, TimeZone, Utc};
use arrangement_engine::instalments::ledger;
use arrangement_engine::{
    ArrangementService, EngineConfig, InMemoryStore, NewArrangement, Outbox, PaymentAction,
    ProgressView, RecordingLedger, RecurrencePlan, SafeTimeProvider, TimeSource,
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
    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap()));
    let control = time.test_control().expect("Should be in test mode");

    // remainders go on the last instalment so the plan sums exactly
    let mut service =
        ArrangementService::new(EngineConfig::exact_split(), &accounting, &store, &store, &outbox);

    let arrangement = service.create(
        &NewArrangement {
            address: "4 Mill Lane".to_string(),
            customer_name: Some("Ms Priya Patel".to_string()),
            phone_number: Some("07700900789".to_string()),
            case_reference: Some("LO-5512".to_string()),
            scheduled_date: NaiveDate::from_ymd_opt(2025, 1, 31),
            amount: "250.00".to_string(),
            previous_payment: Some("50".to_string()),
            plan: Some(RecurrencePlan::monthly(1, 3)),
            ..Default::default()
        },
        &time,
    )?;

    for instalment in arrangement.payment_instalments.iter().flatten() {
        println!("{}  {}", instalment.scheduled_date, instalment.amount);
    }

    // first instalment paid on time
    control.advance(Duration::days(21));
    let after_first = service
        .apply_action(&arrangement, PaymentAction::Continue { amount: None }, &time)?
        .arrangement;
    println!("{:#?}", ProgressView::of(&after_first));

    // the rest cleared in one go
    control.advance(Duration::days(10));
    let settled = service.apply_action(&after_first, PaymentAction::PaidInFull, &time)?;
    println!(
        "{} {} remaining {}",
        settled.outcome.code,
        settled.outcome.amount.map(|a| a.to_string()).unwrap_or_default(),
        ledger::remaining_balance(&settled.arrangement)
    );

    // a second settlement is refused
    if let Err(e) = service.apply_action(&settled.arrangement, PaymentAction::PaidInFull, &time) {
        println!("refused: {}", e);
    }

    for event in service.take_events() {
        println!("{:?}", event);
    }

    Ok(())
}
