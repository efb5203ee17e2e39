pub mod arrangement;
pub mod calendar;
pub mod collaborators;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod instalments;
pub mod lifecycle;
pub mod reminders;
pub mod service;
pub mod types;

// re-export key types
pub use arrangement::{Arrangement, ArrangementPatch, NewArrangement};
pub use collaborators::{
    AccountingLedger, AddressResolver, ArrangementStore, CollaboratorError, InMemoryStore,
    MessageDelivery, Outbox, RecordingLedger,
};
pub use config::{AgentProfile, CustomizableSchedule, EngineConfig, MessageTemplate, ReminderSettings};
pub use decimal::Money;
pub use errors::{ArrangementError, CollaboratorKind, Result};
pub use events::{Event, EventStore};
pub use instalments::{
    generate_instalments, Instalment, InstalmentStatus, ProgressView, RecurrencePlan, SplitRounding,
};
pub use lifecycle::{ActionResult, PaymentAction, StatusEvent, StatusUpdate};
pub use reminders::{
    ComposedMessage, MessageComposer, PendingReminder, ReminderEvaluator, ReminderNotification,
    ReminderStats,
};
pub use service::{ArrangementService, SentReminder};
pub use types::{
    ArrangementId, ArrangementStatus, NotificationStatus, NotificationType, OutcomeCode,
    OutcomeRecord, RecurrenceType,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
