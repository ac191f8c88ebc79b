pub mod dispatcher;
pub mod sound;
pub mod telemetry;

pub use dispatcher::{AlertDispatcher, ChannelOutcome, DispatchOutcome, DispatchStats};
pub use sound::{AudioError, CommandAlertSound, LocalAlert};
pub use telemetry::{TelemetryMessage, TelemetryRoute};
