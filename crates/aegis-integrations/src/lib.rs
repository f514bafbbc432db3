pub mod chat;
pub mod error;
pub mod executor;
pub mod itsm;

pub use chat::{ChatClient, TriageNotification, WebhookChatClient};
pub use error::IntegrationError;
pub use executor::{DispatchResult, HttpRemediationClient, RemediationClient, RemediationRequest};
pub use itsm::{ClosedIncident, HttpItsmClient, IncidentUpdate, ItsmClient, KbDocument};
