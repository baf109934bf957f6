//! Фоновый сбор: опрашиваемые эндпоинты, их реестр, планировщик тиков и канал
//! событий для собранных записей.

pub mod endpoint;
pub mod events;
pub mod registry;
pub mod scheduler;

pub use endpoint::{MonitoredEndpoint, PollContext};
pub use events::{
    BroadcastPublisher, EventPublisher, EventSourceInfo, EventSourceRegistration,
    EventSourceRegistry, LocalEventSources, SoamEvent,
};
pub use registry::EndpointRegistry;
pub use scheduler::{DEFAULT_PERIOD, Scheduler};
