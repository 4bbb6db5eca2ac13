//! Domain events and the sink trait used to deliver them.

pub mod domain_event;
pub mod sink;

pub use domain_event::DomainEvent;
pub use sink::{DomainEventSink, MockDomainEventSink, NoOpDomainEventSink};
