// Messaging module - Update kinds and inbound message routing
pub mod event;
pub mod router;

pub use event::UpdateKind;
pub use router::MessageRouter;
