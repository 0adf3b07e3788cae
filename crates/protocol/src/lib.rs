pub mod constants;
pub mod entity;
pub mod envelope;

// Re-export primary types for convenience.
pub use entity::{Attributes, Entity, EntityStatus, EventPayload, StateChangedData, is_light_id};
pub use envelope::{
    AuthFrame, EventFrame, FrameError, HubErrorInfo, PongFrame, Request, RequestFrame,
    ResultFrame, ServerFrame, ServiceCall,
};
