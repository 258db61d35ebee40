pub mod config;
pub mod interaction_sync;
pub mod pointer_queue;
pub mod pubsub;
pub mod stage;
pub mod tool_mode;
