pub mod context;
pub mod drafting;
pub mod planning;
pub mod publisher;
pub mod step_forward_agent;
pub mod types;
pub mod workflow;
