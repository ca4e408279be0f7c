//! Command implementations for the cdcr CLI
//!
//! Each command has its own module.

pub mod plan;
pub mod question;
pub mod render;
pub mod validate;

pub use plan::PlanArgs;
pub use question::QuestionArgs;
pub use render::RenderArgs;
pub use validate::ValidateArgs;
