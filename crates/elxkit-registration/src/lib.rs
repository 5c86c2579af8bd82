pub mod error;
pub mod config;
pub mod engine;
pub mod elastix;
pub mod transformix;

pub use error::{RegistrationError, Result};
pub use config::EngineConfig;
pub use engine::{Engine, EngineInvocation, EngineRunner, ExitOutcome, ProcessRunner};
pub use elastix::{register, Elastix};
pub use transformix::{apply_transform, Transformix};
pub use elxkit_core::OutputTarget;
