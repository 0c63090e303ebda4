pub mod config;
pub mod download;
pub mod error;
pub mod fal;
pub mod gallery;
pub mod logger;
pub mod models;
pub mod request;
pub mod session;

pub use config::FalConfig;
pub use error::{ForgeError, Result, ValidationError};
pub use fal::{AssetClient, FalClient, ImageService, QueueClient};
pub use gallery::CreativeGallery;
pub use models::*;
pub use session::{
    GenerationEvent, GenerationSession, SessionController, SessionStatus, TaggedEvent,
    GENERATION_FAILED_MESSAGE,
};
