pub mod binder;
pub mod clients;
pub mod config;
pub mod content;
pub mod error;
pub mod evaluation;
pub mod navigation;
pub mod position_cache;
pub mod resolver;
pub mod session;
pub mod snapshot;

pub use config::Config;
pub use error::{FetchError, ViewerError};
pub use session::{GameRef, SessionOptions, ViewState, ViewingSession};
