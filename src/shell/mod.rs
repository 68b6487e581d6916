pub mod error;
pub use error::*;

pub mod services;
pub use services::*;

pub mod debounce;
pub use debounce::*;

pub mod session;
pub use session::*;
