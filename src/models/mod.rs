pub mod diagnostics;
pub mod error;
pub mod health;
pub mod messages;
pub mod notify;
pub mod presence;

pub use diagnostics::*;
pub use error::*;
pub use health::*;
pub use messages::*;
pub use notify::*;
pub use presence::*;
