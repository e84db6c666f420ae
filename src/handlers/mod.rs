pub mod diagnostics;
pub mod health;
pub mod notify;
pub mod presence;

pub use diagnostics::*;
pub use health::*;
pub use notify::*;
pub use presence::*;
