mod chat;
mod social;
mod threat;

pub use chat::*;
pub use social::*;
pub use threat::*;
