pub mod clock;
pub mod code;
pub mod error;
pub mod session;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use code::{CodeGenerator, DEFAULT_CODE_LENGTH, MIN_CODE_LENGTH, RandomCodeGenerator};
pub use error::CoreError;
pub use session::{FileDescriptor, Session, SessionKey, ShareKind, SharePayload};
pub use types::{SessionId, ShareCode};
