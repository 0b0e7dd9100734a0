pub mod app;
pub mod clock;
pub mod config;
pub mod engine;
pub mod input;
pub mod model;
pub mod render;
pub mod storage;
pub mod ticker;
pub mod toast;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{ActionOutcome, PetEngine};
pub use model::{PetState, Rules, Stat};
pub use storage::{FileStore, KvStore, MemoryStore, StoreError};
