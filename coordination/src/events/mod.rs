//! Message passing between orchestrators and the supervisor
//!
//! Each orchestrator runs as an isolated tokio task. The only thing workers
//! share is a write-only channel of [`SessionEvent`]s; the supervisor folds
//! them into an [`Aggregate`].
//!
//! ```text
//! ┌──────────────┐
//! │ orchestrator │──┐
//! └──────────────┘  │  EventSink      ┌──────────────┐     ┌───────────┐
//! ┌──────────────┐  ├────────────────▶│ EventReceiver│────▶│ Aggregate │
//! │ orchestrator │──┘   (mpsc)        └──────────────┘     └───────────┘
//! └──────────────┘
//! ```

pub mod bus;
pub mod types;

pub use bus::{Aggregate, EventBus, EventReceiver, EventSink};
pub use types::{SessionEvent, WorkerId};
