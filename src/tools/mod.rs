//! External tool invocation
//!
//! Tools such as `flutter`, `npm` or `gradle` are optional on the host. The
//! [`ToolProbe`] seam separates soft outcomes ([`ToolOutcome`]) from internal
//! faults ([`ToolError`]).

pub mod mock;
pub mod probe;
pub mod system;

pub use mock::MockToolProbe;
pub use probe::{OfflineToolProbe, ToolError, ToolInvocation, ToolOutcome, ToolProbe};
pub use system::{SystemToolProbe, DEFAULT_TIMEOUT_CAP};
