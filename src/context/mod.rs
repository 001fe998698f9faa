/*!
 * Communication Contexts
 *
 * Context handles qualify one-sided and atomic operations. The default
 * context is a constant; user contexts are created and destroyed through
 * [`ContextManager`], under the serialization guard, by the owning PE.
 */

mod manager;
mod types;

pub use manager::{ContextEntry, ContextManager};
pub use types::{Context, ContextOptions, Team};
