pub mod model;
pub mod money;
pub mod policy;
pub mod reconciler;

pub use model::{BackendValue, ComparisonOutcome, Mismatch, NormalizedValue, RenderedField, Side};
pub use money::Money;
pub use policy::FieldPolicy;
pub use reconciler::reconcile;
