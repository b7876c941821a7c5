//! The three ledger algorithms: lazy month initialization, authoritative
//! recomputation from attendance history, and carry-forward propagation.

mod corrector;
mod initializer;
mod propagator;

pub use corrector::recompute;
pub use initializer::ensure_month;
pub use propagator::propagate;
