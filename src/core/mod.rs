//! Backend-agnostic primitives: clocks, rate limiting and optimistic updates

pub mod clock;
pub mod optimistic;
pub mod rate_limiter;

// Re-export main components for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use optimistic::{run_optimistic, InFlight, InFlightTicket, LocalState, Mutation};
pub use rate_limiter::{ActionClass, RateLimiter};
