//! Session unit budget
//!
//! Every remote page request costs one unit. A session starts with a fixed
//! allotment; the remote side may also declare the quota exhausted at any
//! point, which latches the budget for the rest of the session.
//!
//! # Components
//!
//! - `QuotaBudget`: shared counter with a sticky exhaustion latch
//! - `Charge`: result of debiting units
//! - `Remaining`: units left, or the exhausted state

mod budget;

pub use budget::{Charge, QuotaBudget, Remaining, PAGE_COST};
