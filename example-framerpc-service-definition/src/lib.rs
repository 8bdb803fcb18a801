pub mod arith;
pub use arith::{Args, Quotient, Reply};
