use serde::{Deserialize, Serialize};

/// Name the `Arith` service is registered under.
pub const SERVICE_NAME: &str = "Arith";

pub const ADD: &str = "Arith.Add";
pub const MUL: &str = "Arith.Mul";
pub const DIV: &str = "Arith.Div";

pub const ADD_METHOD: &str = "Add";
pub const MUL_METHOD: &str = "Mul";
pub const DIV_METHOD: &str = "Div";

/// Error text returned by `Arith.Div` for a zero divisor.
pub const DIVIDE_BY_ZERO: &str = "divide by zero";

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Args {
    pub a: i64,
    pub b: i64,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    pub c: i64,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Quotient {
    pub quo: i64,
    pub rem: i64,
}
