pub mod energy;
pub mod solve;
