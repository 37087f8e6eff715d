mod branch;
mod dense;
mod error;
mod lu;
mod network;
mod opt;
mod stress;
mod traits;

pub mod debug;
mod jac;
pub mod newton;
pub mod report;
pub mod ybus;

pub use branch::*;
pub use dense::*;
pub use error::*;
pub use jac::*;
pub use lu::*;
pub use network::*;
pub use opt::*;
pub use stress::*;
pub use traits::*;

#[cfg(test)]
mod tests;
