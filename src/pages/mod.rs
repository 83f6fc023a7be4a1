mod cart;
mod config;
mod payment;
mod receipt;

pub use cart::*;
pub use config::*;
pub use payment::*;
pub use receipt::*;
