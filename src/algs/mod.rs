//! Re-export public algorithms.

pub mod communicator;

pub use communicator::{Communicator, NoComm, broadcast_vec};
