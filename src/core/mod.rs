pub mod error;

pub use error::{ResourceFailure, Result, TxError};
