mod assignment;
mod cleanup;
mod codec;
mod config;
mod error;
mod message;
mod mirror;
mod registry;
mod selection;
mod session;
mod traits;
mod transfer;
mod types;

pub use assignment::*;
pub use cleanup::*;
pub use codec::*;
pub use config::*;
pub use error::*;
pub use message::*;
pub use mirror::*;
pub use registry::*;
pub use selection::*;
pub use session::*;
pub use traits::*;
pub use transfer::*;
pub use types::*;

pub extern crate bincode;
pub extern crate euclid;
pub extern crate rand;
pub extern crate serde;
pub extern crate serde_json;
