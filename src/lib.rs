#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod api;
pub mod board;
pub mod client;
pub mod coord;
pub mod dirty;
pub mod location;
pub mod piece;
pub mod poller;
pub mod promotion;
pub mod selection;
pub mod session;
pub mod side;
pub mod submitter;
pub mod test_util;
