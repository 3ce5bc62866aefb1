pub mod config;
pub mod logging;

pub mod api;
pub mod checksum;
pub mod fetcher;
pub mod lister;
pub mod pipeline;
pub mod resolver;
pub mod retry;
pub mod storage;
pub mod transport;
