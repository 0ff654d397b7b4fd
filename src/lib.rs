pub mod capability;
pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod expression;
pub mod item;
pub mod manager;
pub mod outcome;
pub mod pipeline;
pub mod processor;
pub mod registry;
pub mod request;
pub mod routing;
pub mod sink;
pub mod transport;
