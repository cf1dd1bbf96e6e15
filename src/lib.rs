pub mod address;
pub mod analyzer;
pub mod chain;
pub mod config;
pub mod deployer;
pub mod erc20;
pub mod error;
pub mod explorer;
pub mod funding;
pub mod history;
pub mod metadata;
pub mod platforms;
pub mod report;
pub mod rpc;
