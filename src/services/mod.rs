pub mod account_collector;
pub mod collection_service;
#[cfg(test)]
pub mod fake_gateway;
pub mod gateway;
pub mod metrics_format;
pub mod prober;
pub mod s3_gateway;
