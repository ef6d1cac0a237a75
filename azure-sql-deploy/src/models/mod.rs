pub mod azure;
pub mod requests;
pub mod responses;
