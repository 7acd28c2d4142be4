pub mod generated;
pub mod request;
pub mod response;
