pub mod connect;
pub mod disconnect;
pub mod publish;
