pub mod notification;
pub mod tab;
