pub mod contact;
pub mod email;
