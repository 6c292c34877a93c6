pub mod alert;
pub mod estimate;
pub mod identity;
pub mod profile;
