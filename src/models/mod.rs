pub mod entity;
pub mod event;
pub mod identity;
pub mod profile;
pub mod record;
