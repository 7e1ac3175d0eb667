pub mod admin;
pub mod admin_members;
pub mod checkins;
pub mod images;
pub mod members;
pub mod packages;
pub mod ws;
