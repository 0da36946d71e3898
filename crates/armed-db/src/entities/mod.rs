pub mod comment;
pub mod follow;
pub mod like;
pub mod notification;
pub mod project;
pub mod track;
pub mod user;
