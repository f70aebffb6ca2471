pub mod prelude;

pub mod bugs;
pub mod projects;
pub mod users;
