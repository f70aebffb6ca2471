pub use super::bugs::Entity as Bugs;
pub use super::projects::Entity as Projects;
pub use super::users::Entity as Users;
