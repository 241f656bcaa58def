pub mod home;
pub mod not_found;
pub mod play;

pub use home::HomePage;
pub use not_found::NotFound;
pub use play::PlayPage;
