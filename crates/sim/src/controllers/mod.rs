pub mod tactics;
pub mod rocket;
pub mod turret;

pub use rocket::DefaultRocket;
pub use turret::DefaultTurret;
