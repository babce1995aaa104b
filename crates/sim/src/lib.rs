pub mod relative;
pub mod intercept;
pub mod physics;
pub mod arena;
pub mod movement;
pub mod controller;
pub mod controllers;
pub mod sandbox;
pub mod result;
pub mod game;
pub mod scenario;
pub mod analyzer;

pub use controller::*;
pub use game::*;
pub use sandbox::{Sandbox, SideReport, TickReport};
