mod pix_world;
mod setups;
mod steps;

pub use pix_world::PixWorld;
