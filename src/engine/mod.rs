mod debug_flags;
mod events;
mod physics_engine;

pub use debug_flags::*;
pub use events::*;
pub use physics_engine::*;

#[cfg(test)]
mod physics_engine_tests;
