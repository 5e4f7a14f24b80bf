pub mod decoder;
pub mod renderer;
