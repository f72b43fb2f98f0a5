pub mod bundesbank;
pub mod sdmx;
pub mod util;
