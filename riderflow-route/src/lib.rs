pub mod algorithm;
pub mod index;
pub mod model;
pub mod util;
