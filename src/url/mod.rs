pub mod builder;
pub mod cdn;
pub mod errors;
pub mod params;
pub mod signature;
pub mod variant;
