pub mod cdn;
pub mod edge;
