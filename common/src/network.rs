pub mod destination;
pub mod hop;
