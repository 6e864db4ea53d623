//! Model identifiers, parameters and capabilities.

pub mod capabilities;
pub mod groq;
pub mod temperature;

pub use capabilities::ModelCapabilities;
pub use groq::GroqModel;
pub use temperature::Temperature;
