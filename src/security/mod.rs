pub mod memory;
pub mod validation;

pub use memory::SecureBytes;
pub use validation::InputValidator;
