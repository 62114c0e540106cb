pub mod conversion;
pub mod definition;
pub mod seed;

pub use conversion::*;
pub use definition::*;
pub use seed::*;
