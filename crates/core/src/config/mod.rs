pub mod project;
pub mod sources;
pub mod validation;

pub use project::*;
pub use sources::*;
pub use validation::*;
