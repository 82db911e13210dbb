pub mod types;
pub mod transitions;
pub mod rules;
pub mod queries;

pub use types::*;
pub use transitions::*;
pub use rules::*;
pub use queries::*;
