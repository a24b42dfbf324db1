pub mod derive;
pub mod error;
pub mod normalize;
pub mod traits;
pub mod types;

pub use error::*;
pub use traits::*;
pub use types::*;
