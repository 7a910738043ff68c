pub mod instance_index;
pub mod tokens;

pub use instance_index::InstanceIndex;
pub use tokens::TokenStore;
