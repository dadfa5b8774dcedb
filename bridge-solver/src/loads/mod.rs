//! Load types and load sets

mod distributed;
mod load_set;
mod node_load;

pub use distributed::DistributedLoad;
pub use load_set::LoadSet;
pub use node_load::NodeLoad;
