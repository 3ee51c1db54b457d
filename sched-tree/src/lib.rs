mod token;
mod tree;

pub use token::tokenize;
pub use tree::{PredecessorTree, TreeNode};
