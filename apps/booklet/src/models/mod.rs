pub mod block;

pub use block::{Block, BlockId, BlockRef, GroupId, OptionId, OptionRef, Question};
