// A fork head is the tip block of a candidate chain. compare_forks gives a
// total order over fork heads by (block_num, weight): longer chains win,
// ties on length are broken by weight, and a tie on both keeps the current
// head. The consensus shim below is a stand-in for a real consensus engine:
// it always agrees to publish, and tags/checks a fixed marker on finalized
// blocks.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub block_num: u64,
    pub weight: u64,
    pub consensus: Vec<u8>,
}

impl BlockHeader {
    pub fn new(block_num: u64, weight: u64) -> Self {
        BlockHeader {
            block_num,
            weight,
            consensus: Vec::new(),
        }
    }
}

/// True iff `new_head` should replace `cur_head`: a longer chain always
/// wins, and among chains of equal length the heavier one wins. A tie on
/// both keeps the current head.
pub fn compare_forks(cur_head: &BlockHeader, new_head: &BlockHeader) -> bool {
    if new_head.block_num != cur_head.block_num {
        new_head.block_num > cur_head.block_num
    } else {
        new_head.weight > cur_head.weight
    }
}

const CONSENSUS_MARKER: &[u8] = b"test_mode";

pub struct ConsensusShim;

impl ConsensusShim {
    pub fn initialize_block(&self, _header: &BlockHeader) -> bool {
        true
    }

    pub fn check_publish_block(&self, _header: &BlockHeader) -> bool {
        true
    }

    pub fn finalize_block(&self, header: &mut BlockHeader) -> bool {
        header.consensus = CONSENSUS_MARKER.to_vec();
        true
    }

    pub fn verify_block(&self, header: &BlockHeader) -> bool {
        header.consensus == CONSENSUS_MARKER
    }
}
