use std::sync::Arc;

use crate::allocation::infrastructure::buffer_pool::BufferPool;
use crate::shared::video_caps::VideoCaps;

/// One downstream pool proposal: an optional pool object plus the buffer
/// size and count bounds it should run with. `max == 0` means unbounded.
#[derive(Clone, Debug)]
pub struct PoolProposal {
    pub pool: Option<Arc<BufferPool>>,
    pub size: usize,
    pub min: u32,
    pub max: u32,
}

/// Allocation negotiation between the source and its consumer.
#[derive(Clone, Debug, Default)]
pub struct AllocationQuery {
    caps: Option<VideoCaps>,
    pools: Vec<PoolProposal>,
    video_meta: bool,
}

impl AllocationQuery {
    pub fn new(caps: Option<VideoCaps>) -> Self {
        Self {
            caps,
            ..Self::default()
        }
    }

    pub fn caps(&self) -> Option<&VideoCaps> {
        self.caps.as_ref()
    }

    /// The consumer wants per-plane layout metadata on every buffer.
    pub fn request_video_meta(&mut self) {
        self.video_meta = true;
    }

    pub fn has_video_meta(&self) -> bool {
        self.video_meta
    }

    pub fn pools(&self) -> &[PoolProposal] {
        &self.pools
    }

    pub fn add_pool(&mut self, proposal: PoolProposal) {
        self.pools.push(proposal);
    }

    pub fn set_pool(&mut self, index: usize, proposal: PoolProposal) {
        self.pools[index] = proposal;
    }
}
