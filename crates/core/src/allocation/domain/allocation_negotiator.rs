use std::sync::Arc;

use thiserror::Error;

use crate::allocation::domain::allocation_query::{AllocationQuery, PoolProposal};
use crate::allocation::infrastructure::buffer_pool::{BufferPool, PoolError};
use crate::shared::constants::LOG_TARGET;
use crate::shared::video_geometry::VideoGeometry;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("caps have not been negotiated")]
    NotNegotiated,
    #[error("failed to configure buffer pool: {0}")]
    Pool(#[from] PoolError),
}

/// Settles the pool the source allocates frames from.
///
/// The first downstream proposal wins, with its size raised to fit one
/// frame of `geometry`. Without a proposal the frame size is used with no
/// count bounds. A pool is created when none was offered. The query is
/// updated with the final parameters and the configured (inactive) pool is
/// returned.
pub fn decide_allocation(
    query: &mut AllocationQuery,
    geometry: &VideoGeometry,
) -> Result<Arc<BufferPool>, AllocationError> {
    let (pool, size, min, max, update) = match query.pools().first() {
        Some(proposal) => (
            proposal.pool.clone(),
            proposal.size.max(geometry.size()),
            proposal.min,
            proposal.max,
            true,
        ),
        None => (None, geometry.size(), 0, 0, false),
    };

    let pool = pool.unwrap_or_else(|| Arc::new(BufferPool::new()));

    let mut config = pool.config();
    if let Some(caps) = query.caps() {
        config.set_params(caps, size, min, max);
    }
    if query.has_video_meta() {
        config.add_video_meta_option();
    }
    pool.set_config(config)?;

    log::debug!(
        target: LOG_TARGET,
        "Decided allocation: size={size} min={min} max={max} video_meta={}",
        query.has_video_meta()
    );

    let proposal = PoolProposal {
        pool: Some(Arc::clone(&pool)),
        size,
        min,
        max,
    };
    if update {
        query.set_pool(0, proposal);
    } else {
        query.add_pool(proposal);
    }

    Ok(pool)
}
