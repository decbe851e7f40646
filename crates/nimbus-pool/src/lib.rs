//! Object pooling for short-lived visual-effect instances.
//!
//! [`ObjectPool`] keeps a bounded free list per instance kind. Acquiring
//! reuses a free instance when one exists and otherwise asks the host
//! [`InstanceFactory`] for a new one, so acquisition never fails. Capacities
//! only bound how many released instances are retained.

mod pool;

pub use pool::{
    InstanceFactory, InstanceId, ObjectPool, PoolStats, Poolable, ReleaseOutcome,
};
