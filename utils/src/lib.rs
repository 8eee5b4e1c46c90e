pub mod shared_cache;
pub mod task_queue;
pub mod unique_id;
