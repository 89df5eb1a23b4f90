pub mod queue;
pub mod status;
pub mod storage;
