pub mod interview;
pub mod parsed;
pub mod task;
pub mod upload;
