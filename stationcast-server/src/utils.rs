pub mod aborting_join_handle;
pub mod time_source;
