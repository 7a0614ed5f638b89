pub mod steplog;
pub mod xyz;
