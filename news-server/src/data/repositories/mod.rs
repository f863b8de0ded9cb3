pub(crate) mod memory;
pub(crate) mod mongo;
pub(crate) mod postgres;
