//! Low-level peripheral bring-up.

pub mod hw_init;
