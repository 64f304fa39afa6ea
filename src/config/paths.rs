//! Platform directory helpers.

pub mod xdg_root;
