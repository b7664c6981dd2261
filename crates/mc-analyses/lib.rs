//! The four data-flow analyses over a finished Program Graph: Reaching
//! Definitions, Live Variables, Dangerous Variables, and Detection of
//! Signs. Each submodule owns its lattice element, seed, and transfer
//! function and drives `mc_worklist::run` with them; nothing here is
//! shared state between analyses beyond the read-only `Pg` they all
//! consume.

pub mod ds;
pub mod dv;
pub mod lv;
pub mod rd;
pub mod sign;
