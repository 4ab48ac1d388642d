//! Integration test driver for the `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  Everything runs on the host with no renderer,
//! GPS or camera.

mod mock_io;
mod session_tests;
mod store_tests;
