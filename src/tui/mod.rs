//! TUI module for terminal user interfaces

mod batch_tester;

pub use batch_tester::BatchTesterApp;
