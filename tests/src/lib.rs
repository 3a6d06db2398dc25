pub mod executor;

pub use executor::RecordingExecutor;

/// Route `log` output into the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
