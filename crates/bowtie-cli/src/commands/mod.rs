//! Command implementations.

pub mod extract;
pub mod quality;
pub mod status;

pub use self::extract::execute_extract;
pub use self::quality::execute_quality;
pub use self::status::execute_status;

/// How a command concluded, for the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Everything succeeded (invalid records alone still count as success)
    Success,
    /// At least one input ended in `error`
    InputErrors,
    /// A quality threshold was not met
    GateFailed,
    /// Stopped by an interrupt before finishing
    Interrupted,
}

impl Verdict {
    /// Process exit code
    pub fn exit_code(self) -> i32 {
        match self {
            Verdict::Success => 0,
            Verdict::InputErrors => 1,
            Verdict::GateFailed => 2,
            Verdict::Interrupted => 130,
        }
    }
}
