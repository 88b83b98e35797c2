use std::fmt;
use std::io;

/// Process exit code, named the way the CLI surface in the external
/// interfaces section defines it: `0=ok, 1=config-error, 2=runtime-fault`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Ok = 0,
    Config = 1,
    Failure = 2,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExitCode::Ok => "ok",
            ExitCode::Config => "config-error",
            ExitCode::Failure => "runtime-fault",
        };
        f.write_str(name)
    }
}

impl From<io::Error> for ExitCode {
    fn from(_: io::Error) -> Self {
        ExitCode::Config
    }
}

impl From<toml::de::Error> for ExitCode {
    fn from(_: toml::de::Error) -> Self {
        ExitCode::Config
    }
}

impl From<dbft_error::Error> for ExitCode {
    fn from(err: dbft_error::Error) -> Self {
        if err.is_fatal() {
            ExitCode::Failure
        } else {
            ExitCode::Config
        }
    }
}
