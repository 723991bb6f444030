pub mod command;
pub mod java;
pub mod natives;
pub mod process;

pub use command::{build_command, CommandInputs, LaunchCommand};
pub use java::{probe_java, JavaRuntime};
pub use natives::{extract_natives, NativeExtraction};
pub use process::{GameProcess, OutputLines, ProcessExit};
