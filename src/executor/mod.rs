mod harness;
mod runner;
mod truncation;

pub use harness::{RenderHarness, TempChart};
pub use runner::{find_helm_executable, run_with_timeout, HelmCommand, RenderOutcome, Renderer};
pub use truncation::{build, range_label};
