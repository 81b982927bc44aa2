pub mod config;
pub mod error;
pub mod paths;
pub mod types {
    pub mod dataset;
    pub mod sim_data;
}
pub mod parsing;
pub mod compile;
pub mod survey;
pub mod table_writer;
pub mod pipeline;

pub use config::Config;
pub use error::{CompileError, Result};
pub use paths::{FiberType, PathKind, SimLayout, WorkUnitKey};
