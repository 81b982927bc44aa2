pub mod sim_files;

pub use sim_files::{read_metadata, read_response_series, read_stimulus_waveform};
