use std::env;
use std::path::PathBuf;

pub fn data_dir() -> PathBuf {
    env::var("MEETINGS_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data").join("meetings"))
}
