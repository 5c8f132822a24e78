pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Request from `--input` when given, else from piped stdin.
pub fn read_request<T: DeserializeOwned>(path: Option<&str>) -> Result<Option<T>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => file::read_json(path).map(Some),
        None => stdin::read_stdin(),
    }
}
