pub mod compare;
pub mod seed;
pub mod sensitivity;
pub mod simulate;

use serde::de::DeserializeOwned;

use crate::input;

/// Load a document from `--input`, falling back to piped stdin.
pub(crate) fn load<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_document(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err(format!("--input <file.json|file.yaml> or stdin required for {what}").into())
    }
}
