//! Administrative and session commands.

use std::path::Path;

use async_trait::async_trait;
use roster_core::protocol::{Request, Response};
use tracing::debug;

use super::{Command, CommandError, Session};
use crate::collection::PersonList;

/// `save`: kept as a no-op for protocol compatibility. The collection is
/// write-through, so there is never anything to flush.
pub struct Save;

#[async_trait]
impl Command for Save {
    fn name(&self) -> &'static str {
        "save"
    }

    fn help(&self) -> &'static str {
        "save collection (no-op, collection is persistent)"
    }

    async fn execute(
        &self,
        _request: &Request,
        _session: &Session,
        _list: &PersonList,
    ) -> Result<Response, CommandError> {
        Ok(Response::with_message("Collection saved."))
    }
}

/// `execute_script <filepath>`: reads the file server-side and hands its
/// lines back in `Response::script` for the client to replay one command
/// per request.
pub struct ExecuteScript;

#[async_trait]
impl Command for ExecuteScript {
    fn name(&self) -> &'static str {
        "execute_script"
    }

    fn arg_names(&self) -> &'static [&'static str] {
        &["filepath"]
    }

    fn help(&self) -> &'static str {
        "execute script"
    }

    async fn execute(
        &self,
        request: &Request,
        _session: &Session,
        _list: &PersonList,
    ) -> Result<Response, CommandError> {
        let Some(raw_path) = request.args.first() else {
            return Ok(Response::with_message("No file path provided."));
        };
        let path = Path::new(raw_path);

        match tokio::fs::metadata(path).await {
            Err(_) => return Ok(Response::with_message("File not found.")),
            Ok(meta) if !meta.is_file() => {
                return Ok(Response::with_message("Path is not a file."));
            }
            Ok(_) => {}
        }

        match tokio::fs::read_to_string(path).await {
            Ok(contents) => {
                debug!(path = %path.display(), bytes = contents.len(), "script loaded");
                Ok(Response::with_script(
                    format!("Executing script '{raw_path}'."),
                    contents,
                ))
            }
            Err(_) => Ok(Response::with_message("Not enough rights to read file.")),
        }
    }
}

/// `exit`: the client terminates itself; the server only acknowledges.
pub struct Exit;

#[async_trait]
impl Command for Exit {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn help(&self) -> &'static str {
        "exits the program"
    }

    async fn execute(
        &self,
        _request: &Request,
        _session: &Session,
        _list: &PersonList,
    ) -> Result<Response, CommandError> {
        Ok(Response::with_message("Exiting..."))
    }
}
