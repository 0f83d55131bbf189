//! `protoc` plugin entry point: reads a `CodeGeneratorRequest` from stdin,
//! runs it through the protokit-cli adapter, and writes the resulting
//! `CodeGeneratorResponse` to stdout.

use std::io::{self, Read, Write};

use protokit::Message;
use protokit_types::plugin::CodeGeneratorRequest;

fn main() -> io::Result<()> {
    env_logger::init();

    let mut buf = Vec::new();
    io::stdin().read_to_end(&mut buf)?;

    let request = CodeGeneratorRequest::decode(buf.as_slice())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, format!("invalid CodeGeneratorRequest: {err}")))?;

    let response = protokit_cli::run(request);

    let out = response.encode_to_vec();
    io::stdout().write_all(&out)
}
