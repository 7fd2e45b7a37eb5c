use anyhow::{Context, Result};
use std::path::PathBuf;
use syntect::parsing::SyntaxSet;

fn main() -> Result<()> {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").context("OUT_DIR is not set")?);

    // generate syntaxes.bin from syntect's defaults
    let syntax_path = out_dir.join("syntaxes.bin");
    let ss = SyntaxSet::load_defaults_newlines();
    let syntax_bytes = bincode::serde::encode_to_vec(&ss, bincode::config::standard())
        .with_context(|| "Failed to serialize syntaxset to bincode")?;
    std::fs::write(&syntax_path, syntax_bytes)
        .with_context(|| "Failed to write serialized syntaxes")?;

    println!("cargo:rerun-if-changed=build.rs");
    Ok(())
}
