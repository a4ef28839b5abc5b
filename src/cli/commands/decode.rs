//! Decode command.

use std::path::Path;

use crate::config::Config;
use crate::decoder::{CommandDecoder, Decoder, decode_directory, decode_file};

use super::print_decoder_install_instructions;

/// Decode a file, or every encrypted file in a directory
pub fn cmd_decode(
    config: &Config,
    path: &Path,
    output: Option<&Path>,
    recursive: bool,
) -> anyhow::Result<()> {
    let decoder = CommandDecoder::from_config(&config.decoder);
    if !decoder.is_available() {
        print_decoder_install_instructions(decoder.program());
        anyhow::bail!("decoder not available");
    }
    let delete_source = config.decoder.delete_source;

    if path.is_file() {
        let deleted = decode_file(&decoder, path, output, delete_source)?;
        println!("Decoded {:?}", path);
        if deleted {
            println!("Removed source {:?}", path);
        }
        return Ok(());
    }

    println!("Decoding files in {:?}", path);
    let summary = decode_directory(
        &decoder,
        path,
        output,
        recursive,
        delete_source,
        &config.formats.encrypted,
    )?;

    println!(
        "\nCompleted: {} of {} decoded, {} failed, {} sources deleted",
        summary.succeeded, summary.total, summary.failed, summary.deleted
    );
    if summary.failed > 0 {
        anyhow::bail!("{} files could not be decoded", summary.failed);
    }
    Ok(())
}
