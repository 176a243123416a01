//! File command handlers.

use std::io::Write;

use livewrite_core::model::File;
use livewrite_core::{BucketFile, CoreError, Facade};

use crate::cli::{FileArgs, FileCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(file: &File) -> String {
    let mut pairs = vec![
        ("ID", file.id.clone()),
        ("Bucket", file.bucket_id.clone()),
        ("Name", file.name.clone()),
        ("Type", file.mime_type.clone()),
        ("Size", file.size_original.to_string()),
        ("Signature", file.signature.clone()),
        ("Created", util::timestamp(file.created_at.as_ref())),
        ("Updated", util::timestamp(file.updated_at.as_ref())),
    ];
    if file.chunks_uploaded < file.chunks_total {
        pairs.push((
            "Chunks",
            format!("{}/{}", file.chunks_uploaded, file.chunks_total),
        ));
    }
    output::detail_lines(&pairs)
}

pub async fn handle(facade: &Facade, args: FileArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        FileCommand::Info { bucket, file } => {
            let raw = facade.storage().get_file(&bucket, &file).await?;
            let meta: File = serde_json::from_value(raw).map_err(CoreError::from)?;
            let out = output::render_single(&global.output, &meta, detail, |f| f.id.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FileCommand::Url { bucket, file } => {
            let url = facade.storage().file_download_url(&bucket, &file)?;
            crate::output::print_output(url.as_str(), global.quiet);
            Ok(())
        }

        FileCommand::Download { bucket, file, out } => {
            let handle = BucketFile::open(facade, bucket, file)?;
            let bytes = handle.ready().await?;
            handle.close().await;

            match out {
                Some(path) => {
                    std::fs::write(&path, &bytes)?;
                    if !global.quiet {
                        eprintln!("Wrote {} bytes to {}", bytes.len(), path.display());
                    }
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&bytes)?;
                    stdout.flush()?;
                }
            }
            Ok(())
        }
    }
}
