//! Bucket command handlers.

use std::sync::Arc;

use livewrite_core::model::File;
use livewrite_core::{Bucket, Facade, ListState};
use tabled::Tabled;

use crate::cli::{BucketArgs, BucketCommand, BucketTarget, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    mime_type: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&Arc<File>> for FileRow {
    fn from(f: &Arc<File>) -> Self {
        Self {
            id: f.id.clone(),
            name: f.name.clone(),
            mime_type: f.mime_type.clone(),
            size: f.size_original.to_string(),
            created: util::timestamp(f.created_at.as_ref()),
        }
    }
}

fn print(list: &ListState<File>, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(
        &global.output,
        &list.items,
        |f| FileRow::from(f),
        |f| f.id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    if matches!(global.output, OutputFormat::Table) && !global.quiet {
        eprintln!("{} shown, {} total", list.len(), list.total);
    }
    Ok(())
}

fn open(facade: &Facade, target: BucketTarget) -> (String, Bucket) {
    let resource = format!("bucket {}", target.bucket);
    let bucket = Bucket::open(facade, target.bucket, target.query.queries);
    (resource, bucket)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(facade: &Facade, args: BucketArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        BucketCommand::List(target) => {
            let list = Bucket::<File>::fetch(facade, target.bucket, target.query.queries).await?;
            print(&list, global)
        }

        BucketCommand::Watch(target) => {
            let (resource, bucket) = open(facade, target);
            let result =
                util::watch(&resource, bucket.subscribe(), |list| print(list, global)).await;
            bucket.close().await;
            result
        }
    }
}
