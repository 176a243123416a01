//! Collection command handlers.

use std::sync::Arc;

use livewrite_core::model::Document as ApiDocument;
use livewrite_core::{Collection, Facade, ListState};
use tabled::Tabled;

use crate::cli::{CollectionArgs, CollectionCommand, CollectionTarget, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DocumentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Updated")]
    updated: String,
    #[tabled(rename = "Data")]
    data: String,
}

impl From<&Arc<ApiDocument>> for DocumentRow {
    fn from(d: &Arc<ApiDocument>) -> Self {
        Self {
            id: d.id.clone(),
            updated: util::timestamp(d.updated_at.as_ref()),
            data: output::clip_json(&d.data, 60),
        }
    }
}

fn print(list: &ListState<ApiDocument>, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(
        &global.output,
        &list.items,
        |d| DocumentRow::from(d),
        |d| d.id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    if matches!(global.output, OutputFormat::Table) && !global.quiet {
        eprintln!("{} shown, {} total", list.len(), list.total);
    }
    Ok(())
}

fn open(facade: &Facade, target: CollectionTarget) -> (String, Collection) {
    let resource = format!("collection {}/{}", target.database, target.collection);
    let collection = Collection::open(
        facade,
        target.database,
        target.collection,
        target.query.queries,
    );
    (resource, collection)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    facade: &Facade,
    args: CollectionArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        CollectionCommand::List(target) => {
            let list = Collection::<ApiDocument>::fetch(
                facade,
                target.database,
                target.collection,
                target.query.queries,
            )
            .await?;
            print(&list, global)
        }

        CollectionCommand::Watch(target) => {
            let (resource, collection) = open(facade, target);
            let result = util::watch(&resource, collection.subscribe(), |list| {
                print(list, global)
            })
            .await;
            collection.close().await;
            result
        }
    }
}
