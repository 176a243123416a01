//! Document command handlers.

use livewrite_core::Document;
use livewrite_core::model::Document as ApiDocument;

use crate::cli::{DocumentArgs, DocumentCommand, DocumentTarget, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Detail view ─────────────────────────────────────────────────────

fn detail(doc: &ApiDocument) -> String {
    let mut pairs = vec![
        ("ID", doc.id.clone()),
        ("Database", doc.database_id.clone()),
        ("Collection", doc.collection_id.clone()),
        ("Created", util::timestamp(doc.created_at.as_ref())),
        ("Updated", util::timestamp(doc.updated_at.as_ref())),
    ];
    if !doc.permissions.is_empty() {
        pairs.push(("Permissions", doc.permissions.join(", ")));
    }

    let mut out = output::detail_lines(&pairs);
    for (key, value) in &doc.data {
        out.push_str(&format!("\n  {key}: {}", output::clip_json(value, 80)));
    }
    out
}

fn print(doc: &ApiDocument, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, doc, detail, |d| d.id.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn open(facade: &livewrite_core::Facade, target: DocumentTarget) -> (String, Document) {
    let resource = format!(
        "document {}/{}/{}",
        target.database, target.collection, target.document
    );
    let document = Document::open(
        facade,
        target.database,
        target.collection,
        target.document,
        target.query.queries,
    );
    (resource, document)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    facade: &livewrite_core::Facade,
    args: DocumentArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DocumentCommand::Get(target) => {
            let doc = Document::<ApiDocument>::fetch(
                facade,
                target.database,
                target.collection,
                target.document,
                target.query.queries,
            )
            .await?;
            print(&doc, global)
        }

        DocumentCommand::Watch(target) => {
            let (resource, document) = open(facade, target);
            let result = util::watch(&resource, document.subscribe(), |doc| {
                print(doc, global)
            })
            .await;
            document.close().await;
            result
        }
    }
}
