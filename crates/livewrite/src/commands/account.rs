//! Account command handlers.

use livewrite_core::model::User;
use livewrite_core::{Account, Facade};

use crate::cli::{AccountArgs, AccountCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(user: &User) -> String {
    let mut pairs = vec![
        ("ID", user.id.clone()),
        ("Name", user.name.clone()),
        ("Email", user.email.clone()),
        ("Verified", user.email_verification.to_string()),
        ("Active", user.status.to_string()),
        ("Created", util::timestamp(user.created_at.as_ref())),
    ];
    if !user.labels.is_empty() {
        pairs.push(("Labels", user.labels.join(", ")));
    }
    output::detail_lines(&pairs)
}

fn print(user: &User, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, user, detail, |u| u.id.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(facade: &Facade, args: AccountArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AccountCommand::Show => {
            let user = Account::fetch(facade).await?;
            print(&user, global)
        }
        AccountCommand::Watch => {
            let account = Account::open(facade);
            let result =
                util::watch("account", account.subscribe(), |user| print(user, global)).await;
            account.close().await;
            result
        }
    }
}
