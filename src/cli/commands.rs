//! Command dispatch

use std::io::{self, Read, Write};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, EditSession};
use crate::cli::args::{Cli, Commands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::cli::script::{parse_script, Outcome, ScriptRunner};
use crate::config::Settings;
use crate::domain::{self, Node};
use crate::tree_traits::TreeNodeConvert;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    if let Some(Commands::Completion { shell }) = &cli.command {
        _completion(*shell);
        return Ok(());
    }

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(ids) = cli.ids {
        settings.ids = ids;
    }
    debug!(ids = ?settings.ids, short_id_len = settings.short_id_len, "settings loaded");

    match &cli.command {
        Some(Commands::Show) => _show(&settings),
        Some(Commands::Demo) => _demo(&settings),
        Some(Commands::Edit { script, verify }) => _edit(&settings, script.as_deref(), *verify),
        Some(Commands::Config) => _config(&settings),
        Some(Commands::Completion { .. }) | None => Ok(()),
    }
}

fn new_session(settings: &Settings) -> EditSession {
    EditSession::new(settings.templates.clone(), settings.ids.generator())
}

fn render(session: &EditSession, settings: &Settings) -> String {
    session
        .tree()
        .to_tree_string(settings.short_id_len)
        .to_string()
}

#[instrument(skip(settings))]
fn _show(settings: &Settings) -> CliResult<()> {
    let session = new_session(settings);
    print!("{}", render(&session, settings));
    Ok(())
}

/// Walk through adding and removing a child and an evaluation.
#[instrument(skip(settings))]
fn _demo(settings: &Settings) -> CliResult<()> {
    let mut session = new_session(settings);
    let root = session.root_id();
    let initial = session.tree().clone();

    output::header("initial tree");
    print!("{}", render(&session, settings));

    let child = session.add_child(&root)?;
    output::header("add child to root");
    print!("{}", render(&session, settings));
    let ids = domain::list_ids(session.tree())
        .iter()
        .map(|id| id.short(settings.short_id_len))
        .join(" ");
    output::info(&format!("ids: {ids}"));

    if let Some(child) = child {
        session.remove(&child);
        output::header("remove that child");
        print!("{}", render(&session, settings));
        report_restored(session.tree(), &initial);
    }

    session.add_evaluation(&root);
    output::header("add evaluation to root");
    print!("{}", render(&session, settings));

    session.remove_evaluation(&root, 0)?;
    output::header("remove evaluation 0 from root");
    print!("{}", render(&session, settings));

    output::info(&format!("{} edits applied", session.revision()));
    Ok(())
}

/// Report whether an edit sequence brought the tree back to `initial`.
fn report_restored(current: &Node, initial: &Node) -> bool {
    let restored = current == initial;
    if restored {
        output::success("tree equals the initial tree");
    } else {
        output::warning("tree differs from the initial tree");
    }
    restored
}

fn read_script(path: Option<&Path>) -> CliResult<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| CliError::io(format!("read {}", path.display()), e)),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| CliError::io("read stdin", e))?;
            Ok(text)
        }
    }
}

#[instrument(skip(settings))]
fn _edit(settings: &Settings, script: Option<&Path>, verify: bool) -> CliResult<()> {
    let text = read_script(script)?;
    let commands = parse_script(&text)?;
    debug!("parsed {} commands", commands.len());

    let mut session = new_session(settings);
    let mut stdout = io::stdout().lock();
    {
        let mut runner = ScriptRunner::new(&mut session, settings.short_id_len);
        for (line, command) in &commands {
            let outcome = runner.apply(command, &mut stdout).map_err(|e| match e {
                CliError::Application(ApplicationError::Domain(fault)) => CliError::Script {
                    line: *line,
                    message: fault.to_string(),
                },
                other => other,
            })?;
            if let Outcome::Skipped(reason) = outcome {
                output::warning(&format!("line {line}: {reason}, skipped"));
            }
        }
    }

    write!(stdout, "{}", render(&session, settings))
        .map_err(|e| CliError::io("write tree", e))?;
    drop(stdout);

    if verify {
        domain::check_invariants(session.tree()).map_err(ApplicationError::from)?;
        output::success(&format!(
            "invariants hold: {} nodes, unique ids, consistent depths",
            session.tree().node_count()
        ));
    }
    Ok(())
}

#[instrument(skip(settings))]
fn _config(settings: &Settings) -> CliResult<()> {
    print!("{}", settings.to_toml()?);
    Ok(())
}

fn _completion(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
